// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Writes the synthetic skewed event dataset as a headered CSV file.

use std::fs;
use std::path::{Path, PathBuf};

use datafusion::error::Result;
use datafusion_common::exec_datafusion_err;
use log::debug;
use structopt::StructOpt;

use crate::events::EventGenerator;

/// Name of the file produced inside `--out`.
pub const EVENTS_FILE: &str = "events.csv";

/// Header row of the generated file.
const HEADER: [&str; 4] = ["user_id", "event_ts", "category", "amount"];

/// Generate the synthetic skewed event dataset
///
/// Example
///
/// skewbench datagen --rows 1000000 --out ./data
///
/// writes `./data/events.csv`: one header row plus `--rows` event rows.
/// Repeated invocations with the same parameters produce byte identical
/// files.
#[derive(Debug, StructOpt, Clone)]
#[structopt(verbatim_doc_comment)]
pub struct RunOpt {
    /// Number of event rows to generate
    #[structopt(short = "r", long = "rows", default_value = "1000000")]
    pub rows: usize,

    /// Directory the dataset is written to, created if absent
    #[structopt(parse(from_os_str), short = "o", long = "out", default_value = "data")]
    pub out: PathBuf,

    /// Probability that a row's user id comes from the hot population
    #[structopt(long = "skew", default_value = "0.2")]
    pub skew: f64,
}

impl RunOpt {
    pub fn run(self) -> Result<()> {
        fs::create_dir_all(&self.out)?;
        let out_file = self.out.join(EVENTS_FILE);
        debug!(
            "generating {} rows at skew {} into {}",
            self.rows,
            self.skew,
            out_file.display()
        );

        write_events(&out_file, self.rows, self.skew)
            .map_err(|e| exec_datafusion_err!("writing {}: {e}", out_file.display()))?;

        println!("Wrote {} rows to {}", self.rows, out_file.display());
        Ok(())
    }
}

/// Stream the generator into a headered CSV file at `path`.
fn write_events(path: &Path, rows: usize, skew: f64) -> csv::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    for event in EventGenerator::new(rows, skew) {
        writer.write_record(&event.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn generate(dir: &Path, rows: usize) -> PathBuf {
        let opt = RunOpt {
            rows,
            out: dir.to_path_buf(),
            skew: 0.2,
        };
        opt.run().unwrap();
        dir.join(EVENTS_FILE)
    }

    #[test]
    fn writes_header_plus_n_rows() {
        let tmp = TempDir::new().unwrap();
        // nested directory is created on demand
        let path = generate(&tmp.path().join("nested"), 100);
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 101);
        assert_eq!(lines[0], "user_id,event_ts,category,amount");
        let first_row: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(first_row.len(), 4);
        assert!(first_row[0].starts_with("u_"));
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let a = generate(&tmp.path().join("a"), 500);
        let b = generate(&tmp.path().join("b"), 500);
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }
}
