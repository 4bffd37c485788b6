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

//! Benchmark run metrics, serialized to JSON.

use std::path::Path;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use datafusion::error::{DataFusionError, Result};
use datafusion::DATAFUSION_VERSION;
use serde::Serialize;

/// Summary of one benchmark run, emitted as pretty-printed JSON.
///
/// Declaration order is the serialization order of the document. The record
/// is assembled once after the run finishes and never mutated.
#[derive(Debug, Serialize)]
pub struct RunMetrics {
    /// UTC instant the record was assembled, RFC 3339 with a trailing `Z`
    timestamp: String,
    /// Row count of the final materialized dataset
    rows: usize,
    /// Wall clock pipeline time in seconds, rounded to milliseconds
    runtime_s: f64,
    /// Requested parallelism
    partitions: usize,
    /// Whether the bucketization stage ran
    with_ml: bool,
    input_dir: String,
    output_dir: String,
    /// Engine version the run executed on
    engine_version: String,
}

impl RunMetrics {
    pub fn new(
        rows: usize,
        runtime: Duration,
        partitions: usize,
        with_ml: bool,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            rows,
            runtime_s: round_to_millis(runtime.as_secs_f64()),
            partitions,
            with_ml,
            input_dir: input_dir.display().to_string(),
            output_dir: output_dir.display().to_string(),
            engine_version: DATAFUSION_VERSION.to_string(),
        }
    }

    /// Pretty-printed, two space indented JSON rendition.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DataFusionError::External(Box::new(e)))
    }

    /// Write the JSON rendition to `path`.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Round to 3 fractional digits, the resolution the record reports.
fn round_to_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunMetrics {
        RunMetrics::new(
            1234,
            Duration::from_secs_f64(1.23456),
            4,
            false,
            Path::new("/tmp/in"),
            Path::new("/tmp/out/output"),
        )
    }

    #[test]
    fn record_carries_every_field() {
        let json: serde_json::Value =
            serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        let object = json.as_object().unwrap();
        for field in [
            "timestamp",
            "rows",
            "runtime_s",
            "partitions",
            "with_ml",
            "input_dir",
            "output_dir",
            "engine_version",
        ] {
            assert!(object.contains_key(field), "missing field {field}");
        }
        assert_eq!(object.len(), 8);
        assert_eq!(json["rows"], 1234);
        assert_eq!(json["runtime_s"], 1.235);
        assert_eq!(json["partitions"], 4);
        assert_eq!(json["with_ml"], false);
        assert_eq!(json["input_dir"], "/tmp/in");
        assert_eq!(json["output_dir"], "/tmp/out/output");
        assert_eq!(json["engine_version"], DATAFUSION_VERSION);
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn json_is_two_space_indented() {
        let json = sample().to_json().unwrap();
        assert!(json.starts_with("{\n  \"timestamp\""));
    }

    #[test]
    fn runtime_rounds_to_three_decimals() {
        assert_eq!(round_to_millis(0.0004), 0.0);
        assert_eq!(round_to_millis(1.23456), 1.235);
        assert_eq!(round_to_millis(12.0), 12.0);
    }
}
