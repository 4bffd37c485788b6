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

//! Canned ETL benchmark over the skewed event dataset.
//!
//! The pipeline exercises the pieces a skewed key distribution stresses:
//! dedup on a composite key, a repartition, a join against a small static
//! dimension table and a per-user rolling sum, plus an optional derived
//! bucket column. The engine does the heavy lifting; this module sequences
//! the stages, materializes the result as Parquet and records run metrics.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use datafusion::arrow::array::{Int32Array, StringArray};
use datafusion::arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::error::Result;
use datafusion::logical_expr::Partitioning;
use datafusion::prelude::{CsvReadOptions, DataFrame, SessionConfig, SessionContext};
use datafusion_common::instant::Instant;
use log::debug;
use structopt::StructOpt;

use crate::datagen::EVENTS_FILE;
use crate::events::CATEGORIES;
use crate::util::RunMetrics;

/// Subdirectory of `--out` holding the Parquet dataset.
const OUTPUT_DIR: &str = "output";

/// Dedup: keep one row per `(user_id, event_ts, category)`. Which duplicate
/// survives is engine chosen.
const DEDUP_QUERY: &str = "SELECT DISTINCT ON (user_id, event_ts, category) \
     user_id, event_ts, category, amount \
     FROM events";

/// Join the static category dimension; unknown categories keep a null cat_id.
const JOIN_QUERY: &str =
    "SELECT d.user_id, d.event_ts, d.category, d.amount, c.cat_id \
     FROM deduped d LEFT JOIN categories c ON d.category = c.category";

/// Per-user rolling sum over the current and 10 preceding rows in event time
/// order. Order among equal `event_ts` values is engine defined, so the sum
/// is not deterministic under ties.
const ROLLING_QUERY: &str = "SELECT *, SUM(amount) OVER (\
     PARTITION BY user_id ORDER BY event_ts \
     ROWS BETWEEN 10 PRECEDING AND CURRENT ROW) AS rolling_amt_10 \
     FROM joined";

/// Optional bucketization of the rolling sum.
const BUCKET_QUERY: &str =
    "SELECT *, CAST(FLOOR(rolling_amt_10 / 10) AS BIGINT) AS amt_bucket FROM features";

/// Run the canned ETL benchmark
///
/// Example
///
/// skewbench etl --input ./data --out ./results --partitions 8
///
/// reads `./data/events.csv`, replaces `./results/output/` with the
/// transformed dataset as Parquet, writes a `metrics_<unix_ts>.json` record
/// under `./results/` and prints the same JSON to stdout.
#[derive(Debug, StructOpt, Clone)]
#[structopt(verbatim_doc_comment)]
pub struct RunOpt {
    /// Input directory containing events.csv
    #[structopt(parse(from_os_str), required = true, short = "i", long = "input")]
    pub input: PathBuf,

    /// Output directory for the dataset and the metrics record
    #[structopt(parse(from_os_str), required = true, short = "o", long = "out")]
    pub out: PathBuf,

    /// Number of partitions to process in parallel
    #[structopt(short = "n", long = "partitions", default_value = "200")]
    pub partitions: usize,

    /// Run the optional bucketization stage
    #[structopt(long = "with-ml")]
    pub with_ml: bool,

    /// Activate debug mode to print stage queries
    #[structopt(short, long)]
    pub debug: bool,
}

impl RunOpt {
    pub async fn run(self) -> Result<()> {
        // One session per run; dropping it on any exit path releases the
        // engine resources.
        let config = SessionConfig::from_env()?.with_target_partitions(self.partitions);
        let ctx = SessionContext::new_with_config(config);

        let start = Instant::now();

        self.register_events(&ctx).await?;
        ctx.register_batch("categories", category_dim()?)?;

        let deduped = self
            .stage(&ctx, DEDUP_QUERY)
            .await?
            .repartition(Partitioning::RoundRobinBatch(self.partitions))?;
        ctx.register_table("deduped", deduped.into_view())?;

        let joined = self.stage(&ctx, JOIN_QUERY).await?;
        ctx.register_table("joined", joined.into_view())?;

        let features = self.stage(&ctx, ROLLING_QUERY).await?;
        let features = if self.with_ml {
            ctx.register_table("features", features.into_view())?;
            self.stage(&ctx, BUCKET_QUERY).await?
        } else {
            features
        };

        // Materialize first, count the materialized plan second.
        let out_data = self.out.join(OUTPUT_DIR);
        replace_output_dir(&out_data)?;
        debug!("writing parquet dataset to {}", out_data.display());
        features
            .clone()
            .write_parquet(
                out_data.to_str().expect("non utf8 path name"),
                DataFrameWriteOptions::new(),
                None,
            )
            .await?;
        let rows = features.count().await?;

        let metrics = RunMetrics::new(
            rows,
            start.elapsed(),
            self.partitions,
            self.with_ml,
            &self.input,
            &out_data,
        );

        let metrics_path = self.out.join(format!("metrics_{}.json", unix_timestamp()));
        metrics.write_json(&metrics_path)?;
        println!("{}", metrics.to_json()?);

        Ok(())
    }

    /// Register `events.csv` with its explicit on-disk schema.
    async fn register_events(&self, ctx: &SessionContext) -> Result<()> {
        let events_path = self.input.join(EVENTS_FILE);
        let schema = events_schema();
        ctx.register_csv(
            "events",
            events_path.to_str().expect("non utf8 path name"),
            CsvReadOptions::default().schema(&schema),
        )
        .await
    }

    /// Plan one pipeline stage from SQL.
    async fn stage(&self, ctx: &SessionContext, sql: &str) -> Result<DataFrame> {
        if self.debug {
            println!("Executing {sql}");
        }
        ctx.sql(sql).await
    }
}

/// On-disk schema of the generated dataset.
fn events_schema() -> Schema {
    Schema::new(vec![
        Field::new("user_id", DataType::Utf8, false),
        Field::new(
            "event_ts",
            DataType::Timestamp(TimeUnit::Second, None),
            false,
        ),
        Field::new("category", DataType::Utf8, false),
        Field::new("amount", DataType::Float64, false),
    ])
}

/// The fixed five row `category -> cat_id` dimension table.
fn category_dim() -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("category", DataType::Utf8, false),
        Field::new("cat_id", DataType::Int32, false),
    ]));
    let cat_ids: Vec<i32> = (1..=CATEGORIES.len() as i32).collect();
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(CATEGORIES.to_vec())),
            Arc::new(Int32Array::from(cat_ids)),
        ],
    )?;
    Ok(batch)
}

/// Overwrite semantics for the Parquet dataset: drop any previous output
/// wholesale so two runs never mix files.
fn replace_output_dir(out_data: &Path) -> Result<()> {
    if out_data.exists() {
        fs::remove_dir_all(out_data)?;
    }
    fs::create_dir_all(out_data)?;
    Ok(())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("current time is later than the epoch")
        .as_secs()
}
