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

//! Synthetic skewed event stream used as benchmark input.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed seed, so repeated runs with the same parameters emit identical data.
const GENERATOR_SEED: u64 = 42;

/// Category vocabulary. The ETL dimension table maps these, in order, to the
/// ids `1..=5`.
pub const CATEGORIES: [&str; 5] = ["alpha", "beta", "gamma", "delta", "epsilon"];

/// Timestamps are spread uniformly over this many seconds from [`base_time`].
const EVENT_WINDOW_SECS: i64 = 90 * 24 * 3600;

/// Timestamp rendering used in the generated CSV, second resolution.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// First instant of the 90 day event window.
pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// One synthetic event row.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub user_id: String,
    pub event_ts: NaiveDateTime,
    pub category: &'static str,
    pub amount: f64,
}

impl Event {
    /// Render the four CSV fields in file order.
    pub fn to_record(&self) -> [String; 4] {
        [
            self.user_id.clone(),
            self.event_ts.format(TIMESTAMP_FORMAT).to_string(),
            self.category.to_string(),
            format!("{:.2}", self.amount),
        ]
    }
}

/// Iterator over `n_rows` events with a two population hot/cold key skew.
///
/// `skew` is the probability that a row's `user_id` is drawn from the small
/// hot population rather than the larger cold one; the draw within each
/// population is uniform. The goal is join and shuffle imbalance with a
/// handful of heavy keys, not a true Zipf distribution.
///
/// ```text
/// user_id:  'u_173'
/// event_ts: '2024-02-19T11:48:31'
/// category: 'gamma'
/// amount:   42.07
/// ```
#[derive(Debug)]
pub struct EventGenerator {
    rng: StdRng,
    remaining: usize,
    skew: f64,
    hot_users: u64,
    cold_users: u64,
}

impl EventGenerator {
    /// Create a generator for `n_rows` rows at the given hot key probability.
    ///
    /// The generator seeds its own RNG with a fixed constant, so two
    /// generators built with the same parameters yield the same sequence.
    pub fn new(n_rows: usize, skew: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(GENERATOR_SEED),
            remaining: n_rows,
            skew,
            hot_users: hot_population(n_rows, skew),
            cold_users: cold_population(n_rows),
        }
    }
}

impl Iterator for EventGenerator {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        // Per-row draw order is fixed; changing it changes every output file.
        let user_id = if self.rng.gen::<f64>() < self.skew {
            format!("u_{}", self.rng.gen_range(1..=self.hot_users))
        } else {
            format!("u_{}", self.rng.gen_range(1..=self.cold_users))
        };
        let offset = self.rng.gen_range(0..=EVENT_WINDOW_SECS);
        let event_ts = base_time() + Duration::seconds(offset);
        let category = CATEGORIES[self.rng.gen_range(0..CATEGORIES.len())];
        let amount = (self.rng.gen::<f64>() * 100.0 * 100.0).round() / 100.0;

        Some(Event {
            user_id,
            event_ts,
            category,
            amount,
        })
    }
}

/// Hot population size: `max(1, n_rows * skew / 1000)`, truncated.
fn hot_population(n_rows: usize, skew: f64) -> u64 {
    ((n_rows as f64 * skew / 1000.0) as u64).max(1)
}

/// Cold population size: `max(2, n_rows / 1000)`. The populations overlap,
/// both start at user 1.
fn cold_population(n_rows: usize) -> u64 {
    (n_rows as u64 / 1000).max(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_index(event: &Event) -> u64 {
        event.user_id.strip_prefix("u_").unwrap().parse().unwrap()
    }

    #[test]
    fn identical_parameters_produce_identical_sequences() {
        let a: Vec<Event> = EventGenerator::new(1000, 0.2).collect();
        let b: Vec<Event> = EventGenerator::new(1000, 0.2).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn produces_exactly_n_rows() {
        assert_eq!(EventGenerator::new(0, 0.2).count(), 0);
        assert_eq!(EventGenerator::new(1, 0.2).count(), 1);
        assert_eq!(EventGenerator::new(12_345, 0.2).count(), 12_345);
    }

    #[test]
    fn values_stay_in_domain() {
        let latest = base_time() + Duration::seconds(EVENT_WINDOW_SECS);
        for event in EventGenerator::new(5_000, 0.2) {
            assert!(CATEGORIES.contains(&event.category));
            assert!(event.event_ts >= base_time() && event.event_ts <= latest);
            // rounding the uniform [0, 100) draw to cents can land on 100.00
            assert!((0.0..=100.0).contains(&event.amount));
            let cents = event.amount * 100.0;
            assert!(
                (cents - cents.round()).abs() < 1e-6,
                "amount {} has more than two decimals",
                event.amount
            );
        }
    }

    #[test]
    fn population_sizes_follow_row_count() {
        assert_eq!(hot_population(1_000, 0.2), 1);
        assert_eq!(cold_population(1_000), 2);
        assert_eq!(hot_population(1_000_000, 0.2), 200);
        assert_eq!(cold_population(1_000_000), 1000);
        assert_eq!(hot_population(50_000, 0.9), 45);
        assert_eq!(cold_population(50_000), 50);
        // floors at 1 hot / 2 cold users for tiny inputs
        assert_eq!(hot_population(10, 0.2), 1);
        assert_eq!(cold_population(10), 2);
    }

    #[test]
    fn high_skew_concentrates_rows_on_hot_users() {
        let n = 20_000;
        let hot = hot_population(n, 0.9);
        let hot_rows = EventGenerator::new(n, 0.9)
            .filter(|e| user_index(e) <= hot)
            .count();
        assert!(hot_rows as f64 / n as f64 > 0.9);
    }

    #[test]
    fn low_skew_spreads_rows_across_cold_users() {
        let n = 20_000;
        let hot = hot_population(n, 0.05);
        let hot_rows = EventGenerator::new(n, 0.05)
            .filter(|e| user_index(e) <= hot)
            .count();
        assert!((hot_rows as f64 / n as f64) < 0.2);
    }

    #[test]
    fn records_render_in_csv_field_order() {
        let event = Event {
            user_id: "u_7".to_string(),
            event_ts: base_time() + Duration::seconds(3661),
            category: "beta",
            amount: 5.5,
        };
        assert_eq!(
            event.to_record(),
            ["u_7", "2024-01-01T01:01:01", "beta", "5.50"]
        );
    }
}
