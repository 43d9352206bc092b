use crate::utils::calendar::DayCounts;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ZERO_DAY_PROBABILITY: f64 = 0.70;
const BURST_PROBABILITY: f64 = 0.03;

pub struct MockCalendar;

impl MockCalendar {
    pub fn generate(username: &str, year: i32, start: NaiveDate, end: NaiveDate) -> DayCounts {
        let mut rng = StdRng::seed_from_u64(seed_for(username, year));

        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| {
                let roll: f64 = rng.random();
                let count = if roll < ZERO_DAY_PROBABILITY {
                    0
                } else if roll < 1.0 - BURST_PROBABILITY {
                    rng.random_range(1..=7)
                } else {
                    rng.random_range(8..=15)
                };
                (date, count)
            })
            .collect()
    }
}

// FNV-1a, stable across builds and platforms
fn seed_for(username: &str, year: i32) -> u64 {
    format!("{}:{}", username.to_lowercase(), year)
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
        })
}
