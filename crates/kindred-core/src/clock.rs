//! Injectable time source.
//!
//! The target store stamps every written row with its native day-count
//! convention: a continuous floating-point day number since 1899-12-30
//! (`julianday(now) - 2415018.5`). Merges take a [`Clock`] so those stamps
//! are reproducible under test.

use chrono::{DateTime, Utc};

/// Days from the store epoch (1899-12-30) to the Unix epoch.
const UNIX_EPOCH_DAY_COUNT: f64 = 25_569.0;

pub trait Clock {
  fn now(&self) -> DateTime<Utc>;

  /// The current instant as the store's modification-date day count.
  fn mod_date(&self) -> f64 {
    let now = self.now();
    let secs =
      now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) * 1e-9;
    secs / 86_400.0 + UNIX_EPOCH_DAY_COUNT
  }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A pinned instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn unix_epoch_maps_to_known_day_count() {
    let clock = FixedClock(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(clock.mod_date(), UNIX_EPOCH_DAY_COUNT);
  }

  #[test]
  fn day_count_advances_by_whole_days() {
    let d0 = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    let d1 = FixedClock(Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap());
    assert!((d1.mod_date() - d0.mod_date() - 1.0).abs() < 1e-9);
  }

  #[test]
  fn noon_is_half_a_day() {
    let mid = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    let noon = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    assert!((noon.mod_date() - mid.mod_date() - 0.5).abs() < 1e-9);
  }
}
