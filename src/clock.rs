use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Study days start at the cutover, not at midnight: anything before it
/// still belongs to the previous calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRollover {
    cutover: NaiveTime,
}

impl Default for DayRollover {
    fn default() -> Self {
        Self {
            cutover: NaiveTime::from_hms_opt(5, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl DayRollover {
    pub fn new(cutover: NaiveTime) -> Self {
        Self { cutover }
    }

    /// Parse an `HH:MM` cutover.
    pub fn parse(value: &str) -> Result<Self> {
        let cutover = NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .with_context(|| format!("invalid day cutover '{}', expected HH:MM", value))?;
        Ok(Self { cutover })
    }

    pub fn cutover(&self) -> NaiveTime {
        self.cutover
    }

    pub fn effective_date(&self, now: NaiveDateTime) -> NaiveDate {
        if now.time() < self.cutover {
            now.date() - Duration::days(1)
        } else {
            now.date()
        }
    }

    pub fn today(&self, clock: &dyn Clock) -> NaiveDate {
        self.effective_date(clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    #[test]
    fn test_before_cutover_is_previous_day() {
        let rollover = DayRollover::default();
        assert_eq!(
            rollover.effective_date(at(2025, 5, 5, 5, 29)),
            NaiveDate::from_ymd_opt(2025, 5, 4).unwrap()
        );
        assert_eq!(
            rollover.effective_date(at(2025, 3, 1, 0, 10)),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_at_or_after_cutover_is_same_day() {
        let rollover = DayRollover::default();
        let today = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        assert_eq!(rollover.effective_date(at(2025, 5, 5, 5, 30)), today);
        assert_eq!(rollover.effective_date(at(2025, 5, 5, 23, 59)), today);
    }

    #[test]
    fn test_parse_cutover() {
        let rollover = DayRollover::parse("04:00").unwrap();
        let clock = FixedClock(at(2025, 5, 5, 4, 30));
        assert_eq!(rollover.today(&clock), NaiveDate::from_ymd_opt(2025, 5, 5).unwrap());
        assert!(DayRollover::parse("late").is_err());
        assert!(DayRollover::parse("25:00").is_err());
    }
}
