// ⏰ Temporal Checks - send dates against "now"
//
// "Now" is never read implicitly: it comes from a Clock, so the checks
// are deterministic under test.

use crate::error::{VerificationError, VerificationResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CLOCK
// ============================================================================

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Frozen instant, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ============================================================================
// TIMESTAMP PARSING
// ============================================================================

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a send date. Offsets are honoured; a timestamp without offset is taken as UTC.
///
/// A form-decoded query turns the `+` of an offset into a space
/// (`2024-01-15T10:30:00 01:00`), which is repaired before giving up.
pub fn parse_timestamp(input: &str) -> VerificationResult<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(date.and_utc());
        }
    }

    if let Ok(day) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    if let Some(split) = input.rfind(' ') {
        let repaired = format!("{}+{}", &input[..split], &input[split + 1..]);
        if let Ok(date) = DateTime::parse_from_rfc3339(&repaired) {
            return Ok(date.with_timezone(&Utc));
        }
    }

    tracing::warn!(input, "Unparsable send date");
    Err(VerificationError::DateFormat(input.to_string()))
}

// ============================================================================
// DATE EVALUATOR
// ============================================================================

/// How a date exactly equal to "now" is judged by the window check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowBoundary {
    /// `input < now || now < input < now + tolerance`; equality is rejected
    #[default]
    Exclusive,
    /// `input <= now || input < now + tolerance`; equality is accepted
    Inclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateEvaluator {
    tolerance: Duration,
    boundary: WindowBoundary,
}

impl DateEvaluator {
    pub fn new(tolerance: Duration) -> Self {
        DateEvaluator {
            tolerance,
            boundary: WindowBoundary::Exclusive,
        }
    }

    /// Builder: set the equality policy
    pub fn with_boundary(mut self, boundary: WindowBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Already in effect, or no further ahead than the clock-skew tolerance
    pub fn is_within_window(&self, input: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // No representable horizon: every future date is within tolerance
        let before_horizon = now
            .checked_add_signed(self.tolerance)
            .map_or(true, |horizon| input < horizon);

        match self.boundary {
            WindowBoundary::Exclusive => input < now || (input > now && before_horizon),
            WindowBoundary::Inclusive => input <= now || before_horizon,
        }
    }

    /// Strictly in the past
    pub fn has_passed(&self, input: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now > input
    }
}

impl Default for DateEvaluator {
    fn default() -> Self {
        DateEvaluator::new(Duration::seconds(3))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_window_past_dates() {
        let eval = DateEvaluator::default();
        let now = t0();

        assert!(eval.is_within_window(now - Duration::seconds(1), now));
        assert!(eval.is_within_window(now - Duration::days(365), now));
    }

    #[test]
    fn test_window_near_future_within_tolerance() {
        let eval = DateEvaluator::default();
        let now = t0();

        assert!(eval.is_within_window(now + Duration::seconds(1), now));
        assert!(eval.is_within_window(now + Duration::milliseconds(2_999), now));
        assert!(!eval.is_within_window(now + Duration::seconds(3), now));
    }

    #[test]
    fn test_window_far_future() {
        let eval = DateEvaluator::default();
        let now = t0();

        assert!(!eval.is_within_window(now + Duration::minutes(10), now));
    }

    #[test]
    fn test_window_exact_now_depends_on_boundary() {
        let now = t0();

        let exclusive = DateEvaluator::default();
        assert!(!exclusive.is_within_window(now, now));

        let inclusive = DateEvaluator::default().with_boundary(WindowBoundary::Inclusive);
        assert!(inclusive.is_within_window(now, now));
        assert!(!inclusive.is_within_window(now + Duration::seconds(3), now));
    }

    #[test]
    fn test_inclusive_zero_tolerance_accepts_now() {
        let eval = DateEvaluator::new(Duration::zero()).with_boundary(WindowBoundary::Inclusive);
        let now = t0();

        assert!(eval.is_within_window(now, now));
        assert!(eval.is_within_window(now - Duration::seconds(1), now));
        assert!(!eval.is_within_window(now + Duration::milliseconds(1), now));

        let exclusive = DateEvaluator::new(Duration::zero());
        assert!(!exclusive.is_within_window(now, now));
    }

    #[test]
    fn test_huge_tolerance_does_not_overflow() {
        let eval = DateEvaluator::new(Duration::MAX);
        let now = t0();

        assert!(eval.is_within_window(now + Duration::days(365 * 100), now));
        assert!(eval.is_within_window(now - Duration::seconds(1), now));
        assert!(!eval.is_within_window(now, now));
    }

    #[test]
    fn test_custom_tolerance() {
        let eval = DateEvaluator::new(Duration::minutes(15));
        let now = t0();

        assert!(eval.is_within_window(now + Duration::minutes(10), now));
        assert!(!eval.is_within_window(now + Duration::minutes(20), now));
    }

    #[test]
    fn test_has_passed() {
        let eval = DateEvaluator::default();
        let now = t0();

        assert!(eval.has_passed(now - Duration::seconds(1), now));
        assert!(!eval.has_passed(now, now));
        assert!(!eval.has_passed(now + Duration::seconds(1), now));
    }

    #[test]
    fn test_parse_rfc3339() {
        let parsed = parse_timestamp("2024-03-15T13:00:00+01:00").unwrap();
        assert_eq!(parsed, t0());

        let parsed = parse_timestamp("2024-03-15T12:00:00Z").unwrap();
        assert_eq!(parsed, t0());
    }

    #[test]
    fn test_parse_naive_as_utc() {
        assert_eq!(parse_timestamp("2024-03-15T12:00:00").unwrap(), t0());
        assert_eq!(parse_timestamp("2024-03-15 12:00:00").unwrap(), t0());
        assert_eq!(
            parse_timestamp("2024-03-15T12:00:00.250").unwrap(),
            t0() + Duration::milliseconds(250)
        );
    }

    #[test]
    fn test_parse_date_only() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-15").unwrap(), midnight);
    }

    #[test]
    fn test_parse_form_decoded_offset() {
        assert_eq!(parse_timestamp("2024-03-15T13:00:00 01:00").unwrap(), t0());
    }

    #[test]
    fn test_parse_garbage_is_format_error() {
        for input in ["", "tomorrow", "2024-13-45T00:00:00", "15/03/2024"] {
            let err = parse_timestamp(input).unwrap_err();
            assert!(err.is_format(), "{:?} not a format error", input);
        }
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(t0()).now(), t0());
    }
}
