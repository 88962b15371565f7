// Sample validation rules and rejection reasons
use super::sample::{Reading, Sample};
use chrono::{NaiveDate, NaiveTime, Timelike};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    L1ToL2,
    L2ToL3,
    L3ToL1,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Line::L1ToL2 => "Vl1to2",
            Line::L2ToL3 => "Vl2to3",
            Line::L3ToL1 => "Vl3to1",
        };
        f.write_str(name)
    }
}

/// Why a pushed sample ended up in the reject log
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("RowIndex not monotonic (last={last})")]
    NonMonotonic { last: i64 },
    #[error("RowLimitN reached ({limit})")]
    LimitReached { limit: u64 },
    #[error("Invalid Day format (expected yyyy-M-d)")]
    InvalidDay,
    #[error("Invalid Hour format (expected HH:mm:ss)")]
    InvalidHour,
    #[error("AcPwrt < 0")]
    NegativeAcPower,
    #[error("DcVolt < 0")]
    NegativeDcVoltage,
    #[error("Temper too low")]
    TemperatureTooLow,
    #[error("AcVlt1 <= 0")]
    NonPositiveAcVoltage,
    #[error("AcCur1 < 0")]
    NegativeAcCurrent,
    #[error("{0} <= 0")]
    NonPositiveLineVoltage(Line),
}

const MIN_TEMPERATURE: f64 = -50.0;

/// Check a normalized sample. Rules run in a fixed order and the first failure is reported.
pub fn validate(sample: &Sample) -> Result<(), Rejection> {
    if !is_valid_day(&sample.day) {
        return Err(Rejection::InvalidDay);
    }
    if !is_valid_hour(&sample.hour) {
        return Err(Rejection::InvalidHour);
    }

    check(sample.ac_power, |v| v >= 0.0, Rejection::NegativeAcPower)?;
    check(sample.dc_voltage, |v| v >= 0.0, Rejection::NegativeDcVoltage)?;
    check(sample.temperature, |v| v >= MIN_TEMPERATURE, Rejection::TemperatureTooLow)?;
    check(sample.ac_voltage, |v| v > 0.0, Rejection::NonPositiveAcVoltage)?;
    check(sample.ac_current, |v| v >= 0.0, Rejection::NegativeAcCurrent)?;

    let lines = [
        (sample.vl1to2, Line::L1ToL2),
        (sample.vl2to3, Line::L2ToL3),
        (sample.vl3to1, Line::L3ToL1),
    ];
    for (reading, line) in lines {
        check(reading, |v| v > 0.0, Rejection::NonPositiveLineVoltage(line))?;
    }

    Ok(())
}

fn check(reading: Reading, ok: impl Fn(f64) -> bool, rejection: Rejection) -> Result<(), Rejection> {
    match reading.value() {
        // NaN fails every comparison and is rejected along with out-of-range values
        Some(v) if !ok(v) => Err(rejection),
        _ => Ok(()),
    }
}

/// `year-month-day`, month and day may drop the leading zero
fn is_valid_day(day: &str) -> bool {
    let mut parts = day.split('-');
    let (Some(year), Some(month), Some(dom), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if year.len() != 4 || !(1..=2).contains(&month.len()) || !(1..=2).contains(&dom.len()) {
        return false;
    }
    if !all_digits(year) || !all_digits(month) || !all_digits(dom) {
        return false;
    }

    match (year.parse::<i32>(), month.parse::<u32>(), dom.parse::<u32>()) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d).is_some(),
        _ => false,
    }
}

/// Strict zero-padded 24h `HH:MM:SS`
fn is_valid_hour(hour: &str) -> bool {
    let bytes = hour.as_bytes();
    let shape_ok = bytes.len() == 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && [0, 1, 3, 4, 6, 7].iter().all(|&i| bytes[i].is_ascii_digit());
    if !shape_ok {
        return false;
    }

    match NaiveTime::parse_from_str(hour, "%H:%M:%S") {
        // chrono accepts :60 as a leap second
        Ok(time) => time.nanosecond() < 1_000_000_000,
        Err(_) => false,
    }
}
