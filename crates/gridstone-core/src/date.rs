//! Excel serial-date conversion
//!
//! Excel stores dates and times as f64 serial numbers: whole days since an
//! epoch, with the time of day in the fraction. Two epochs exist: the 1900
//! system (Windows default) and the 1904 system (classic Mac); the
//! workbook's settings select which one applies.
//!
//! The 1900 system inherits Lotus 1-2-3's phantom leap day: serial 60 is
//! the nonexistent 1900-02-29, so real dates from 1900-03-01 onward are
//! offset by one.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Convert a date to an Excel serial number
pub fn date_to_serial(date: NaiveDate, date_1904: bool) -> f64 {
    if date_1904 {
        let epoch = NaiveDate::from_ymd_opt(1904, 1, 1).unwrap();
        (date - epoch).num_days() as f64
    } else {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        let days = (date - epoch).num_days() as f64;
        // Account for the phantom 1900-02-29 at serial 60.
        if days > 59.0 {
            days + 1.0
        } else {
            days
        }
    }
}

/// Convert a date-time to an Excel serial number
pub fn datetime_to_serial(dt: NaiveDateTime, date_1904: bool) -> f64 {
    date_to_serial(dt.date(), date_1904) + time_fraction(dt.time())
}

/// Convert a time of day to the fractional part of a serial number
pub fn time_fraction(time: NaiveTime) -> f64 {
    let seconds =
        time.hour() as f64 * 3600.0 + time.minute() as f64 * 60.0 + time.second() as f64;
    seconds / 86_400.0
}
