//! Calendar date to decimal year conversion, the time axis
//! expected by geomagnetic field models.
use chrono::{DateTime, Datelike, LocalResult, TimeZone};

/// Expresses `date` as `year + elapsed fraction of that year`.
///
/// Year boundaries are taken at midnight on January 1st in the date's
/// own timezone and the elapsed time is wall-clock (Unix timestamps,
/// whole seconds). Daylight-saving transitions therefore make the year
/// duration seen here differ from a flat 365/366 days by up to an hour.
/// That skew is deliberate: the field models this feeds are insensitive
/// to it, and normalizing would change results across a DST boundary.
pub fn decimal_year<Tz: TimeZone>(date: &DateTime<Tz>) -> f64 {
    let tz = date.timezone();
    let year = date.year();
    let start_of_year = year_start(&tz, year);
    let start_of_next = year_start(&tz, year + 1);

    let elapsed = (date.timestamp() - start_of_year) as f64;
    let duration = (start_of_next - start_of_year) as f64;

    year as f64 + elapsed / duration
}

/// Unix timestamp of local midnight, January 1st of `year`.
fn year_start<Tz: TimeZone>(tz: &Tz, year: i32) -> i64 {
    match tz.with_ymd_and_hms(year, 1, 1, 0, 0, 0) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.timestamp(),
        // a few timezones schedule their offset change at midnight,
        // leaving no 00:00 on January 1st: fall back to 01:00
        LocalResult::None => match tz.with_ymd_and_hms(year, 1, 1, 1, 0, 0) {
            LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.timestamp(),
            LocalResult::None => unreachable!("year {} has no representable start", year),
        },
    }
}

#[cfg(test)]
mod test {
    use super::decimal_year;
    use chrono::{FixedOffset, TimeZone};

    fn tz() -> FixedOffset {
        // UTC+10, no DST: deterministic year boundaries
        FixedOffset::east_opt(10 * 3600).unwrap()
    }

    #[test]
    fn year_open() {
        let date = tz().with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(decimal_year(&date), 2023.0);
    }

    #[test]
    fn year_close() {
        let date = tz().with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let value = decimal_year(&date);
        assert!(value < 2024.0);
        // one second short of the full 365 day year
        let expected = 2023.0 + (365.0 * 86400.0 - 1.0) / (365.0 * 86400.0);
        assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn leap_year_duration() {
        // noon on day 60 of a leap year: 59.5 days elapsed out of 366
        let date = tz().with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let value = decimal_year(&date);
        let expected = 2024.0 + 59.5 / 366.0;
        assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn mid_year() {
        // start of day 182 of 365: just before the year's midpoint
        let date = tz().with_ymd_and_hms(2023, 7, 2, 0, 0, 0).unwrap();
        let value = decimal_year(&date);
        assert!((value - (2023.0 + 182.0 / 365.0)).abs() < 1e-12);
    }
}
