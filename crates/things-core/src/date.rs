//! Codec for the packed date and time integers stored in `TMTask`.
//!
//! Dates pack as `(year << 16) | (month << 12) | (day << 7)` and reminder
//! times as `(hour << 26) | (minute << 20)`. The host-side functions and the
//! SQL generators both read their shifts and masks from the [`DateField`]
//! constants below, so the two representations cannot drift apart.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeZone, Timelike};

// ---------------------------------------------------------------------------
// Bit layout
// ---------------------------------------------------------------------------

/// One bit field inside a packed date or time integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateField {
    /// Position of the lowest bit of the field.
    pub shift: u32,
    /// Width of the field in bits.
    pub bits: u32,
}

impl DateField {
    /// Mask selecting this field in a packed integer.
    #[must_use]
    pub const fn mask(self) -> i64 {
        ((1_i64 << self.bits) - 1) << self.shift
    }

    /// Largest value the field can hold.
    #[must_use]
    pub const fn max(self) -> i64 {
        (1_i64 << self.bits) - 1
    }

    /// Place `value` into this field.
    #[must_use]
    pub const fn pack(self, value: i64) -> i64 {
        (value << self.shift) & self.mask()
    }

    /// Extract this field from a packed integer.
    #[must_use]
    pub const fn unpack(self, packed: i64) -> i64 {
        (packed & self.mask()) >> self.shift
    }

    /// SQL expression extracting this field from the SQL expression `expr`.
    #[must_use]
    pub fn sql_unpack(self, expr: &str) -> String {
        format!("(({expr} & {}) >> {})", self.mask(), self.shift)
    }

    /// SQL expression shifting the integer SQL expression `expr` into place.
    #[must_use]
    pub fn sql_pack(self, expr: &str) -> String {
        format!("({expr} << {})", self.shift)
    }
}

/// Year field of a packed date (11 bits).
pub const YEAR: DateField = DateField { shift: 16, bits: 11 };
/// Month field of a packed date (4 bits).
pub const MONTH: DateField = DateField { shift: 12, bits: 4 };
/// Day field of a packed date (5 bits).
pub const DAY: DateField = DateField { shift: 7, bits: 5 };
/// Hour field of a packed time (5 bits).
pub const HOUR: DateField = DateField { shift: 26, bits: 5 };
/// Minute field of a packed time (6 bits).
pub const MINUTE: DateField = DateField { shift: 20, bits: 6 };

/// Smallest year a packed date can carry.
pub const MIN_YEAR: i32 = 1;
/// Largest year a packed date can carry (11-bit ceiling).
#[allow(clippy::cast_possible_truncation)]
pub const MAX_YEAR: i32 = YEAR.max() as i32;

const ISO_DATE: &str = "%Y-%m-%d";
const LOCAL_NOW: &str = "'now', 'localtime'";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a date literal is rejected by [`parse_iso_date`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    /// Not exactly `YYYY-MM-DD` with digits and `-` separators.
    #[error("invalid date literal '{0}': expected YYYY-MM-DD")]
    Format(String),

    /// Well-formed, but the fields do not name a calendar day.
    #[error("'{0}' is not a calendar date")]
    Calendar(String),

    /// The year cannot be represented in the packed format.
    #[error("year {year} in '{literal}' is outside 1..=2047")]
    YearOutOfRange {
        /// The rejected literal.
        literal: String,
        /// The parsed year.
        year: i32,
    },
}

// ---------------------------------------------------------------------------
// Packed dates
// ---------------------------------------------------------------------------

/// Pack a calendar date.
///
/// Returns `0` (unset) for years outside [`MIN_YEAR`]..=[`MAX_YEAR`], which
/// the packed format cannot represent.
#[must_use]
pub fn date_to_things_date(date: NaiveDate) -> i64 {
    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        return 0;
    }
    YEAR.pack(i64::from(date.year()))
        | MONTH.pack(i64::from(date.month()))
        | DAY.pack(i64::from(date.day()))
}

/// Pack the local-calendar date of `time`; `None` packs to `0`.
///
/// The time of day is ignored.
#[must_use]
pub fn time_to_things_date<Tz: TimeZone>(time: Option<&DateTime<Tz>>) -> i64 {
    time.map_or(0, |t| {
        date_to_things_date(t.with_timezone(&Local).date_naive())
    })
}

/// Unpack a packed date into a calendar date.
///
/// Returns `None` for non-positive values (unset) and for bit patterns that
/// do not name a calendar day.
#[must_use]
pub fn things_date_to_date(packed: i64) -> Option<NaiveDate> {
    if packed <= 0 {
        return None;
    }
    let year = i32::try_from(YEAR.unpack(packed)).ok()?;
    let month = u32::try_from(MONTH.unpack(packed)).ok()?;
    let day = u32::try_from(DAY.unpack(packed)).ok()?;
    if year < MIN_YEAR {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Unpack a packed date into local midnight of that day.
#[must_use]
pub fn things_date_to_time(packed: i64) -> Option<DateTime<Local>> {
    let date = things_date_to_date(packed)?;
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
}

/// Strictly parse a `YYYY-MM-DD` literal.
///
/// # Errors
///
/// Returns [`DateParseError`] when the literal is not exactly ten
/// characters of the form `DDDD-DD-DD`, names no calendar day (leap years
/// honoured), or carries a year the packed format cannot hold.
pub fn parse_iso_date(literal: &str) -> Result<NaiveDate, DateParseError> {
    let bytes = literal.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| {
            if i == 4 || i == 7 {
                *b == b'-'
            } else {
                b.is_ascii_digit()
            }
        });
    if !well_formed {
        return Err(DateParseError::Format(literal.to_string()));
    }

    let field = |range: std::ops::Range<usize>| -> Result<u32, DateParseError> {
        literal[range]
            .parse()
            .map_err(|_| DateParseError::Format(literal.to_string()))
    };
    let year = i32::try_from(field(0..4)?)
        .map_err(|_| DateParseError::Format(literal.to_string()))?;
    let month = field(5..7)?;
    let day = field(8..10)?;

    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(DateParseError::YearOutOfRange {
            literal: literal.to_string(),
            year,
        });
    }

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::Calendar(literal.to_string()))
}

/// Parse a `YYYY-MM-DD` literal into a packed date; `""` is `Ok(0)`.
///
/// # Errors
///
/// See [`parse_iso_date`].
pub fn string_to_things_date(literal: &str) -> Result<i64, DateParseError> {
    if literal.is_empty() {
        return Ok(0);
    }
    parse_iso_date(literal).map(date_to_things_date)
}

/// Render a packed date as `YYYY-MM-DD`; unset renders as `""`.
#[must_use]
pub fn things_date_to_string(packed: i64) -> String {
    things_date_to_date(packed)
        .map(|date| date.format(ISO_DATE).to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Packed times
// ---------------------------------------------------------------------------

/// Pack the hour and minute of `time`; seconds are dropped.
#[must_use]
pub fn time_to_things_time(time: NaiveTime) -> i64 {
    things_time(time.hour(), time.minute())
}

/// Pack an hour and minute. Out-of-range components are masked to their
/// field width.
#[must_use]
pub fn things_time(hour: u32, minute: u32) -> i64 {
    HOUR.pack(i64::from(hour)) | MINUTE.pack(i64::from(minute))
}

/// Unpack a packed time.
///
/// Midnight is indistinguishable from "no reminder" and unpacks to `None`.
#[must_use]
pub fn things_time_to_time(packed: i64) -> Option<NaiveTime> {
    if packed <= 0 {
        return None;
    }
    let hour = u32::try_from(HOUR.unpack(packed)).ok()?;
    let minute = u32::try_from(MINUTE.unpack(packed)).ok()?;
    if hour == 0 && minute == 0 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Render a packed time as `HH:MM`; unset and midnight render as `""`.
#[must_use]
pub fn things_time_to_string(packed: i64) -> String {
    things_time_to_time(packed)
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// SQL generators
// ---------------------------------------------------------------------------

/// SQL expression computing today's packed date from `SQLite`'s local clock.
#[must_use]
pub fn today_things_date_sql() -> String {
    let part = |format: &str, field: DateField| {
        field.sql_pack(&format!(
            "CAST(strftime('{format}', {LOCAL_NOW}) AS INTEGER)"
        ))
    };
    format!(
        "({} | {} | {})",
        part("%Y", YEAR),
        part("%m", MONTH),
        part("%d", DAY)
    )
}

/// SQL expression rendering the packed-date `column` as `YYYY-MM-DD`.
///
/// `NULL` and `0` pass through unchanged.
#[must_use]
pub fn things_date_sql(column: &str) -> String {
    let iso = format!(
        "printf('%04d-%02d-%02d', {}, {}, {})",
        YEAR.sql_unpack(column),
        MONTH.sql_unpack(column),
        DAY.sql_unpack(column)
    );
    format!("CASE WHEN {column} THEN {iso} ELSE {column} END")
}

/// SQL expression rendering the packed-time `column` as `HH:MM`.
///
/// `NULL` and `0` pass through unchanged.
#[must_use]
pub fn things_time_sql(column: &str) -> String {
    let iso = format!(
        "printf('%02d:%02d', {}, {})",
        HOUR.sql_unpack(column),
        MINUTE.sql_unpack(column)
    );
    format!("CASE WHEN {column} THEN {iso} ELSE {column} END")
}

/// SQL expression rendering the Unix-seconds `column` as a local `YYYY-MM-DD`.
#[must_use]
pub fn unix_date_sql(column: &str) -> String {
    format!("date({column}, 'unixepoch', 'localtime')")
}

/// SQL expression rendering the Unix-seconds `column` as a local
/// `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn unix_datetime_sql(column: &str) -> String {
    format!("datetime({column}, 'unixepoch', 'localtime')")
}

/// SQL expression for today's local date, comparable with [`unix_date_sql`].
#[must_use]
pub fn today_unix_date_sql() -> String {
    format!("date({LOCAL_NOW})")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn field_masks_match_layout() {
        assert_eq!(YEAR.mask(), 0x07FF_0000);
        assert_eq!(MONTH.mask(), 0xF000);
        assert_eq!(DAY.mask(), 0xF80);
        assert_eq!(HOUR.mask(), 0x7C00_0000);
        assert_eq!(MINUTE.mask(), 0x03F0_0000);
        assert_eq!(MAX_YEAR, 2047);
    }

    #[test]
    fn packs_known_date() {
        // 2021-03-28 as stored by the app.
        assert_eq!(date_to_things_date(ymd(2021, 3, 28)), 132_464_128);
        assert_eq!(things_date_to_string(132_464_128), "2021-03-28");
    }

    #[test]
    fn low_bits_are_always_zero() {
        let packed = date_to_things_date(ymd(2024, 12, 31));
        assert_eq!(packed & 0x7F, 0);
    }

    #[test]
    fn year_outside_range_packs_to_unset() {
        assert_eq!(date_to_things_date(ymd(2048, 1, 1)), 0);
        assert_eq!(date_to_things_date(ymd(0, 1, 1)), 0);
    }

    #[test]
    fn time_to_things_date_none_is_zero() {
        assert_eq!(time_to_things_date::<Local>(None), 0);
    }

    #[test]
    fn time_to_things_date_ignores_time_of_day() {
        let morning = Local
            .from_local_datetime(&ymd(2024, 6, 1).and_hms_opt(0, 30, 0).expect("time"))
            .earliest()
            .expect("local time");
        let evening = Local
            .from_local_datetime(&ymd(2024, 6, 1).and_hms_opt(23, 30, 0).expect("time"))
            .earliest()
            .expect("local time");
        assert_eq!(
            time_to_things_date(Some(&morning)),
            time_to_things_date(Some(&evening))
        );
        assert_eq!(
            time_to_things_date(Some(&morning)),
            date_to_things_date(ymd(2024, 6, 1))
        );
    }

    #[test]
    fn non_positive_is_unset() {
        for n in [0, -1, -132_464_128, i64::MIN] {
            assert!(things_date_to_time(n).is_none());
            assert!(things_date_to_date(n).is_none());
            assert_eq!(things_date_to_string(n), "");
            assert_eq!(things_time_to_string(n), "");
        }
    }

    #[test]
    fn unpacked_garbage_is_unset() {
        // month 13
        let packed = YEAR.pack(2024) | MONTH.pack(13) | DAY.pack(1);
        assert!(things_date_to_date(packed).is_none());
        // February 30th
        let packed = YEAR.pack(2024) | MONTH.pack(2) | DAY.pack(30);
        assert!(things_date_to_date(packed).is_none());
    }

    #[test]
    fn things_date_to_time_is_local_midnight() {
        let packed = date_to_things_date(ymd(2023, 7, 14));
        let time = things_date_to_time(packed).expect("valid date");
        assert_eq!(time.date_naive(), ymd(2023, 7, 14));
        assert_eq!(time.hour(), 0);
        assert_eq!(time.minute(), 0);
    }

    #[test]
    fn string_to_things_date_empty_is_zero() {
        assert_eq!(string_to_things_date(""), Ok(0));
    }

    #[test]
    fn string_to_things_date_rejects_malformed() {
        for literal in [
            "2024-1-01",
            "2024-01-1",
            "24-01-01",
            "2024/01/01",
            "2024-01-01T00:00",
            "2024-01-01 ",
            " 2024-01-01",
            "2024-0a-01",
            "+024-01-01",
            "2024-01",
            "today",
        ] {
            assert!(
                matches!(
                    string_to_things_date(literal),
                    Err(DateParseError::Format(_))
                ),
                "accepted {literal:?}"
            );
        }
    }

    #[test]
    fn string_to_things_date_rejects_impossible_days() {
        for literal in ["2024-13-01", "2024-00-10", "2024-04-31", "2023-02-29", "2024-13-40"] {
            assert!(
                matches!(
                    string_to_things_date(literal),
                    Err(DateParseError::Calendar(_))
                ),
                "accepted {literal:?}"
            );
        }
    }

    #[test]
    fn leap_day_accepted_only_in_leap_years() {
        assert!(string_to_things_date("2024-02-29").is_ok());
        assert!(string_to_things_date("2000-02-29").is_ok());
        assert!(string_to_things_date("1900-02-29").is_err());
    }

    #[test]
    fn year_bounds_enforced() {
        assert!(string_to_things_date("0001-01-01").is_ok());
        assert!(string_to_things_date("2047-12-31").is_ok());
        assert!(matches!(
            string_to_things_date("0000-01-01"),
            Err(DateParseError::YearOutOfRange { year: 0, .. })
        ));
        assert!(matches!(
            string_to_things_date("2048-01-01"),
            Err(DateParseError::YearOutOfRange { year: 2048, .. })
        ));
    }

    #[test]
    fn midnight_is_suppressed() {
        assert_eq!(things_time_to_string(0), "");
        let midnight = time_to_things_time(NaiveTime::MIN);
        assert_eq!(things_time_to_string(midnight), "");
        // Stray low bits do not turn midnight into a reminder.
        assert_eq!(things_time_to_string(midnight | 0x1), "");
    }

    #[test]
    fn formats_reminder_times() {
        let one_past = time_to_things_time(NaiveTime::from_hms_opt(0, 1, 0).expect("time"));
        let last = time_to_things_time(NaiveTime::from_hms_opt(23, 59, 0).expect("time"));
        assert_eq!(things_time_to_string(one_past), "00:01");
        assert_eq!(things_time_to_string(last), "23:59");
        assert_eq!(things_time_to_string(HOUR.pack(9) | MINUTE.pack(5)), "09:05");
        assert_eq!(things_time(9, 5), HOUR.pack(9) | MINUTE.pack(5));
    }

    #[test]
    fn today_sql_shifts_each_field() {
        let sql = today_things_date_sql();
        assert!(sql.contains("strftime('%Y', 'now', 'localtime') AS INTEGER) << 16)"));
        assert!(sql.contains("strftime('%m', 'now', 'localtime') AS INTEGER) << 12)"));
        assert!(sql.contains("strftime('%d', 'now', 'localtime') AS INTEGER) << 7)"));
    }

    #[test]
    fn date_sql_passes_unset_through() {
        let sql = things_date_sql("TASK.startDate");
        assert!(sql.starts_with("CASE WHEN TASK.startDate THEN printf('%04d-%02d-%02d'"));
        assert!(sql.ends_with("ELSE TASK.startDate END"));
        assert!(sql.contains("((TASK.startDate & 134152192) >> 16)"));
    }

    #[test]
    fn time_sql_uses_time_fields() {
        let sql = things_time_sql("TASK.reminderTime");
        assert!(sql.contains("((TASK.reminderTime & 2080374784) >> 26)"));
        assert!(sql.contains("((TASK.reminderTime & 66060288) >> 20)"));
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (MIN_YEAR..=MAX_YEAR, 1_u32..=12, 1_u32..=31)
            .prop_filter_map("calendar date", |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
    }

    proptest! {
        #[test]
        fn date_round_trips(date in arb_date()) {
            let packed = date_to_things_date(date);
            prop_assert!(packed > 0);
            prop_assert_eq!(things_date_to_date(packed), Some(date));
            let time = things_date_to_time(packed);
            prop_assert_eq!(time.map(|t| t.date_naive()), Some(date));
        }

        #[test]
        fn iso_string_round_trips(date in arb_date()) {
            let literal = date.format("%Y-%m-%d").to_string();
            let packed = string_to_things_date(&literal).expect("valid literal");
            prop_assert_eq!(things_date_to_string(packed), literal);
        }

        #[test]
        fn packed_order_matches_calendar_order(a in arb_date(), b in arb_date()) {
            prop_assert_eq!(
                date_to_things_date(a).cmp(&date_to_things_date(b)),
                a.cmp(&b)
            );
        }

        #[test]
        fn time_round_trips(hour in 0_u32..24, minute in 0_u32..60) {
            let time = NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time");
            let packed = time_to_things_time(time);
            if hour == 0 && minute == 0 {
                prop_assert_eq!(things_time_to_time(packed), None);
            } else {
                prop_assert_eq!(things_time_to_time(packed), Some(time));
                prop_assert_eq!(things_time_to_string(packed), time.format("%H:%M").to_string());
            }
        }
    }
}
