pub mod auth;
pub mod bot;
pub mod guards;
pub mod logs;
pub mod rosters;
pub mod templates;
pub mod warns;

use chrono::NaiveDateTime;

/// Database timestamps are naive UTC; the wire format is RFC 3339.
pub(crate) fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.and_utc().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn timestamps_serialize_as_rfc3339_utc() {
        let ts = NaiveDate::from_ymd_opt(2026, 8, 27)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(fmt_ts(ts), "2026-08-27T12:30:00+00:00");
    }
}
