use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 instant with millisecond precision, e.g. `2024-03-07T10:04:05.120Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// [`iso_timestamp`] with `:` and `.` replaced by `-` so it can sit in a file name.
pub fn filename_timestamp(at: DateTime<Utc>) -> String {
    iso_timestamp(at).replace([':', '.'], "-")
}

#[cfg(test)]
mod tests {
    use super::{filename_timestamp, iso_timestamp};
    use chrono::{TimeZone, Utc};

    #[test]
    fn iso_timestamp_keeps_millis_and_zulu() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 10, 4, 5).unwrap()
            + chrono::Duration::milliseconds(120);
        assert_eq!(iso_timestamp(at), "2024-03-07T10:04:05.120Z");
    }

    #[test]
    fn filename_timestamp_has_no_colons_or_dots() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 10, 4, 5).unwrap();
        let s = filename_timestamp(at);
        assert_eq!(s, "2024-03-07T10-04-05-000Z");
        assert!(!s.contains(':'));
        assert!(!s.contains('.'));
    }
}
