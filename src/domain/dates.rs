//! Lenient date parsing for request payloads and query strings.
//!
//! Clients send either a calendar date (`2025-01-31`) or a full RFC 3339 timestamp.
//! Calendar dates resolve to midnight UTC.

use serde::{Deserialize, Deserializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub fn parse_flexible(value: &str) -> Option<OffsetDateTime> {
    let trimmed = value.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(parsed);
    }
    let calendar = format_description!("[year]-[month]-[day]");
    Date::parse(trimmed, &calendar)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Upper bound variant of [`parse_flexible`]: a calendar date covers the whole day.
pub fn parse_until(value: &str) -> Option<OffsetDateTime> {
    let trimmed = value.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(parsed);
    }
    let calendar = format_description!("[year]-[month]-[day]");
    Date::parse(trimmed, &calendar)
        .ok()
        .and_then(|date| date.with_hms_nano(23, 59, 59, 999_999_999).ok())
        .map(|moment| moment.assume_utc())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{raw}`")))
}

pub mod option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => parse_flexible(&value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{value}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn accepts_calendar_dates_and_timestamps() {
        assert_eq!(
            parse_flexible("2025-01-02"),
            Some(datetime!(2025-01-02 00:00 UTC))
        );
        assert_eq!(
            parse_flexible("2025-01-02T10:30:00+07:00"),
            Some(datetime!(2025-01-02 10:30 +7))
        );
        assert_eq!(parse_flexible("02/01/2025"), None);
    }

    #[test]
    fn upper_bounds_cover_the_whole_day() {
        assert_eq!(
            parse_until("2025-01-02"),
            Some(datetime!(2025-01-02 23:59:59.999_999_999 UTC))
        );
        assert_eq!(
            parse_until("2025-01-02T10:30:00Z"),
            Some(datetime!(2025-01-02 10:30 UTC))
        );
    }
}
