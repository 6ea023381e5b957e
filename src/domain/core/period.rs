use std::ops::Range;

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DeserializeAs, SerializeAs};

use super::ReservationError;

const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";
const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// 予約期間 `[start, end)`。常に `start < end` を満たす
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodRecord", into = "PeriodRecord")]
pub struct Period {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ReservationError> {
        if start >= end {
            return Err(ReservationError::EndNotAfterStart);
        }
        Ok(Self { start, end })
    }

    /// フォーム入力の文字列から期間を作る
    pub fn parse(start: &str, end: &str) -> Result<Self, ReservationError> {
        let start = parse_timestamp("startDate", start)?;
        let end = parse_timestamp("endDate", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn range(&self) -> Range<DateTime<Utc>> {
        self.start..self.end
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// 半開区間として重なるか（端点が接するだけなら重ならない）
    pub fn overlaps(&self, other: &Period) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// `at` が期間の内側（両端を含まない）にあるか
    pub fn surrounds(&self, at: DateTime<Utc>) -> bool {
        self.start < at && at < self.end
    }
}

/// 秒を省いたローカル時刻表記 `YYYY-MM-DDTHH:MM` で日時を扱う
pub struct LocalMinute;

impl SerializeAs<DateTime<Utc>> for LocalMinute {
    fn serialize_as<S>(source: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&format_timestamp(source))
    }
}

impl<'de> DeserializeAs<'de, DateTime<Utc>> for LocalMinute {
    fn deserialize_as<D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse_timestamp("timestamp", &value).map_err(serde::de::Error::custom)
    }
}

/// 秒以下が0なら分まで、そうでなければ小数秒まで書き出す
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    if value.second() == 0 && value.nanosecond() == 0 {
        value.format(MINUTE_FORMAT).to_string()
    } else {
        value.format(SECOND_FORMAT).to_string()
    }
}

pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, ReservationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ReservationError::MissingField { field });
    }
    NaiveDateTime::parse_from_str(value, MINUTE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, SECOND_FORMAT))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|_| ReservationError::InvalidTimestamp {
            field,
            value: value.to_owned(),
        })
}

#[serde_as]
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodRecord {
    #[serde_as(as = "LocalMinute")]
    start_date: DateTime<Utc>,
    #[serde_as(as = "LocalMinute")]
    end_date: DateTime<Utc>,
}

impl TryFrom<PeriodRecord> for Period {
    type Error = ReservationError;

    fn try_from(value: PeriodRecord) -> Result<Self, Self::Error> {
        Period::new(value.start_date, value.end_date)
    }
}

impl From<Period> for PeriodRecord {
    fn from(value: Period) -> Self {
        Self {
            start_date: value.start,
            end_date: value.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: &str, end: &str) -> Period {
        Period::parse(start, end).unwrap()
    }

    #[test]
    fn test_period_rejects_inverted_and_empty() {
        assert!(matches!(
            Period::parse("2025-12-17T17:00", "2025-12-17T09:00"),
            Err(ReservationError::EndNotAfterStart)
        ));
        assert!(matches!(
            Period::parse("2025-12-17T09:00", "2025-12-17T09:00"),
            Err(ReservationError::EndNotAfterStart)
        ));
    }

    #[test]
    fn test_period_parse_errors() {
        assert!(matches!(
            Period::parse("", "2025-12-17T09:00"),
            Err(ReservationError::MissingField { field: "startDate" })
        ));
        assert!(matches!(
            Period::parse("2025-12-17T09:00", "tomorrow"),
            Err(ReservationError::InvalidTimestamp { field: "endDate", .. })
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 17, 9, 0, 0).unwrap();
        assert_eq!(parse_timestamp("t", "2025-12-17T09:00").unwrap(), expected);
        assert_eq!(parse_timestamp("t", "2025-12-17T09:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("t", "2025-12-17T10:00:00+01:00").unwrap(), expected);
    }

    #[test]
    fn test_overlap_is_half_open() {
        let base = period("2025-12-17T09:00", "2025-12-17T17:00");
        let after = period("2025-12-17T17:00", "2025-12-17T18:00");
        let before = period("2025-12-17T08:00", "2025-12-17T09:00");
        let late = period("2025-12-17T16:00", "2025-12-17T18:00");
        let inside = period("2025-12-17T10:00", "2025-12-17T11:00");
        let around = period("2025-12-17T08:00", "2025-12-17T18:00");

        assert!(!base.overlaps(&after));
        assert!(!after.overlaps(&base));
        assert!(!base.overlaps(&before));
        for other in [&late, &inside, &around] {
            assert!(base.overlaps(other));
            assert!(other.overlaps(&base));
        }
    }

    #[test]
    fn test_surrounds_excludes_bounds() {
        let base = period("2025-12-17T09:00", "2025-12-17T17:00");
        assert!(base.surrounds(parse_timestamp("t", "2025-12-17T12:00").unwrap()));
        assert!(!base.surrounds(base.start()));
        assert!(!base.surrounds(base.end()));
    }

    #[test]
    fn test_period_serde_shape() {
        let base = period("2025-12-17T09:00", "2025-12-17T17:00:30");
        let json = serde_json::to_value(&base).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"startDate": "2025-12-17T09:00", "endDate": "2025-12-17T17:00:30"})
        );
        assert_eq!(serde_json::from_value::<Period>(json).unwrap(), base);
    }

    #[test]
    fn test_period_deserialize_rejects_inverted() {
        let json = serde_json::json!({"startDate": "2025-12-17T17:00", "endDate": "2025-12-17T09:00"});
        assert!(serde_json::from_value::<Period>(json).is_err());
    }

    #[test]
    fn test_fractional_seconds_survive_serde() {
        let base = period("2026-01-05T09:00:00.100", "2026-01-05T09:00:00.500");
        let json = serde_json::to_value(&base).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"startDate": "2026-01-05T09:00:00.100", "endDate": "2026-01-05T09:00:00.500"})
        );
        assert_eq!(serde_json::from_value::<Period>(json).unwrap(), base);
    }
}
