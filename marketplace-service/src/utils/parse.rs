use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use service_core::error::AppError;
use uuid::Uuid;

/// Accept a path id only if it is a well-formed UUID. `kind` names the
/// entity in the error, e.g. "package" gives "Invalid package ID".
pub fn parse_id<'a>(raw: &'a str, kind: &str) -> Result<&'a str, AppError> {
    Uuid::parse_str(raw)
        .map(|_| raw)
        .map_err(|_| AppError::bad_request(format!("Invalid {} ID", kind)))
}

/// RFC 3339 timestamp or a plain `YYYY-MM-DD` day (midnight UTC). Absent or
/// blank means now.
pub fn parse_travel_date(raw: Option<&str>) -> Result<DateTime<Utc>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Utc::now());
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::bad_request("Invalid travel date"))
}

/// Number fields that web forms sometimes send as strings.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {:?}", s))),
    }
}
