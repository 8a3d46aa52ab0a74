use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::FormError;

/// Base type of a form field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Boolean,
    List,
}

impl FieldKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::List => "list",
        }
    }

    /// The value a field of this kind is reset to when it stops being relevant.
    pub fn safe_default(self) -> Value {
        match self {
            Self::Text => Value::Text(String::new()),
            Self::Number => Value::Number(0.0),
            Self::Date => Value::Null,
            Self::Boolean => Value::Bool(false),
            Self::List => Value::List(Vec::new()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime value of a field.
///
/// Date fields may hold either a [`Value::Date`] or ISO text as received from
/// the backend; both are normalized by [`Value::instant`] before comparing.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Date(DateTime<Utc>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns `true` when the value counts as missing for `Required`.
    ///
    /// Numbers and booleans are never empty; text is empty when blank.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bool(_) | Self::Number(_) | Self::Date(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Normalizes a date-like value to a comparable instant.
    ///
    /// Returns `None` for empty values and `Some(Err(()))` when the value is
    /// present but cannot be read as a date.
    pub fn instant(&self) -> Option<Result<DateTime<Utc>, ()>> {
        match self {
            Self::Null => None,
            Self::Date(at) => Some(Ok(*at)),
            Self::Text(raw) if raw.trim().is_empty() => None,
            Self::Text(raw) => Some(parse_instant(raw).ok_or(())),
            _ => Some(Err(())),
        }
    }

    /// Parses user input (CLI `--set`, text boxes) for a field of `kind`.
    pub fn parse(field: &str, kind: FieldKind, raw: &str) -> Result<Value, FormError> {
        let trimmed = raw.trim();
        match kind {
            FieldKind::Text => Ok(Value::Text(raw.to_string())),
            FieldKind::Number => {
                if trimmed.is_empty() {
                    return Ok(Value::Null);
                }
                let number: f64 = decimal_point(trimmed)
                    .ok_or_else(|| {
                        FormError::invalid_input(field, "ambiguous separators, use a single '.'")
                    })?
                    .parse()
                    .map_err(|_| FormError::invalid_input(field, "not a number"))?;
                if !number.is_finite() {
                    return Err(FormError::invalid_input(field, "not a finite number"));
                }
                Ok(Value::Number(number))
            }
            FieldKind::Date => {
                if trimmed.is_empty() {
                    return Ok(Value::Null);
                }
                parse_instant(trimmed)
                    .map(Value::Date)
                    .ok_or_else(|| FormError::invalid_input(field, "not a date"))
            }
            FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "0" | "" => Ok(Value::Bool(false)),
                _ => Err(FormError::invalid_input(field, "not a boolean")),
            },
            FieldKind::List => Ok(Value::List(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            )),
        }
    }

    /// Reads a wire value for a field of `kind`.
    ///
    /// Date strings that do not parse are kept as text so validation can
    /// report them instead of failing the whole load.
    pub fn from_wire(
        field: &str,
        kind: FieldKind,
        wire: &serde_json::Value,
    ) -> Result<Value, FormError> {
        use serde_json::Value as Json;

        let mismatch = || FormError::invalid_input(field, format!("expected {kind}, got {wire}"));

        match (kind, wire) {
            (_, Json::Null) => Ok(kind.safe_default()),
            (FieldKind::Text, Json::String(s)) => Ok(Value::Text(s.clone())),
            (FieldKind::Text, Json::Number(n)) => Ok(Value::Text(n.to_string())),
            (FieldKind::Number, Json::Number(n)) => n.as_f64().map(Value::Number).ok_or_else(mismatch),
            (FieldKind::Boolean, Json::Bool(b)) => Ok(Value::Bool(*b)),
            (FieldKind::Date, Json::String(s)) => Ok(parse_instant(s)
                .map(Value::Date)
                .unwrap_or_else(|| Value::Text(s.clone()))),
            (FieldKind::List, Json::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Json::String(s) => Ok(s.clone()),
                    Json::Number(n) => Ok(n.to_string()),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            _ => Err(mismatch()),
        }
    }

    /// Serializes the value for a payload.
    pub fn to_wire(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Number(n) => number_to_wire(*n),
            Self::Text(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().cloned().map(Json::String).collect()),
            Self::Date(at) => Json::String(at.to_rfc3339()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("-"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(",")),
            Self::Date(at) => f.write_str(&at.to_rfc3339()),
        }
    }
}

/// Accepts a single comma as the decimal separator (`12,5`). A comma next to
/// a dot, repeated, or followed by exactly three digits reads as a thousands
/// separator and is refused.
fn decimal_point(raw: &str) -> Option<std::borrow::Cow<'_, str>> {
    let Some((_, tail)) = raw.split_once(',') else {
        return Some(raw.into());
    };
    if raw.contains('.') || tail.contains(',') || tail.len() == 3 {
        return None;
    }
    Some(raw.replacen(',', ".", 1).into())
}

pub(crate) fn number_to_wire(n: f64) -> serde_json::Value {
    // Integral values go out as integers so `15` stays `15` on the wire.
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Parses the date formats observed on the wire and in user input.
///
/// Values without an offset are read as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_instant_accepts_observed_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        assert_eq!(parse_instant("2024-06-10"), Some(midnight));
        assert_eq!(parse_instant("2024-06-10T00:00:00"), Some(midnight));
        assert_eq!(parse_instant("2024-06-10T00:00:00.000Z"), Some(midnight));
        assert_eq!(parse_instant("2024-06-10T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_instant("2024-06-10 00:00"), Some(midnight));
        assert_eq!(parse_instant("10/06/2024"), None);
    }

    #[test]
    fn emptiness_follows_required_semantics() {
        assert!(Value::Null.is_empty());
        assert!(Value::text("  ").is_empty());
        assert!(Value::List(vec![]).is_empty());
        assert!(!Value::Number(0.0).is_empty());
        assert!(!Value::Bool(false).is_empty());
    }

    #[test]
    fn parse_user_input_by_kind() {
        assert_eq!(
            Value::parse("v", FieldKind::Number, "12,5").unwrap(),
            Value::Number(12.5)
        );
        assert!(Value::parse("v", FieldKind::Number, "abc").is_err());
        assert_eq!(
            Value::parse("ids", FieldKind::List, "b1, b2,,").unwrap(),
            Value::list(["b1", "b2"])
        );
        assert_eq!(
            Value::parse("on", FieldKind::Boolean, "yes").unwrap(),
            Value::Bool(true)
        );
        assert!(matches!(
            Value::parse("d", FieldKind::Date, "2024-06-10").unwrap(),
            Value::Date(_)
        ));
    }

    #[test]
    fn thousands_separators_are_refused() {
        for raw in ["1,000", "1,000.50", "1.000,5", "1,2,3"] {
            let err = Value::parse("minimumOrder", FieldKind::Number, raw).unwrap_err();
            assert!(matches!(err, FormError::InvalidInput { .. }), "{raw}");
        }
        assert_eq!(
            Value::parse("minimumOrder", FieldKind::Number, "1000.50").unwrap(),
            Value::Number(1000.5)
        );
        assert_eq!(
            Value::parse("minimumOrder", FieldKind::Number, "0,15").unwrap(),
            Value::Number(0.15)
        );
        assert!(Value::parse("minimumOrder", FieldKind::Number, "inf").is_err());
    }

    #[test]
    fn wire_null_reads_as_safe_default() {
        let v = Value::from_wire("n", FieldKind::Number, &serde_json::Value::Null).unwrap();
        assert_eq!(v, Value::Number(0.0));
        let v = Value::from_wire("l", FieldKind::List, &serde_json::Value::Null).unwrap();
        assert_eq!(v, Value::List(vec![]));
    }

    #[test]
    fn wire_type_mismatch_is_rejected() {
        let err = Value::from_wire("n", FieldKind::Number, &serde_json::json!("x")).unwrap_err();
        assert!(matches!(err, FormError::InvalidInput { .. }));
    }

    #[test]
    fn unparseable_wire_date_is_kept_as_text() {
        let v = Value::from_wire("d", FieldKind::Date, &serde_json::json!("tomorrow")).unwrap();
        assert_eq!(v, Value::text("tomorrow"));
        assert_eq!(v.instant(), Some(Err(())));
    }

    #[test]
    fn integral_numbers_serialize_as_integers() {
        assert_eq!(Value::Number(15.0).to_wire(), serde_json::json!(15));
        assert_eq!(Value::Number(0.15).to_wire(), serde_json::json!(0.15));
    }
}
