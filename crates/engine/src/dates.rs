use crate::{FieldError, Value};

/// Two date fields whose values must be strictly ordered.
///
/// The error lands on the `end` field and is recomputed whenever either
/// side changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateRangePair {
    pub start: String,
    pub end: String,
}

impl DateRangePair {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn involves(&self, field: &str) -> bool {
        self.start == field || self.end == field
    }
}

/// Fails with [`FieldError::EndDateInvalid`] iff `end <= start`.
///
/// Missing ends are left to `Required`. A present value that cannot be read as
/// a date fails with [`FieldError::InvalidDate`]; only the end side reports it,
/// the start field carries its own check.
pub fn validate_range(start: &Value, end: &Value) -> Result<(), FieldError> {
    let end = match end.instant() {
        None => return Ok(()),
        Some(Err(())) => return Err(FieldError::InvalidDate),
        Some(Ok(at)) => at,
    };
    let start = match start.instant() {
        None | Some(Err(())) => return Ok(()),
        Some(Ok(at)) => at,
    };
    if end <= start {
        return Err(FieldError::EndDateInvalid);
    }
    Ok(())
}

/// Reports a value on a date field that cannot be normalized.
pub(crate) fn check_date_value(value: &Value) -> Result<(), FieldError> {
    match value.instant() {
        Some(Err(())) => Err(FieldError::InvalidDate),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::parse_instant;

    fn day(raw: &str) -> Value {
        Value::Date(parse_instant(raw).unwrap())
    }

    #[test]
    fn same_day_is_invalid() {
        assert_eq!(
            validate_range(&day("2024-06-10"), &day("2024-06-10")),
            Err(FieldError::EndDateInvalid)
        );
    }

    #[test]
    fn next_day_is_valid() {
        assert!(validate_range(&day("2024-06-10"), &day("2024-06-11")).is_ok());
    }

    #[test]
    fn end_before_start_is_invalid() {
        assert_eq!(
            validate_range(&day("2024-06-11"), &day("2024-06-10")),
            Err(FieldError::EndDateInvalid)
        );
    }

    #[test]
    fn mixed_representations_are_normalized() {
        let start = Value::text("2024-06-10T12:00:00+02:00");
        let end = day("2024-06-10T10:00:00Z");
        assert_eq!(validate_range(&start, &end), Err(FieldError::EndDateInvalid));

        let end = Value::text("2024-06-10T10:00:01Z");
        assert!(validate_range(&start, &end).is_ok());
    }

    #[test]
    fn missing_side_is_skipped() {
        assert!(validate_range(&Value::Null, &day("2024-06-10")).is_ok());
        assert!(validate_range(&day("2024-06-10"), &Value::Null).is_ok());
    }

    #[test]
    fn garbage_end_reports_invalid_date() {
        assert_eq!(
            validate_range(&day("2024-06-10"), &Value::text("soon")),
            Err(FieldError::InvalidDate)
        );
    }
}
