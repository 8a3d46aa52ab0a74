//! Field Validator Set.
//!
//! A [`Rule`] checks one field value. Every rule except [`Rule::Required`]
//! skips empty values, so optional fields only fail when something was typed.
use std::fmt;

use regex::Regex;

use crate::{FormError, Value};

/// Anchored regular expression used by [`Rule::Pattern`].
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` anchored at both ends.
    pub fn new(source: &str) -> Result<Self, FormError> {
        let regex = Regex::new(&format!("^(?:{source})$"))
            .map_err(|err| FormError::Configuration(format!("invalid pattern {source:?}: {err}")))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    Required,
    Min(f64),
    Max(f64),
    MinLength(usize),
    MaxLength(usize),
    Pattern(Pattern),
    /// Every value must be one of the ids loaded from the field's option source.
    InOptions,
}

impl Rule {
    pub fn pattern(source: &str) -> Result<Self, FormError> {
        Pattern::new(source).map(Self::Pattern)
    }

    /// Checks `value`. `options` are the loaded option ids, if any.
    pub fn check(&self, value: &Value, options: Option<&[String]>) -> Result<(), FieldError> {
        if let Self::Required = self {
            return if value.is_empty() {
                Err(FieldError::Required)
            } else {
                Ok(())
            };
        }
        if value.is_empty() {
            return Ok(());
        }

        match self {
            Self::Required => Ok(()),
            Self::Min(min) => match value.as_number() {
                Some(actual) if actual < *min => Err(FieldError::Min { min: *min, actual }),
                _ => Ok(()),
            },
            Self::Max(max) => match value.as_number() {
                Some(actual) if actual > *max => Err(FieldError::Max { max: *max, actual }),
                _ => Ok(()),
            },
            Self::MinLength(min) => match length(value) {
                Some(actual) if actual < *min => Err(FieldError::MinLength { min: *min, actual }),
                _ => Ok(()),
            },
            Self::MaxLength(max) => match length(value) {
                Some(actual) if actual > *max => Err(FieldError::MaxLength { max: *max, actual }),
                _ => Ok(()),
            },
            Self::Pattern(pattern) => match value {
                Value::Text(s) if !pattern.is_match(s) => Err(FieldError::Pattern {
                    pattern: pattern.source().to_string(),
                }),
                _ => Ok(()),
            },
            Self::InOptions => {
                // Not loaded yet: nothing to check against.
                let Some(options) = options else {
                    return Ok(());
                };
                let unknown = match value {
                    Value::Text(s) => (!options.contains(s)).then(|| s.clone()),
                    Value::List(items) => items.iter().find(|item| !options.contains(item)).cloned(),
                    _ => None,
                };
                match unknown {
                    Some(value) => Err(FieldError::UnknownOption(value)),
                    None => Ok(()),
                }
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("required"),
            Self::Min(min) => write!(f, "min({min})"),
            Self::Max(max) => write!(f, "max({max})"),
            Self::MinLength(min) => write!(f, "minlength({min})"),
            Self::MaxLength(max) => write!(f, "maxlength({max})"),
            Self::Pattern(p) => write!(f, "pattern({})", p.source()),
            Self::InOptions => f.write_str("in_options"),
        }
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::Text(s) => Some(s.chars().count()),
        Value::List(items) => Some(items.len()),
        _ => None,
    }
}

/// A single failed check on a field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldError {
    Required,
    Min { min: f64, actual: f64 },
    Max { max: f64, actual: f64 },
    MinLength { min: usize, actual: usize },
    MaxLength { max: usize, actual: usize },
    Pattern { pattern: String },
    UnknownOption(String),
    /// The end of a date range is not strictly after its start.
    EndDateInvalid,
    InvalidDate,
}

impl FieldError {
    /// Stable key, as rendered next to the field.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Min { .. } => "min",
            Self::Max { .. } => "max",
            Self::MinLength { .. } => "minlength",
            Self::MaxLength { .. } => "maxlength",
            Self::Pattern { .. } => "pattern",
            Self::UnknownOption(_) => "option",
            Self::EndDateInvalid => "endDateInvalid",
            Self::InvalidDate => "invalidDate",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("is required"),
            Self::Min { min, actual } => write!(f, "must be at least {min} (got {actual})"),
            Self::Max { max, actual } => write!(f, "must be at most {max} (got {actual})"),
            Self::MinLength { min, actual } => {
                write!(f, "must have at least {min} characters/items (got {actual})")
            }
            Self::MaxLength { max, actual } => {
                write!(f, "must have at most {max} characters/items (got {actual})")
            }
            Self::Pattern { pattern } => write!(f, "must match {pattern}"),
            Self::UnknownOption(value) => write!(f, "unknown option {value:?}"),
            Self::EndDateInvalid => f.write_str("must be after the start date"),
            Self::InvalidDate => f.write_str("is not a valid date"),
        }
    }
}

/// Errors of every invalid field, in form order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    pub fields: Vec<(String, Vec<FieldError>)>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn errors_for(&self, field: &str) -> &[FieldError] {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, errors)| errors.as_slice())
            .unwrap_or(&[])
    }

    pub fn has(&self, field: &str, key: &str) -> bool {
        self.errors_for(field).iter().any(|err| err.key() == key)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, errors) in &self.fields {
            for err in errors {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{field} {err}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_and_null() {
        assert_eq!(Rule::Required.check(&Value::Null, None), Err(FieldError::Required));
        assert_eq!(Rule::Required.check(&Value::text(" "), None), Err(FieldError::Required));
        assert!(Rule::Required.check(&Value::Number(0.0), None).is_ok());
    }

    #[test]
    fn bounds_skip_empty_values() {
        assert!(Rule::Min(1.0).check(&Value::Null, None).is_ok());
        assert!(Rule::MinLength(3).check(&Value::text(""), None).is_ok());
        assert_eq!(
            Rule::Max(100.0).check(&Value::Number(101.0), None),
            Err(FieldError::Max {
                max: 100.0,
                actual: 101.0
            })
        );
        assert_eq!(Rule::Min(1.0).check(&Value::Number(0.0), None).unwrap_err().key(), "min");
    }

    #[test]
    fn pattern_is_anchored() {
        let rule = Rule::pattern("[A-Z]{3}").unwrap();
        assert!(rule.check(&Value::text("ABC"), None).is_ok());
        assert_eq!(rule.check(&Value::text("xABCx"), None).unwrap_err().key(), "pattern");
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        assert!(matches!(Rule::pattern("(["), Err(FormError::Configuration(_))));
    }

    #[test]
    fn in_options_checks_each_list_item() {
        let options = vec!["b1".to_string(), "b2".to_string()];
        assert!(Rule::InOptions.check(&Value::list(["b1", "b2"]), Some(&options)).is_ok());
        assert_eq!(
            Rule::InOptions.check(&Value::list(["b1", "b9"]), Some(&options)),
            Err(FieldError::UnknownOption("b9".to_string()))
        );
        assert!(Rule::InOptions.check(&Value::list(["b9"]), None).is_ok());
    }

    #[test]
    fn report_renders_every_error() {
        let report = ValidationReport {
            fields: vec![
                ("code".to_string(), vec![FieldError::Required]),
                ("endDate".to_string(), vec![FieldError::EndDateInvalid]),
            ],
        };
        assert!(report.has("endDate", "endDateInvalid"));
        assert_eq!(
            report.to_string(),
            "code is required; endDate must be after the start date"
        );
    }
}
