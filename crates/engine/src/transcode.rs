//! Value Transcoder.
//!
//! Converts a numeric field between the user-facing representation (a
//! percentage typed as `15`) and the backend one (`0.15`), depending on the
//! mode active on a selector.
use crate::{Value, value::number_to_wire};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Codec {
    Identity,
    /// Wire value is the domain value with its decimal point moved this many
    /// places to the left (`Scale(2)`: `15` is sent as `0.15`).
    Scale(u32),
    /// The field has no numeric meaning in this mode; it is sent as `null`.
    Null,
}

impl Codec {
    pub const PERCENTAGE: Codec = Codec::Scale(2);

    pub fn encode(self, value: f64) -> Option<f64> {
        match self {
            Self::Identity => Some(value),
            Self::Scale(places) => Some(shift_point(value, -(places as i32))),
            Self::Null => None,
        }
    }

    /// `None` means the wire value carries nothing for this mode.
    pub fn decode(self, value: f64) -> Option<f64> {
        match self {
            Self::Identity => Some(value),
            Self::Scale(places) => Some(shift_point(value, places as i32)),
            Self::Null => None,
        }
    }
}

/// Moves the decimal point of `value` by `places` (positive is right) on its
/// shortest decimal form, so `0.15` becomes exactly `15` and back.
fn shift_point(value: f64, places: i32) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    // `Display` for f64 never uses an exponent
    let text = value.abs().to_string();
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let digits = format!("{int}{frac}");
    let point = int.len() as i32 + places;

    let shifted = if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point as usize >= digits.len() {
        format!("{digits}{}", "0".repeat(point as usize - digits.len()))
    } else {
        let (head, tail) = digits.split_at(point as usize);
        format!("{head}.{tail}")
    };

    shifted
        .parse::<f64>()
        .map(|magnitude| magnitude.copysign(value))
        .unwrap_or_else(|_| value * 10f64.powi(places))
}

/// Codecs for one numeric field, keyed by the modes of one selector.
///
/// Modes without an explicit codec use [`Codec::Identity`].
#[derive(Clone, Debug, PartialEq)]
pub struct TranscodeRule {
    pub field: String,
    pub selector: String,
    codecs: Vec<(String, Codec)>,
}

impl TranscodeRule {
    pub fn new(field: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            selector: selector.into(),
            codecs: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: impl Into<String>, codec: Codec) -> Self {
        self.codecs.push((mode.into(), codec));
        self
    }

    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.codecs.iter().map(|(mode, _)| mode.as_str())
    }

    pub fn codec(&self, mode: &str) -> Codec {
        self.codecs
            .iter()
            .find(|(m, _)| m == mode)
            .map(|(_, codec)| *codec)
            .unwrap_or(Codec::Identity)
    }

    /// Domain value to wire value, at submit time.
    pub fn encode(&self, mode: &str, value: &Value) -> serde_json::Value {
        let codec = self.codec(mode);
        match value {
            Value::Number(n) => codec
                .encode(*n)
                .map(number_to_wire)
                .unwrap_or(serde_json::Value::Null),
            _ if codec == Codec::Null => serde_json::Value::Null,
            other => other.to_wire(),
        }
    }

    /// Wire value to domain value, at edit-mode population time.
    pub fn decode(&self, mode: &str, value: &Value) -> Value {
        match value {
            Value::Number(n) => self
                .codec(mode)
                .decode(*n)
                .map(Value::Number)
                .unwrap_or(Value::Number(0.0)),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discount() -> TranscodeRule {
        TranscodeRule::new("discountValue", "discountType")
            .mode("percentage", Codec::PERCENTAGE)
            .mode("fixed_discount", Codec::Identity)
            .mode("free_shipping", Codec::Null)
    }

    #[test]
    fn percentage_is_divided_on_encode() {
        let rule = discount();
        assert_eq!(
            rule.encode("percentage", &Value::Number(15.0)),
            serde_json::json!(0.15)
        );
        assert_eq!(
            rule.decode("percentage", &Value::Number(0.5)),
            Value::Number(50.0)
        );
    }

    #[test]
    fn decode_absorbs_float_noise() {
        assert_eq!(Codec::PERCENTAGE.decode(0.15), Some(15.0));
        assert_eq!(Codec::PERCENTAGE.decode(0.07), Some(7.0));
        assert_eq!(Codec::PERCENTAGE.encode(7.0), Some(0.07));
    }

    #[test]
    fn long_fractions_keep_every_digit() {
        for shown in [33.3333333333, 12.3456789012, 99.99999999995, 100.0, 1.0] {
            let wire = Codec::PERCENTAGE.encode(shown).unwrap();
            assert_eq!(Codec::PERCENTAGE.decode(wire), Some(shown), "{shown} via {wire}");
        }
        assert_eq!(Codec::PERCENTAGE.encode(99.99999999995), Some(0.9999999999995));
    }

    #[test]
    fn shifting_handles_signs_and_magnitudes() {
        assert_eq!(shift_point(-12.5, -2), -0.125);
        assert_eq!(shift_point(0.0001, 2), 0.01);
        assert_eq!(shift_point(1234.0, -2), 12.34);
        assert_eq!(shift_point(0.5, 3), 500.0);
        assert_eq!(shift_point(0.0, 2), 0.0);
        assert!(shift_point(f64::NAN, 2).is_nan());
    }

    #[test]
    fn fixed_amount_is_identity() {
        let rule = discount();
        assert_eq!(
            rule.encode("fixed_discount", &Value::Number(4.5)),
            serde_json::json!(4.5)
        );
        assert_eq!(
            rule.decode("fixed_discount", &Value::Number(4.5)),
            Value::Number(4.5)
        );
    }

    #[test]
    fn modes_without_numeric_meaning_encode_null() {
        let rule = discount();
        assert_eq!(
            rule.encode("free_shipping", &Value::Number(10.0)),
            serde_json::Value::Null
        );
        assert_eq!(rule.encode("free_shipping", &Value::Null), serde_json::Value::Null);
    }

    #[test]
    fn unlisted_mode_falls_back_to_identity() {
        assert_eq!(discount().codec("product"), Codec::Identity);
    }
}
