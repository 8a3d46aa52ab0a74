use std::str::FromStr;

use api_types::reference::RefKey;

use crate::{
    FieldSpec, FormError, FormSpec, Rule,
    modes::{ModeRule, ModeSelector},
    transcode::{Codec, TranscodeRule},
};

pub const RESOURCE: &str = "promo-codes";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscountType {
    Percentage,
    FixedDiscount,
    FreeShipping,
    Product,
}

impl DiscountType {
    pub const ALL: [DiscountType; 4] = [
        Self::Percentage,
        Self::FixedDiscount,
        Self::FreeShipping,
        Self::Product,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedDiscount => "fixed_discount",
            Self::FreeShipping => "free_shipping",
            Self::Product => "product",
        }
    }
}

impl FromStr for DiscountType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FormError::Configuration(format!("unknown discount type {s:?}")))
    }
}

/// Promo code creation/edit form.
///
/// `discountValue` is typed as a percentage (1-100) or an amount depending on
/// `discountType`, and is not sent at all for free shipping or product codes.
pub fn spec() -> Result<FormSpec, FormError> {
    let discount = ModeSelector::new("discountType", DiscountType::Percentage.as_str())
        .mode(
            ModeRule::new(DiscountType::Percentage.as_str())
                .owns(
                    "discountValue",
                    [Rule::Required, Rule::Min(1.0), Rule::Max(100.0)],
                )
                .owns("maxDiscount", [Rule::Min(0.0)]),
        )
        .mode(
            ModeRule::new(DiscountType::FixedDiscount.as_str())
                .owns("discountValue", [Rule::Required, Rule::Min(1.0)]),
        )
        .mode(ModeRule::new(DiscountType::FreeShipping.as_str()))
        .mode(ModeRule::new(DiscountType::Product.as_str()).owns("productId", [Rule::Required]));

    FormSpec::builder(RESOURCE)
        .field(
            FieldSpec::text("code")
                .required()
                .rule(Rule::pattern("[A-Z0-9_-]{3,20}")?),
        )
        .field(FieldSpec::text("description").rule(Rule::MaxLength(280)))
        .field(FieldSpec::text("discountType"))
        .field(FieldSpec::number("discountValue"))
        .field(FieldSpec::number("maxDiscount"))
        .field(FieldSpec::text("productId"))
        .field(FieldSpec::number("minimumOrder").rule(Rule::Min(0.0)))
        .field(
            FieldSpec::number("usageLimit")
                .required()
                .rule(Rule::Min(1.0)),
        )
        .field(FieldSpec::list("brandIds").required().options(RefKey::Brands))
        .field(FieldSpec::date("startDate").required())
        .field(FieldSpec::date("endDate").required())
        .selector(discount)
        .transcode(
            TranscodeRule::new("discountValue", "discountType")
                .mode(DiscountType::Percentage.as_str(), Codec::PERCENTAGE)
                .mode(DiscountType::FixedDiscount.as_str(), Codec::Identity)
                .mode(DiscountType::FreeShipping.as_str(), Codec::Null)
                .mode(DiscountType::Product.as_str(), Codec::Null),
        )
        .date_range("startDate", "endDate")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_builds() {
        let spec = spec().unwrap();
        assert_eq!(spec.resource, RESOURCE);
        assert!(spec.is_selector("discountType"));
    }

    #[test]
    fn discount_type_round_trips_through_str() {
        for t in DiscountType::ALL {
            assert_eq!(t.as_str().parse::<DiscountType>().unwrap(), t);
        }
        assert!("coupon".parse::<DiscountType>().is_err());
    }
}
