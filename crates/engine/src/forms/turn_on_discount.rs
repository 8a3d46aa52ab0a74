use api_types::reference::RefKey;

use crate::{
    FieldSpec, FormError, FormSpec, Rule,
    modes::{ModeRule, ModeSelector},
    transcode::{Codec, TranscodeRule},
};

pub const RESOURCE: &str = "turn-on-discounts";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscountType {
    Percentage,
    FixedDiscount,
}

impl DiscountType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedDiscount => "fixed_discount",
        }
    }
}

/// Time-boxed discount a brand can switch on. Both modes share
/// `discountValue`, only the bounds and the wire unit change.
pub fn spec() -> Result<FormSpec, FormError> {
    let discount = ModeSelector::new("discountType", DiscountType::Percentage.as_str())
        .mode(ModeRule::new(DiscountType::Percentage.as_str()).owns(
            "discountValue",
            [Rule::Required, Rule::Min(1.0), Rule::Max(100.0)],
        ))
        .mode(
            ModeRule::new(DiscountType::FixedDiscount.as_str())
                .owns("discountValue", [Rule::Required, Rule::Min(1.0)]),
        );

    FormSpec::builder(RESOURCE)
        .field(FieldSpec::text("brandId").required().options(RefKey::Brands))
        .field(FieldSpec::text("discountType"))
        .field(FieldSpec::number("discountValue"))
        .field(FieldSpec::number("maxOrders").rule(Rule::Min(1.0)))
        .field(FieldSpec::date("startTime").required())
        .field(FieldSpec::date("endTime").required())
        .selector(discount)
        .transcode(
            TranscodeRule::new("discountValue", "discountType")
                .mode(DiscountType::Percentage.as_str(), Codec::PERCENTAGE),
        )
        .date_range("startTime", "endTime")
        .build()
}
