use api_types::reference::RefKey;

use crate::{
    FieldSpec, FormError, FormSpec, Rule,
    modes::{ModeRule, ModeSelector},
    transcode::{Codec, TranscodeRule},
};

pub const RESOURCE: &str = "campaigns";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerType {
    FirstOrder,
    OrderCount,
    MinimumSpend,
}

impl TriggerType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstOrder => "first_order",
            Self::OrderCount => "order_count",
            Self::MinimumSpend => "minimum_spend",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RewardType {
    FreeProduct,
    ShippingDiscount,
    PercentageDiscount,
}

impl RewardType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FreeProduct => "free_product",
            Self::ShippingDiscount => "shipping_discount",
            Self::PercentageDiscount => "percentage_discount",
        }
    }
}

/// In-app campaign: what triggers it and what the customer gets.
pub fn spec() -> Result<FormSpec, FormError> {
    let trigger = ModeSelector::new("triggerType", TriggerType::FirstOrder.as_str())
        .mode(ModeRule::new(TriggerType::FirstOrder.as_str()))
        .mode(
            ModeRule::new(TriggerType::OrderCount.as_str())
                .owns("orderCount", [Rule::Required, Rule::Min(1.0)]),
        )
        .mode(
            ModeRule::new(TriggerType::MinimumSpend.as_str())
                .owns("minimumSpend", [Rule::Required, Rule::Min(1.0)]),
        );

    let reward = ModeSelector::new("rewardType", RewardType::FreeProduct.as_str())
        .mode(
            ModeRule::new(RewardType::FreeProduct.as_str())
                .owns("productToReward", [Rule::Required])
                .owns("productQuantity", [Rule::Required, Rule::Min(1.0)]),
        )
        .mode(
            ModeRule::new(RewardType::ShippingDiscount.as_str())
                .owns("deliveryCharge", [Rule::Required, Rule::Min(0.0)]),
        )
        .mode(
            ModeRule::new(RewardType::PercentageDiscount.as_str()).owns(
                "discountPercentage",
                [Rule::Required, Rule::Min(1.0), Rule::Max(100.0)],
            ),
        );

    FormSpec::builder(RESOURCE)
        .field(
            FieldSpec::text("name")
                .required()
                .rule(Rule::MaxLength(80)),
        )
        .field(FieldSpec::text("triggerType"))
        .field(FieldSpec::number("orderCount"))
        .field(FieldSpec::number("minimumSpend"))
        .field(FieldSpec::text("rewardType"))
        .field(FieldSpec::text("productToReward"))
        .field(FieldSpec::number("productQuantity").default_value(crate::Value::Number(1.0)))
        .field(FieldSpec::number("deliveryCharge"))
        .field(FieldSpec::number("discountPercentage"))
        .field(FieldSpec::list("channelIds").options(RefKey::Channels))
        .field(FieldSpec::boolean("active").default_value(crate::Value::Bool(true)))
        .field(FieldSpec::date("startDate").required())
        .field(FieldSpec::date("endDate").required())
        .selector(trigger)
        .selector(reward)
        .transcode(
            TranscodeRule::new("discountPercentage", "rewardType")
                .mode(RewardType::PercentageDiscount.as_str(), Codec::PERCENTAGE)
                .mode(RewardType::FreeProduct.as_str(), Codec::Null)
                .mode(RewardType::ShippingDiscount.as_str(), Codec::Null),
        )
        .date_range("startDate", "endDate")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_selectors_govern_disjoint_fields() {
        let spec = spec().unwrap();
        assert_eq!(spec.governing_selector("orderCount"), spec.selector_index("triggerType"));
        assert_eq!(spec.governing_selector("deliveryCharge"), spec.selector_index("rewardType"));
        assert_eq!(spec.governing_selector("name"), None);
    }
}
