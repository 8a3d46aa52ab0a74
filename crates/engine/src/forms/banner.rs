use api_types::reference::RefKey;

use crate::{
    FieldSpec, FormError, FormSpec, Rule,
    modes::{ModeRule, ModeSelector},
};

pub const RESOURCE: &str = "banners";

const URL_PATTERN: &str = r"https?://\S+";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionType {
    None,
    OpenUrl,
    OpenRestaurant,
    OpenProduct,
}

impl ActionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OpenUrl => "open_url",
            Self::OpenRestaurant => "open_restaurant",
            Self::OpenProduct => "open_product",
        }
    }
}

/// Home screen banner. `position` is the slot in the drag-drop ordering.
pub fn spec() -> Result<FormSpec, FormError> {
    let action = ModeSelector::new("actionType", ActionType::None.as_str())
        .mode(ModeRule::new(ActionType::None.as_str()))
        .mode(
            ModeRule::new(ActionType::OpenUrl.as_str())
                .owns("actionUrl", [Rule::Required, Rule::pattern(URL_PATTERN)?]),
        )
        .mode(
            ModeRule::new(ActionType::OpenRestaurant.as_str())
                .owns("restaurantId", [Rule::Required]),
        )
        .mode(
            ModeRule::new(ActionType::OpenProduct.as_str())
                .owns("restaurantId", [Rule::Required])
                .owns("productId", [Rule::Required]),
        );

    FormSpec::builder(RESOURCE)
        .field(FieldSpec::text("title").required().rule(Rule::MaxLength(60)))
        .field(
            FieldSpec::text("imageUrl")
                .required()
                .rule(Rule::pattern(URL_PATTERN)?),
        )
        .field(
            FieldSpec::number("position")
                .required()
                .rule(Rule::Min(0.0)),
        )
        .field(FieldSpec::text("actionType"))
        .field(FieldSpec::text("actionUrl"))
        .field(FieldSpec::text("restaurantId"))
        .field(FieldSpec::text("productId"))
        .field(FieldSpec::list("cityIds").required().options(RefKey::Cities))
        .field(FieldSpec::date("startDate").required())
        .field(FieldSpec::date("endDate"))
        .selector(action)
        .date_range("startDate", "endDate")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restaurant_is_shared_by_two_actions() {
        let spec = spec().unwrap();
        let selector = &spec.selectors()[0];
        assert!(selector.rule("open_restaurant").unwrap().is_owner("restaurantId"));
        assert!(selector.rule("open_product").unwrap().is_owner("restaurantId"));
        assert_eq!(selector.governed_fields(), vec!["actionUrl", "restaurantId", "productId"]);
    }
}
