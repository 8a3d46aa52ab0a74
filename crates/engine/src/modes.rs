//! Mode selectors and the dependent field groups they drive.
use serde::{Deserialize, Serialize};

use crate::Rule;

/// What happens to the value of a field when the active mode stops owning it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPolicy {
    /// Reset to the kind's safe default; switching back starts from scratch.
    #[default]
    Clear,
    /// Reset to the safe default, but remember the last value and put it back
    /// when any mode owning the field is selected.
    Restore,
}

/// Fields a single mode owns, with the extra rules each gets while the mode
/// is active.
#[derive(Clone, Debug, PartialEq)]
pub struct ModeRule {
    pub mode: String,
    owned: Vec<(String, Vec<Rule>)>,
}

impl ModeRule {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            owned: Vec::new(),
        }
    }

    /// Marks `field` as relevant in this mode, attaching `rules`.
    pub fn owns(mut self, field: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.owned.push((field.into(), rules.into_iter().collect()));
        self
    }

    pub fn owned_fields(&self) -> impl Iterator<Item = &str> {
        self.owned.iter().map(|(field, _)| field.as_str())
    }

    pub fn is_owner(&self, field: &str) -> bool {
        self.owned.iter().any(|(f, _)| f == field)
    }

    pub fn rules_for(&self, field: &str) -> &[Rule] {
        self.owned
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, rules)| rules.as_slice())
            .unwrap_or(&[])
    }
}

/// A text field whose value picks which dependent fields are relevant.
#[derive(Clone, Debug, PartialEq)]
pub struct ModeSelector {
    pub field: String,
    pub default_mode: String,
    rules: Vec<ModeRule>,
}

impl ModeSelector {
    pub fn new(field: impl Into<String>, default_mode: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            default_mode: default_mode.into(),
            rules: Vec::new(),
        }
    }

    pub fn mode(mut self, rule: ModeRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.mode.as_str())
    }

    pub fn rules(&self) -> &[ModeRule] {
        &self.rules
    }

    pub fn rule(&self, mode: &str) -> Option<&ModeRule> {
        self.rules.iter().find(|rule| rule.mode == mode)
    }

    pub fn is_known(&self, mode: &str) -> bool {
        self.rule(mode).is_some()
    }

    /// Returns `true` if any mode of this selector owns `field`.
    pub fn governs(&self, field: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_owner(field))
    }

    /// Returns every field governed by this selector, deduplicated, in
    /// declaration order.
    pub fn governed_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for field in self.rules.iter().flat_map(ModeRule::owned_fields) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward() -> ModeSelector {
        ModeSelector::new("rewardType", "free_product")
            .mode(ModeRule::new("free_product").owns("productToReward", [Rule::Required]))
            .mode(ModeRule::new("shipping_discount").owns(
                "deliveryCharge",
                [Rule::Required, Rule::Min(0.0)],
            ))
            .mode(ModeRule::new("nothing"))
    }

    #[test]
    fn governed_fields_are_collected_once() {
        let selector = ModeSelector::new("t", "a")
            .mode(ModeRule::new("a").owns("x", []).owns("y", []))
            .mode(ModeRule::new("b").owns("y", []).owns("z", []));
        assert_eq!(selector.governed_fields(), vec!["x", "y", "z"]);
    }

    #[test]
    fn rules_are_looked_up_per_mode() {
        let selector = reward();
        let rule = selector.rule("shipping_discount").unwrap();
        assert_eq!(rule.rules_for("deliveryCharge").len(), 2);
        assert!(rule.rules_for("productToReward").is_empty());
        assert!(selector.governs("productToReward"));
        assert!(!selector.is_known("coupon"));
    }
}
