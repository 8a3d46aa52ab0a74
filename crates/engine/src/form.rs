//! Static form definitions.
//!
//! A [`FormSpec`] is built once per page type and never mutated. Building it
//! checks that the selectors, transcoders and date pairs agree with the
//! declared fields.
use std::collections::HashSet;

use api_types::reference::RefKey;

use crate::{
    FormError, Rule, Value,
    dates::DateRangePair,
    modes::{ModeRule, ModeSelector},
    transcode::TranscodeRule,
    value::FieldKind,
};

type ResultForm<T> = Result<T, FormError>;

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Always-on rules, whatever the active modes.
    pub base: Vec<Rule>,
    pub default: Option<Value>,
    /// Reference list the field's values must come from.
    pub options: Option<RefKey>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base: Vec::new(),
            default: None,
            options: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::List)
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.base.push(rule);
        self
    }

    pub fn required(self) -> Self {
        self.rule(Rule::Required)
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Restricts values to the ids of a reference list.
    pub fn options(mut self, key: RefKey) -> Self {
        self.options = Some(key);
        self.base.push(Rule::InOptions);
        self
    }

    pub fn is_always_required(&self) -> bool {
        self.base.contains(&Rule::Required)
    }

    pub fn initial_value(&self) -> Value {
        self.default.clone().unwrap_or_else(|| self.kind.safe_default())
    }
}

#[derive(Clone, Debug)]
pub struct FormSpec {
    /// Backend resource path, e.g. `promo-codes`.
    pub resource: String,
    fields: Vec<FieldSpec>,
    selectors: Vec<ModeSelector>,
    transcoders: Vec<TranscodeRule>,
    date_ranges: Vec<DateRangePair>,
}

impl FormSpec {
    pub fn builder(resource: impl Into<String>) -> FormSpecBuilder {
        FormSpecBuilder {
            resource: resource.into(),
            fields: Vec::new(),
            selectors: Vec::new(),
            transcoders: Vec::new(),
            date_ranges: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn selectors(&self) -> &[ModeSelector] {
        &self.selectors
    }

    pub fn transcoders(&self) -> &[TranscodeRule] {
        &self.transcoders
    }

    pub fn date_ranges(&self) -> &[DateRangePair] {
        &self.date_ranges
    }

    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == field)
    }

    pub fn field(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == field)
    }

    pub fn selector_index(&self, selector: &str) -> Option<usize> {
        self.selectors.iter().position(|s| s.field == selector)
    }

    pub fn is_selector(&self, field: &str) -> bool {
        self.selector_index(field).is_some()
    }

    /// Index of the selector governing `field`, if any.
    pub fn governing_selector(&self, field: &str) -> Option<usize> {
        self.selectors.iter().position(|s| s.governs(field))
    }

    pub fn transcoder_for(&self, field: &str) -> Option<&TranscodeRule> {
        self.transcoders.iter().find(|t| t.field == field)
    }

    /// Rules active on `field` for the given modes (one per selector, in
    /// selector order).
    ///
    /// Recomputed from scratch on every call, so nothing a previous mode
    /// attached can linger.
    pub fn active_rules(&self, field: &str, modes: &[String]) -> Vec<Rule> {
        let mut rules = self
            .field(field)
            .map(|spec| spec.base.clone())
            .unwrap_or_default();
        for (selector, mode) in self.selectors.iter().zip(modes) {
            if let Some(rule) = selector.rule(mode) {
                rules.extend(rule.rules_for(field).iter().cloned());
            }
        }
        rules
    }

    /// A field is relevant unless a selector governs it and the selector's
    /// active mode does not own it.
    pub fn is_relevant(&self, field: &str, modes: &[String]) -> bool {
        match self.governing_selector(field) {
            None => true,
            Some(idx) => modes
                .get(idx)
                .and_then(|mode| self.selectors[idx].rule(mode))
                .is_some_and(|rule| rule.is_owner(field)),
        }
    }

    pub fn default_modes(&self) -> Vec<String> {
        self.selectors
            .iter()
            .map(|s| s.default_mode.clone())
            .collect()
    }
}

pub struct FormSpecBuilder {
    resource: String,
    fields: Vec<FieldSpec>,
    selectors: Vec<ModeSelector>,
    transcoders: Vec<TranscodeRule>,
    date_ranges: Vec<DateRangePair>,
}

impl FormSpecBuilder {
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares `selector.field` as a mode selector. The field itself must be
    /// declared with [`FormSpecBuilder::field`] as text.
    pub fn selector(mut self, selector: ModeSelector) -> Self {
        self.selectors.push(selector);
        self
    }

    pub fn transcode(mut self, rule: TranscodeRule) -> Self {
        self.transcoders.push(rule);
        self
    }

    pub fn date_range(mut self, start: &str, end: &str) -> Self {
        self.date_ranges.push(DateRangePair::new(start, end));
        self
    }

    pub fn build(self) -> ResultForm<FormSpec> {
        let spec = FormSpec {
            resource: self.resource,
            fields: self.fields,
            selectors: self.selectors,
            transcoders: self.transcoders,
            date_ranges: self.date_ranges,
        };
        check_fields(&spec)?;
        check_selectors(&spec)?;
        check_transcoders(&spec)?;
        check_date_ranges(&spec)?;
        Ok(spec)
    }
}

fn config_err(msg: String) -> FormError {
    FormError::Configuration(msg)
}

fn check_fields(spec: &FormSpec) -> ResultForm<()> {
    let mut seen = HashSet::new();
    for field in &spec.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(config_err(format!("duplicated field {}", field.name)));
        }
    }
    Ok(())
}

fn check_selectors(spec: &FormSpec) -> ResultForm<()> {
    for (idx, selector) in spec.selectors.iter().enumerate() {
        let field = spec
            .field(&selector.field)
            .ok_or_else(|| config_err(format!("selector {} is not a field", selector.field)))?;
        if field.kind != FieldKind::Text {
            return Err(config_err(format!(
                "selector {} must be a text field",
                selector.field
            )));
        }
        if selector.rules().is_empty() {
            return Err(config_err(format!("selector {} has no modes", selector.field)));
        }
        if !selector.is_known(&selector.default_mode) {
            return Err(config_err(format!(
                "selector {} default mode {} is not one of its modes",
                selector.field, selector.default_mode
            )));
        }

        let mut modes = HashSet::new();
        for rule in selector.rules() {
            if !modes.insert(rule.mode.as_str()) {
                return Err(config_err(format!(
                    "selector {} declares mode {} twice",
                    selector.field, rule.mode
                )));
            }
            check_mode_rule(spec, idx, selector, rule)?;
        }
    }
    Ok(())
}

fn check_mode_rule(
    spec: &FormSpec,
    idx: usize,
    selector: &ModeSelector,
    rule: &ModeRule,
) -> ResultForm<()> {
    for owned in rule.owned_fields() {
        let field = spec.field(owned).ok_or_else(|| {
            config_err(format!("mode {} owns unknown field {owned}", rule.mode))
        })?;
        if spec.is_selector(owned) {
            return Err(config_err(format!(
                "mode {} cannot own selector field {owned}",
                rule.mode
            )));
        }
        if let Some(other) = spec.governing_selector(owned)
            && other != idx
        {
            return Err(config_err(format!(
                "field {owned} is governed by both {} and {}",
                spec.selectors[other].field, selector.field
            )));
        }
        // An always-required field must never be cleared by a mode switch.
        if field.is_always_required() {
            if let Some(clearing) = selector.rules().iter().find(|r| !r.is_owner(owned)) {
                return Err(config_err(format!(
                    "field {owned} is always required but mode {} of {} clears it",
                    clearing.mode, selector.field
                )));
            }
        }
    }
    Ok(())
}

fn check_transcoders(spec: &FormSpec) -> ResultForm<()> {
    for rule in &spec.transcoders {
        let field = spec
            .field(&rule.field)
            .ok_or_else(|| config_err(format!("transcoder targets unknown field {}", rule.field)))?;
        if field.kind != FieldKind::Number {
            return Err(config_err(format!(
                "transcoder target {} must be a number field",
                rule.field
            )));
        }
        let selector = spec
            .selector_index(&rule.selector)
            .map(|idx| &spec.selectors[idx])
            .ok_or_else(|| config_err(format!("transcoder selector {} is unknown", rule.selector)))?;
        if let Some(mode) = rule.modes().find(|mode| !selector.is_known(mode)) {
            return Err(config_err(format!(
                "transcoder for {} names unknown mode {mode}",
                rule.field
            )));
        }
    }
    Ok(())
}

fn check_date_ranges(spec: &FormSpec) -> ResultForm<()> {
    for pair in &spec.date_ranges {
        for name in [&pair.start, &pair.end] {
            let field = spec
                .field(name)
                .ok_or_else(|| config_err(format!("date range names unknown field {name}")))?;
            if !matches!(field.kind, FieldKind::Date | FieldKind::Text) {
                return Err(config_err(format!("date range field {name} must hold a date")));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcode::Codec;

    fn base() -> FormSpecBuilder {
        FormSpec::builder("things")
            .field(FieldSpec::text("kind"))
            .field(FieldSpec::number("amount"))
            .field(FieldSpec::text("label").required())
    }

    fn selector() -> ModeSelector {
        ModeSelector::new("kind", "a")
            .mode(ModeRule::new("a").owns("amount", [Rule::Required, Rule::Max(100.0)]))
            .mode(ModeRule::new("b"))
    }

    #[test]
    fn active_rules_are_base_plus_current_mode() {
        let spec = base()
            .field(FieldSpec::number("extra").rule(Rule::Min(0.0)))
            .selector(selector())
            .build()
            .unwrap();
        let a = vec!["a".to_string()];
        let b = vec!["b".to_string()];
        assert_eq!(spec.active_rules("amount", &a).len(), 2);
        assert!(spec.active_rules("amount", &b).is_empty());
        assert_eq!(spec.active_rules("extra", &b), vec![Rule::Min(0.0)]);
        assert!(spec.is_relevant("amount", &a));
        assert!(!spec.is_relevant("amount", &b));
        assert!(spec.is_relevant("label", &b));
    }

    #[test]
    fn duplicated_fields_are_rejected() {
        let err = base().field(FieldSpec::text("label")).build().unwrap_err();
        assert!(matches!(err, FormError::Configuration(_)));
    }

    #[test]
    fn unknown_default_mode_is_rejected() {
        let err = base()
            .selector(ModeSelector::new("kind", "z").mode(ModeRule::new("a")))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::Configuration(_)));
    }

    #[test]
    fn always_required_field_cannot_be_cleared_by_a_mode() {
        let err = base()
            .selector(
                ModeSelector::new("kind", "a")
                    .mode(ModeRule::new("a").owns("label", []))
                    .mode(ModeRule::new("b")),
            )
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("always required"));
    }

    #[test]
    fn always_required_field_owned_by_every_mode_is_fine() {
        let spec = base()
            .selector(
                ModeSelector::new("kind", "a")
                    .mode(ModeRule::new("a").owns("label", [Rule::MaxLength(3)]))
                    .mode(ModeRule::new("b").owns("label", [])),
            )
            .build();
        assert!(spec.is_ok());
    }

    #[test]
    fn field_governed_by_two_selectors_is_rejected() {
        let err = base()
            .field(FieldSpec::text("other"))
            .selector(selector())
            .selector(ModeSelector::new("other", "x").mode(ModeRule::new("x").owns("amount", [])))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("governed by both"));
    }

    #[test]
    fn transcoder_must_target_known_modes_and_numbers() {
        let err = base()
            .selector(selector())
            .transcode(TranscodeRule::new("amount", "kind").mode("c", Codec::Null))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::Configuration(_)));

        let err = base()
            .selector(selector())
            .transcode(TranscodeRule::new("label", "kind"))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::Configuration(_)));
    }

    #[test]
    fn selector_must_be_a_text_field() {
        let err = base()
            .selector(ModeSelector::new("amount", "a").mode(ModeRule::new("a")))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::Configuration(_)));
    }
}
