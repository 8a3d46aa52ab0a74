use crate::{FieldError, Rule, Value};

/// Runtime state of one field during an editing session.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldState {
    pub name: String,
    value: Value,
    initial: Value,
    active: Vec<Rule>,
    touched: bool,
    enabled: bool,
    errors: Vec<FieldError>,
    options: Option<Vec<String>>,
}

impl FieldState {
    pub(crate) fn new(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            initial: value.clone(),
            value,
            active: Vec::new(),
            touched: false,
            enabled: true,
            errors: Vec::new(),
            options: None,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn active_rules(&self) -> &[Rule] {
        &self.active
    }

    pub fn is_required(&self) -> bool {
        self.active.contains(&Rule::Required)
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Differs from the value the session started with.
    pub fn is_dirty(&self) -> bool {
        self.value != self.initial
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Sets the value and makes it the baseline for dirty tracking.
    pub(crate) fn seed(&mut self, value: Value) {
        self.initial = value.clone();
        self.value = value;
    }

    pub(crate) fn initial(&self) -> &Value {
        &self.initial
    }

    /// Replaces the active rule set wholesale.
    pub(crate) fn set_rules(&mut self, rules: Vec<Rule>) {
        self.active = rules;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_options(&mut self, options: Vec<String>) {
        self.options = Some(options);
    }

    pub(crate) fn touch(&mut self) {
        self.touched = true;
    }

    pub(crate) fn untouch(&mut self) {
        self.touched = false;
    }

    /// Runs the active rules; `extra` holds cross-field failures computed by
    /// the caller. Disabled fields never carry errors.
    pub(crate) fn revalidate(&mut self, extra: Vec<FieldError>) {
        self.errors.clear();
        if !self.enabled {
            return;
        }
        let options = self.options.as_deref();
        for rule in &self.active {
            if let Err(err) = rule.check(&self.value, options) {
                self.errors.push(err);
            }
        }
        self.errors.extend(extra);
    }
}
