//! Form Lifecycle Controller.
//!
//! Owns the [`FieldState`]s of one editing session and keeps them consistent
//! with the active modes, from initialization (defaults or a loaded entity)
//! through submission.
use std::{collections::HashMap, fmt, sync::Arc};

use api_types::entity::{Entity, Payload};
use uuid::Uuid;

use crate::{
    FieldError, FormError, FormSpec, ServiceError, ValidationReport, Value,
    dates::{check_date_value, validate_range},
    modes::SwitchPolicy,
    reference::{ReferenceCache, ReferenceLoader},
    service::EntityService,
    state::FieldState,
    value::FieldKind,
};

type ResultForm<T> = Result<T, FormError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Uninitialized,
    Ready,
    /// A write is in flight; the form is locked until it completes.
    Submitting,
    SubmittedOk,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Submitting => "submitting",
            Self::SubmittedOk => "submitted",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Create,
    Edit { id: String },
}

/// Everything the write collaborator needs for one submit.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitRequest {
    pub target: Target,
    pub payload: Payload,
    pub idempotency_key: Uuid,
}

#[derive(Debug)]
pub struct FormController {
    spec: Arc<FormSpec>,
    fields: Vec<FieldState>,
    /// Active mode of each selector, in selector order.
    modes: Vec<String>,
    phase: Phase,
    target: Target,
    policy: SwitchPolicy,
    /// Values cleared by a mode switch, keyed by field.
    stash: HashMap<String, Value>,
    /// Key and payload of the last write that did not succeed. A retry with
    /// the same payload reuses the key.
    pending: Option<(Uuid, Payload)>,
    last_error: Option<ServiceError>,
}

impl FormController {
    pub fn new(spec: Arc<FormSpec>) -> Self {
        let fields = spec
            .fields()
            .iter()
            .map(|field| FieldState::new(&field.name, field.initial_value()))
            .collect();
        let modes = spec.default_modes();
        Self {
            spec,
            fields,
            modes,
            phase: Phase::Uninitialized,
            target: Target::Create,
            policy: SwitchPolicy::default(),
            stash: HashMap::new(),
            pending: None,
            last_error: None,
        }
    }

    pub fn with_policy(mut self, policy: SwitchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn fields(&self) -> &[FieldState] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.field(name).map(FieldState::value)
    }

    /// Active mode of `selector`.
    pub fn mode(&self, selector: &str) -> Option<&str> {
        self.spec
            .selector_index(selector)
            .map(|idx| self.modes[idx].as_str())
    }

    /// Last write failure, kept until the next successful submit.
    pub fn last_error(&self) -> Option<&ServiceError> {
        self.last_error.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(FieldState::is_valid)
    }

    /// Current errors of every invalid field.
    pub fn report(&self) -> ValidationReport {
        ValidationReport {
            fields: self
                .fields
                .iter()
                .filter(|f| !f.is_valid())
                .map(|f| (f.name.clone(), f.errors().to_vec()))
                .collect(),
        }
    }

    fn index(&self, name: &str) -> ResultForm<usize> {
        self.spec
            .index_of(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    fn ensure_editable(&self) -> ResultForm<()> {
        match self.phase {
            Phase::Ready => Ok(()),
            Phase::Submitting => Err(FormError::Locked),
            other => Err(FormError::NotReady(other)),
        }
    }

    /// Initializes a create session with defaults and the default modes.
    pub fn init_create(&mut self) -> ResultForm<()> {
        if self.phase != Phase::Uninitialized {
            return Err(FormError::NotReady(self.phase));
        }
        let spec = Arc::clone(&self.spec);
        let modes = spec.default_modes();
        let values = spec.fields().iter().map(|f| f.initial_value()).collect();
        self.seed(values, modes);
        self.target = Target::Create;
        self.phase = Phase::Ready;
        tracing::debug!("{} form ready for create", spec.resource);
        Ok(())
    }

    /// Initializes an edit session from a loaded entity.
    ///
    /// Selector values must belong to their enumerated set; numeric fields are
    /// decoded with the codec of the entity's own mode. On error nothing is
    /// modified and the form stays uninitialized.
    pub fn init_edit(&mut self, entity: &Entity) -> ResultForm<()> {
        if self.phase != Phase::Uninitialized {
            return Err(FormError::NotReady(self.phase));
        }
        let spec = Arc::clone(&self.spec);

        let mut modes = Vec::with_capacity(spec.selectors().len());
        for selector in spec.selectors() {
            let mode = entity
                .field(&selector.field)
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| {
                    FormError::Configuration(format!(
                        "entity {} has no value for selector {}",
                        entity.id, selector.field
                    ))
                })?;
            if !selector.is_known(mode) {
                return Err(FormError::Configuration(format!(
                    "entity {} has unknown {} {mode:?}",
                    entity.id, selector.field
                )));
            }
            modes.push(mode.to_string());
        }

        let mut values = Vec::with_capacity(spec.fields().len());
        for field in spec.fields() {
            let value = match entity.field(&field.name) {
                None => field.initial_value(),
                Some(wire) => Value::from_wire(&field.name, field.kind, wire)?,
            };
            let value = match spec.transcoder_for(&field.name) {
                Some(rule) => {
                    let mode = spec
                        .selector_index(&rule.selector)
                        .map(|idx| modes[idx].as_str())
                        .unwrap_or_default();
                    rule.decode(mode, &value)
                }
                None => value,
            };
            values.push(value);
        }

        self.seed(values, modes);
        self.target = Target::Edit {
            id: entity.id.clone(),
        };
        self.phase = Phase::Ready;
        tracing::debug!("{} form ready for edit of {}", spec.resource, entity.id);
        Ok(())
    }

    /// Initializes the session for `target`, fetching the entity in edit mode.
    ///
    /// A failed read is fatal for the session: the caller should leave the
    /// page rather than show a half-populated form.
    pub async fn open<S: EntityService>(&mut self, target: Target, service: &S) -> ResultForm<()> {
        match target {
            Target::Create => self.init_create(),
            Target::Edit { id } => {
                let entity = service.get_entity(&id).await.map_err(|err| {
                    tracing::warn!("failed to load {} {id}: {err}", self.spec.resource);
                    FormError::RemoteRead(err)
                })?;
                self.init_edit(&entity)
            }
        }
    }

    fn seed(&mut self, values: Vec<Value>, modes: Vec<String>) {
        let spec = Arc::clone(&self.spec);
        self.modes = modes;
        self.stash.clear();
        self.pending = None;
        for (selector, mode) in spec.selectors().iter().zip(&self.modes) {
            if let Some(idx) = spec.index_of(&selector.field) {
                self.fields[idx].seed(Value::Text(mode.clone()));
            }
        }
        for ((field, state), value) in spec.fields().iter().zip(&mut self.fields).zip(values) {
            state.untouch();
            if spec.is_selector(&field.name) {
                continue;
            }
            let relevant = spec.is_relevant(&field.name, &self.modes);
            state.seed(if relevant { value } else { field.kind.safe_default() });
        }
        self.apply_modes();
        self.revalidate_all();
    }

    /// Recomputes the rule set and enabled flag of every field from the
    /// active modes.
    fn apply_modes(&mut self) {
        let spec = Arc::clone(&self.spec);
        for (field, state) in spec.fields().iter().zip(&mut self.fields) {
            state.set_rules(spec.active_rules(&field.name, &self.modes));
            state.set_enabled(spec.is_relevant(&field.name, &self.modes));
        }
    }

    /// Sets a field value from user input.
    ///
    /// Setting a selector field switches modes. Fields the active modes do not
    /// use are disabled and reject input.
    pub fn set_value(&mut self, name: &str, value: Value) -> ResultForm<()> {
        self.ensure_editable()?;
        let idx = self.index(name)?;

        if self.spec.is_selector(name) {
            let Value::Text(mode) = value else {
                return Err(FormError::invalid_input(name, "mode must be text"));
            };
            return self.on_mode_change(name, &mode);
        }

        let kind = self.spec.fields()[idx].kind;
        if !accepts(kind, &value) {
            return Err(FormError::invalid_input(
                name,
                format!("{value} is not a {kind} value"),
            ));
        }
        if !self.fields[idx].is_enabled() {
            return Err(FormError::invalid_input(
                name,
                "field is not used by the current mode",
            ));
        }

        self.fields[idx].set_value(value);
        self.revalidate_related(name);
        Ok(())
    }

    /// Switches `selector` to `mode`.
    ///
    /// Rules are recomputed for every field the selector governs, fields the
    /// new mode does not own are reset to their safe default and disabled, and
    /// affected fields are revalidated. Unknown selectors or modes are
    /// rejected without touching any state.
    pub fn on_mode_change(&mut self, selector: &str, mode: &str) -> ResultForm<()> {
        self.ensure_editable()?;
        let spec = Arc::clone(&self.spec);
        let sidx = spec
            .selector_index(selector)
            .ok_or_else(|| FormError::Configuration(format!("{selector} is not a mode selector")))?;
        let sel = &spec.selectors()[sidx];
        let Some(next) = sel.rule(mode) else {
            return Err(FormError::Configuration(format!(
                "{mode:?} is not a valid {selector}"
            )));
        };

        let previous = std::mem::replace(&mut self.modes[sidx], mode.to_string());
        if let Some(idx) = spec.index_of(selector) {
            self.fields[idx].set_value(Value::Text(mode.to_string()));
        }
        if previous == mode {
            return Ok(());
        }
        let prev = sel.rule(&previous);

        for name in sel.governed_fields() {
            let Some(idx) = spec.index_of(name) else {
                continue;
            };
            let owned_now = next.is_owner(name);
            let owned_before = prev.is_some_and(|rule| rule.is_owner(name));
            let safe = spec.fields()[idx].kind.safe_default();

            let state = &mut self.fields[idx];
            state.set_rules(spec.active_rules(name, &self.modes));
            state.set_enabled(owned_now);

            if !owned_now {
                let old = state.value().clone();
                state.set_value(safe.clone());
                if owned_before && self.policy == SwitchPolicy::Restore && old != safe {
                    self.stash.insert(name.to_string(), old);
                }
            } else if !owned_before
                && self.policy == SwitchPolicy::Restore
                && let Some(old) = self.stash.remove(name)
            {
                self.fields[idx].set_value(old);
            }
        }

        for name in sel.governed_fields() {
            self.revalidate_related(name);
        }
        self.revalidate_related(selector);
        tracing::debug!("{}: {selector} {previous} -> {mode}", spec.resource);
        Ok(())
    }

    /// Marks a field as visited so its errors are shown.
    pub fn touch(&mut self, name: &str) -> ResultForm<()> {
        self.ensure_editable()?;
        let idx = self.index(name)?;
        self.fields[idx].touch();
        Ok(())
    }

    /// Puts back the values the session started with.
    pub fn reset(&mut self) -> ResultForm<()> {
        self.ensure_editable()?;
        let spec = Arc::clone(&self.spec);
        let modes = spec
            .selectors()
            .iter()
            .zip(&self.modes)
            .map(|(selector, current)| {
                spec.index_of(&selector.field)
                    .and_then(|idx| self.fields[idx].initial().as_text().map(ToString::to_string))
                    .unwrap_or_else(|| current.clone())
            })
            .collect();
        let values = self.fields.iter().map(|f| f.initial().clone()).collect();
        self.seed(values, modes);
        Ok(())
    }

    /// Loads option lists for fields restricted to reference data, through the
    /// shared cache.
    pub async fn load_options<L: ReferenceLoader>(
        &mut self,
        cache: &ReferenceCache<L>,
    ) -> ResultForm<()> {
        if self.phase == Phase::Submitting {
            return Err(FormError::Locked);
        }
        let spec = Arc::clone(&self.spec);
        for (idx, field) in spec.fields().iter().enumerate() {
            let Some(key) = field.options else {
                continue;
            };
            let mut items = cache.ensure_loaded(key).await.map_err(FormError::RemoteRead)?;
            if items.is_empty() {
                items = cache.force_refresh(key).await.map_err(FormError::RemoteRead)?;
            }
            self.fields[idx].set_options(items.iter().map(|item| item.id.clone()).collect());
            self.revalidate_related(&field.name);
        }
        Ok(())
    }

    /// Wire payload for the current values, transcoded with the active modes.
    pub fn payload(&self) -> Payload {
        let mut payload = Payload::new();
        for (field, state) in self.spec.fields().iter().zip(&self.fields) {
            let wire = match self.spec.transcoder_for(&field.name) {
                Some(rule) => {
                    let mode = self.mode(&rule.selector).unwrap_or_default();
                    rule.encode(mode, state.value())
                }
                None => state.value().to_wire(),
            };
            payload.insert(field.name.clone(), wire);
        }
        payload
    }

    /// Validates the whole form and, if valid, locks it for the write.
    ///
    /// An invalid form marks every field touched so all messages show, and
    /// stays `Ready`. After a failed write, submitting the same payload again
    /// carries the same idempotency key; any edit to the payload gets a new one.
    pub fn begin_submit(&mut self) -> ResultForm<SubmitRequest> {
        match self.phase {
            Phase::Ready => {}
            Phase::Submitting => return Err(FormError::AlreadySubmitting),
            other => return Err(FormError::NotReady(other)),
        }

        self.revalidate_all();
        let report = self.report();
        if !report.is_empty() {
            self.fields.iter_mut().for_each(FieldState::touch);
            tracing::debug!("{} submit blocked: {report}", self.spec.resource);
            return Err(FormError::Validation(report));
        }

        let payload = self.payload();
        let idempotency_key = match &self.pending {
            Some((key, sent)) if *sent == payload => {
                tracing::debug!("{} retrying write {key}", self.spec.resource);
                *key
            }
            _ => Uuid::new_v4(),
        };
        self.pending = Some((idempotency_key, payload.clone()));
        let request = SubmitRequest {
            target: self.target.clone(),
            payload,
            idempotency_key,
        };
        self.phase = Phase::Submitting;
        tracing::info!("{} submit {:?}", self.spec.resource, request.target);
        Ok(request)
    }

    /// Records the outcome of the write started by [`begin_submit`].
    ///
    /// A failure puts the form back to `Ready` with every value intact.
    ///
    /// [`begin_submit`]: FormController::begin_submit
    pub fn complete_submit(&mut self, result: Result<Entity, ServiceError>) -> ResultForm<Entity> {
        if self.phase != Phase::Submitting {
            return Err(FormError::NotSubmitting);
        }
        match result {
            Ok(entity) => {
                self.phase = Phase::SubmittedOk;
                self.pending = None;
                self.last_error = None;
                tracing::info!("{} saved {}", self.spec.resource, entity.id);
                Ok(entity)
            }
            Err(err) => {
                self.phase = Phase::Ready;
                tracing::warn!("{} save failed: {err}", self.spec.resource);
                self.last_error = Some(err.clone());
                Err(FormError::RemoteWrite(err))
            }
        }
    }

    /// Validates, transcodes and hands the payload to `service`.
    pub async fn submit<S: EntityService>(&mut self, service: &S) -> ResultForm<Entity> {
        let request = self.begin_submit()?;
        let result = match &request.target {
            Target::Create => {
                service
                    .create_entity(&request.payload, request.idempotency_key)
                    .await
            }
            Target::Edit { id } => service.update_entity(id, &request.payload).await,
        };
        self.complete_submit(result)
    }

    /// Ends the session. A write still in flight is left to complete unobserved.
    pub fn close(self) -> Phase {
        if self.phase == Phase::Submitting {
            tracing::warn!("{} closed with a submit in flight", self.spec.resource);
        }
        self.phase
    }

    fn revalidate_all(&mut self) {
        for idx in 0..self.fields.len() {
            self.revalidate_at(idx);
        }
    }

    /// Revalidates `name` and both ends of every date pair it belongs to.
    fn revalidate_related(&mut self, name: &str) {
        let spec = Arc::clone(&self.spec);
        if let Some(idx) = spec.index_of(name) {
            self.revalidate_at(idx);
        }
        for pair in spec.date_ranges().iter().filter(|p| p.involves(name)) {
            for end in [&pair.start, &pair.end] {
                if let Some(idx) = spec.index_of(end) {
                    self.revalidate_at(idx);
                }
            }
        }
    }

    fn revalidate_at(&mut self, idx: usize) {
        let extra = self.cross_field_errors(idx);
        self.fields[idx].revalidate(extra);
    }

    fn cross_field_errors(&self, idx: usize) -> Vec<FieldError> {
        let field = &self.spec.fields()[idx];
        let value = self.fields[idx].value();
        let mut errors = Vec::new();
        if field.kind == FieldKind::Date
            && let Err(err) = check_date_value(value)
        {
            errors.push(err);
        }
        for pair in self.spec.date_ranges().iter().filter(|p| p.end == field.name) {
            let Some(start) = self.value(&pair.start) else {
                continue;
            };
            if let Err(err) = validate_range(start, value)
                && !errors.contains(&err)
            {
                errors.push(err);
            }
        }
        errors
    }
}

fn accepts(kind: FieldKind, value: &Value) -> bool {
    if let Value::Number(n) = value
        && !n.is_finite()
    {
        return false;
    }
    matches!(
        (kind, value),
        (_, Value::Null)
            | (FieldKind::Text, Value::Text(_))
            | (FieldKind::Number, Value::Number(_))
            | (FieldKind::Boolean, Value::Bool(_))
            | (FieldKind::List, Value::List(_))
            | (FieldKind::Date, Value::Date(_) | Value::Text(_))
    )
}
