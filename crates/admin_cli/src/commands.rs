use std::sync::Arc;

use api_types::{entity::Entity, reference::RefKey};
use engine::{
    FormController, FormError, ReferenceCache, Target, Value,
    forms::FormKind,
};

use crate::{
    client::Client,
    config::AppConfig,
    error::{AppError, Result},
};

/// Splits a `name=value` command line assignment.
pub fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in {raw:?}"));
    }
    Ok((name.to_string(), value.to_string()))
}

pub fn parse_ref_key(raw: &str) -> std::result::Result<RefKey, String> {
    RefKey::ALL
        .into_iter()
        .find(|key| key.as_str() == raw)
        .ok_or_else(|| format!("unknown reference list {raw:?} (brands, channels, cities)"))
}

pub struct Context {
    config: AppConfig,
    client: Client,
    refs: ReferenceCache<Client>,
}

impl Context {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::new(&config.base_url, config.token.clone())?;
        Ok(Self {
            refs: ReferenceCache::new(client.clone()),
            client,
            config,
        })
    }

    fn form(&self, kind: FormKind) -> Result<FormController> {
        let spec = Arc::new(kind.spec()?);
        Ok(FormController::new(spec).with_policy(self.config.switch_policy))
    }
}

/// Prints the fields, rules and modes of a form.
pub fn describe(kind: FormKind) -> Result<()> {
    let spec = kind.spec()?;
    println!("{kind} ({})", spec.resource);
    println!();
    for field in spec.fields() {
        let mut line = format!("  {:<20} {:<8}", field.name, field.kind);
        let rules = field.base.iter().map(ToString::to_string).collect::<Vec<_>>();
        if !rules.is_empty() {
            line.push_str(&format!(" {}", rules.join(" ")));
        }
        if let Some(key) = field.options {
            line.push_str(&format!(" from {key}"));
        }
        if let Some(default) = &field.default {
            line.push_str(&format!(" default {default}"));
        }
        println!("{}", line.trim_end());
    }
    for selector in spec.selectors() {
        println!();
        println!("  {} (default {})", selector.field, selector.default_mode);
        for rule in selector.rules() {
            let owned = rule
                .owned_fields()
                .map(|field| {
                    let rules = rule
                        .rules_for(field)
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>();
                    format!("{field}[{}]", rules.join(" "))
                })
                .collect::<Vec<_>>();
            println!("    {:<20} {}", rule.mode, owned.join(", "));
        }
    }
    Ok(())
}

pub async fn create(
    ctx: &Context,
    kind: FormKind,
    assignments: &[(String, String)],
    dry_run: bool,
) -> Result<()> {
    let service = ctx.client.resource(kind.resource());
    let mut form = ctx.form(kind)?;
    form.open(Target::Create, &service).await?;
    form.load_options(&ctx.refs).await?;
    apply(&mut form, assignments)?;
    finish(form, &service, dry_run).await
}

pub async fn edit(
    ctx: &Context,
    kind: FormKind,
    id: &str,
    assignments: &[(String, String)],
    dry_run: bool,
) -> Result<()> {
    let service = ctx.client.resource(kind.resource());
    let mut form = ctx.form(kind)?;
    form.open(
        Target::Edit {
            id: id.to_string(),
        },
        &service,
    )
    .await?;
    form.load_options(&ctx.refs).await?;
    apply(&mut form, assignments)?;
    finish(form, &service, dry_run).await
}

pub async fn refs(ctx: &Context, key: RefKey, refresh: bool) -> Result<()> {
    let items = if refresh {
        ctx.refs.force_refresh(key).await?
    } else {
        ctx.refs.ensure_loaded(key).await?
    };
    for item in items.iter() {
        println!("{}\t{}", item.id, item.name);
    }
    Ok(())
}

/// Applies assignments, selectors first so the dependent fields they enable
/// accept input.
fn apply(form: &mut FormController, assignments: &[(String, String)]) -> Result<()> {
    let (selectors, fields): (Vec<_>, Vec<_>) = assignments
        .iter()
        .partition(|(name, _)| form.spec().is_selector(name));

    for (name, raw) in selectors.into_iter().chain(fields) {
        let kind = form
            .spec()
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.clone()))?
            .kind;
        let value = Value::parse(name, kind, raw)?;
        tracing::debug!("{name} = {value}");
        form.set_value(name, value)?;
    }
    Ok(())
}

async fn finish<S: engine::EntityService>(
    mut form: FormController,
    service: &S,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        let request = form.begin_submit()?;
        println!("{}", serde_json::to_string_pretty(&request.payload)?);
        form.close();
        return Ok(());
    }

    let saved: Entity = form.submit(service).await?;
    println!("{}", serde_json::to_string_pretty(&saved)?);
    Ok(())
}

/// Renders a command failure for the terminal.
pub fn report(err: &AppError) -> String {
    match err {
        AppError::Form(FormError::Validation(report)) => {
            let mut out = String::from("form is invalid:");
            for (field, errors) in &report.fields {
                for error in errors {
                    out.push_str(&format!("\n  {field} {error} ({})", error.key()));
                }
            }
            out
        }
        other => other.to_string(),
    }
}
