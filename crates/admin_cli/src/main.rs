use std::process::ExitCode;

use api_types::reference::RefKey;
use clap::{Args, Parser, Subcommand};
use engine::forms::FormKind;
use tracing_subscriber::EnvFilter;

mod client;
mod commands;
mod config;
mod error;

use crate::{config::GlobalArgs, error::Result};

#[derive(Parser, Debug)]
#[command(name = "backoffice")]
#[command(about = "Create and edit promotions on the delivery back office")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the fields, rules and modes of a form.
    Describe {
        #[arg(value_parser = parse_form)]
        form: FormKind,
    },
    /// Create a new entity.
    Create {
        #[arg(value_parser = parse_form)]
        form: FormKind,
        #[command(flatten)]
        input: InputArgs,
    },
    /// Load an entity, apply changes and save it.
    Edit {
        #[arg(value_parser = parse_form)]
        form: FormKind,
        id: String,
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print a reference list.
    Refs {
        #[arg(value_parser = commands::parse_ref_key)]
        key: RefKey,
        /// Bypass the cache and fetch the list again.
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Field assignment, repeatable (e.g. --set discountType=percentage).
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = commands::parse_assignment)]
    set: Vec<(String, String)>,
    /// Validate and print the payload without sending it.
    #[arg(long)]
    dry_run: bool,
}

fn parse_form(raw: &str) -> std::result::Result<FormKind, String> {
    raw.parse::<FormKind>().map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("command failed: {err:?}");
            eprintln!("{}", commands::report(&err));
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = config::load(&cli.global)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!(
                    "backoffice={level},engine={level}",
                    level = settings.log_level
                ))
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("using backend {}", settings.base_url);
    let ctx = commands::Context::new(settings)?;

    match cli.command {
        Command::Describe { form } => commands::describe(form),
        Command::Create { form, input } => {
            commands::create(&ctx, form, &input.set, input.dry_run).await
        }
        Command::Edit { form, id, input } => {
            commands::edit(&ctx, form, &id, &input.set, input.dry_run).await
        }
        Command::Refs { key, refresh } => commands::refs(&ctx, key, refresh).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_collects_repeated_assignments() {
        let cli = Cli::try_parse_from([
            "backoffice",
            "--base-url",
            "http://backend:8080",
            "create",
            "promo-code",
            "--set",
            "discountType=percentage",
            "--set",
            "discountValue=15",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.global.base_url.as_deref(), Some("http://backend:8080"));
        let Command::Create { form, input } = cli.command else {
            panic!("expected create");
        };
        assert_eq!(form, FormKind::PromoCode);
        assert_eq!(input.set.len(), 2);
        assert_eq!(input.set[1], ("discountValue".to_string(), "15".to_string()));
        assert!(input.dry_run);
    }

    #[test]
    fn unknown_forms_and_lists_are_rejected() {
        assert!(Cli::try_parse_from(["backoffice", "describe", "drivers"]).is_err());
        assert!(Cli::try_parse_from(["backoffice", "refs", "drivers"]).is_err());
        assert!(Cli::try_parse_from(["backoffice", "edit", "banner"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
