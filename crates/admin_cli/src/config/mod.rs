use clap::Args;
use engine::SwitchPolicy;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/backoffice.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub log_level: String,
    pub switch_policy: SwitchPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            token: None,
            log_level: "info".to_string(),
            switch_policy: SwitchPolicy::Clear,
        }
    }
}

#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:3000/api).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override the API token.
    #[arg(long, global = true, env = "BACKOFFICE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Override the log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Bring values back when switching to a mode that used them before.
    #[arg(long, global = true)]
    pub restore_on_switch: bool,
}

/// Layers the config file, `BACKOFFICE_*` variables and command line flags.
pub fn load(args: &GlobalArgs) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("BACKOFFICE"));
    let settings: AppConfig = builder.build()?.try_deserialize()?;

    Ok(apply_overrides(settings, args))
}

fn apply_overrides(mut settings: AppConfig, args: &GlobalArgs) -> AppConfig {
    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(token) = &args.token {
        settings.token = Some(token.clone());
    }
    if let Some(level) = &args.log_level {
        settings.log_level = level.clone();
    }
    if args.restore_on_switch {
        settings.switch_policy = SwitchPolicy::Restore;
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let args = GlobalArgs {
            base_url: Some("https://admin.example.com/api".to_string()),
            restore_on_switch: true,
            ..GlobalArgs::default()
        };
        let settings = apply_overrides(AppConfig::default(), &args);
        assert_eq!(settings.base_url, "https://admin.example.com/api");
        assert_eq!(settings.switch_policy, SwitchPolicy::Restore);
        assert_eq!(settings.log_level, "info");
        assert!(settings.token.is_none());
    }

    #[test]
    fn file_values_are_read_from_toml() {
        let settings: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "base_url = \"http://backend:8080\"\nswitch_policy = \"restore\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.base_url, "http://backend:8080");
        assert_eq!(settings.switch_policy, SwitchPolicy::Restore);
        assert_eq!(settings.log_level, "info");
    }
}
