use std::collections::HashSet;
use std::path::Path;
use crate::config::sources::default_sources;
use crate::config::{MonitorConfig, PersistenceConfig, ResolverConfig};
use crate::error::{Error, Result};
use crate::monitor::scheduler::interval_from_minutes;
use crate::rate_sources::{SourceDescriptor, SourceKind};
use ::config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub resolver: ResolverConfig,
    pub monitor: MonitorConfig,
    pub persistence: PersistenceConfig,
    pub sources: Vec<SourceDescriptor>,
}

impl AppConfig {
    /// Loads `config/default`, then `config/<env>`, then `FXWATCH__*`
    /// environment variables. Every layer is optional.
    pub fn load(env: &str) -> Result<Self> {
        Self::load_from(Path::new("config"), env)
    }

    pub fn load_from(dir: &Path, env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(env)).required(false))
            .add_source(
                Environment::with_prefix("FXWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        let mut app: AppConfig = config
            .try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        if app.sources.is_empty() {
            app.sources = default_sources();
        }

        app.validate()?;
        Ok(app)
    }

    /// Rejects configurations the core cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.resolver.fallback_rate.is_finite() && self.resolver.fallback_rate > 0.0) {
            return Err(Error::ConfigError(format!(
                "fallback_rate must be positive, got {}",
                self.resolver.fallback_rate
            )));
        }

        if let Err(e) = interval_from_minutes(self.monitor.interval_minutes) {
            return Err(Error::ConfigError(format!("interval_minutes: {}", e)));
        }

        if self.monitor.history_capacity == 0 {
            return Err(Error::ConfigError("history_capacity must be at least 1".to_string()));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(Error::ConfigError(format!("duplicate source name: {}", source.name)));
            }
            if source.kind == SourceKind::Browser && source.selectors.is_none() {
                return Err(Error::ConfigError(format!(
                    "browser source {} needs selectors",
                    source.name
                )));
            }
        }

        Ok(())
    }

    /// Configured sources, or the built-in set when none are configured.
    pub fn effective_sources(&self) -> Vec<SourceDescriptor> {
        if self.sources.is_empty() {
            default_sources()
        } else {
            self.sources.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path(), "test").unwrap();

        assert_eq!(config.resolver.max_retries, 2);
        assert_eq!(config.monitor.history_capacity, 1000);
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.sources[0].name, "Google Finance");
    }

    #[test]
    fn test_file_layers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
                [resolver]
                max_retries = 1
                fallback_rate = 5.1

                [[sources]]
                name = "Primary"
                kind = "api"
                url = "http://localhost:1/rate"
                timeout_ms = 500
                priority = 1
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("staging.toml"),
            r#"
                [monitor]
                interval_minutes = 0.5
            "#,
        )
        .unwrap();

        let config = AppConfig::load_from(dir.path(), "staging").unwrap();

        assert_eq!(config.resolver.max_retries, 1);
        assert_eq!(config.resolver.fallback_rate, 5.1);
        assert_eq!(config.resolver.retry_delay_ms, 2_000);
        assert_eq!(config.monitor.interval_minutes, 0.5);
        assert_eq!(config.sources.len(), 1);
        assert!(config.sources[0].enabled);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let config = AppConfig {
            sources: vec![
                SourceDescriptor::api("Same", "http://a", 1),
                SourceDescriptor::api("Same", "http://b", 2),
            ],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_interval() {
        let mut config = AppConfig::default();
        config.monitor.interval_minutes = 0.0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        config.monitor.interval_minutes = 1e300;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        config.monitor.interval_minutes = 0.5;
        assert!(config.validate().is_ok());
    }
}
