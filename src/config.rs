//! Layered resolver configuration
//!
//! Defaults, overlaid by an optional TOML file, overlaid by environment
//! variables. The fixed stack-depth offset is deliberately configuration:
//! it encodes the calling convention between the injected call site and the
//! resolver, and that convention is not this crate's to hard-code.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::caller::{ResolveStrategy, DEFAULT_STACK_DEPTH};

/// Environment variable selecting the resolution strategy (`fixed` or `scan`)
pub const ENV_STRATEGY: &str = "CALLTRACE_STRATEGY";

/// Environment variable overriding the fixed stack-depth offset
pub const ENV_STACK_DEPTH: &str = "CALLTRACE_STACK_DEPTH";

/// Environment variable overriding the record tag
pub const ENV_TAG: &str = "CALLTRACE_TAG";

/// Named resolution strategies as they appear in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Fixed-depth stack index
    Fixed,
    /// First frame outside the resolver's modules
    Scan,
}

/// Error parsing a strategy name from configuration or environment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resolution strategy '{0}' (expected 'fixed' or 'scan')")]
pub struct ParseStrategyError(String);

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "scan" => Ok(Self::Scan),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

/// Resolved configuration for a [`CallerLogger`](crate::logger::CallerLogger)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalltraceConfig {
    /// Which resolution strategy to use
    pub strategy_kind: StrategyKind,
    /// Stack index used by the fixed strategy
    pub stack_depth: usize,
    /// Record tag override; `None` uses the component default
    pub tag: Option<String>,
}

impl Default for CalltraceConfig {
    fn default() -> Self {
        Self {
            strategy_kind: StrategyKind::Scan,
            stack_depth: DEFAULT_STACK_DEPTH,
            tag: None,
        }
    }
}

/// On-disk configuration layout
///
/// ```toml
/// [resolver]
/// strategy = "fixed"
/// stack_depth = 3
/// tag = "app::tracing"
/// ```
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    resolver: ResolverSection,
}

#[derive(Debug, Default, Deserialize)]
struct ResolverSection {
    strategy: Option<StrategyKind>,
    stack_depth: Option<usize>,
    tag: Option<String>,
}

impl CalltraceConfig {
    /// The [`ResolveStrategy`] this configuration selects
    pub fn strategy(&self) -> ResolveStrategy {
        match self.strategy_kind {
            StrategyKind::Fixed => ResolveStrategy::FixedDepth(self.stack_depth),
            StrategyKind::Scan => ResolveStrategy::FirstExternal,
        }
    }

    /// Defaults overlaid with environment variables
    ///
    /// # Errors
    /// Returns an error when an environment value fails to parse.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load a TOML file, without the environment layer
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        let file: ConfigFile =
            toml::from_str(&content).context("Failed to parse TOML resolver configuration")?;

        let mut config = Self::default();
        if let Some(strategy) = file.resolver.strategy {
            config.strategy_kind = strategy;
        }
        if let Some(depth) = file.resolver.stack_depth {
            config.stack_depth = depth;
        }
        if file.resolver.tag.is_some() {
            config.tag = file.resolver.tag;
        }
        Ok(config)
    }

    /// Full layering: defaults, then the optional file, then the environment
    ///
    /// # Errors
    /// Returns an error on an unreadable file or an unparsable value in
    /// either layer.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = env::var(ENV_STRATEGY) {
            self.strategy_kind = value
                .parse()
                .with_context(|| format!("Invalid {ENV_STRATEGY} value"))?;
        }
        if let Ok(value) = env::var(ENV_STACK_DEPTH) {
            self.stack_depth = value
                .parse()
                .with_context(|| format!("Invalid {ENV_STACK_DEPTH} value: '{value}'"))?;
        }
        if let Ok(value) = env::var(ENV_TAG) {
            self.tag = Some(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn clear_env() {
        env::remove_var(ENV_STRATEGY);
        env::remove_var(ENV_STACK_DEPTH);
        env::remove_var(ENV_TAG);
    }

    #[test]
    fn test_defaults() {
        let config = CalltraceConfig::default();
        assert_eq!(config.strategy_kind, StrategyKind::Scan);
        assert_eq!(config.stack_depth, DEFAULT_STACK_DEPTH);
        assert!(config.tag.is_none());
        assert_eq!(config.strategy(), ResolveStrategy::FirstExternal);
    }

    #[test]
    fn test_fixed_strategy_uses_configured_depth() {
        let config = CalltraceConfig {
            strategy_kind: StrategyKind::Fixed,
            stack_depth: 7,
            tag: None,
        };
        assert_eq!(config.strategy(), ResolveStrategy::FixedDepth(7));
    }

    #[test]
    fn test_parse_strategy_kind() {
        assert_eq!("fixed".parse::<StrategyKind>().unwrap(), StrategyKind::Fixed);
        assert_eq!("scan".parse::<StrategyKind>().unwrap(), StrategyKind::Scan);
        let err = "stackwalk".parse::<StrategyKind>().unwrap_err();
        assert!(err.to_string().contains("stackwalk"));
    }

    #[test]
    fn test_from_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[resolver]
strategy = "fixed"
stack_depth = 5
tag = "app::tracing"
"#
        )?;
        file.flush()?;

        let config = CalltraceConfig::from_toml(file.path())?;
        assert_eq!(config.strategy_kind, StrategyKind::Fixed);
        assert_eq!(config.stack_depth, 5);
        assert_eq!(config.tag.as_deref(), Some("app::tracing"));
        Ok(())
    }

    #[test]
    fn test_from_toml_partial_section_keeps_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[resolver]\nstack_depth = 9")?;
        file.flush()?;

        let config = CalltraceConfig::from_toml(file.path())?;
        assert_eq!(config.strategy_kind, StrategyKind::Scan);
        assert_eq!(config.stack_depth, 9);
        Ok(())
    }

    #[test]
    fn test_from_toml_missing_file_errors() {
        let result = CalltraceConfig::from_toml("/nonexistent/calltrace.toml");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }

    #[test]
    fn test_from_toml_bad_strategy_errors() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[resolver]\nstrategy = \"stackwalk\"")?;
        file.flush()?;

        assert!(CalltraceConfig::from_toml(file.path()).is_err());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_env_overrides_defaults() -> Result<()> {
        clear_env();
        env::set_var(ENV_STRATEGY, "fixed");
        env::set_var(ENV_STACK_DEPTH, "6");
        env::set_var(ENV_TAG, "env::tag");

        let config = CalltraceConfig::from_env()?;
        assert_eq!(config.strategy_kind, StrategyKind::Fixed);
        assert_eq!(config.stack_depth, 6);
        assert_eq!(config.tag.as_deref(), Some("env::tag"));

        clear_env();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() -> Result<()> {
        clear_env();
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[resolver]\nstrategy = \"fixed\"\nstack_depth = 5")?;
        file.flush()?;

        env::set_var(ENV_STACK_DEPTH, "8");
        let config = CalltraceConfig::load(Some(file.path()))?;
        assert_eq!(config.strategy_kind, StrategyKind::Fixed);
        assert_eq!(config.stack_depth, 8);

        clear_env();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_invalid_env_depth_errors() {
        clear_env();
        env::set_var(ENV_STACK_DEPTH, "not-a-number");

        let result = CalltraceConfig::from_env();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains(ENV_STACK_DEPTH));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_strategy_errors() {
        clear_env();
        env::set_var(ENV_STRATEGY, "stackwalk");

        assert!(CalltraceConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_no_env_keeps_defaults() -> Result<()> {
        clear_env();
        let config = CalltraceConfig::from_env()?;
        assert_eq!(config, CalltraceConfig::default());
        Ok(())
    }
}
