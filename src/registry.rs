//! Host contract surface
//!
//! The instrumentation host locates this component by data, not by language
//! metadata: an allow-list of injectable operation names ([`ExportRegistry`])
//! and a well-known binding name resolved to the process-wide
//! [`CallerLogger`] instance ([`lookup`]).
//!
//! The binding name and the default export set are contractually fixed by the
//! host and must stay stable across releases.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::CalltraceConfig;
use crate::logger::{CallerLogger, TracingSink};

/// Well-known name the host resolves the process-wide instance by
pub const INSTANCE_BINDING: &str = "INSTANCE";

/// One injectable operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDefinition {
    /// Operation name the host targets
    pub name: String,
    /// Human-readable summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Allow-list of operations the host may inject calls to
///
/// Loadable from TOML for host deployments that restrict or extend the
/// surface; [`ExportRegistry::builtin`] supplies the embedded default set.
#[derive(Debug)]
pub struct ExportRegistry {
    /// Exports in declaration order
    exports: Vec<ExportDefinition>,

    /// Fast lookup: operation name → index into `exports`
    by_name: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct ExportFile {
    export: Vec<ExportDefinition>,
}

impl ExportRegistry {
    /// Load export definitions from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, has invalid TOML syntax,
    /// or declares the same operation name twice.
    ///
    /// # Example TOML
    /// ```toml
    /// [[export]]
    /// name = "trace_log"
    /// description = "Log the identity of the immediate caller"
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read exports file: {}", path.as_ref().display())
        })?;
        let file: ExportFile =
            toml::from_str(&content).context("Failed to parse TOML export definitions")?;
        Self::from_definitions(file.export)
    }

    /// The embedded default allow-list
    ///
    /// Uses exports-default.toml compiled into the binary for zero-config
    /// operation.
    pub fn builtin() -> Result<Self> {
        const DEFAULT_TOML: &str = include_str!("../exports-default.toml");

        let file: ExportFile = toml::from_str(DEFAULT_TOML)
            .context("Failed to parse embedded exports-default.toml")?;
        Self::from_definitions(file.export)
    }

    fn from_definitions(exports: Vec<ExportDefinition>) -> Result<Self> {
        let mut by_name = HashMap::new();
        for (index, export) in exports.iter().enumerate() {
            if by_name.insert(export.name.clone(), index).is_some() {
                anyhow::bail!("Duplicate export '{}'", export.name);
            }
        }
        Ok(Self { exports, by_name })
    }

    /// Whether the host may inject calls to the named operation
    pub fn is_injectable(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Get an export definition by operation name
    pub fn get(&self, name: &str) -> Option<&ExportDefinition> {
        self.by_name.get(name).map(|&index| &self.exports[index])
    }

    /// All exports in declaration order
    pub fn exports(&self) -> &[ExportDefinition] {
        &self.exports
    }
}

static INSTANCE: OnceLock<CallerLogger> = OnceLock::new();

/// The process-wide logger instance
///
/// Constructed on first access from environment-layered defaults and never
/// reset; its initialization record is emitted exactly once per process.
/// This path is host-facing and must not fail, so an unparsable environment
/// falls back to defaults.
pub fn instance() -> &'static CallerLogger {
    INSTANCE.get_or_init(|| {
        let config = CalltraceConfig::from_env().unwrap_or_default();
        CallerLogger::new(&config, Box::new(TracingSink))
    })
}

/// Resolve a well-known binding name to the instance it names
///
/// Only [`INSTANCE_BINDING`] is defined; anything else is `None`.
pub fn lookup(binding: &str) -> Option<&'static CallerLogger> {
    (binding == INSTANCE_BINDING).then(instance)
}
