use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::arguments::find_option;
use crate::platform::Platform;
use crate::{TriangleError, TriangleResult};

/// Environment variable that overrides the directory holding bundled binaries.
pub const ENV_VENDOR_DIR: &str = "SQIP_TRIANGLE_VENDOR_DIR";

const VENDOR_DIR_NAME: &str = "vendor";

/// A single plugin option value as the pipeline supplies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for OptionValue {
    /// Render the value the way the binary expects it on the command line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag(value) => write!(f, "{value}"),
            OptionValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            OptionValue::Number(value) => write!(f, "{value}"),
            OptionValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Flag(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Number(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Number(f64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Sparse mapping of option key to value, e.g. `{"nf": 1, "bg": "#654321"}`.
///
/// Iteration order carries no meaning; the argument builder walks its own
/// table so the command line is the same however the map was filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginOptions(BTreeMap<String, OptionValue>);

impl PluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value for the key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check every key against the option table and every value against its kind.
    pub fn validate(&self) -> TriangleResult<()> {
        for (key, value) in &self.0 {
            let spec = find_option(key).ok_or_else(|| TriangleError::InvalidOption {
                key: key.clone(),
                reason: "not a triangle option".to_string(),
            })?;
            if !spec.kind.accepts(value) {
                return Err(TriangleError::InvalidOption {
                    key: key.clone(),
                    reason: format!("expected a {}, got {value:?}", spec.kind),
                });
            }
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for PluginOptions
where
    K: Into<String>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Pipeline-wide options. Carried for the construction contract, not read here.
pub type PipelineOptions = serde_json::Map<String, serde_json::Value>;

/// Global pipeline configuration shared by every plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqipConfig {
    pub input: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub plugins: Vec<String>,
}

/// Everything the pipeline hands a plugin at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(default)]
    pub plugin_options: PluginOptions,
    #[serde(default)]
    pub options: PipelineOptions,
    #[serde(default)]
    pub sqip_config: SqipConfig,
}

impl PluginConfig {
    pub fn new(plugin_options: PluginOptions, sqip_config: SqipConfig) -> Self {
        Self {
            plugin_options,
            options: PipelineOptions::new(),
            sqip_config,
        }
    }

    /// Parse a configuration document in the pipeline's JSON shape.
    pub fn from_json(json: &str) -> TriangleResult<Self> {
        let config: PluginConfig = serde_json::from_str(json)?;
        config.plugin_options.validate()?;
        Ok(config)
    }
}

/// Where and for which platform the resolver looks for a bundled binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Directory containing the `<os>-<arch>/` binary folders.
    pub vendor_dir: PathBuf,
    /// Platform used to pick the bundled binary and the lookup command.
    pub platform: Platform,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        let env_override = std::env::var_os(ENV_VENDOR_DIR).map(PathBuf::from);
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
        Self {
            vendor_dir: resolve_vendor_dir(env_override, exe_dir),
            platform: Platform::current(),
        }
    }
}

impl ResolverSettings {
    /// Set the directory holding bundled binaries.
    pub fn with_vendor_dir(mut self, vendor_dir: impl Into<PathBuf>) -> Self {
        self.vendor_dir = vendor_dir.into();
        self
    }

    /// Set the platform the resolver should assume.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

fn resolve_vendor_dir(env_override: Option<PathBuf>, exe_dir: Option<PathBuf>) -> PathBuf {
    if let Some(path) = env_override
        && !path.as_os_str().is_empty()
    {
        return path;
    }

    exe_dir
        .map(|dir| dir.join(VENDOR_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(VENDOR_DIR_NAME))
}
