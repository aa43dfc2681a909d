//! Configuration types for rawconv

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};
use utoipa::ToSchema;

/// Environment variable naming an optional JSON configuration file
pub const CONFIG_FILE_ENV: &str = "RAWCONV_CONFIG";

/// Filesystem roots for batch inputs and outputs
///
/// Every batch gets `<upload_dir>/<token>` for its inputs and
/// `<converted_dir>/<token>_out` for the converter's outputs.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Uploads root (default: "/app_data/uploads")
    #[serde(default = "default_upload_dir")]
    #[schema(value_type = String)]
    pub upload_dir: PathBuf,

    /// Converted-outputs root (default: "/app_data/converted")
    #[serde(default = "default_converted_dir")]
    #[schema(value_type = String)]
    pub converted_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            converted_dir: default_converted_dir(),
        }
    }
}

/// External converter invocation settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ConverterConfig {
    /// Path to the converter executable
    /// (default: "/opt/thermorawfileparser/ThermoRawFileParser.exe")
    #[serde(default = "default_executable")]
    #[schema(value_type = String)]
    pub executable: PathBuf,

    /// Program that launches the executable, e.g. `mono` for a .NET assembly
    /// (default: "mono"). `None` runs the executable directly.
    #[serde(default = "default_launcher")]
    #[schema(value_type = Option<String>)]
    pub launcher: Option<PathBuf>,

    /// Maximum run time before the converter is killed (default: 1800 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// Accepted upload extensions, compared case-insensitively (default: ["raw"])
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Whether to search PATH for a launcher or executable given as a bare name (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            launcher: default_launcher(),
            timeout: default_timeout(),
            allowed_extensions: default_allowed_extensions(),
            search_path: true,
        }
    }
}

impl ConverterConfig {
    /// Program to spawn and the arguments that precede the converter's own flags
    ///
    /// With a launcher this is `(launcher, [executable])`, otherwise
    /// `(executable, [])`. Bare program names are looked up on PATH when
    /// `search_path` is set; if the lookup fails the configured value is used
    /// as-is and any problem surfaces when the process is started.
    pub fn resolve_program(&self) -> (PathBuf, Vec<PathBuf>) {
        match &self.launcher {
            Some(launcher) => (
                self.lookup(launcher),
                vec![self.executable.clone()],
            ),
            None => (self.lookup(&self.executable), Vec::new()),
        }
    }

    fn lookup(&self, program: &Path) -> PathBuf {
        let is_bare_name = program.components().count() == 1 && !program.is_absolute();
        if self.search_path && is_bare_name {
            if let Ok(found) = which::which(program) {
                return found;
            }
            tracing::debug!(program = ?program, "program not found on PATH, using configured name");
        }
        program.to_path_buf()
    }
}

/// HTTP server settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Maximum request body size in bytes (None = unlimited)
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    /// Show the converter command line, exit code, stdout and stderr to users (default: true)
    ///
    /// Disable for hardened deployments; the output is still logged.
    #[serde(default = "default_true")]
    pub expose_diagnostics: bool,

    /// Optional API key required in the X-Api-Key header for `/api/v1` routes
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for the JSON API (default: false)
    #[serde(default)]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_upload_bytes: None,
            expose_diagnostics: true,
            api_key: None,
            cors_enabled: false,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration
///
/// - [`storage`](StorageConfig): batch directory roots
/// - [`converter`](ConverterConfig): external tool location, timeout, allowed uploads
/// - [`server`](ServerConfig): HTTP binding and exposure settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Batch directory roots
    #[serde(default)]
    pub storage: StorageConfig,

    /// External converter settings
    #[serde(default)]
    pub converter: ConverterConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Build configuration from the process environment
    ///
    /// Starts from the file named by `RAWCONV_CONFIG` (or defaults), then applies
    /// `RAWCONV_*` overrides, then validates the result.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_FILE_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RAWCONV_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("RAWCONV_BIND_ADDRESS") {
            self.server.bind_address = value.parse().map_err(|e| Error::Config {
                message: format!("invalid bind address '{}': {}", value, e),
                key: Some("bind_address".to_string()),
            })?;
        }
        if let Some(value) = lookup("RAWCONV_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("RAWCONV_CONVERTED_DIR") {
            self.storage.converted_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("RAWCONV_CONVERTER_PATH") {
            self.converter.executable = PathBuf::from(value);
        }
        if let Some(value) = lookup("RAWCONV_LAUNCHER") {
            // An empty value runs the executable directly
            self.converter.launcher = if value.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        if let Some(value) = lookup("RAWCONV_TIMEOUT_SECS") {
            let secs: u64 = value.parse().map_err(|e| Error::Config {
                message: format!("invalid timeout '{}': {}", value, e),
                key: Some("timeout".to_string()),
            })?;
            self.converter.timeout = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("RAWCONV_API_KEY") {
            self.server.api_key = Some(value).filter(|k| !k.is_empty());
        }
        if let Some(value) = lookup("RAWCONV_EXPOSE_DIAGNOSTICS") {
            self.server.expose_diagnostics = parse_bool(&value).ok_or_else(|| Error::Config {
                message: format!("invalid boolean '{}'", value),
                key: Some("expose_diagnostics".to_string()),
            })?;
        }
        Ok(())
    }

    /// Check settings that would make every batch fail
    pub fn validate(&self) -> Result<()> {
        if self.converter.allowed_extensions.is_empty()
            || self
                .converter
                .allowed_extensions
                .iter()
                .any(|e| e.trim().is_empty())
        {
            return Err(Error::Config {
                message: "allowed extensions must be a non-empty list of non-empty values"
                    .to_string(),
                key: Some("allowed_extensions".to_string()),
            });
        }
        if self.converter.timeout.is_zero() {
            return Err(Error::Config {
                message: "converter timeout must be greater than zero".to_string(),
                key: Some("timeout".to_string()),
            });
        }
        if self.storage.upload_dir == self.storage.converted_dir {
            return Err(Error::Config {
                message: "upload and converted directories must differ".to_string(),
                key: Some("converted_dir".to_string()),
            });
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("/app_data/uploads")
}

fn default_converted_dir() -> PathBuf {
    PathBuf::from("/app_data/converted")
}

fn default_executable() -> PathBuf {
    PathBuf::from("/opt/thermorawfileparser/ThermoRawFileParser.exe")
}

fn default_launcher() -> Option<PathBuf> {
    Some(PathBuf::from("mono"))
}

fn default_timeout() -> Duration {
    Duration::from_secs(1800) // 30 minutes
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["raw".into()]
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
