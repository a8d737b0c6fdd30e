use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::messages::MessageTable;
use crate::validation::{ValidationPattern, DEFAULT_PIN_PATTERN, DEFAULT_PIN_PATTERN_TITLE};

/// Name of the configuration file looked up in the working and application directories
pub const CONFIG_FILE_NAME: &str = "device-provisioning.toml";

/// Main configuration structure for device provisioning
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProvisioningConfig {
    /// Provisioning API settings
    pub api: ApiConfig,
    /// PIN format rule
    pub validation: ValidationConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Localized messages keyed by server error code
    #[serde(default)]
    pub messages: MessageTable,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL the `devices/{id}/set-password` path is appended to
    pub base_url: String,
    /// Request timeout enforced by the HTTP client
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Regular expression the PIN must match
    pub pin_pattern: String,
    /// Description shown when the PIN does not match
    pub pin_pattern_title: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (overridden by RUST_LOG)
    pub log_level: String,
    /// Emit JSON instead of human-readable log lines
    pub json_logs: bool,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8082/api/".to_string(),
                timeout_seconds: 120, // the device waits for a button press
            },
            validation: ValidationConfig {
                pin_pattern: DEFAULT_PIN_PATTERN.to_string(),
                pin_pattern_title: DEFAULT_PIN_PATTERN_TITLE.to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
            messages: MessageTable::default(),
        }
    }
}

impl ValidationConfig {
    pub fn pattern(&self) -> Result<ValidationPattern> {
        Ok(ValidationPattern::new(&self.pin_pattern, self.pin_pattern_title.clone())?)
    }
}

/// Per-OS application directory holding user configuration
pub fn app_directory() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join("Library").join("Application Support").join("DBB"))
    } else if cfg!(target_os = "windows") {
        std::env::var_os("APPDATA").map(|appdata| PathBuf::from(appdata).join("DBB"))
    } else {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".dbb"))
    }
}

impl ProvisioningConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. device-provisioning.toml in the application directory
    /// 3. device-provisioning.toml in the working directory
    /// 4. Environment variables (e.g. DEVICE_PROVISIONING_API__BASE_URL)
    pub fn load() -> Result<Self> {
        let mut files = Vec::new();
        if let Some(dir) = app_directory() {
            files.push(dir.join(CONFIG_FILE_NAME));
        }
        files.push(PathBuf::from(CONFIG_FILE_NAME));
        Self::load_from(&files)
    }

    /// Same as [`ProvisioningConfig::load`] with an explicit list of files, later files winning.
    /// Missing files are skipped.
    pub fn load_from<P: AsRef<Path>>(files: &[P]) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        for path in files {
            builder = builder.add_source(File::from(path.as_ref()).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("DEVICE_PROVISIONING")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<ProvisioningConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = ProvisioningConfig::load_env_file();
        ProvisioningConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static ProvisioningConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
