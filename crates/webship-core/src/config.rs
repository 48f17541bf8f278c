//! Configuration module for Webship.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, defaults, and a builder pattern for
//! programmatic use. The FTP password can be supplied through the
//! `WEBSHIP_FTP_PASSWORD` environment variable so it never has to live in
//! the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that overrides `ftp.password` when set.
pub const FTP_PASSWORD_ENV: &str = "WEBSHIP_FTP_PASSWORD";

/// Top-level configuration for Webship.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ftp: FtpConfig,
    pub build: BuildConfig,
    pub backend: BackendConfig,
    pub git: GitConfig,
    pub retention: RetentionConfig,
    pub logging: LoggingConfig,
}

/// FTP target settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FtpConfig {
    /// Hostname or address of the FTP server.
    pub host: String,
    /// Control connection port.
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Optional root prefix under the FTP login's home; empty means the
    /// login root itself.
    pub remote_base_path: String,
    /// Use passive (PASV) data connections.
    pub passive: bool,
}

/// Frontend build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory of the frontend project. Must exist; the build command
    /// runs here.
    pub frontend_path: Option<PathBuf>,
    /// Build command, split on whitespace into program and arguments.
    pub command: String,
    /// Build output location, relative to `frontend_path`.
    pub output_subdir: String,
}

/// Optional backend bundling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Directory of the backend tree to bundle into the build output.
    /// `None` disables bundling.
    pub path: Option<PathBuf>,
    /// Subdirectory of the build output the backend is copied into.
    pub remote_subdir: String,
}

/// Release tagging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Repository to tag. `None` means: walk upward from the working
    /// directory looking for a `.git` directory.
    pub repository_path: Option<PathBuf>,
    /// Tag names are `<prefix>-<yyyy-MM-dd-HH-mm>`.
    pub tag_prefix: String,
    /// Create and push the tag after a successful sync.
    pub tag_on_deploy: bool,
}

/// Retention rule lists consumed by the pruner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Path segments that protect everything at or below them.
    pub protected_segments: Vec<String>,
    /// Filename suffixes that protect individual files.
    pub protected_suffixes: Vec<String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`, applying environment
    /// overrides afterwards.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] (plus
    /// environment overrides) on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|_| {
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        })
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/webship/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("webship")
            .join("config.yaml")
    }

    /// Pulls secrets from the environment. Currently only the FTP
    /// password.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var(FTP_PASSWORD_ENV) {
            if !password.is_empty() {
                self.ftp.password = password;
            }
        }
    }
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 21,
            username: String::new(),
            password: String::new(),
            remote_base_path: String::new(),
            passive: true,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            frontend_path: None,
            command: "npx quasar build".to_string(),
            output_subdir: "dist/spa".to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            path: None,
            remote_subdir: "server".to_string(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            repository_path: None,
            tag_prefix: "deploy".to_string(),
            tag_on_deploy: true,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            protected_segments: vec!["logs".to_string(), "photos".to_string()],
            protected_suffixes: vec![".log".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"ftp.host"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- ftp ---
        if self.ftp.host.trim().is_empty() {
            errors.push(ValidationError {
                field: "ftp.host".into(),
                message: "is missing".into(),
            });
        }
        if self.ftp.port == 0 {
            errors.push(ValidationError {
                field: "ftp.port".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.ftp.username.trim().is_empty() {
            errors.push(ValidationError {
                field: "ftp.username".into(),
                message: "is missing".into(),
            });
        }
        if self.ftp.password.trim().is_empty() {
            errors.push(ValidationError {
                field: "ftp.password".into(),
                message: format!("is missing; set it in the file or via {FTP_PASSWORD_ENV}"),
            });
        }

        // --- build ---
        if self.build.frontend_path.is_none() {
            errors.push(ValidationError {
                field: "build.frontend_path".into(),
                message: "is missing".into(),
            });
        }
        if self.build.command.trim().is_empty() {
            errors.push(ValidationError {
                field: "build.command".into(),
                message: "must not be empty".into(),
            });
        }
        if self.build.output_subdir.trim().is_empty() {
            errors.push(ValidationError {
                field: "build.output_subdir".into(),
                message: "must not be empty".into(),
            });
        }

        // --- backend ---
        if self.backend.path.is_some() && self.backend.remote_subdir.trim().is_empty() {
            errors.push(ValidationError {
                field: "backend.remote_subdir".into(),
                message: "must not be empty when backend.path is set".into(),
            });
        }

        // --- git ---
        if self.git.tag_on_deploy && self.git.tag_prefix.trim().is_empty() {
            errors.push(ValidationError {
                field: "git.tag_prefix".into(),
                message: "must not be empty when git.tag_on_deploy is enabled".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use webship_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .ftp_host("ftp.example.net")
///     .ftp_credentials("deploy", "secret")
///     .build_frontend_path(PathBuf::from("/srv/frontend"))
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self::default()
    }

    // --- ftp ---

    pub fn ftp_host(mut self, host: impl Into<String>) -> Self {
        self.config.ftp.host = host.into();
        self
    }

    pub fn ftp_port(mut self, port: u16) -> Self {
        self.config.ftp.port = port;
        self
    }

    pub fn ftp_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.ftp.username = username.into();
        self.config.ftp.password = password.into();
        self
    }

    pub fn ftp_remote_base_path(mut self, path: impl Into<String>) -> Self {
        self.config.ftp.remote_base_path = path.into();
        self
    }

    pub fn ftp_passive(mut self, passive: bool) -> Self {
        self.config.ftp.passive = passive;
        self
    }

    // --- build ---

    pub fn build_frontend_path(mut self, path: PathBuf) -> Self {
        self.config.build.frontend_path = Some(path);
        self
    }

    pub fn build_command(mut self, command: impl Into<String>) -> Self {
        self.config.build.command = command.into();
        self
    }

    pub fn build_output_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.config.build.output_subdir = subdir.into();
        self
    }

    // --- backend ---

    pub fn backend_path(mut self, path: PathBuf) -> Self {
        self.config.backend.path = Some(path);
        self
    }

    pub fn backend_remote_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.config.backend.remote_subdir = subdir.into();
        self
    }

    // --- git ---

    pub fn git_repository_path(mut self, path: PathBuf) -> Self {
        self.config.git.repository_path = Some(path);
        self
    }

    pub fn git_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.git.tag_prefix = prefix.into();
        self
    }

    pub fn git_tag_on_deploy(mut self, enabled: bool) -> Self {
        self.config.git.tag_on_deploy = enabled;
        self
    }

    // --- retention ---

    pub fn retention_protected_segments(
        mut self,
        segments: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.config.retention.protected_segments =
            segments.into_iter().map(Into::into).collect();
        self
    }

    pub fn retention_protected_suffixes(
        mut self,
        suffixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.config.retention.protected_suffixes =
            suffixes.into_iter().map(Into::into).collect();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}
