//! Wiretap configuration loaded from environment variables.
//!
//! Device addresses come from the command line; everything else comes
//! from environment variables (or a `.env` file via `dotenvy`).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::WiretapError;

/// Default port the gateway serves its registration route on.
pub const DEFAULT_REGISTER_PORT: u16 = 3012;

/// Default registration route.
pub const DEFAULT_REGISTER_PATH: &str = "/register";

/// Top-level wiretap configuration.
///
/// Loaded once at startup via [`WiretapConfig::from_env`].
#[derive(Debug, Clone)]
pub struct WiretapConfig {
    /// Directory the `.wiretap` files are written to.
    pub output_dir: PathBuf,

    /// Port of the gateway registration endpoint.
    pub register_port: u16,

    /// Path of the gateway registration endpoint, with a leading `/`.
    pub register_path: String,

    /// Upper bound on a single registration request.
    pub handshake_timeout: Duration,

    /// Emit log records as JSON lines instead of the human format.
    pub log_json: bool,
}

impl Default for WiretapConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            register_port: DEFAULT_REGISTER_PORT,
            register_path: DEFAULT_REGISTER_PATH.to_string(),
            handshake_timeout: Duration::from_secs(10),
            log_json: false,
        }
    }
}

impl WiretapConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`WiretapError::Config`] if `WIRETAP_REGISTER_PATH` does not
    /// start with `/` or the handshake timeout is zero.
    pub fn from_env() -> Result<Self, WiretapError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let output_dir = std::env::var("WIRETAP_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        let register_port = parse_env("WIRETAP_REGISTER_PORT", defaults.register_port);
        let register_path =
            std::env::var("WIRETAP_REGISTER_PATH").unwrap_or(defaults.register_path);
        let handshake_timeout_secs = parse_env("WIRETAP_HANDSHAKE_TIMEOUT_SECS", 10_u64);
        let log_json = parse_env_bool("WIRETAP_LOG_JSON", defaults.log_json);

        let config = Self {
            output_dir,
            register_port,
            register_path,
            handshake_timeout: Duration::from_secs(handshake_timeout_secs),
            log_json,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`WiretapError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<(), WiretapError> {
        if !self.register_path.starts_with('/') {
            return Err(WiretapError::Config(format!(
                "register path `{}` must start with `/`",
                self.register_path
            )));
        }
        if self.handshake_timeout.is_zero() {
            return Err(WiretapError::Config(
                "handshake timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
