//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Every setting has a default or is
//! optional: missing EmailJS keys switch delivery to simulation mode, and a
//! missing AI key only disables the generation features.

use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
///
/// Every setting is optional or defaulted, so the only way loading can fail
/// is a value that does not parse.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// EmailJS delivery credentials. All three are required for live delivery;
/// when any is absent the email adapter runs in simulation mode.
#[derive(Clone, Debug)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the per-key JSON state files.
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub tutor_model: String,
    pub content_model: String,
    pub visual_model: String,
    pub emailjs: Option<EmailJsConfig>,
    /// Accept the fixed bypass verification code. Development only.
    pub debug_bypass_code: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let data_dir = std::env::var("STUDYSPARK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        // --- Load Adapter-specific Settings ---
        let tutor_model = std::env::var("TUTOR_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let content_model =
            std::env::var("CONTENT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let visual_model = std::env::var("VISUAL_MODEL")
            .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string());

        // --- EmailJS (all-or-nothing; partial config falls back to simulation) ---
        let emailjs = match (
            std::env::var("EMAILJS_SERVICE_ID").ok(),
            std::env::var("EMAILJS_TEMPLATE_ID").ok(),
            std::env::var("EMAILJS_PUBLIC_KEY").ok(),
        ) {
            (Some(service_id), Some(template_id), Some(public_key)) => Some(EmailJsConfig {
                service_id,
                template_id,
                public_key,
            }),
            _ => None,
        };

        let debug_bypass_code = match std::env::var("STUDYSPARK_DEBUG_BYPASS") {
            Ok(raw) => match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(ConfigError::InvalidValue(
                        "STUDYSPARK_DEBUG_BYPASS".to_string(),
                        format!("'{}' is not a boolean", other),
                    ))
                }
            },
            Err(_) => false,
        };

        Ok(Self {
            data_dir,
            log_level,
            openai_api_key,
            gemini_api_key,
            tutor_model,
            content_model,
            visual_model,
            emailjs,
            debug_bypass_code,
        })
    }
}
