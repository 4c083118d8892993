// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: parameter bounds and the supported-model list.

use std::str::FromStr;

use parley_core::types::{
    ChatModel, MAX_TOKENS_MAX, MAX_TOKENS_MIN, TEMPERATURE_MAX, TEMPERATURE_MIN,
};

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate default_model is one of the supported identifiers.
    if ChatModel::from_str(&config.openai.default_model).is_err() {
        let supported = ChatModel::ALL
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        errors.push(ConfigError::Validation {
            message: format!(
                "openai.default_model `{}` is not supported (supported models: {supported})",
                config.openai.default_model
            ),
        });
    }

    // Validate temperature bounds, boundaries inclusive.
    let temp = config.openai.temperature;
    if !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&temp) {
        errors.push(ConfigError::Validation {
            message: format!(
                "openai.temperature must be between {TEMPERATURE_MIN} and {TEMPERATURE_MAX}, got {temp}"
            ),
        });
    }

    // Validate max_tokens bounds, boundaries inclusive.
    let max_tokens = config.openai.max_tokens;
    if !(MAX_TOKENS_MIN..=MAX_TOKENS_MAX).contains(&max_tokens) {
        errors.push(ConfigError::Validation {
            message: format!(
                "openai.max_tokens must be between {MAX_TOKENS_MIN} and {MAX_TOKENS_MAX}, got {max_tokens}"
            ),
        });
    }

    // Validate log_level is a recognized tracing level.
    let level = config.chat.log_level.to_ascii_lowercase();
    if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "chat.log_level `{}` is not one of trace, debug, info, warn, error",
                config.chat.log_level
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ParleyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unsupported_model_fails_validation() {
        let mut config = ParleyConfig::default();
        config.openai.default_model = "gpt-5-nano".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("default_model"))));
    }

    #[test]
    fn out_of_range_temperature_fails_validation() {
        let mut config = ParleyConfig::default();
        config.openai.temperature = 2.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("temperature"))));
    }

    #[test]
    fn out_of_range_max_tokens_fails_validation() {
        let mut config = ParleyConfig::default();
        config.openai.max_tokens = 5000;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_tokens"))));
    }

    #[test]
    fn boundary_values_pass_validation() {
        let mut config = ParleyConfig::default();
        config.openai.temperature = 0.0;
        config.openai.max_tokens = 100;
        assert!(validate_config(&config).is_ok());

        config.openai.temperature = 2.0;
        config.openai.max_tokens = 4000;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn multiple_errors_collected_not_fail_fast() {
        let mut config = ParleyConfig::default();
        config.openai.default_model = "nope".to_string();
        config.openai.temperature = -1.0;
        config.openai.max_tokens = 1;
        config.chat.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let mut config = ParleyConfig::default();
        config.chat.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))));
    }
}
