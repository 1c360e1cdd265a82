//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early. Only
//! some errors are fatal; a bad pattern or template just disables the
//! feature it belongs to.

use super::Config;
use crate::state::names::check_template;
use std::collections::BTreeMap;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.name is required")]
    MissingBotName,
    #[error("bot.command_prefix is required")]
    MissingCommandPrefix,
    #[error("bot.tick_interval_secs must be greater than zero")]
    ZeroTickInterval,
    #[error("admission.bad_name_pattern is not a valid regex: {0}")]
    InvalidBadNamePattern(String),
    #[error("broadcast.commands.{name} template is malformed: {reason}")]
    MalformedBroadcast { name: String, reason: String },
    #[error("email.commands.{0} must not be empty")]
    EmptyEmailTemplate(String),
}

impl ValidationError {
    /// Whether the engine cannot start with this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingBotName | Self::MissingCommandPrefix | Self::ZeroTickInterval
        )
    }
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bot.name.trim().is_empty() {
        errors.push(ValidationError::MissingBotName);
    }
    if config.bot.command_prefix.is_empty() {
        errors.push(ValidationError::MissingCommandPrefix);
    }
    if config.bot.tick_interval_secs == 0 {
        errors.push(ValidationError::ZeroTickInterval);
    }

    if let Some(ref pattern) = config.admission.bad_name_pattern
        && let Err(e) = regex::Regex::new(pattern)
    {
        errors.push(ValidationError::InvalidBadNamePattern(e.to_string()));
    }

    let broadcasts: BTreeMap<String, String> = config
        .broadcast
        .entries()
        .into_iter()
        .map(|(alias, _, message)| (alias, message))
        .collect();
    for (name, message) in &config.broadcast.commands {
        if let Err(e) = check_template(message, &broadcasts) {
            errors.push(ValidationError::MalformedBroadcast {
                name: name.clone(),
                reason: e.to_string(),
            });
        }
    }

    for (name, command) in &config.email.commands {
        if command.subject.trim().is_empty() && command.body.trim().is_empty() {
            errors.push(ValidationError::EmptyEmailTemplate(name.clone()));
        }
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
    fn test_default_config_passes() {
        let config: Config = toml::from_str("").unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_bot_name_is_fatal() {
        let config: Config = toml::from_str(
            r#"
[bot]
name = "  "
tick_interval_secs = 0
"#,
        )
        .unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingBotName)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroTickInterval)));
        assert!(errors.iter().all(ValidationError::is_fatal));
    }

    #[test]
    fn test_bad_regex_is_not_fatal() {
        let config: Config = toml::from_str(
            r#"
[admission]
bad_name_pattern = "(unclosed"
"#,
        )
        .unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::InvalidBadNamePattern(_)));
        assert!(!errors[0].is_fatal());
    }

    #[test]
    fn test_broadcast_templates_checked() {
        let config: Config = toml::from_str(
            r#"
[broadcast.commands]
hi = "Good {1}, everyone. {link}"
link = "See {missing}"
"#,
        )
        .unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::MalformedBroadcast { name, .. } if name == "link"
        ));
    }
}
