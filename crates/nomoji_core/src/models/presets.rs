//! The default template and the three named presets.
//!
//! All four are built once and handed out as `&'static` references. They are
//! merge sources only; nothing is ever stored under a preset's name.

use super::config::{
    ConfigUpdate, Configuration, ContextConfig, Contexts, Exceptions, Severity,
};
use crate::constants::CONFIG_SCHEMA_VERSION;
use crate::error::AppError;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use Severity::{Moderate, Relaxed, Strict};

/// The template every new configuration starts from.
pub fn default_config() -> &'static Configuration {
    static DEFAULT: OnceLock<Configuration> = OnceLock::new();
    DEFAULT.get_or_init(build_default)
}

fn build_default() -> Configuration {
    Configuration {
        version: CONFIG_SCHEMA_VERSION.to_string(),
        enabled: true,
        contexts: Contexts {
            documentation: ContextConfig::new(true, Strict).with_message(
                "Do not use emojis in documentation, markdown files, or README files.",
            ),
            console: ContextConfig::new(true, Strict).with_message(
                "Do not use emojis in console.log, console.error, or any console output.",
            ),
            cli: ContextConfig::new(true, Strict).with_message(
                "Do not use emojis in CLI tool output, progress bars, or command-line messages.",
            ),
            logging: ContextConfig::new(true, Strict).with_message(
                "Do not use emojis in application logs, error messages, or logging statements.",
            ),
            comments: ContextConfig::new(true, Moderate).with_message(
                "Avoid using emojis in code comments unless absolutely necessary for clarity.",
            ),
            commit_messages: ContextConfig::new(true, Strict)
                .with_message("Do not use emojis in git commit messages."),
            user_interface: ContextConfig::new(false, Relaxed)
                .with_message("Emojis may be used in user-facing UI when appropriate for UX."),
        },
        exceptions: Some(Exceptions {
            allowed_emojis: Vec::new(),
            allowed_contexts: vec!["userInterface".to_string()],
        }),
        custom_rules: None,
        metadata: None,
    }
}

/// Named policy bundles a user can apply in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Strict,
    Moderate,
    Relaxed,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Strict, Preset::Moderate, Preset::Relaxed];

    pub fn name(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Relaxed => "relaxed",
        }
    }

    /// The preset's full document.
    pub fn config(self) -> &'static Configuration {
        static PRESETS: OnceLock<[Configuration; 3]> = OnceLock::new();
        let presets = PRESETS.get_or_init(|| {
            [
                build_preset(Preset::Strict),
                build_preset(Preset::Moderate),
                build_preset(Preset::Relaxed),
            ]
        });
        match self {
            Self::Strict => &presets[0],
            Self::Moderate => &presets[1],
            Self::Relaxed => &presets[2],
        }
    }

    /// The partial document applying this preset writes.
    ///
    /// Custom rules are absent so a user's own rules survive the merge.
    pub fn to_update(self) -> ConfigUpdate {
        let config = self.config();
        ConfigUpdate {
            version: Some(config.version.clone()),
            enabled: Some(config.enabled),
            contexts: Some(config.contexts.clone().into()),
            exceptions: config.exceptions.clone(),
            custom_rules: None,
            metadata: None,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "strict" => Ok(Self::Strict),
            "moderate" => Ok(Self::Moderate),
            "relaxed" => Ok(Self::Relaxed),
            _ => Err(AppError::BadRequest(
                "Invalid preset name. Must be 'strict', 'moderate', or 'relaxed'.".to_string(),
            )),
        }
    }
}

fn policy(enabled: bool, severity: Severity) -> ContextConfig {
    ContextConfig::new(enabled, severity)
}

fn build_preset(preset: Preset) -> Configuration {
    let base = default_config();
    let (contexts, exceptions) = match preset {
        Preset::Strict => (
            Contexts {
                documentation: policy(true, Strict),
                console: policy(true, Strict),
                cli: policy(true, Strict),
                logging: policy(true, Strict),
                comments: policy(true, Strict),
                commit_messages: policy(true, Strict),
                user_interface: policy(true, Strict),
            },
            Some(Exceptions::default()),
        ),
        Preset::Moderate => (
            Contexts {
                documentation: policy(true, Moderate),
                console: policy(true, Moderate),
                cli: policy(true, Moderate),
                logging: policy(true, Strict),
                comments: policy(false, Relaxed),
                commit_messages: policy(true, Moderate),
                user_interface: policy(false, Relaxed),
            },
            base.exceptions.clone(),
        ),
        Preset::Relaxed => (
            Contexts {
                documentation: policy(true, Relaxed),
                console: policy(false, Relaxed),
                cli: policy(true, Relaxed),
                logging: policy(true, Strict),
                comments: policy(false, Relaxed),
                commit_messages: policy(false, Relaxed),
                user_interface: policy(false, Relaxed),
            },
            base.exceptions.clone(),
        ),
    };
    Configuration {
        contexts,
        exceptions,
        ..base.clone()
    }
}
