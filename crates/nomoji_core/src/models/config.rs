//! Emoji-policy configuration documents.
//!
//! A [`Configuration`] is the unit stored per user and per share. Writes
//! arrive as a [`ConfigUpdate`], a partial document that is shallow-merged
//! over the existing record by [`Configuration::merged`].

use super::presets::default_config;
use chrono::{DateTime, Utc};
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// How firmly a context's rule is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Disallow.
    Strict,
    /// Discourage.
    Moderate,
    /// Allow.
    Relaxed,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Relaxed => "relaxed",
        }
    }

    /// Ordering weight, higher is stricter.
    pub fn rank(self) -> u8 {
        match self {
            Self::Strict => 2,
            Self::Moderate => 1,
            Self::Relaxed => 0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The seven places an assistant might emit emojis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextName {
    Documentation,
    Console,
    Cli,
    Logging,
    Comments,
    CommitMessages,
    UserInterface,
}

impl ContextName {
    /// All contexts in document order.
    pub const ALL: [ContextName; 7] = [
        Self::Documentation,
        Self::Console,
        Self::Cli,
        Self::Logging,
        Self::Comments,
        Self::CommitMessages,
        Self::UserInterface,
    ];

    /// JSON key, e.g. `commitMessages`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Documentation => "documentation",
            Self::Console => "console",
            Self::Cli => "cli",
            Self::Logging => "logging",
            Self::Comments => "comments",
            Self::CommitMessages => "commitMessages",
            Self::UserInterface => "userInterface",
        }
    }

    /// Lower-case words, e.g. `commit messages`.
    pub fn spaced(self) -> &'static str {
        match self {
            Self::CommitMessages => "commit messages",
            Self::UserInterface => "user interface",
            other => other.key(),
        }
    }

    /// Heading form, e.g. `Commit Messages`.
    pub fn title(self) -> &'static str {
        match self {
            Self::Documentation => "Documentation",
            Self::Console => "Console",
            Self::Cli => "Cli",
            Self::Logging => "Logging",
            Self::Comments => "Comments",
            Self::CommitMessages => "Commit Messages",
            Self::UserInterface => "User Interface",
        }
    }
}

/// Policy for a single context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContextConfig {
    pub enabled: bool,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

impl ContextConfig {
    pub(crate) fn new(enabled: bool, severity: Severity) -> Self {
        Self {
            enabled,
            severity,
            custom_message: None,
        }
    }

    pub(crate) fn with_message(mut self, message: &str) -> Self {
        self.custom_message = Some(message.to_string());
        self
    }
}

/// The full set of per-context policies. Always holds all seven entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Contexts {
    pub documentation: ContextConfig,
    pub console: ContextConfig,
    pub cli: ContextConfig,
    pub logging: ContextConfig,
    pub comments: ContextConfig,
    pub commit_messages: ContextConfig,
    pub user_interface: ContextConfig,
}

impl Contexts {
    /// Borrow the policy for `name`.
    pub fn get(&self, name: ContextName) -> &ContextConfig {
        match name {
            ContextName::Documentation => &self.documentation,
            ContextName::Console => &self.console,
            ContextName::Cli => &self.cli,
            ContextName::Logging => &self.logging,
            ContextName::Comments => &self.comments,
            ContextName::CommitMessages => &self.commit_messages,
            ContextName::UserInterface => &self.user_interface,
        }
    }

    /// Iterate `(name, policy)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (ContextName, &ContextConfig)> + '_ {
        ContextName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }

    /// Names of enabled contexts in document order.
    pub fn enabled(&self) -> impl Iterator<Item = ContextName> + '_ {
        self.iter()
            .filter(|(_, policy)| policy.enabled)
            .map(|(name, _)| name)
    }
}

/// A `contexts` object as sent by clients; any subset of the seven keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialContexts {
    #[serde(default, deserialize_with = "non_null")]
    pub documentation: Option<ContextConfig>,
    #[serde(default, deserialize_with = "non_null")]
    pub console: Option<ContextConfig>,
    #[serde(default, deserialize_with = "non_null")]
    pub cli: Option<ContextConfig>,
    #[serde(default, deserialize_with = "non_null")]
    pub logging: Option<ContextConfig>,
    #[serde(default, deserialize_with = "non_null")]
    pub comments: Option<ContextConfig>,
    #[serde(default, deserialize_with = "non_null")]
    pub commit_messages: Option<ContextConfig>,
    #[serde(default, deserialize_with = "non_null")]
    pub user_interface: Option<ContextConfig>,
}

impl PartialContexts {
    /// Complete the map, taking missing entries from `fallback`.
    pub fn fill_from(self, fallback: &Contexts) -> Contexts {
        Contexts {
            documentation: self
                .documentation
                .unwrap_or_else(|| fallback.documentation.clone()),
            console: self.console.unwrap_or_else(|| fallback.console.clone()),
            cli: self.cli.unwrap_or_else(|| fallback.cli.clone()),
            logging: self.logging.unwrap_or_else(|| fallback.logging.clone()),
            comments: self.comments.unwrap_or_else(|| fallback.comments.clone()),
            commit_messages: self
                .commit_messages
                .unwrap_or_else(|| fallback.commit_messages.clone()),
            user_interface: self
                .user_interface
                .unwrap_or_else(|| fallback.user_interface.clone()),
        }
    }
}

impl From<Contexts> for PartialContexts {
    fn from(value: Contexts) -> Self {
        Self {
            documentation: Some(value.documentation),
            console: Some(value.console),
            cli: Some(value.cli),
            logging: Some(value.logging),
            comments: Some(value.comments),
            commit_messages: Some(value.commit_messages),
            user_interface: Some(value.user_interface),
        }
    }
}

/// Emojis and contexts exempt from the rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Exceptions {
    #[serde(default)]
    pub allowed_emojis: Vec<String>,
    #[serde(default)]
    pub allowed_contexts: Vec<String>,
}

/// Bookkeeping stamped by the store, never trusted from clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "super::timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, alias = "ownerId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A complete emoji-policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Configuration {
    pub version: String,
    pub enabled: bool,
    pub contexts: Contexts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<Exceptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rules: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Partial document accepted by configuration writes.
///
/// Absent fields keep their stored value; an explicit `null` is rejected.
/// `metadata` is tolerated so clients can post back what they read, but its
/// content is discarded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigUpdate {
    #[serde(default, deserialize_with = "non_null")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "non_null")]
    pub contexts: Option<PartialContexts>,
    #[serde(default, deserialize_with = "non_null")]
    pub exceptions: Option<Exceptions>,
    #[serde(default, deserialize_with = "non_null")]
    pub custom_rules: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<IgnoredAny>,
}

/// Deserialize a present field, refusing `null`. Pair with `#[serde(default)]`
/// so an absent field still yields `None`.
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)?
        .map(Some)
        .ok_or_else(|| de::Error::custom("must not be null"))
}

impl Configuration {
    /// Shallow-merge `update` over `base`.
    ///
    /// Each top-level field present in `update` replaces the one in `base`.
    /// A present `contexts` replaces the whole map; keys it omits come from
    /// the default template, not from `base`. Metadata is carried over from
    /// `base` untouched.
    ///
    /// # Returns
    /// The merged document.
    pub fn merged(base: &Configuration, update: ConfigUpdate) -> Configuration {
        let contexts = match update.contexts {
            Some(partial) => partial.fill_from(&default_config().contexts),
            None => base.contexts.clone(),
        };
        Configuration {
            version: update.version.unwrap_or_else(|| base.version.clone()),
            enabled: update.enabled.unwrap_or(base.enabled),
            contexts,
            exceptions: update.exceptions.or_else(|| base.exceptions.clone()),
            custom_rules: update.custom_rules.or_else(|| base.custom_rules.clone()),
            metadata: base.metadata.clone(),
        }
    }

    /// Allowed-emoji exceptions, empty when none are configured.
    pub fn allowed_emojis(&self) -> &[String] {
        self.exceptions
            .as_ref()
            .map(|exceptions| exceptions.allowed_emojis.as_slice())
            .unwrap_or_default()
    }

    /// Allowed-context exceptions, empty when none are configured.
    pub fn allowed_contexts(&self) -> &[String] {
        self.exceptions
            .as_ref()
            .map(|exceptions| exceptions.allowed_contexts.as_slice())
            .unwrap_or_default()
    }

    /// Custom rules, empty when none are configured.
    pub fn custom_rules(&self) -> &[String] {
        self.custom_rules.as_deref().unwrap_or_default()
    }

    /// The strictest severity among enabled contexts, `relaxed` when none are enabled.
    pub fn strictest_severity(&self) -> Severity {
        self.contexts
            .iter()
            .filter(|(_, policy)| policy.enabled)
            .map(|(_, policy)| policy.severity)
            .max_by_key(|severity| severity.rank())
            .unwrap_or(Severity::Relaxed)
    }
}
