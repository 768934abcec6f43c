//! Rendering a [`Configuration`] into assistant instruction files.
//!
//! Every format is a pure function of the configuration. The only format
//! that embeds a time is the deprecated `.cursorrules` notice, and it takes
//! that time as an argument.

mod assistants;
mod claude;
mod cursor;
mod plain;

pub use claude::generate_claude_subagent;
pub use cursor::generate_cursor_rules;
pub use plain::generate_rules;

use crate::error::AppError;
use crate::models::config::Configuration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A renderable output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Plain,
    ClaudeSubagent,
    CursorMdc,
    Copilot,
    Gemini,
    OpenAi,
    OpenAiCodex,
    Generic,
    Json,
    LegacyCursorRules,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 10] = [
        Self::Plain,
        Self::ClaudeSubagent,
        Self::CursorMdc,
        Self::Copilot,
        Self::Gemini,
        Self::OpenAi,
        Self::OpenAiCodex,
        Self::Generic,
        Self::Json,
        Self::LegacyCursorRules,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::ClaudeSubagent => "claude-subagent",
            Self::CursorMdc => "cursor-mdc",
            Self::Copilot => "copilot",
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::OpenAiCodex => "openai-codex",
            Self::Generic => "generic",
            Self::Json => "json",
            Self::LegacyCursorRules => "cursorrules",
        }
    }

    /// `Content-Type` header value for the rendered body.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Plain | Self::Generic | Self::LegacyCursorRules => "text/plain; charset=utf-8",
            Self::Json => "application/json",
            _ => "text/markdown; charset=utf-8",
        }
    }

    /// Suggested file name for downloads.
    pub fn filename(self) -> &'static str {
        match self {
            Self::Plain | Self::Generic => "nomoji-rules.txt",
            Self::ClaudeSubagent | Self::CursorMdc => "nomoji.mdc",
            Self::Copilot => "copilot-instructions.md",
            Self::Gemini => "GEMINI.md",
            Self::OpenAi => "nomoji-openai.md",
            Self::OpenAiCodex => "AGENTS.md",
            Self::Json => "nomoji.json",
            Self::LegacyCursorRules => ".cursorrules",
        }
    }

    /// `Content-Disposition` for formats served as downloads.
    pub fn content_disposition(self) -> Option<&'static str> {
        match self {
            Self::ClaudeSubagent | Self::CursorMdc => Some("attachment; filename=\"nomoji.mdc\""),
            Self::LegacyCursorRules => Some("attachment; filename=\".cursorrules\""),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name() == value)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown output format '{}'.", value)))
    }
}

/// Assistant names accepted by the template route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assistant {
    Claude,
    Cursor,
    Copilot,
    Gemini,
    OpenAi,
    OpenAiCodex,
    Codeium,
    Tabnine,
    Generic,
}

impl Assistant {
    pub const ALL: [Assistant; 9] = [
        Self::Claude,
        Self::Cursor,
        Self::Copilot,
        Self::Gemini,
        Self::OpenAi,
        Self::OpenAiCodex,
        Self::Codeium,
        Self::Tabnine,
        Self::Generic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Cursor => "cursor",
            Self::Copilot => "copilot",
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::OpenAiCodex => "openai-codex",
            Self::Codeium => "codeium",
            Self::Tabnine => "tabnine",
            Self::Generic => "generic",
        }
    }

    /// Format served for this assistant.
    pub fn format(self) -> OutputFormat {
        match self {
            Self::Claude => OutputFormat::ClaudeSubagent,
            Self::Cursor => OutputFormat::CursorMdc,
            Self::Copilot => OutputFormat::Copilot,
            Self::Gemini => OutputFormat::Gemini,
            Self::OpenAi => OutputFormat::OpenAi,
            Self::OpenAiCodex => OutputFormat::OpenAiCodex,
            Self::Codeium | Self::Tabnine | Self::Generic => OutputFormat::Generic,
        }
    }
}

impl FromStr for Assistant {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|assistant| assistant.name() == value)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|a| a.name()).collect();
                AppError::BadRequest(format!(
                    "Invalid assistant. Must be one of: {}.",
                    names.join(", ")
                ))
            })
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    nomoji: JsonBody<'a>,
}

#[derive(Serialize)]
struct JsonBody<'a> {
    version: &'a str,
    enabled: bool,
    rules: String,
    config: &'a Configuration,
}

/// Pretty-printed `{"nomoji": {version, enabled, rules, config}}` document.
///
/// # Errors
/// Returns [`AppError::Json`] if serialization fails.
pub fn generate_json(config: &Configuration) -> Result<String, AppError> {
    let document = JsonDocument {
        nomoji: JsonBody {
            version: &config.version,
            enabled: config.enabled,
            rules: generate_rules(config),
            config,
        },
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Render `config` in `format`.
///
/// # Arguments
/// - `config`: Configuration to render.
/// - `format`: Target format.
/// - `generated_at`: Stamp for formats that embed a generation time.
///
/// # Returns
/// The rendered document.
///
/// # Errors
/// Only the JSON format can fail, on serialization.
pub fn render(
    config: &Configuration,
    format: OutputFormat,
    generated_at: DateTime<Utc>,
) -> Result<String, AppError> {
    let rendered = match format {
        OutputFormat::Plain | OutputFormat::Generic => generate_rules(config),
        OutputFormat::ClaudeSubagent => generate_claude_subagent(config),
        OutputFormat::CursorMdc => generate_cursor_rules(config),
        OutputFormat::Copilot => assistants::copilot(&generate_rules(config)),
        OutputFormat::Gemini => assistants::gemini(config, &generate_rules(config)),
        OutputFormat::OpenAi => assistants::openai(config, &generate_rules(config)),
        OutputFormat::OpenAiCodex => assistants::openai_codex(config, &generate_rules(config)),
        OutputFormat::Json => generate_json(config)?,
        OutputFormat::LegacyCursorRules => assistants::legacy_cursorrules(config, generated_at),
    };
    Ok(rendered)
}
