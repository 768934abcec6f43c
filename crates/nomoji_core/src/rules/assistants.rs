//! Wrappers that embed the plain listing in assistant-specific instructions.

use crate::models::config::Configuration;
use crate::models::timestamp;
use chrono::{DateTime, Utc};

fn enabled_label(config: &Configuration) -> &'static str {
    if config.enabled {
        "Enabled"
    } else {
        "Disabled"
    }
}

fn footer(config: &Configuration) -> String {
    format!(
        "---\n\nGenerated from: https://nomoji.dev\nConfiguration: {}\nVersion: {}",
        enabled_label(config),
        config.version
    )
}

pub fn copilot(rules: &str) -> String {
    format!(
        "# Emoji Usage Guidelines\n\n{}\n\nPlease adhere to these rules when generating suggestions.",
        rules
    )
}

pub fn gemini(config: &Configuration, rules: &str) -> String {
    format!(
        "# Emoji Usage Rules\n\n{rules}\n\n{footer}\n\n\
         This configuration enforces professional, emoji-free code and documentation across all contexts.\n\
         For questions or to customize these rules, visit https://nomoji.dev",
        rules = rules,
        footer = footer(config),
    )
}

const OPENAI_GUIDELINES: &str = "## Important Guidelines

- Never use emojis in any code generation
- Keep all output professional and accessible
- Use clear, descriptive text instead of decorative characters
- This applies to all programming languages and contexts
- When generating documentation, use plain text formatting

## Reasoning Models

If using o1, o3-mini, or o3-mini-high models, these guidelines will be strictly enforced due to enhanced reasoning capabilities.";

pub fn openai(config: &Configuration, rules: &str) -> String {
    format!(
        "# OpenAI API - System Instructions\n\n\
         You are a professional coding assistant that generates clean, emoji-free code.\n\n\
         {rules}\n\n{guidelines}\n\n{footer}",
        rules = rules,
        guidelines = OPENAI_GUIDELINES,
        footer = footer(config),
    )
}

const CODEX_GUIDELINES: &str = r#"## Codex-Specific Guidelines

When working in terminal or IDE contexts:
- All code generation must be emoji-free
- Console output should use plain ASCII characters
- Error messages and logs must not contain emojis
- Git commit messages should be professional and clear
- Code comments should use descriptive text only
- Progress indicators should use ASCII (e.g., "[OK]" not "✓")

## File Operations

When creating or modifying files:
- Documentation: No emojis in markdown headers or content
- README files: Use plain text formatting
- Configuration files: Keep all output machine-readable
- Test files: Use descriptive assertions without emoji decoration

## Integration Context

Codex operates in ChatGPT Plus, Pro, Business, Edu, and Enterprise plans. These rules ensure:
- Professional output across all team interactions
- Accessibility for screen readers and CI/CD tools
- Consistent cross-platform rendering
- Clean git history and logs"#;

pub fn openai_codex(config: &Configuration, rules: &str) -> String {
    format!(
        "# OpenAI Codex Configuration\n\n{rules}\n\n{guidelines}\n\n{footer}\n\n\
         To configure Codex with these rules, use: npx @openai/codex config --system-instructions <this-file>",
        rules = rules,
        guidelines = CODEX_GUIDELINES,
        footer = footer(config),
    )
}

/// Deprecated single-file Cursor format pointing at its replacement.
pub fn legacy_cursorrules(config: &Configuration, generated_at: DateTime<Utc>) -> String {
    format!(
        "# DEPRECATED: This file format is outdated\n\
         # Modern Cursor uses .cursor/rules/ directory\n\
         # See .cursor/rules/nomoji.mdc for current rules\n\n\
         Please download the new format at: https://nomoji.dev/api/cursor-rules/default\n\n\
         Generated: {}\nVersion: {}\n",
        timestamp::format(&generated_at),
        config.version
    )
}
