//! Cursor project rule (`.cursor/rules/nomoji.mdc`).

use crate::models::config::{ContextName, Configuration, Severity};

struct StrictBlock {
    context: ContextName,
    heading: &'static str,
    items: &'static [&'static str],
    closing: &'static str,
}

const STRICT_BLOCKS: &[StrictBlock] = &[
    StrictBlock {
        context: ContextName::Documentation,
        heading: "### Documentation & Markdown",
        items: &[
            "README files",
            "Markdown documentation",
            "API documentation",
            "Code examples in docs",
            "Headers, lists, or paragraphs",
        ],
        closing: "Use clear, professional language without emoji decoration.",
    },
    StrictBlock {
        context: ContextName::Console,
        heading: "### Console Output",
        items: &[
            "`console.log()`, `console.error()`, `console.warn()`",
            "Terminal output",
            "Standard output/error streams",
            "Debug messages",
        ],
        closing: "Use plain text for all terminal output.",
    },
    StrictBlock {
        context: ContextName::Cli,
        heading: "### CLI Tools & Command-Line Output",
        items: &[
            "Command-line interface output",
            "Progress bars",
            "Spinners",
            "Status messages",
            "Help text",
        ],
        closing: "Use ASCII characters and plain text only.",
    },
    StrictBlock {
        context: ContextName::Logging,
        heading: "### Logging & Error Messages",
        items: &[
            "Application logs",
            "Error messages",
            "Debug output",
            "Logging statements",
            "Stack traces",
        ],
        closing: "Logs should be machine-parseable and professional.",
    },
    StrictBlock {
        context: ContextName::Comments,
        heading: "### Code Comments",
        items: &[
            "Inline comments",
            "JSDoc/TSDoc comments",
            "Docstrings",
            "Code documentation",
        ],
        closing: "Write clear, descriptive comments using words only.",
    },
    StrictBlock {
        context: ContextName::CommitMessages,
        heading: "### Git Commit Messages",
        items: &["Commit messages", "PR titles and descriptions", "Branch names"],
        closing: "Use conventional commit format with plain text.",
    },
];

const RATIONALE: &[&str] = &[
    "## Rationale",
    "",
    "Emojis in code and documentation:",
    "- Reduce accessibility for screen readers",
    "- Create inconsistent rendering across platforms",
    "- Make text harder to search and parse programmatically",
    "- Appear unprofessional in enterprise contexts",
    "- Clutter console output and logs",
    "",
    "## Configuration",
    "",
    "Generated from: https://nomoji.dev",
    "Update your rules at: https://nomoji.dev/configure",
    "",
    "---",
    "",
    "**Remember**: Professional code should prioritize clarity and consistency over decoration. When in doubt, do not use emojis.",
];

/// Render the Cursor `.mdc` rule file.
pub fn generate_cursor_rules(config: &Configuration) -> String {
    let mut lines: Vec<String> = vec![
        format!(
            "---\ntitle: nomoji.dev - Emoji Control Rules\nversion: {}\npriority: high\ndescription: Control emoji usage in AI-generated code and documentation\n---",
            config.version
        ),
        String::new(),
        "# Emoji Usage Rules".into(),
        String::new(),
        "This project enforces professional, emoji-free code and documentation.".into(),
        String::new(),
        "## Strict Contexts".into(),
        String::new(),
    ];

    for block in STRICT_BLOCKS {
        if !config.contexts.get(block.context).enabled {
            continue;
        }
        lines.push(block.heading.into());
        lines.push("Do not use emojis in:".into());
        lines.extend(block.items.iter().map(|item| format!("- {}", item)));
        lines.push(String::new());
        lines.push(block.closing.into());
        lines.push(String::new());
    }

    let relaxed: Vec<_> = config
        .contexts
        .iter()
        .filter(|(_, policy)| !policy.enabled || policy.severity == Severity::Relaxed)
        .collect();
    if !relaxed.is_empty() {
        lines.push("## Relaxed Contexts".into());
        lines.push(String::new());
        for (name, policy) in relaxed {
            lines.push(format!("### {}", name.title()));
            lines.push(match policy.custom_message.as_deref() {
                Some(message) if !message.is_empty() => message.to_string(),
                _ => "Emojis may be used when appropriate.".to_string(),
            });
            lines.push(String::new());
        }
    }

    lines.extend(RATIONALE.iter().map(|line| line.to_string()));
    lines.join("\n")
}
