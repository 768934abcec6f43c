//! Plain-text rule listing, the body every wrapper format embeds.

use crate::models::config::{ContextName, Configuration};

struct Section {
    context: ContextName,
    heading: &'static str,
    default_rule: &'static str,
    bullets: &'static [&'static str],
}

// `userInterface` has no section: it only ever appears as an exception.
const SECTIONS: &[Section] = &[
    Section {
        context: ContextName::Documentation,
        heading: "DOCUMENTATION & MARKDOWN:",
        default_rule: "Do not use emojis in markdown files, README files, or documentation.",
        bullets: &[
            "- This includes headers, lists, paragraphs, and code examples.",
            "- Use clear, professional language without emoji decoration.",
        ],
    },
    Section {
        context: ContextName::Console,
        heading: "CONSOLE OUTPUT:",
        default_rule:
            "Do not use emojis in console.log, console.error, console.warn, or any console output.",
        bullets: &["- Use plain text for all terminal output."],
    },
    Section {
        context: ContextName::Cli,
        heading: "CLI TOOLS & COMMAND-LINE OUTPUT:",
        default_rule: "Do not use emojis in CLI tool output, progress bars, spinners, or command-line messages.",
        bullets: &["- Use ASCII characters and plain text only."],
    },
    Section {
        context: ContextName::Logging,
        heading: "LOGGING & ERROR MESSAGES:",
        default_rule: "Do not use emojis in application logs, error messages, debug output, or logging statements.",
        bullets: &["- Logs should be machine-parseable and professional."],
    },
    Section {
        context: ContextName::Comments,
        heading: "CODE COMMENTS:",
        default_rule: "Avoid using emojis in code comments.",
        bullets: &["- Write clear, descriptive comments using words only."],
    },
    Section {
        context: ContextName::CommitMessages,
        heading: "GIT COMMIT MESSAGES:",
        default_rule: "Do not use emojis in git commit messages.",
        bullets: &["- Use conventional commit format with plain text."],
    },
];

/// Render the plain rule listing.
///
/// # Returns
/// An empty string when the configuration is disabled, otherwise the
/// newline-joined listing.
pub fn generate_rules(config: &Configuration) -> String {
    if !config.enabled {
        return String::new();
    }

    let mut lines: Vec<String> = vec!["EMOJI USAGE RULES:".into(), String::new()];

    for section in SECTIONS {
        let policy = config.contexts.get(section.context);
        if !policy.enabled {
            continue;
        }
        lines.push(section.heading.into());
        lines.push(match policy.custom_message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => format!(
                "- {}: {}",
                policy.severity.as_str().to_ascii_uppercase(),
                section.default_rule
            ),
        });
        lines.extend(section.bullets.iter().map(|bullet| bullet.to_string()));
        lines.push(String::new());
    }

    let allowed_emojis = config.allowed_emojis();
    if !allowed_emojis.is_empty() {
        lines.push("EXCEPTIONS:".into());
        lines.push(format!(
            "- The following emojis are allowed: {}",
            allowed_emojis.join(", ")
        ));
        lines.push(String::new());
    }

    let allowed_contexts = config.allowed_contexts();
    if !allowed_contexts.is_empty() {
        lines.push("ALLOWED CONTEXTS:".into());
        lines.push(format!(
            "- Emojis may be used in: {}",
            allowed_contexts.join(", ")
        ));
        lines.push(String::new());
    }

    let custom_rules = config.custom_rules();
    if !custom_rules.is_empty() {
        lines.push("CUSTOM RULES:".into());
        lines.extend(custom_rules.iter().map(|rule| format!("- {}", rule)));
        lines.push(String::new());
    }

    lines.push(
        "REMEMBER: Professional code should prioritize clarity and consistency over decoration."
            .into(),
    );
    lines.push("When in doubt, do not use emojis.".into());

    lines.join("\n")
}
