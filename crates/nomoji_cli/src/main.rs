//! Command-line client for nomoji: local emoji checks and API access.

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use nomoji_core::emoji;
use nomoji_core::DEFAULT_CLI_SERVER_URL;
use serde_json::Value;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "nomoji", about = "Emoji policy checks and rules for AI assistants", version)]
struct Cli {
    /// Server URL (can also be set via NOMOJI_SERVER env var)
    #[arg(short, long, env = "NOMOJI_SERVER", global = true)]
    server: Option<String>,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30", global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Scan files (or stdin) for emojis; exits 1 when any are not allowed
    Check {
        /// Files to scan; reads stdin when omitted
        files: Vec<PathBuf>,
        /// Emoji to permit (repeatable)
        #[arg(short, long = "allow")]
        allow: Vec<String>,
    },
    /// Download rendered rules for a user
    Rules {
        user_id: String,
        #[arg(short, long, value_enum, default_value_t = RulesFormat::Plain)]
        format: RulesFormat,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a named preset (strict, moderate, relaxed) to a user
    Preset { user_id: String, name: String },
    /// Print a user's configuration as JSON
    Config { user_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RulesFormat {
    Plain,
    Claude,
    Cursor,
    Copilot,
    Gemini,
    Openai,
    OpenaiCodex,
    Json,
}

impl RulesFormat {
    /// API path segments for this format.
    fn segments<'a>(self, user_id: &'a str) -> Vec<&'a str> {
        match self {
            Self::Plain => vec!["api", "rules", user_id],
            Self::Claude => vec!["api", "claude", user_id],
            Self::Cursor => vec!["api", "cursor-rules", user_id],
            Self::Json => vec!["api", "json", user_id],
            Self::Copilot => vec!["api", "template", user_id, "copilot"],
            Self::Gemini => vec!["api", "template", user_id, "gemini"],
            Self::Openai => vec!["api", "template", user_id, "openai"],
            Self::OpenaiCodex => vec!["api", "template", user_id, "openai-codex"],
        }
    }
}

/// One line containing emojis that are not allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Finding {
    line: usize,
    emojis: Vec<String>,
}

fn scan_text(text: &str, allowed: &[String]) -> Vec<Finding> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let emojis = emoji::analyze(line).disallowed(allowed);
            (!emojis.is_empty()).then(|| Finding {
                line: index + 1,
                emojis,
            })
        })
        .collect()
}

fn format_finding(label: &str, finding: &Finding) -> String {
    format!("{}:{}: {}", label, finding.line, finding.emojis.join(" "))
}

fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

async fn ensure_success(res: reqwest::Response, action: &str) -> anyhow::Result<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => format!("failed to read error response body: {}", err),
    };
    anyhow::bail!(
        "{} failed ({}): {}",
        action,
        status,
        error_message_for_response(status, &body)
    )
}

fn api_url(server: &str, segments: &[&str]) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(server)
        .map_err(|err| format!("Invalid server URL '{}': {}", server, err))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| "Server URL cannot be used as an API base".to_string())?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

fn resolve_server(server: Option<String>) -> String {
    let chosen = server
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CLI_SERVER_URL.to_string());
    chosen.trim_end_matches('/').to_string()
}

fn run_check(files: &[PathBuf], allowed: &[String]) -> anyhow::Result<ExitCode> {
    let mut inputs = Vec::new();
    if files.is_empty() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        inputs.push(("<stdin>".to_string(), buffer));
    } else {
        for path in files {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            inputs.push((path.display().to_string(), text));
        }
    }

    let mut violations = 0;
    for (label, text) in &inputs {
        for finding in scan_text(text, allowed) {
            println!("{}", format_finding(label, &finding));
            violations += 1;
        }
    }

    if violations == 0 {
        return Ok(ExitCode::SUCCESS);
    }
    eprintln!("{} line(s) contain disallowed emojis", violations);
    Ok(ExitCode::FAILURE)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let Cli {
        server,
        timeout,
        command,
    } = Cli::parse();

    match &command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Check { files, allow } => return run_check(files, allow),
        _ => {}
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()?;
    let server = resolve_server(server);

    match command {
        Commands::Completions { .. } | Commands::Check { .. } => {}
        Commands::Rules {
            user_id,
            format,
            output,
        } => {
            let url = api_url(&server, &format.segments(&user_id)).map_err(anyhow::Error::msg)?;
            let res = ensure_success(client.get(url).send().await?, "Rules").await?;
            let body = res.text().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &body)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", body),
            }
        }
        Commands::Preset { user_id, name } => {
            let url = api_url(
                &server,
                &["api", "config", user_id.as_str(), "preset", name.as_str()],
            )
            .map_err(anyhow::Error::msg)?;
            let res = ensure_success(client.post(url).send().await?, "Preset").await?;
            let response: Value = res.json().await?;
            let message = response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Preset applied");
            println!("{}", message);
        }
        Commands::Config { user_id } => {
            let url = api_url(&server, &["api", "config", user_id.as_str()])
                .map_err(anyhow::Error::msg)?;
            let res = ensure_success(client.get(url).send().await?, "Config").await?;
            let response: Value = res.json().await?;
            let data = response.get("data").unwrap_or(&response);
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
