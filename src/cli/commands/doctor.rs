//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::{Settings, YOUTUBE_API_KEY_ENV};
use console::style;
use std::path::{Path, PathBuf};

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    Output::header("Skriv Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_checks = vec![
        check_openai_api_key(std::env::var("OPENAI_API_KEY").ok()),
        check_youtube_api_key(settings),
    ];
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);
    let config_checks = vec![check_config_file(&config_path), check_prompt_dir(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    println!("{}", style("Models").bold());
    Output::kv("Extraction", &settings.extraction.model);
    Output::kv("Blog", &settings.blog.model);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Skriv.",
            errors
        ));
        anyhow::bail!("{} doctor check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Skriv is ready to use.");
    }

    Ok(())
}

/// Check the OpenAI API key taken from the environment.
fn check_openai_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(&key)))
        }
        Some(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Keep the first seven and last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check that a YouTube Data API key is available and report where it came from.
fn check_youtube_api_key(settings: &Settings) -> CheckResult {
    let from_config = settings
        .youtube
        .api_key
        .as_deref()
        .is_some_and(|k| !k.is_empty());

    match settings.youtube_api_key() {
        Some(_) if from_config => CheckResult::ok("YouTube API key", "configured (config file)"),
        Some(_) => CheckResult::ok(
            "YouTube API key",
            &format!("configured ({})", YOUTUBE_API_KEY_ENV),
        ),
        None => CheckResult::error(
            "YouTube API key",
            "not set",
            &format!(
                "Set with: export {}='...' or skriv config set youtube.api_key ...",
                YOUTUBE_API_KEY_ENV
            ),
        ),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: skriv config set <key> <value>",
        )
    }
}

/// Check the custom prompt directory, if one is configured.
fn check_prompt_dir(settings: &Settings) -> CheckResult {
    let Some(dir) = settings.prompts.custom_dir.as_deref() else {
        return CheckResult::ok("Prompts", "built-in");
    };

    let path = Settings::expand_path(dir);
    if path.is_dir() {
        CheckResult::ok("Prompts", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            "Prompts",
            &format!("{} not found, using built-in prompts", path.display()),
            "Create the directory with extraction.toml and/or blog.toml",
        )
    }
}
