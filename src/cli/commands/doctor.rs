//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{Settings, StoreProvider};
use crate::media::readable_size;
use console::style;
use std::path::Path;
use std::process::Command;

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

    /// Downgrade an error to a warning for optional requirements.
    fn optional(mut self) -> Self {
        if self.status == CheckStatus::Error {
            self.status = CheckStatus::Warning;
        }
        self
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
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Medley Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    section(
        "External Tools",
        vec![
            check_tool(&settings.downloader.ytdlp_binary, "--version", install_hint_ytdlp()),
            check_tool("ffmpeg", "-version", install_hint_ffmpeg()),
            check_tool("ffplay", "-version", install_hint_ffmpeg()).optional(),
            check_tool(
                &settings.speech.offline_engine,
                "--version",
                install_hint_espeak(),
            )
            .optional(),
        ],
        &mut checks,
    );

    section("API Configuration", vec![check_api_key(settings)], &mut checks);
    section("Directories", check_directories(settings), &mut checks);
    section("Cookie Files", check_cookies(settings), &mut checks);
    section("Configuration", vec![check_config_file(config_path)], &mut checks);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Medley.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Medley is ready to use.");
    }

    Ok(())
}

fn section(title: &str, results: Vec<CheckResult>, all: &mut Vec<CheckResult>) {
    println!("{}", style(title).bold());
    for check in &results {
        check.print();
    }
    println!();
    all.extend(results);
}

/// Check if an external tool is available.
fn check_tool(name: &str, version_arg: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok(name, &truncate(&version, 50))
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Check that the model API key is configured.
fn check_api_key(settings: &Settings) -> CheckResult {
    let var = &settings.api.api_key_env;
    let hint = format!("Set with: export {}='...'", var);
    match std::env::var(var) {
        Ok(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Ok(key) if key.chars().count() > 12 => {
            let chars: Vec<char> = key.chars().collect();
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            CheckResult::ok(var, &format!("configured ({}...{})", head, tail))
        }
        Ok(_) => CheckResult::warning(var, "set but looks too short", "Check the key value"),
        Err(_) => CheckResult::error(var, "not set", &hint),
    }
}

/// Check data, download and database locations.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for (name, dir) in [
        ("Data directory", settings.data_dir()),
        ("Download directory", settings.output_dir()),
    ] {
        if dir.is_dir() {
            results.push(CheckResult::ok(name, &dir.display().to_string()));
        } else {
            results.push(CheckResult::warning(
                name,
                &format!("{} (will be created)", dir.display()),
                "Directory will be created on first use",
            ));
        }
    }

    if settings.store.provider == StoreProvider::Memory {
        results.push(CheckResult::warning(
            "Conversation store",
            "memory (conversations are lost on restart)",
            "Use: medley config set store.provider sqlite",
        ));
        return results;
    }

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| readable_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Database",
            &format!("{} ({})", db_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Database",
            &format!("{} (not created yet)", db_path.display()),
            "Database will be created when the server starts",
        ));
    }

    results
}

/// Check the configured cookie files.
fn check_cookies(settings: &Settings) -> Vec<CheckResult> {
    [
        ("YouTube cookies", &settings.downloader.youtube_cookies),
        ("Instagram cookies", &settings.downloader.instagram_cookies),
    ]
    .into_iter()
    .map(|(name, configured)| match configured {
        None => CheckResult::ok(name, "not configured"),
        Some(path) => {
            let path = Settings::expand_path(path);
            if path.is_file() {
                CheckResult::ok(name, &path.display().to_string())
            } else {
                CheckResult::warning(
                    name,
                    &format!("{} (missing)", path.display()),
                    "Downloads continue without cookies; export them from your browser if needed",
                )
            }
        }
    })
    .collect()
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: medley config edit",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

/// Platform-specific install hint for espeak-ng.
fn install_hint_espeak() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install espeak-ng (only needed for offline speech)"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install espeak-ng (only needed for offline speech)"
    } else {
        "Install from: https://github.com/espeak-ng/espeak-ng (only needed for offline speech)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_optional_downgrades_errors() {
        let result = CheckResult::error("espeak-ng", "not found", "install it").optional();
        assert_eq!(result.status, CheckStatus::Warning);
        assert_eq!(result.hint, Some("install it".to_string()));
    }

    #[test]
    fn test_missing_tool_is_error() {
        let result = check_tool("medley-no-such-tool", "--version", "hint");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.message, "not found");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 50), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }

    #[test]
    fn test_cookie_checks() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("yt.txt");
        std::fs::write(&present, "# Netscape HTTP Cookie File").unwrap();

        let mut settings = Settings::default();
        settings.downloader.youtube_cookies = Some(present.display().to_string());
        settings.downloader.instagram_cookies = None;

        let results = check_cookies(&settings);
        assert_eq!(results[0].status, CheckStatus::Ok);
        assert_eq!(results[1].message, "not configured");

        settings.downloader.youtube_cookies =
            Some(dir.path().join("gone.txt").display().to_string());
        assert_eq!(check_cookies(&settings)[0].status, CheckStatus::Warning);
    }
}
