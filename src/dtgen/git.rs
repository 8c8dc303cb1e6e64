//! Snapshot of a generated tree in a fresh git repository

use std::path::Path;
use std::time::Duration;

use super::command::run_command;
use super::error::{DtgenError, Result};
use super::options::GitOptions;

/// Identity used when the user has none configured
const FALLBACK_NAME: &str = "recovery-dtgen";
const FALLBACK_EMAIL: &str = "recovery-dtgen@localhost";

async fn git(options: &GitOptions, dir: &Path, args: &[&str]) -> Result<String> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let output = run_command(
        &options.git_path,
        &args,
        Some(dir),
        Duration::from_secs(options.timeout_secs),
    )
    .await
    .map_err(|e| DtgenError::Git(e.to_string()))?;

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether `git config <key>` yields a non-empty value in `dir`
async fn has_config(options: &GitOptions, dir: &Path, key: &str) -> bool {
    matches!(git(options, dir, &["config", key]).await, Ok(value) if !value.is_empty())
}

/// Initialise a repository in `dir`, stage everything and commit it
pub async fn commit_all(options: &GitOptions, dir: &Path, message: &str) -> Result<()> {
    tracing::info!("Creating git repo...");
    git(options, dir, &["init", "-q"]).await?;
    git(options, dir, &["add", "-A"]).await?;

    let mut args: Vec<String> = Vec::new();
    let has_identity =
        has_config(options, dir, "user.email").await && has_config(options, dir, "user.name").await;
    if !has_identity {
        tracing::debug!("No git identity configured, committing as {}", FALLBACK_NAME);
        args.extend([
            "-c".to_string(),
            format!("user.name={}", FALLBACK_NAME),
            "-c".to_string(),
            format!("user.email={}", FALLBACK_EMAIL),
        ]);
    }
    args.extend(["commit".to_string(), "-q".to_string(), "-m".to_string(), message.to_string()]);

    run_command(
        &options.git_path,
        &args,
        Some(dir),
        Duration::from_secs(options.timeout_secs),
    )
    .await
    .map_err(|e| DtgenError::Git(e.to_string()))?;

    Ok(())
}
