//! External tool invocation with a timeout
//!
//! Both external collaborators (the AIK unpacker and git) are driven
//! through their CLI and treated as opaque.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Spawn(String),
    #[error("{0}")]
    Failed(String),
    #[error("Operation timed out")]
    Timeout,
}

pub(crate) async fn run_command(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    timeout_duration: Duration,
) -> Result<Output, CommandError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    tracing::debug!("Running {} {:?}", program, args);

    let output = match timeout(timeout_duration, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(CommandError::Spawn(format!(
                "Failed to run {}: {}",
                program, e
            )))
        }
        Err(_) => return Err(CommandError::Timeout),
    };

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommandError::Failed(format!(
            "{} {:?} failed (code {:?}). stdout: '{}' stderr: '{}'",
            program,
            args,
            output.status.code(),
            stdout.trim(),
            stderr.trim()
        )));
    }

    Ok(output)
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable shell script standing in for an external tool
    pub(crate) fn write_script(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write script");
        let mut perms = fs::metadata(&path)
            .expect("read script metadata")
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set script permissions");
        path
    }
}
