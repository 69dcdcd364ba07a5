//! Re-runs the failed command to capture what it printed.

use crate::config::Settings;
use crate::errors::HeckError;
use anyhow::Result;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command as ProcessCommand;
use tracing::{debug, warn};

/// Joins the raw CLI words into one script.
///
/// Fails with [`HeckError::EmptyCommand`] when nothing but whitespace is left.
pub fn format_raw_script(raw: &[String]) -> Result<String, HeckError> {
    let script = raw.join(" ").trim().to_string();
    if script.is_empty() {
        return Err(HeckError::EmptyCommand);
    }
    Ok(script)
}

/// Runs `script` through `sh -c` and returns its stdout followed by stderr.
///
/// The child gets `settings.env` on top of the inherited environment and no
/// stdin. Returns `None` when it outlives its wait budget, in which case the
/// child is killed.
pub async fn get_output(script: &str, settings: &Settings) -> Result<Option<String>> {
    let budget = settings.wait_budget(script);
    let started = Instant::now();

    let child = ProcessCommand::new("sh")
        .arg("-c")
        .arg(script)
        .envs(&settings.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let output = match tokio::time::timeout(budget, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            warn!("Execution timed out after {:?}: {}", budget, script);
            return Ok(None);
        }
    };

    debug!(
        "Received output of `{}` in {:?} (status {})",
        script,
        started.elapsed(),
        output.status
    );

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(Some(combined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn words(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_format_raw_script_joins_and_trims() {
        assert_eq!(format_raw_script(&words(&["git", "brnch"])).unwrap(), "git brnch");
        assert_eq!(format_raw_script(&words(&[" ls ", "-la "])).unwrap(), "ls  -la");
    }

    #[test]
    fn test_format_raw_script_rejects_empty() {
        assert_eq!(format_raw_script(&[]), Err(HeckError::EmptyCommand));
        assert_eq!(format_raw_script(&words(&["  ", ""])), Err(HeckError::EmptyCommand));
    }

    #[tokio::test]
    async fn test_get_output_captures_stdout_and_stderr() {
        let output = get_output("echo out; echo err 1>&2", &Settings::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output, "out\nerr\n");
    }

    #[tokio::test]
    async fn test_get_output_passes_settings_env() {
        let output = get_output("echo $LANG", &Settings::default()).await.unwrap().unwrap();
        assert_eq!(output, "C\n");
    }

    #[tokio::test]
    async fn test_get_output_of_failing_command() {
        let output = get_output("echo nope 1>&2; exit 3", &Settings::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output, "nope\n");
    }

    #[tokio::test]
    async fn test_get_output_times_out() {
        let settings = Settings {
            wait_command: 0.2,
            ..Settings::default()
        };
        let started = Instant::now();

        let output = get_output("sleep 5", &settings).await.unwrap();

        assert_eq!(output, None);
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
