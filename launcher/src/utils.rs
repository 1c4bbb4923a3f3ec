use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Run a command and return the output
pub fn run_command(program: &str, args: &[&str]) -> Result<std::process::Output> {
    log::debug!("Running command: {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to execute: {} {}", program, args.join(" ")))?;

    log::debug!("Command exit status: {}", output.status);
    if !output.stdout.is_empty() {
        log::debug!("stdout: {}", String::from_utf8_lossy(&output.stdout));
    }
    if !output.stderr.is_empty() {
        log::debug!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }

    Ok(output)
}

/// Run a command and return stdout if it exits successfully
pub fn command_stdout(program: &str, args: &[&str]) -> Result<String> {
    let output = run_command(program, args)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "Command failed: {} {}\nError: {}",
            program,
            args.join(" "),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_stdout_success_and_failure() {
        assert_eq!(command_stdout("sh", &["-c", "printf hello"]).unwrap(), "hello");

        let err = command_stdout("sh", &["-c", "echo boom >&2; exit 3"]).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_missing_command_does_not_exist() {
        assert!(!command_exists("definitely-not-a-real-command-1234"));
    }
}
