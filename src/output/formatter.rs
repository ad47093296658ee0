use std::path::Path;
use std::process::Command;

/// External command used to format the generated file; the file path is
/// appended as the last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterCommand {
    /// Program to run.
    pub program: String,
    /// Arguments placed before the file path.
    pub args: Vec<String>,
}

impl Default for FormatterCommand {
    fn default() -> Self {
        Self {
            program: "uv".to_string(),
            args: vec!["run".to_string(), "ruff".to_string(), "format".to_string()],
        }
    }
}

impl FormatterCommand {
    /// Human-readable command line, for diagnostics.
    pub fn display(&self, path: &Path) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.push(path.display().to_string());
        parts.join(" ")
    }
}

/// Outcome of the formatter pass. Only `Formatted` means the tool succeeded;
/// the other variants are warnings for the caller to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// The tool ran and exited successfully.
    Formatted,
    /// The tool could not be started (usually not installed).
    Unavailable(String),
    /// The tool ran and exited with a failure status.
    Failed(String),
}

/// Run the formatter over `path`, capturing its output.
pub fn run_formatter(command: &FormatterCommand, path: &Path) -> FormatOutcome {
    let output = match Command::new(&command.program)
        .args(&command.args)
        .arg(path)
        .output()
    {
        Ok(output) => output,
        Err(error) => {
            return FormatOutcome::Unavailable(format!(
                "Failed to run `{}`: {error}",
                command.program
            ))
        }
    };

    if output.status.success() {
        FormatOutcome::Formatted
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        FormatOutcome::Failed(format!(
            "Command `{}` exited with status {}: {}",
            command.display(path),
            output.status,
            stderr.trim()
        ))
    }
}
