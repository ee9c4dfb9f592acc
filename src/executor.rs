//! Shell execution of confirmed commands.
//!
//! Candidate commands are run through `sh -c` with stdout and stderr
//! captured. Captured output is handed back even when the command fails, so
//! the caller can show whatever the command printed before it died.

use crate::error::Failure;
use std::io;
use std::process::{Command, Output};
use tracing::{error, info};

/// Shell used to interpret candidate commands.
pub const SHELL: &str = "sh";

/// Output of a command that exited successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
}

// =============================================================================
// Traits for Dependency Injection
// =============================================================================

/// Trait for running system processes.
///
/// This abstraction enables testing without spawning real processes.
pub trait ProcessRunner: Send + Sync {
    /// Executes a command and returns its output.
    fn run(&self, program: &str, args: &[&str]) -> io::Result<Output>;

    /// Checks if a program exists in PATH.
    fn program_exists(&self, program: &str) -> bool;
}

/// Default process runner using std::process::Command.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<Output> {
        Command::new(program).args(args).output()
    }

    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

// =============================================================================
// Executor Implementation
// =============================================================================

/// Runs candidate commands through the system shell.
///
/// # Example
///
/// ```no_run
/// use aiterm::executor::Executor;
///
/// let executor = Executor::new();
/// let result = executor.execute("echo hi")?;
/// assert_eq!(result.stdout, "hi\n");
/// # Ok::<(), aiterm::error::Failure>(())
/// ```
pub struct Executor {
    runner: Box<dyn ProcessRunner>,
}

impl Executor {
    pub fn new() -> Self {
        Self::with_runner(Box::new(SystemProcessRunner))
    }

    /// Creates an executor with a custom process runner (for testing).
    pub fn with_runner(runner: Box<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Runs `command` with `sh -c`.
    ///
    /// # Errors
    ///
    /// - [`Failure::Spawn`] if the shell is missing or cannot be started
    /// - [`Failure::Execution`] if the command exits non-zero; the variant
    ///   carries everything the command printed
    pub fn execute(&self, command: &str) -> Result<ExecutionResult, Failure> {
        if !self.runner.program_exists(SHELL) {
            return Err(Failure::Spawn(io::Error::new(
                io::ErrorKind::NotFound,
                format!("`{}` was not found in PATH", SHELL),
            )));
        }

        info!("Executing command: {}", command);
        let output = self
            .runner
            .run(SHELL, &["-c", command])
            .map_err(Failure::Spawn)?;

        Self::handle_output(output)
    }

    /// Splits process output into a result or an execution failure.
    fn handle_output(output: Output) -> Result<ExecutionResult, Failure> {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(ExecutionResult { stdout, stderr })
        } else {
            error!("Command failed with status: {}", output.status);
            Err(Failure::Execution {
                status: output.status,
                stdout,
                stderr,
            })
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use std::sync::{Arc, Mutex};

    // =========================================================================
    // Mock implementations
    // =========================================================================

    /// Mock process runner for testing.
    pub struct MockProcessRunner {
        output: Output,
        program_exists: bool,
        pub calls: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl MockProcessRunner {
        pub fn success(stdout: &str) -> Self {
            Self::with_output(0, stdout, "")
        }

        pub fn failure(exit_code: i32, stdout: &str, stderr: &str) -> Self {
            Self::with_output(exit_code, stdout, stderr)
        }

        pub fn missing_shell() -> Self {
            Self {
                program_exists: false,
                ..Self::success("")
            }
        }

        fn with_output(exit_code: i32, stdout: &str, stderr: &str) -> Self {
            Self {
                output: Output {
                    status: ExitStatus::from_raw(exit_code << 8),
                    stdout: stdout.as_bytes().to_vec(),
                    stderr: stderr.as_bytes().to_vec(),
                },
                program_exists: true,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl ProcessRunner for MockProcessRunner {
        fn run(&self, program: &str, args: &[&str]) -> io::Result<Output> {
            let mut call = vec![program.to_string()];
            call.extend(args.iter().map(|a| a.to_string()));
            self.calls.lock().unwrap().push(call);
            Ok(self.output.clone())
        }

        fn program_exists(&self, _program: &str) -> bool {
            self.program_exists
        }
    }

    #[test]
    fn test_execute_passes_command_to_shell() {
        let runner = MockProcessRunner::success("file\n");
        let calls = runner.calls.clone();
        let executor = Executor::with_runner(Box::new(runner));

        let result = executor.execute("ls -la | head").unwrap();

        assert_eq!(result.stdout, "file\n");
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], vec!["sh", "-c", "ls -la | head"]);
    }

    #[test]
    fn test_execute_failure_keeps_captured_output() {
        let runner = MockProcessRunner::failure(2, "partial\n", "boom\n");
        let executor = Executor::with_runner(Box::new(runner));

        match executor.execute("false").unwrap_err() {
            Failure::Execution {
                status,
                stdout,
                stderr,
            } => {
                assert_eq!(status.code(), Some(2));
                assert_eq!(stdout, "partial\n");
                assert_eq!(stderr, "boom\n");
            }
            other => panic!("expected Execution, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_missing_shell_is_spawn_failure() {
        let executor = Executor::with_runner(Box::new(MockProcessRunner::missing_shell()));
        let failure = executor.execute("ls").unwrap_err();
        assert!(matches!(failure, Failure::Spawn(_)));
        assert_eq!(failure.kind(), "execution");
    }

    #[test]
    fn test_handle_output_success_with_stderr() {
        let output = Output {
            status: ExitStatus::from_raw(0),
            stdout: vec![],
            stderr: b"warning".to_vec(),
        };

        let result = Executor::handle_output(output).unwrap();

        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "warning");
    }

    #[test]
    fn test_system_runner_runs_real_shell() {
        let executor = Executor::new();
        let result = executor.execute("printf 'hi'").unwrap();
        assert_eq!(result.stdout, "hi");
    }
}
