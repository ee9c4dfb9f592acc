//! Interactive loop that turns a request into a confirmed command.
//!
//! The loop is a small state machine:
//!
//! ```text
//! AwaitingKey -> Resolving -> Validating -> AwaitingChoice -> Terminated
//!      ^             |  ^          |              |
//!      +-------------+  +----------+--------------+
//!      invalid key       not a command / r / w     g loops on itself
//! ```
//!
//! Conditions the user can fix by answering a prompt (missing or rejected
//! key, "not a command", unknown menu input) are handled here. Everything
//! else is returned to the caller as a [`Failure`].

use crate::clipboard::{self, Clipboard, SystemClipboard};
use crate::command_menu::{prompt_line, Choice, CommandMenu};
use crate::error::Failure;
use crate::executor::{ExecutionResult, Executor};
use crate::provider::{CommandProvider, ContextMode, Recovery};
use std::io::{self, BufRead, Write};
use tracing::info;

/// Phrase the model answers with when a request is not a shell command.
pub const SENTINEL: &str = "not a command";

/// Result of checking completion text against [`SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    NotACommand,
    Candidate(String),
}

/// Trims `text` and matches it case-insensitively against the sentinel,
/// allowing one trailing period. Anything else is a candidate command.
pub fn validate(text: &str) -> Validation {
    let trimmed = text.trim();
    let phrase = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if phrase.eq_ignore_ascii_case(SENTINEL) {
        Validation::NotACommand
    } else {
        Validation::Candidate(trimmed.to_string())
    }
}

/// How a run ended when it ended cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No API key was configured and none was entered.
    NoApiKey,
    /// The command ran and exited successfully.
    Executed(ExecutionResult),
    /// The command was copied to the clipboard.
    Copied,
    /// The user quit from the menu.
    Quit,
}

#[derive(Debug)]
enum State {
    /// Collect a key; `replacing` is set when the previous key was rejected.
    AwaitingKey { replacing: bool },
    Resolving,
    Validating(String),
    AwaitingChoice(String),
    Terminated(Outcome),
}

/// Drives one request from prompt to execution, copy, or exit.
///
/// # Example
///
/// ```ignore
/// use aiterm::provider::{OpenAiProvider, RequestParameters};
/// use aiterm::resolution::ResolutionLoop;
///
/// let provider = OpenAiProvider::new(endpoint, api_key, RequestParameters::default());
/// let mut resolution = ResolutionLoop::new(provider, "list files", false);
/// let outcome = resolution.run().await?;
/// ```
pub struct ResolutionLoop<P: CommandProvider> {
    provider: P,
    executor: Executor,
    clipboard: Box<dyn Clipboard>,
    menu: CommandMenu,
    request: String,
    mode: ContextMode,
}

impl<P: CommandProvider> ResolutionLoop<P> {
    /// Creates a loop using the system shell and clipboard.
    pub fn new(provider: P, request: impl Into<String>, verbose: bool) -> Self {
        Self::with_capabilities(
            provider,
            request,
            Executor::new(),
            Box::new(SystemClipboard::new()),
            CommandMenu::new(verbose),
        )
    }

    /// Creates a loop with injected capabilities (for testing).
    pub fn with_capabilities(
        provider: P,
        request: impl Into<String>,
        executor: Executor,
        clipboard: Box<dyn Clipboard>,
        menu: CommandMenu,
    ) -> Self {
        Self {
            provider,
            executor,
            clipboard,
            menu,
            request: request.into(),
            mode: ContextMode::WithContext,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs the loop on stdin/stdout.
    ///
    /// This is a convenience wrapper around [`Self::run_with_io`].
    pub async fn run(&mut self) -> Result<Outcome, Failure> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        self.run_with_io(&mut input, &mut output).await
    }

    /// Runs the loop until it terminates cleanly or hits an unrecoverable failure.
    pub async fn run_with_io<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<Outcome, Failure> {
        let mut state = if self.provider.has_api_key() {
            State::Resolving
        } else {
            State::AwaitingKey { replacing: false }
        };

        loop {
            state = match state {
                State::AwaitingKey { replacing } => self.await_key(replacing, input, output)?,
                State::Resolving => self.resolve(output).await?,
                State::Validating(text) => self.validate_with_io(&text, input, output)?,
                State::AwaitingChoice(command) => self.await_choice(command, input, output)?,
                State::Terminated(outcome) => {
                    info!("Run finished: {:?}", outcome);
                    return Ok(outcome);
                }
            };
        }
    }

    fn await_key<R: BufRead, W: Write>(
        &mut self,
        replacing: bool,
        input: &mut R,
        output: &mut W,
    ) -> Result<State, Failure> {
        if replacing {
            writeln!(output, "\nPlease set the correct API key and retry.")?;
        } else {
            writeln!(
                output,
                "Set the OPENAI_KEY environment variable with your secret API key and retry, or enter it for temporary use."
            )?;
        }

        let key = prompt_line("Enter your OpenAI API key or empty to exit: ", input, output)?;
        if key.is_empty() {
            writeln!(output, "No API key was provided. Exiting.")?;
            return Ok(State::Terminated(Outcome::NoApiKey));
        }

        self.provider.set_api_key(key);
        Ok(State::Resolving)
    }

    async fn resolve<W: Write>(&mut self, output: &mut W) -> Result<State, Failure> {
        match self.provider.resolve(&self.request, self.mode).await {
            Ok(text) => Ok(State::Validating(text)),
            Err(failure) => match self.provider.handle_failure(&failure) {
                Recovery::ReenterKey => {
                    info!("API key rejected, asking for a new one: {}", failure);
                    writeln!(output, "{}", failure)?;
                    Ok(State::AwaitingKey { replacing: true })
                }
                Recovery::Abort => Err(failure),
            },
        }
    }

    fn validate_with_io<R: BufRead, W: Write>(
        &mut self,
        text: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<State, Failure> {
        match validate(text) {
            Validation::Candidate(command) => Ok(State::AwaitingChoice(command)),
            Validation::NotACommand => {
                info!("Request did not resolve to a command: {}", self.request);
                writeln!(output, "That does not look like a command request.")?;
                self.request = prompt_line("Please retry with a different prompt: ", input, output)?;
                Ok(State::Resolving)
            }
        }
    }

    fn await_choice<R: BufRead, W: Write>(
        &mut self,
        command: String,
        input: &mut R,
        output: &mut W,
    ) -> Result<State, Failure> {
        let choice = self.menu.prompt_for_choice_with_io(&command, input, output)?;

        let next = match choice {
            Choice::Execute => State::Terminated(Outcome::Executed(self.execute(&command, output)?)),
            Choice::Copy => {
                clipboard::copy(self.clipboard.as_mut(), &command)?;
                writeln!(output, "Command copied to clipboard. Exiting.")?;
                State::Terminated(Outcome::Copied)
            }
            Choice::CopyAndEdit => {
                clipboard::copy(self.clipboard.as_mut(), &command)?;
                let edited = prompt_line(
                    "Command copied to clipboard. Paste your edited command: ",
                    input,
                    output,
                )?;
                State::AwaitingChoice(edited)
            }
            Choice::ResubmitWithContext => {
                self.request = prompt_line("(+c) Enter the new prompt: ", input, output)?;
                self.mode = ContextMode::WithContext;
                State::Resolving
            }
            Choice::ResubmitWithoutContext => {
                self.request = prompt_line("(-c) Enter the new prompt: ", input, output)?;
                self.mode = ContextMode::WithoutContext;
                State::Resolving
            }
            Choice::Quit => State::Terminated(Outcome::Quit),
        };
        Ok(next)
    }

    /// Runs the command, showing its output even when it fails.
    fn execute<W: Write>(&self, command: &str, output: &mut W) -> Result<ExecutionResult, Failure> {
        match self.executor.execute(command) {
            Ok(result) => {
                self.menu.show_execution_output_with_io(&result, output)?;
                Ok(result)
            }
            Err(Failure::Execution {
                status,
                stdout,
                stderr,
            }) => {
                self.menu.show_failed_output_with_io(&stdout, &stderr, output)?;
                Err(Failure::Execution {
                    status,
                    stdout,
                    stderr,
                })
            }
            Err(failure) => Err(failure),
        }
    }
}
