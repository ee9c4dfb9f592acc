//! Terminal interaction for the confirmation menu.
//!
//! Everything here reads from a [`BufRead`] and writes to a [`Write`] passed
//! in by the caller, so the menu can be driven from tests with a `Cursor`
//! and a `Vec<u8>`.

use crate::error::Failure;
use crate::executor::ExecutionResult;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

/// One of the directives accepted while a candidate command is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// `y`: run the command.
    Execute,
    /// `c`: copy to the clipboard and exit.
    Copy,
    /// `g`: copy to the clipboard, then read back an edited command.
    CopyAndEdit,
    /// `r`: new prompt, keep the conversation.
    ResubmitWithContext,
    /// `w`: new prompt, fresh conversation.
    ResubmitWithoutContext,
    /// `q`: exit without doing anything.
    Quit,
}

impl Choice {
    /// Parses a directive, ignoring surrounding whitespace and case.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "y" => Some(Choice::Execute),
            "c" => Some(Choice::Copy),
            "g" => Some(Choice::CopyAndEdit),
            "r" => Some(Choice::ResubmitWithContext),
            "w" => Some(Choice::ResubmitWithoutContext),
            "q" => Some(Choice::Quit),
            _ => None,
        }
    }
}

/// Reads one line, trimmed.
///
/// End of input is reported as [`Failure::InputRead`]; a closed stdin must
/// not be mistaken for an empty answer.
pub fn read_line<R: BufRead>(input: &mut R) -> Result<String, Failure> {
    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(Failure::InputRead)?;
    if read == 0 {
        return Err(Failure::InputRead(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "end of input",
        )));
    }
    Ok(line.trim().to_string())
}

/// Writes `prompt` without a newline, then reads the answer.
pub fn prompt_line<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<String, Failure> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    read_line(input)
}

/// Presents candidate commands and collects the user's directive.
pub struct CommandMenu {
    verbose: bool,
}

impl CommandMenu {
    /// Creates a new `CommandMenu`.
    ///
    /// # Arguments
    ///
    /// * `verbose` - If true, also prints stderr and status lines after execution
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Shows `command` with the directive list and reads a valid choice.
    ///
    /// Unknown input prints a reminder and is read again.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::InputRead`] if input cannot be read, and
    /// [`Failure::Terminal`] if the menu cannot be written.
    pub fn prompt_for_choice_with_io<R: BufRead, W: Write>(
        &self,
        command: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<Choice, Failure> {
        self.display_command_with_io(command, output)?;

        loop {
            let answer = prompt_line("-> ", input, output)?;
            match Choice::parse(&answer) {
                Some(choice) => {
                    info!("User chose {:?} for command '{}'", choice, command);
                    return Ok(choice);
                }
                None => {
                    debug!("Unknown directive: {:?}", answer);
                    writeln!(
                        output,
                        "Unknown option. Enter one of y, c, g, r, w; to exit press 'q'."
                    )?;
                }
            }
        }
    }

    /// Displays the candidate command and the directive list.
    fn display_command_with_io<W: Write>(&self, command: &str, output: &mut W) -> Result<(), Failure> {
        writeln!(output)?;
        writeln!(output, "Here is the command --> {} <--", command)?;
        writeln!(output, "{}", "-".repeat(40))?;
        writeln!(output, "  y) Execute it")?;
        writeln!(output, "  c) Copy to clipboard and exit")?;
        writeln!(output, "  g) Copy to clipboard, then paste back an edited version")?;
        writeln!(output, "  r) Send a new request with context")?;
        writeln!(output, "  w) Send a new request without context")?;
        writeln!(output, "  q) Exit")?;
        Ok(())
    }

    /// Shows what an executed command printed.
    pub fn show_execution_output_with_io<W: Write>(
        &self,
        result: &ExecutionResult,
        output: &mut W,
    ) -> Result<(), Failure> {
        write!(output, "{}", result.stdout)?;
        if self.verbose && !result.stderr.is_empty() {
            write!(output, "{}", result.stderr)?;
        }
        Ok(())
    }

    /// Shows whatever a failed command printed before exiting.
    pub fn show_failed_output_with_io<W: Write>(
        &self,
        stdout: &str,
        stderr: &str,
        output: &mut W,
    ) -> Result<(), Failure> {
        writeln!(output, "\nYour command has been executed and this is the output:")?;
        write!(output, "{}", stdout)?;
        write!(output, "{}", stderr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // =========================================================================
    // Choice parsing
    // =========================================================================

    #[test]
    fn test_parse_all_directives() {
        assert_eq!(Choice::parse("y"), Some(Choice::Execute));
        assert_eq!(Choice::parse("c"), Some(Choice::Copy));
        assert_eq!(Choice::parse("g"), Some(Choice::CopyAndEdit));
        assert_eq!(Choice::parse("r"), Some(Choice::ResubmitWithContext));
        assert_eq!(Choice::parse("w"), Some(Choice::ResubmitWithoutContext));
        assert_eq!(Choice::parse("q"), Some(Choice::Quit));
    }

    #[test]
    fn test_parse_ignores_case_and_whitespace() {
        assert_eq!(Choice::parse("  Y \n"), Some(Choice::Execute));
        assert_eq!(Choice::parse("Q"), Some(Choice::Quit));
    }

    #[test]
    fn test_parse_rejects_anything_else() {
        for input in ["", "yes", "x", "yy", "1"] {
            assert_eq!(Choice::parse(input), None, "input {:?}", input);
        }
    }

    // =========================================================================
    // read_line
    // =========================================================================

    #[test]
    fn test_read_line_trims() {
        let mut input = Cursor::new(b"  echo hi  \n");
        assert_eq!(read_line(&mut input).unwrap(), "echo hi");
    }

    #[test]
    fn test_read_line_accepts_empty_line() {
        let mut input = Cursor::new(b"\n");
        assert_eq!(read_line(&mut input).unwrap(), "");
    }

    #[test]
    fn test_read_line_at_eof_is_input_read_failure() {
        let mut input = Cursor::new(b"");
        let failure = read_line(&mut input).unwrap_err();
        assert!(matches!(failure, Failure::InputRead(_)));
    }

    // =========================================================================
    // prompt_for_choice_with_io
    // =========================================================================

    #[test]
    fn test_prompt_displays_command_and_options() {
        let menu = CommandMenu::new(false);
        let mut input = Cursor::new(b"q\n");
        let mut output = Vec::new();

        let choice = menu
            .prompt_for_choice_with_io("ls -la", &mut input, &mut output)
            .unwrap();

        assert_eq!(choice, Choice::Quit);
        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("--> ls -la <--"));
        for option in ["y)", "c)", "g)", "r)", "w)", "q)"] {
            assert!(output_str.contains(option), "missing {}", option);
        }
    }

    #[test]
    fn test_prompt_retries_on_invalid_input() {
        let menu = CommandMenu::new(false);
        let mut input = Cursor::new(b"nope\n\nr\n");
        let mut output = Vec::new();

        let choice = menu
            .prompt_for_choice_with_io("ls", &mut input, &mut output)
            .unwrap();

        assert_eq!(choice, Choice::ResubmitWithContext);
        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(output_str.matches("Unknown option").count(), 2);
        assert_eq!(output_str.matches("Here is the command").count(), 1);
    }

    #[test]
    fn test_prompt_eof_during_invalid_loop_fails() {
        let menu = CommandMenu::new(false);
        let mut input = Cursor::new(b"zzz\n");
        let mut output = Vec::new();

        let failure = menu
            .prompt_for_choice_with_io("ls", &mut input, &mut output)
            .unwrap_err();

        assert!(matches!(failure, Failure::InputRead(_)));
    }

    // =========================================================================
    // Output display
    // =========================================================================

    #[test]
    fn test_show_execution_output_hides_stderr_unless_verbose() {
        let result = ExecutionResult {
            stdout: "out\n".to_string(),
            stderr: "warn\n".to_string(),
        };

        let mut quiet = Vec::new();
        CommandMenu::new(false)
            .show_execution_output_with_io(&result, &mut quiet)
            .unwrap();
        assert_eq!(String::from_utf8(quiet).unwrap(), "out\n");

        let mut verbose = Vec::new();
        CommandMenu::new(true)
            .show_execution_output_with_io(&result, &mut verbose)
            .unwrap();
        assert_eq!(String::from_utf8(verbose).unwrap(), "out\nwarn\n");
    }

    #[test]
    fn test_show_failed_output_includes_both_streams() {
        let mut output = Vec::new();
        CommandMenu::new(false)
            .show_failed_output_with_io("partial\n", "boom\n", &mut output)
            .unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("partial"));
        assert!(output_str.contains("boom"));
    }
}
