//! Line-oriented interactive prompts.
//!
//! The pipeline only ever needs a yes/no answer, through [`Confirm`]. The
//! binary additionally asks for the device code and provider when they were
//! not given on the command line.

use crate::device::DeviceId;
use crate::error::{FetchError, Result};
use crate::output::write_stderr_line;
use crate::provider::{self, ProviderKind};
use std::cell::RefCell;
use std::io::{self, BufRead, Write};

/// Question asked for the device code.
pub const DEVICE_QUESTION: &str = "What is the code of your device (case sensitive)? ";

/// Decides whether a destructive step may go ahead.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm {
    /// Ask `message` and return whether the user agreed.
    fn confirm(&self, message: &str) -> bool;
}

/// Approves everything without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, message: &str) -> bool {
        log::info!("assuming yes: {message}");
        true
    }
}

/// Prompts on a writer and reads answers line by line.
pub struct TerminalPrompt<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on standard output, reading standard input.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    /// Create a prompt over arbitrary streams.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    /// Consume the prompt, returning the output stream.
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }

    /// Print `question` and read one line, without its line ending.
    ///
    /// Returns `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from either stream.
    pub fn ask(&self, question: &str) -> io::Result<Option<String>> {
        {
            let mut output = self.output.borrow_mut();
            output.write_all(question.as_bytes())?;
            output.flush()?;
        }
        let mut line = String::new();
        if self.input.borrow_mut().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    fn say(&self, message: impl std::fmt::Display) {
        write_stderr_line(&mut *self.output.borrow_mut(), message);
    }

    /// Ask for the device code and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] for an invalid or missing answer.
    pub fn ask_device(&self) -> Result<DeviceId> {
        let answer = self.ask(DEVICE_QUESTION)?.unwrap_or_default();
        DeviceId::parse(answer.trim())
    }

    /// Show the provider menu until a valid number is entered.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidSelection`] if input ends before a valid
    /// answer.
    pub fn choose_provider(&self) -> Result<ProviderKind> {
        let max = ProviderKind::ALL.len();
        let question = format!("What ROM are you running?\n{}ROM number: ", provider::menu());
        loop {
            let Some(answer) = self.ask(&question)? else {
                return Err(FetchError::InvalidSelection {
                    value: String::new(),
                    max,
                });
            };
            let choice = answer
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(ProviderKind::from_menu_number);
            if let Some(kind) = choice {
                return Ok(kind);
            }
            self.say(format_args!(
                "Invalid response \"{answer}\". Must be a number between 1 and {max}"
            ));
        }
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalPrompt<R, W> {
    fn confirm(&self, message: &str) -> bool {
        let question = format!("{message} (y/N) ");
        loop {
            let answer = match self.ask(&question) {
                Ok(Some(answer)) => answer.trim().to_lowercase(),
                Ok(None) => return false,
                Err(err) => {
                    log::warn!("could not read answer: {err}");
                    return false;
                }
            };
            match answer.as_str() {
                "y" => return true,
                "" | "n" => return false,
                _ => self.say(format_args!(
                    "Invalid response \"{answer}\". Must be either Y or N."
                )),
            }
        }
    }
}
