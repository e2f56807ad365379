//! Operator confirmation for irreversible operations.

use std::io::{self, BufRead, Write};

use crate::ResultsResult;

/// Asks whether an irreversible operation may proceed.
pub trait Confirmation {
    fn confirm(&mut self, prompt: &str) -> ResultsResult<bool>;
}

/// Answers yes without asking (`--yes`).
pub struct AlwaysConfirm;

impl Confirmation for AlwaysConfirm {
    fn confirm(&mut self, prompt: &str) -> ResultsResult<bool> {
        log::info!("{prompt} [confirmed non-interactively]");
        Ok(true)
    }
}

/// Any closure deciding from the prompt.
impl<F: FnMut(&str) -> bool> Confirmation for F {
    fn confirm(&mut self, prompt: &str) -> ResultsResult<bool> {
        Ok(self(prompt))
    }
}

/// Prompts on `output` and reads a `y`/`yes` answer from `input`.
/// Anything else declines.
pub struct PromptConfirm<R, W> {
    input:  R,
    output: W,
}

impl PromptConfirm<io::StdinLock<'static>, io::Stderr> {
    pub fn terminal() -> Self {
        Self { input: io::stdin().lock(), output: io::stderr() }
    }
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirmation for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> ResultsResult<bool> {
        write!(self.output, "{prompt} [y/N] ")?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}
