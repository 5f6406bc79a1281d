use std::io::{BufRead, Write};

use anyhow::{Context, Result};

/// Decides whether a run proceeds past a review point.
pub(crate) trait ConfirmationGate {
    /// Asks the operator to approve `prompt`.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Gate that approves every review point without asking.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AutoApprove;

impl ConfirmationGate for AutoApprove {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Gate that asks on `output` and reads the answer from `input`.
///
/// An empty answer approves; end of input declines.
#[derive(Debug)]
pub(crate) struct PromptGate<R, W> {
    input: R,
    output: W,
}

impl<R, W> PromptGate<R, W>
where
    R: BufRead,
    W: Write,
{
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R, W> ConfirmationGate for PromptGate<R, W>
where
    R: BufRead,
    W: Write,
{
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        loop {
            write!(self.output, "{prompt} [Y/n] ").context("failed to write prompt")?;
            self.output.flush().context("failed to flush prompt")?;

            let mut answer = String::new();
            if self
                .input
                .read_line(&mut answer)
                .context("failed to read answer")?
                == 0
            {
                return Ok(false);
            }

            match answer.trim().to_ascii_lowercase().as_str() {
                "" | "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                other => writeln!(self.output, "please answer y or n, not '{other}'")
                    .context("failed to write prompt")?,
            }
        }
    }
}
