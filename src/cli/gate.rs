//! Confirmation of the containers to convert

use std::io::{BufRead, Write};

use crate::cli::display::{render_actions, render_container};
use crate::config::TranscodeConfig;
use crate::domain::model::Container;
use crate::error::ReelResult;

/// Decides which containers are converted. Order is preserved.
pub trait ConversionGate {
    fn confirm(&mut self, containers: Vec<Container>) -> ReelResult<Vec<Container>>;
}

/// Converts everything
pub struct AcceptAll;

impl ConversionGate for AcceptAll {
    fn confirm(&mut self, containers: Vec<Container>) -> ReelResult<Vec<Container>> {
        Ok(containers)
    }
}

/// Asks about each container in turn.
///
/// `c` converts, `s` skips, `q` (or end of input) cancels the whole batch.
pub struct PromptEach<R: BufRead, W: Write> {
    input: R,
    output: W,
    config: TranscodeConfig,
}

impl<R: BufRead, W: Write> PromptEach<R, W> {
    pub fn new(input: R, output: W, config: TranscodeConfig) -> Self {
        Self {
            input,
            output,
            config,
        }
    }

    fn ask(&mut self) -> ReelResult<Answer> {
        loop {
            write!(self.output, "[c]onvert, [s]kip or [q]uit? ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Answer::Quit);
            }
            match line.trim().to_lowercase().as_str() {
                "c" | "convert" => return Ok(Answer::Convert),
                "s" | "skip" => return Ok(Answer::Skip),
                "q" | "quit" => return Ok(Answer::Quit),
                other => writeln!(self.output, "Unknown choice: {:?}", other)?,
            }
        }
    }
}

enum Answer {
    Convert,
    Skip,
    Quit,
}

impl<R: BufRead, W: Write> ConversionGate for PromptEach<R, W> {
    fn confirm(&mut self, containers: Vec<Container>) -> ReelResult<Vec<Container>> {
        let mut confirmed = Vec::with_capacity(containers.len());
        for container in containers {
            write!(self.output, "{}", render_container(&container))?;
            write!(self.output, "{}", render_actions(&container, &self.config))?;
            match self.ask()? {
                Answer::Convert => confirmed.push(container),
                Answer::Skip => {}
                Answer::Quit => return Ok(Vec::new()),
            }
        }
        Ok(confirmed)
    }
}
