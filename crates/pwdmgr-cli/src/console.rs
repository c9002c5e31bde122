use anyhow::Result;
use pwdmgr_core::settings::parse_bool;
use std::io::{self, BufRead, BufReader, Write};

/// Input ended before a command finished prompting.
#[derive(Debug, thiserror::Error)]
#[error("input cancelled")]
pub struct Cancelled;

/// Line-oriented prompt/answer I/O for the shell and its commands.
pub struct Console {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Console {
    pub fn new(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }

    pub fn out(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    /// Show `prompt` and read one line. `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Like [`Self::read_line`], but end of input cancels the command.
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        match self.read_line(prompt)? {
            Some(line) => Ok(line),
            None => Err(Cancelled.into()),
        }
    }

    /// Prompt showing the current value; an empty answer keeps it.
    pub fn ask_default(&mut self, label: &str, current: &str) -> Result<String> {
        let answer = self.ask(&format!("{label} ({current}): "))?;
        if answer.is_empty() {
            Ok(current.to_string())
        } else {
            Ok(answer.trim().to_string())
        }
    }

    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(question)?;
        Ok(parse_bool(answer.trim()).unwrap_or(false))
    }
}
