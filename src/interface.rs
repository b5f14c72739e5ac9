use crate::types::Settings;
use console::Term;
use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Source of answer lines for prompts.
pub trait LineSource {
    /// Next line, trimmed, or `None` when nothing arrived within `timeout`.
    fn read_line(&mut self, timeout: Duration) -> Option<String>;
}

/// Reads stdin on a helper thread so the wait can be bounded.
pub struct StdinLines;

impl LineSource for StdinLines {
    fn read_line(&mut self, timeout: Duration) -> Option<String> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut line = String::new();
            if io::stdin().read_line(&mut line).is_ok() {
                let _ = tx.send(line);
            }
        });
        rx.recv_timeout(timeout)
            .ok()
            .map(|line| line.trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Number(i64),
    Invalid,
    TimedOut,
}

pub struct Interface {
    settings: Settings,
    input: Box<dyn LineSource>,
}

impl Interface {
    pub fn new(settings: Settings) -> Self {
        Self::with_input(settings, Box::new(StdinLines))
    }

    pub fn with_input(settings: Settings, input: Box<dyn LineSource>) -> Self {
        Self { settings, input }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Prints to stdout unless quiet.
    pub fn print(&self, message: &str) {
        if !self.settings.quiet {
            println!("{}", message);
        }
    }

    fn read_answer(&mut self) -> Option<String> {
        let term = Term::stderr();
        let _ = term.write_str("$ ");
        let answer = self.input.read_line(self.settings.prompt_timeout);
        if answer.is_none() {
            let _ = term.write_line("");
        }
        answer
    }

    pub fn ask_number(&mut self, question: &str) -> Answer {
        self.print(question);
        match self.read_answer() {
            None => {
                tracing::info!("Time up! Maybe next time.");
                Answer::TimedOut
            }
            Some(answer) => match answer.parse::<i64>() {
                Ok(number) => Answer::Number(number),
                Err(_) => {
                    tracing::error!("Input must be a number to proceed.");
                    Answer::Invalid
                }
            },
        }
    }

    /// Yes/no confirmation. Anything but an answer starting with `y` is no,
    /// including a timeout.
    pub fn ask_to_proceed(&mut self, question: Option<&str>) -> bool {
        self.print(question.unwrap_or("Continue? (Y)es or (N)o:"));
        if self.settings.assume_yes {
            self.print("y");
            return true;
        }
        match self.read_answer() {
            None => {
                tracing::info!("Time up! Maybe next time.");
                false
            }
            Some(answer) => answer
                .chars()
                .next()
                .is_some_and(|c| c.eq_ignore_ascii_case(&'y')),
        }
    }
}

/// Replays prepared answers; `None` simulates a timeout.
#[cfg(test)]
pub(crate) struct ScriptedLines(pub std::collections::VecDeque<Option<String>>);

#[cfg(test)]
impl ScriptedLines {
    pub(crate) fn boxed(answers: &[Option<&str>]) -> Box<dyn LineSource> {
        Box::new(Self(
            answers.iter().map(|a| a.map(str::to_string)).collect(),
        ))
    }
}

#[cfg(test)]
impl LineSource for ScriptedLines {
    fn read_line(&mut self, _timeout: Duration) -> Option<String> {
        self.0.pop_front().flatten()
    }
}
