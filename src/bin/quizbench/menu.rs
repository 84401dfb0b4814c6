use std::fmt;
use std::io::{self, BufRead, Write};

use anyhow::bail;
use crossterm::style::Stylize;

const BANNER: &str = r"
  ___        _       ___               _
 / _ \ _   _(_)____ | _ ) ___ _ _  __| |_
| (_) | | | | |_  / | _ \/ -_) ' \/ _| ' \
 \__\_\\_,_|_/__|  |___/\___|_||_\__|_||_|
  Create & Answer Questions From DbPedia
";

/// What the binary does in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    CreateQuestions,
    AnswerQuestions,
    AnswerQuestionsAtScale,
}

impl Mode {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::CreateQuestions),
            2 => Some(Self::AnswerQuestions),
            3 => Some(Self::AnswerQuestionsAtScale),
            _ => None,
        }
    }

    /// Accepts exactly `1`, `2` or `3`, ignoring surrounding whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::CreateQuestions),
            "2" => Some(Self::AnswerQuestions),
            "3" => Some(Self::AnswerQuestionsAtScale),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::CreateQuestions => write!(f, "CreateQuestions"),
            Mode::AnswerQuestions => write!(f, "AnswerQuestions"),
            Mode::AnswerQuestionsAtScale => write!(f, "AnswerQuestionsAtScale"),
        }
    }
}

pub fn print_banner(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", BANNER.yellow())
}

/// Shows the menu until a valid choice is read. EOF is an error.
pub fn prompt_mode<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> anyhow::Result<Mode> {
    loop {
        writeln!(out)?;
        writeln!(out, "{}", "Select one of the options, by typing either 1 through 3:".cyan())?;
        writeln!(out, "{}", "1) Create questions from DbPedia titles and text".cyan())?;
        writeln!(out, "{}", "2) Answer questions generated by GenAI".cyan())?;
        writeln!(out, "{}", "3) Answer questions generated by GenAI (at scale)".cyan())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("stdin closed before a mode was selected");
        }
        match Mode::parse(&line) {
            Some(mode) => {
                writeln!(out, "You selected: {mode}")?;
                return Ok(mode);
            }
            None => writeln!(out, "{}", "Incorrect selection!".red())?,
        }
    }
}
