use std::io::{BufRead, Write};

use crate::error::{InstallError, InstallResult};

/// Source of operator answers for interactive runs.
pub trait Prompt {
    /// Ask a question. An empty answer yields `default` when one is
    /// given.
    fn ask(&mut self, question: &str, default: Option<&str>) -> InstallResult<String>;
}

/// Prompts on stdout and reads answers from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct Terminal;

impl Prompt for Terminal {
    fn ask(&mut self, question: &str, default: Option<&str>) -> InstallResult<String> {
        let mut stdout = std::io::stdout();
        match default {
            Some(d) if !d.is_empty() => write!(stdout, "{question} [{d}]: ")?,
            _ => write!(stdout, "{question}: ")?,
        }
        stdout.flush()?;

        let mut input = String::new();
        let read = std::io::stdin().lock().read_line(&mut input)?;
        if read == 0 {
            return Err(InstallError::Aborted);
        }

        let answer = input.trim();
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer.to_string())
        }
    }
}

/// Ask until `accept` approves the answer.
pub fn ask_valid<F>(
    prompt: &mut dyn Prompt,
    question: &str,
    default: Option<&str>,
    accept: F,
) -> InstallResult<String>
where
    F: Fn(&str) -> bool,
{
    loop {
        let answer = prompt.ask(question, default)?;
        if accept(&answer) {
            return Ok(answer);
        }
        println!("Invalid input. Please try again.");
    }
}

/// Ask a yes/no question.
pub fn confirm(prompt: &mut dyn Prompt, question: &str, default: bool) -> InstallResult<bool> {
    let default_answer = if default { "yes" } else { "no" };
    let answer = ask_valid(prompt, question, Some(default_answer), |a| {
        parse_yes_no(a).is_some()
    })?;
    Ok(parse_yes_no(&answer).unwrap_or(default))
}

/// Parse `yes`/`y`/`true`/`1` and `no`/`n`/`false`/`0`.
#[must_use]
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}
