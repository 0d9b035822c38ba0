//! Interactive questions for values missing from the command line
//!
//! End of input (e.g. stdin closed in CI) answers every prompt with its
//! default.

use crate::core::error::RelmanResult;
use std::io::{self, BufRead, Write};

/// Ask for a line of text; blank input selects `default`
pub fn prompt(message: &str, default: Option<&str>) -> RelmanResult<String> {
  let stdin = io::stdin();
  ask(&mut stdin.lock(), &mut io::stdout(), message, default)
}

/// Ask a yes/no question
pub fn prompt_bool(message: &str, default: bool) -> RelmanResult<bool> {
  let stdin = io::stdin();
  ask_bool(&mut stdin.lock(), &mut io::stdout(), message, default)
}

fn ask(input: &mut impl BufRead, output: &mut impl Write, message: &str, default: Option<&str>) -> RelmanResult<String> {
  match default {
    Some(d) if !d.is_empty() => write!(output, "{} [{}]: ", message, d)?,
    _ => write!(output, "{}: ", message)?,
  }
  output.flush()?;

  let mut line = String::new();
  let read = input.read_line(&mut line)?;
  if read == 0 {
    writeln!(output)?;
  }

  let answer = line.trim();
  if answer.is_empty() {
    return Ok(default.unwrap_or_default().to_string());
  }
  Ok(answer.to_string())
}

fn ask_bool(input: &mut impl BufRead, output: &mut impl Write, message: &str, default: bool) -> RelmanResult<bool> {
  let hint = if default { "Y/n" } else { "y/N" };
  let answer = ask(input, output, &format!("{} ({})", message, hint), None)?;
  Ok(match answer.to_lowercase().as_str() {
    "y" | "yes" | "true" | "1" => true,
    "n" | "no" | "false" | "0" => false,
    _ => default,
  })
}
