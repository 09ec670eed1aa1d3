//! Interactive disclaimer and confirmation

use crate::error::Result;
use crate::target::TARGET_APP;
use std::io::{BufRead, Write};

pub fn disclaimer() -> String {
    format!(
        "IMPORTANT DISCLAIMER\n\n\
         This utility is provided ONLY for non-commercial use.\n\
         By answering \"y\" you acknowledge that you have read and agree.\n\n\
         If you are a commercial user, please purchase an {} subscription.",
        TARGET_APP
    )
}

pub fn confirmation() -> String {
    format!(
        "Are you sure?\n\
         This will terminate {app} and delete its data folder.\n\
         Operation cannot be undone. Close {app} if it has unsaved work.",
        app = TARGET_APP
    )
}

/// Shows `text` and reads a yes/no answer. Anything but `y`/`yes`, including EOF, is a no.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, text: &str) -> Result<bool> {
    writeln!(output, "{}", text)?;
    write!(output, "Continue? [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Disclaimer first, then the destructive-action confirmation.
pub fn acknowledge_and_confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    if !ask(input, output, &disclaimer())? {
        return Ok(false);
    }
    writeln!(output)?;
    ask(input, output, &confirmation())
}
