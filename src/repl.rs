//! Read-eval-print loop
//!
//! Reads one line at a time, dispatches it to a [`Command`] and keeps going
//! until `exit` or end of input. A failing command is reported and the loop
//! carries on.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use crate::commands::{Command, CommandError, Flow, Session};

/// Prompt printed before every line of input
pub const PROMPT: &str = "Pokedex > ";

/// Lower-cases the input and splits it into words.
pub fn clean_input(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Runs the loop until `exit` or end of input
///
/// # Arguments
/// * `session` - Context handed to every command
/// * `input` - Source of command lines
/// * `out` - Destination for the prompt and command output
///
/// # Returns
/// * `Ok(())` on `exit` or end of input
/// * `Err` only if reading input or writing the prompt fails
pub async fn run<R, W>(session: &mut Session, input: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            // Keep the shell prompt on its own line after Ctrl-D
            writeln!(out)?;
            return Ok(());
        };

        let words = clean_input(&line);
        let Some(first) = words.first() else {
            continue;
        };

        let Some(command) = Command::from_str(first) else {
            writeln!(out, "Unknown command")?;
            continue;
        };

        let arg = words.get(1).map(String::as_str);
        match session.execute(command, arg, out).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => return Ok(()),
            Err(CommandError::Io(err)) => return Err(err),
            Err(err) => {
                warn!(command = command.name(), %err, "command failed");
                writeln!(out, "Error: {}", err)?;
            }
        }
        out.flush()?;
    }
}
