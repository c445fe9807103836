//! Line based front end of the player.
//!
//! Prints the lines of the current node followed by the numbered choices
//! and reads the number of the picked choice.
//! Choices are numbered from 1.

use std::io::{BufRead, Write};

use common_story::{DialogError, Player};
use thiserror::Error;
use tracing::{debug, warn};

/// Shown for choices whose label is empty.
const UNLABELED_CHOICE: &str = "Continue";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Reached a node without choices.
    Ended,
    /// Input closed before reaching an end.
    Quit,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub(crate) enum TerminalError {
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Dialog(#[from] DialogError),
}

/// Plays until the dialogue ends or the input runs out.
pub(crate) fn run(
    player: &mut Player,
    mut input: impl BufRead,
    mut output: impl Write,
    prompt: &str,
) -> Result<Outcome, TerminalError> {
    loop {
        for line in player.current_text()? {
            writeln!(output, "{line}")?;
        }

        if player.is_at_end() {
            writeln!(output)?;
            return Ok(Outcome::Ended);
        }

        let choices = player.current_choices();
        for (label, index) in &choices {
            let label = if label.is_empty() {
                UNLABELED_CHOICE
            } else {
                label.as_str()
            };
            writeln!(output, "  {}) {label}", index + 1)?;
        }

        let Some(index) =
            read_choice(&mut input, &mut output, prompt, choices.len())?
        else {
            debug!("Input closed at '{}'", player.current_node_id());
            return Ok(Outcome::Quit);
        };

        player.choose(index)?;
        writeln!(output)?;
    }
}

/// Asks until a valid number is given.
/// Returns [`None`] on end of input.
fn read_choice(
    input: &mut impl BufRead,
    output: &mut impl Write,
    prompt: &str,
    available: usize,
) -> Result<Option<usize>, TerminalError> {
    let mut buf = String::new();
    loop {
        write!(output, "{prompt}")?;
        output.flush()?;

        buf.clear();
        if input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }

        match buf.trim().parse::<usize>() {
            Ok(n) if (1..=available).contains(&n) => return Ok(Some(n - 1)),
            _ => {
                warn!("Invalid choice input '{}'", buf.trim());
                writeln!(output, "Pick a number from 1 to {available}")?;
            }
        }
    }
}
