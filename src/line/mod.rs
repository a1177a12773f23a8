use std::fmt;

use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::Config;

mod command;
pub use command::Command;

// Reasons a line never becomes a Command.  None of these are reported
// to the user; the shell simply prompts again.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rejection {
    Empty,
    Comment,
    TooLong,
    TooManyArguments,
    MissingRedirectTarget,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty line"),
            Rejection::Comment => write!(f, "comment"),
            Rejection::TooLong => write!(f, "line exceeds maximum length"),
            Rejection::TooManyArguments => write!(f, "too many arguments"),
            Rejection::MissingRedirectTarget => write!(f, "redirection without a file name"),
        }
    }
}

// Grammar:
//      program [arg ...] [< input] [> output] [&]
//
// `&` only means "background" as the very last word; anywhere else it
// is passed through as an ordinary argument.
pub fn parse(rawline: &str, config: &Config) -> Result<Command, Rejection> {
    if rawline.len() > config.max_line_length {
        return Err(Rejection::TooLong);
    }

    if rawline.trim_start().starts_with('#') {
        return Err(Rejection::Comment);
    }

    let mut words = get_words(rawline).into_iter().peekable();

    let mut command = match words.next() {
        Some(program) => Command::new(program),
        None => return Err(Rejection::Empty),
    };

    while let Some(word) = words.next() {
        match word.as_str() {
            ">" => match words.next() {
                Some(path) => command.set_output_path(path),
                None => return Err(Rejection::MissingRedirectTarget),
            },
            "<" => match words.next() {
                Some(path) => command.set_input_path(path),
                None => return Err(Rejection::MissingRedirectTarget),
            },
            "&" if words.peek().is_none() => {
                command.set_background();
            }
            _ => {
                command.push_arg(word);

                // Program occupies one slot of the bound
                if command.arguments().len() + 1 > config.max_arguments {
                    return Err(Rejection::TooManyArguments);
                }
            }
        }
    }

    trace!(?command, "parsed line");

    Ok(command)
}

// Splits on runs of whitespace.  No quoting, no escaping.
fn get_words(rawline: &str) -> Vec<String> {
    let mut words = Vec::<String>::new();
    let mut word = String::new();

    for grapheme in rawline.graphemes(true) {
        match grapheme {
            " " | "\t" | "\n" | "\r" | "\r\n" => {
                if !word.is_empty() {
                    words.push(word);
                    word = String::new();
                }
            }
            _ => {
                word.push_str(grapheme);
            }
        }
    }

    if !word.is_empty() {
        words.push(word);
    }

    words
}
