//! User intents and their text command form.
//!
//! The headless binary reads one command per line from stdin. The grammar
//! is small enough to parse by hand:
//!
//! ```text
//! toggle I J        flip cell (I, J)
//! set I J 0|1       set cell (I, J)
//! clear             kill every cell
//! random            fill the board at random
//! stamp NAME        clear, then stamp gliders | blinker | block
//! start             push the board and begin stepping
//! stop              stop stepping
//! refresh           fetch a snapshot now (alias: get)
//! quit              shut the engine down (alias: exit)
//! ```

use std::str::FromStr;

use lifesync_core::board::BoardError;
use lifesync_core::pattern::Pattern;
use lifesync_core::state::LocalEdit;

/// Something the user asked the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Edit the local board.
    Edit(LocalEdit),
    /// Push the board and enter `Running`.
    Start,
    /// Enter `Stopped`.
    Stop,
    /// Fetch a snapshot out of band.
    Refresh,
    /// End the event loop.
    Shutdown,
}

/// Errors from parsing a text command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    /// The line was blank.
    #[error("empty command")]
    Empty,

    /// The first word is not a known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A required argument was not given.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        /// The command being parsed.
        command: &'static str,
        /// Name of the missing argument.
        argument: &'static str,
    },

    /// An argument could not be parsed.
    #[error("{command}: invalid {argument} {value:?}")]
    InvalidArgument {
        /// The command being parsed.
        command: &'static str,
        /// Name of the bad argument.
        argument: &'static str,
        /// What was given.
        value: String,
    },

    /// More words followed a complete command.
    #[error("{command}: unexpected trailing input {rest:?}")]
    TrailingInput {
        /// The command being parsed.
        command: &'static str,
        /// The first unexpected word.
        rest: String,
    },

    /// `stamp` named an unknown preset.
    #[error(transparent)]
    Pattern(#[from] BoardError),
}

impl FromStr for Intent {
    type Err = IntentError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(IntentError::Empty);
        };

        let (command, intent) = match head.to_ascii_lowercase().as_str() {
            "toggle" => {
                let i = coordinate(&mut words, "toggle", "I")?;
                let j = coordinate(&mut words, "toggle", "J")?;
                ("toggle", Self::Edit(LocalEdit::Toggle { i, j }))
            }
            "set" => {
                let i = coordinate(&mut words, "set", "I")?;
                let j = coordinate(&mut words, "set", "J")?;
                let bit = bit(&mut words)?;
                ("set", Self::Edit(LocalEdit::Set { i, j, bit }))
            }
            "clear" => ("clear", Self::Edit(LocalEdit::Clear)),
            "random" | "randomize" => ("random", Self::Edit(LocalEdit::Randomize)),
            "stamp" => {
                let name = words.next().ok_or(IntentError::MissingArgument {
                    command: "stamp",
                    argument: "NAME",
                })?;
                ("stamp", Self::Edit(LocalEdit::Stamp(name.parse::<Pattern>()?)))
            }
            "start" => ("start", Self::Start),
            "stop" => ("stop", Self::Stop),
            "refresh" | "get" => ("refresh", Self::Refresh),
            "quit" | "exit" => ("quit", Self::Shutdown),
            _ => return Err(IntentError::UnknownCommand(head.to_owned())),
        };

        if let Some(rest) = words.next() {
            return Err(IntentError::TrailingInput {
                command,
                rest: rest.to_owned(),
            });
        }
        Ok(intent)
    }
}

fn coordinate<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<usize, IntentError> {
    let word = words
        .next()
        .ok_or(IntentError::MissingArgument { command, argument })?;
    word.parse().ok().ok_or_else(|| IntentError::InvalidArgument {
        command,
        argument,
        value: word.to_owned(),
    })
}

fn bit<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<u8, IntentError> {
    match words.next() {
        Some("0") => Ok(0),
        Some("1") => Ok(1),
        Some(other) => Err(IntentError::InvalidArgument {
            command: "set",
            argument: "value",
            value: other.to_owned(),
        }),
        None => Err(IntentError::MissingArgument {
            command: "set",
            argument: "value",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_edits() {
        assert_eq!(
            "toggle 3 4".parse::<Intent>(),
            Ok(Intent::Edit(LocalEdit::Toggle { i: 3, j: 4 }))
        );
        assert_eq!(
            "set 1 2 1".parse::<Intent>(),
            Ok(Intent::Edit(LocalEdit::Set { i: 1, j: 2, bit: 1 }))
        );
        assert_eq!("clear".parse(), Ok(Intent::Edit(LocalEdit::Clear)));
        assert_eq!("Random".parse(), Ok(Intent::Edit(LocalEdit::Randomize)));
        assert_eq!(
            "stamp gliders".parse(),
            Ok(Intent::Edit(LocalEdit::Stamp(Pattern::Gliders)))
        );
    }

    #[test]
    fn parses_control_commands() {
        assert_eq!("start".parse(), Ok(Intent::Start));
        assert_eq!("  stop  ".parse(), Ok(Intent::Stop));
        assert_eq!("refresh".parse(), Ok(Intent::Refresh));
        assert_eq!("get".parse(), Ok(Intent::Refresh));
        assert_eq!("quit".parse(), Ok(Intent::Shutdown));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<Intent>(), Err(IntentError::Empty));
        assert_eq!(
            "jump".parse::<Intent>(),
            Err(IntentError::UnknownCommand("jump".to_owned()))
        );
        assert_eq!(
            "toggle 3".parse::<Intent>(),
            Err(IntentError::MissingArgument {
                command: "toggle",
                argument: "J"
            })
        );
        assert!(matches!(
            "toggle -1 2".parse::<Intent>(),
            Err(IntentError::InvalidArgument { argument: "I", .. })
        ));
        assert!(matches!(
            "set 1 1 2".parse::<Intent>(),
            Err(IntentError::InvalidArgument {
                argument: "value",
                ..
            })
        ));
        assert!(matches!(
            "stamp spaceship".parse::<Intent>(),
            Err(IntentError::Pattern(BoardError::UnknownPattern(_)))
        ));
        assert!(matches!(
            "clear now".parse::<Intent>(),
            Err(IntentError::TrailingInput { command: "clear", .. })
        ));
    }
}
