//! Command definitions
//!
//! Interprets a decoded argument vector as one of the supported commands.

use bytes::Bytes;

/// A recognized command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key
    Get { key: Bytes },

    /// Insert or overwrite a key
    Set { key: Bytes, value: Bytes },

    /// Delete a key
    Del { key: Bytes },
}

impl Command {
    /// Match an argument vector against the known command shapes.
    ///
    /// The command name is compared case-insensitively and the argument count
    /// must be exact: `get key`, `set key value`, `del key`. Anything else is
    /// `None`.
    pub fn parse(argv: &[Bytes]) -> Option<Command> {
        let (name, args) = argv.split_first()?;

        match args {
            [key] if name.eq_ignore_ascii_case(b"get") => Some(Command::Get { key: key.clone() }),
            [key, value] if name.eq_ignore_ascii_case(b"set") => Some(Command::Set {
                key: key.clone(),
                value: value.clone(),
            }),
            [key] if name.eq_ignore_ascii_case(b"del") => Some(Command::Del { key: key.clone() }),
            _ => None,
        }
    }

    /// Lowercase command name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "get",
            Command::Set { .. } => "set",
            Command::Del { .. } => "del",
        }
    }
}
