use thiserror::Error;

/// Errors in user supplied output templates and image file naming.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unknown token '%{token}' at position {position}")]
    UnknownToken { token: char, position: usize },

    #[error("token '%{token}' at position {position} needs a channel number (1 or 2)")]
    MissingChannel { token: char, position: usize },

    #[error("unknown escape '\\{escape}' at position {position}")]
    UnknownEscape { escape: char, position: usize },

    #[error("template ends inside a token")]
    Truncated,

    #[error("no unused file name after {tries} tries, try removing some files")]
    CounterExhausted { tries: u32 },
}
