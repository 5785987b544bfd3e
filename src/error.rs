use std::io;

use thiserror::Error;

/// Everything that can abort a parse. Parsing is all-or-nothing: when one of these is returned,
/// no partially built [`Unit`](crate::Unit) survives.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read data")]
    ReadFailure {
        #[from]
        source: io::Error,
    },
    #[error("line too long (max {max} bytes)")]
    LineTooLong { max: usize },
    #[error("unable to find end of section")]
    UnterminatedSection,
    #[error("found garbage after section name {section}: {garbage:?}")]
    GarbageAfterSectionName { section: String, garbage: String },
    #[error("unexpected newline encountered while parsing option name")]
    NewlineInOptionName,
    #[error("unexpected end of input while parsing option name")]
    UnterminatedOptionName,
    #[error("unit file misparse: option before section")]
    OptionBeforeSection,
}
