#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]

//! Reading and writing systemd-unit-style configuration text.
//!
//! The format is INI-like: `[Section]` headers followed by `Key=Value` options, `#`/`;` comments,
//! and backslash line continuation. Parsing turns text into a [`Unit`], serializing turns a
//! [`Unit`] back into canonical text, and [`units_equivalent`] compares two units while ignoring
//! the order of sections and options (but not how often each one occurs).
//!
//! ```
//! use systemd_config::{Unit, units_equivalent};
//!
//! let a: Unit = "[Service]\nType=simple\nUser=nobody\n".parse().unwrap();
//! let b: Unit = "[Service]\nUser=nobody\nType=simple\n".parse().unwrap();
//!
//! assert_eq!(a.section("Service").unwrap().get("Type"), Some("simple"));
//! assert!(units_equivalent(&a, &b));
//! assert_eq!(a.to_string(), "[Service]\nType=simple\nUser=nobody\n");
//! ```

mod config;
mod equivalence;
mod error;
mod lexer;
mod parser;
mod section;
mod serializer;

use std::io::Read;
use std::str::FromStr;

pub use config::{Config, LINE_MAX};
pub use equivalence::{Match, units_equivalent};
pub use error::ParseError;
pub use lexer::{Event, Lexer, is_comment};
pub use parser::{assemble, parse, parse_concurrent, parse_with_config};
pub use section::{OptionValue, Section};
pub use serializer::serialize;

/// A parsed unit file: an ordered list of sections. Section names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unit {
    sections: Vec<Section>,
}

impl Unit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sections(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Read and parse a whole unit file.
    ///
    /// # Errors
    ///
    /// Fails on malformed input or if reading fails; see [`ParseError`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ParseError> {
        parse(reader)
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The first section called `name`.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name() == name)
    }

    pub(crate) fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub(crate) fn last_section_mut(&mut self) -> Option<&mut Section> {
        self.sections.last_mut()
    }
}

impl FromStr for Unit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s.as_bytes())
    }
}
