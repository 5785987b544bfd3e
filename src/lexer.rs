//! Turns a byte stream into section/option events.
//!
//! The scanner is an explicit state machine: every call to [`Lexer::next`] runs transitions until
//! one of them emits an [`Event`], the input ends cleanly, or a transition fails. No transition
//! consumes more than one line, and before each one the next `line_max` unconsumed bytes are
//! inspected, so an over-long line is caught no matter which construct it sits in.

use std::io::{self, Read};
use std::iter::FusedIterator;

use tracing::{debug, trace};

use crate::config::Config;
use crate::error::ParseError;
use crate::section::OptionValue;

const CHUNK_SIZE: usize = 8 * 1024;

/// Something the scanner recognized, in the order it was recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SectionStarted(String),
    OptionFound(OptionValue),
}

/// Both `#` and `;` open a comment.
#[must_use]
pub fn is_comment(b: u8) -> bool {
    matches!(b, b'#' | b';')
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

fn is_line_break(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// `None` stands for "no section opened yet" in the option states; those options are still
/// emitted so the assembler can reject them.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    ScanTop,
    // A top-level line already known to hold no `=`.
    SkipStray,
    ReadSectionName(Vec<u8>),
    SectionSuffix(String),
    AfterSectionOrOption(String),
    ReadOptionName(Option<String>),
    ReadOptionValue {
        section: Option<String>,
        name: String,
        acc: String,
    },
    SkipComment(Option<String>),
}

impl State {
    fn resume(section: Option<String>) -> Self {
        match section {
            Some(section) => Self::AfterSectionOrOption(section),
            None => Self::ScanTop,
        }
    }
}

type Transition = (Option<State>, Option<Event>);

/// Byte buffer over a reader that supports one byte of push-back and look-ahead of arbitrary
/// length.
#[derive(Debug)]
struct Input<R> {
    reader: R,
    buf: Vec<u8>,
    pos: usize,
    // Bytes already dropped from the front of `buf`.
    base: usize,
    eof: bool,
}

impl<R: Read> Input<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(CHUNK_SIZE),
            pos: 0,
            base: 0,
            eof: false,
        }
    }

    /// Absolute position in the stream of the next unconsumed byte.
    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn available(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Read one more chunk. Returns `false` once the reader is exhausted.
    fn fill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }

        self.buf.drain(..self.pos);
        self.base += self.pos;
        self.pos = 0;

        let start = self.buf.len();
        self.buf.resize(start + CHUNK_SIZE, 0);
        loop {
            match self.reader.read(&mut self.buf[start..]) {
                Ok(0) => {
                    self.buf.truncate(start);
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.buf.truncate(start + n);
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(e);
                }
            }
        }
    }

    /// Up to `n` unconsumed bytes; fewer only when the input ends first.
    fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        while self.available().len() < n && self.fill()? {}
        let len = n.min(self.available().len());
        Ok(&self.buf[self.pos..self.pos + len])
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if self.available().is_empty() && !self.fill()? {
            return Ok(None);
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }

    /// Push back the byte returned by the last `next_byte`.
    fn unread(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos -= 1;
    }

    /// Consume through the first byte matching `is_delim`, which is included. The flag is
    /// `false` if the input ended before such a byte was seen.
    fn read_until(&mut self, is_delim: impl Fn(u8) -> bool) -> io::Result<(Vec<u8>, bool)> {
        let mut out = Vec::new();
        loop {
            let available = self.available();
            if let Some(i) = available.iter().position(|&b| is_delim(b)) {
                out.extend_from_slice(&available[..=i]);
                self.pos += i + 1;
                return Ok((out, true));
            }
            out.extend_from_slice(available);
            self.pos = self.buf.len();
            if !self.fill()? {
                return Ok((out, false));
            }
        }
    }

    /// Consume the rest of the current line, returning it without its line break along with
    /// whether the input ended before a break was found.
    fn read_line(&mut self) -> io::Result<(Vec<u8>, bool)> {
        let (mut line, found) = self.read_until(|b| b == b'\n')?;
        if found {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok((line, !found))
    }

    /// Whether `needle` occurs before the end of the current line, without consuming anything.
    fn line_ahead_contains(&mut self, needle: u8) -> io::Result<bool> {
        let mut scanned = 0;
        loop {
            for &b in &self.available()[scanned..] {
                if b == needle {
                    return Ok(true);
                }
                if b == b'\n' {
                    return Ok(false);
                }
            }
            scanned = self.available().len();
            if !self.fill()? {
                return Ok(false);
            }
        }
    }
}

/// The scanner. Yields events lazily and stops for good after the first error.
///
/// ```
/// use systemd_config::{Event, Lexer, OptionValue};
///
/// let events = Lexer::new("[Match]\nA=B\n".as_bytes())
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
///
/// assert_eq!(
///     events,
///     vec![
///         Event::SectionStarted("Match".to_owned()),
///         Event::OptionFound(OptionValue::new("A", "B")),
///     ]
/// );
/// ```
#[derive(Debug)]
pub struct Lexer<R> {
    input: Input<R>,
    config: Config,
    state: Option<State>,
    // Absolute offset of a line break already seen at or past the cursor.
    known_break: Option<usize>,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, Config::default())
    }

    pub fn with_config(reader: R, config: Config) -> Self {
        Self {
            input: Input::new(reader),
            config,
            state: Some(State::ScanTop),
            known_break: None,
        }
    }

    fn check_line_length(&mut self) -> Result<(), ParseError> {
        let max = self.config.line_max;
        let here = self.input.offset();
        if self
            .known_break
            .is_some_and(|at| at >= here && at - here < max)
        {
            return Ok(());
        }

        let window = self.input.peek(max)?;
        match window.iter().position(|&b| is_line_break(b)) {
            Some(i) => {
                self.known_break = Some(here + i);
                Ok(())
            }
            None if window.len() >= max => Err(ParseError::LineTooLong { max }),
            None => Ok(()),
        }
    }

    fn step(&mut self, state: State) -> Result<Transition, ParseError> {
        match state {
            State::ScanTop => self.scan_top(),
            State::SkipStray => self.skip_stray(),
            State::ReadSectionName(partial) => self.read_section_name(partial),
            State::SectionSuffix(section) => self.section_suffix(section),
            State::AfterSectionOrOption(section) => self.after_section_or_option(section),
            State::ReadOptionName(section) => self.read_option_name(section),
            State::ReadOptionValue { section, name, acc } => {
                self.read_option_value(section, name, acc)
            }
            State::SkipComment(section) => self.skip_comment(section),
        }
    }

    fn scan_top(&mut self) -> Result<Transition, ParseError> {
        let next = match self.input.next_byte()? {
            None => return Ok((None, None)),
            Some(b'[') => State::ReadSectionName(Vec::new()),
            Some(b) if is_comment(b) => State::SkipComment(None),
            Some(b) if !is_space(b) => {
                self.input.unread();
                if self.input.line_ahead_contains(b'=')? {
                    State::ReadOptionName(None)
                } else {
                    self.input.next_byte()?;
                    State::SkipStray
                }
            }
            Some(_) => State::ScanTop,
        };
        Ok((Some(next), None))
    }

    fn skip_stray(&mut self) -> Result<Transition, ParseError> {
        let next = match self.input.next_byte()? {
            None => return Ok((None, None)),
            Some(b'\n') => State::ScanTop,
            Some(b'[') => State::ReadSectionName(Vec::new()),
            Some(b) if is_comment(b) => State::SkipComment(None),
            Some(_) => State::SkipStray,
        };
        Ok((Some(next), None))
    }

    /// Names may span lines; each line is its own transition so every one is length-checked.
    fn read_section_name(&mut self, mut partial: Vec<u8>) -> Result<Transition, ParseError> {
        let (raw, found) = self
            .input
            .read_until(|b| b == b']' || is_line_break(b))?;
        if !found {
            return Err(ParseError::UnterminatedSection);
        }
        partial.extend_from_slice(&raw);
        if raw.last() == Some(&b']') {
            partial.pop();
            return Ok((Some(State::SectionSuffix(decode(&partial))), None));
        }
        Ok((Some(State::ReadSectionName(partial)), None))
    }

    fn section_suffix(&mut self, section: String) -> Result<Transition, ParseError> {
        let (rest, _) = self.input.read_line()?;
        let garbage = decode(&rest);
        let garbage = garbage.trim();
        if !garbage.is_empty() {
            return Err(ParseError::GarbageAfterSectionName {
                section,
                garbage: garbage.to_owned(),
            });
        }

        Ok((
            Some(State::AfterSectionOrOption(section.clone())),
            Some(Event::SectionStarted(section)),
        ))
    }

    fn after_section_or_option(&mut self, section: String) -> Result<Transition, ParseError> {
        let next = match self.input.next_byte()? {
            None => return Ok((None, None)),
            Some(b) if is_space(b) => State::AfterSectionOrOption(section),
            Some(b'[') => State::ReadSectionName(Vec::new()),
            Some(b) if is_comment(b) => State::SkipComment(Some(section)),
            Some(_) => {
                self.input.unread();
                State::ReadOptionName(Some(section))
            }
        };
        Ok((Some(next), None))
    }

    fn read_option_name(&mut self, section: Option<String>) -> Result<Transition, ParseError> {
        let mut partial = Vec::new();
        loop {
            match self.input.next_byte()? {
                None => return Err(ParseError::UnterminatedOptionName),
                Some(b) if is_line_break(b) => return Err(ParseError::NewlineInOptionName),
                Some(b'=') => break,
                Some(b) => partial.push(b),
            }
        }

        let name = decode(&partial).trim().to_owned();
        Ok((
            Some(State::ReadOptionValue {
                section,
                name,
                acc: String::new(),
            }),
            None,
        ))
    }

    fn read_option_value(
        &mut self,
        section: Option<String>,
        name: String,
        mut acc: String,
    ) -> Result<Transition, ParseError> {
        let (line, at_eof) = self.input.read_line()?;
        let line = decode(&line);

        if !line.trim().is_empty() {
            acc.push_str(&line);
            if line.ends_with('\\') {
                if !at_eof {
                    acc.push('\n');
                }
                return Ok((Some(State::ReadOptionValue { section, name, acc }), None));
            }
        }

        // A kept line break means the value was continued into a blank line.
        let value = if acc.ends_with('\n') {
            format!("{}\n", acc.trim())
        } else {
            acc.trim().to_owned()
        };

        Ok((
            Some(State::resume(section)),
            Some(Event::OptionFound(OptionValue::new(name, value))),
        ))
    }

    /// One comment line per transition; a trailing backslash continues the comment.
    fn skip_comment(&mut self, section: Option<String>) -> Result<Transition, ParseError> {
        let (line, _) = self.input.read_line()?;
        let line = line.strip_suffix(b" ").unwrap_or(&line);
        if line.ends_with(b"\\") {
            return Ok((Some(State::SkipComment(section)), None));
        }
        Ok((Some(State::resume(section)), None))
    }
}

impl<R: Read> Iterator for Lexer<R> {
    type Item = Result<Event, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(state) = self.state.take() {
            let transition = self
                .check_line_length()
                .and_then(|()| self.step(state));

            match transition {
                Ok((next, event)) => {
                    self.state = next;
                    if let Some(event) = event {
                        trace!(?event, "scanned");
                        return Some(Ok(event));
                    }
                }
                Err(err) => {
                    debug!(%err, "scan failed");
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

impl<R: Read> FusedIterator for Lexer<R> {}
