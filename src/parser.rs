use std::io::Read;
use std::sync::mpsc;
use std::thread;

use tracing::{debug, trace};

use crate::Unit;
use crate::config::Config;
use crate::error::ParseError;
use crate::lexer::{Event, Lexer};
use crate::section::Section;

/// Folds scanner events into a [`Unit`].
#[derive(Debug, Default)]
struct Assembler {
    unit: Unit,
}

impl Assembler {
    fn accept(&mut self, event: Event) -> Result<(), ParseError> {
        match event {
            Event::SectionStarted(name) => self.unit.push(Section::new(name)),
            Event::OptionFound(option) => {
                let Some(section) = self.unit.last_section_mut() else {
                    debug!(option = %option, "rejecting option before any section");
                    return Err(ParseError::OptionBeforeSection);
                };
                section.push(option);
            }
        }
        Ok(())
    }

    fn finish(self) -> Unit {
        trace!(sections = self.unit.sections().len(), "assembled unit");
        self.unit
    }
}

/// Build a [`Unit`] from an already scanned event sequence.
///
/// # Errors
///
/// The first scan error in `events` is returned as-is. An option arriving before any section
/// fails with [`ParseError::OptionBeforeSection`].
pub fn assemble<I>(events: I) -> Result<Unit, ParseError>
where
    I: IntoIterator<Item = Result<Event, ParseError>>,
{
    let mut assembler = Assembler::default();
    for event in events {
        assembler.accept(event?)?;
    }
    Ok(assembler.finish())
}

/// Parse unit-file text using the default [`Config`].
///
/// # Errors
///
/// See [`parse_with_config`].
pub fn parse<R: Read>(reader: R) -> Result<Unit, ParseError> {
    parse_with_config(reader, &Config::default())
}

/// Parse unit-file text. Either the whole input is accepted or nothing is returned.
///
/// # Errors
///
/// Returns the first scan or read failure, or [`ParseError::OptionBeforeSection`].
pub fn parse_with_config<R: Read>(reader: R, config: &Config) -> Result<Unit, ParseError> {
    assemble(Lexer::with_config(reader, *config))
}

/// Like [`parse_with_config`], but the scanner runs on its own thread and hands events over one
/// at a time. The outcome is identical to the single-threaded parse.
///
/// # Errors
///
/// Same as [`parse_with_config`].
///
/// # Panics
///
/// Re-raises a panic from the scanner thread.
pub fn parse_concurrent<R>(reader: R, config: Config) -> Result<Unit, ParseError>
where
    R: Read + Send + 'static,
{
    // Rendezvous channel: the scanner blocks until each event has been taken.
    let (events_tx, events_rx) = mpsc::sync_channel::<Event>(0);

    let scanner = thread::spawn(move || -> Result<(), ParseError> {
        for event in Lexer::with_config(reader, config) {
            if events_tx.send(event?).is_err() {
                // The assembler gave up; nobody is listening any more.
                return Ok(());
            }
        }
        Ok(())
    });

    let mut assembler = Assembler::default();
    for event in &events_rx {
        // Returning drops the receiver, which stops the scanner at its next send.
        assembler.accept(event)?;
    }

    match scanner.join() {
        Ok(outcome) => outcome?,
        Err(panic) => std::panic::resume_unwind(panic),
    }

    Ok(assembler.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::OptionValue;

    #[test]
    fn sections_collect_their_options() {
        let unit = parse("[Match]\nA=B\nC=D\n".as_bytes()).unwrap();

        assert_eq!(
            unit,
            Unit::with_sections(vec![Section::with_options(
                "Match",
                vec![OptionValue::new("A", "B"), OptionValue::new("C", "D")],
            )])
        );
    }

    #[test]
    fn options_go_to_the_latest_section() {
        let unit = parse("[AAA]\nA=B\n\n[BBB]\nA=B\n[AAA]\nC=D\n".as_bytes()).unwrap();

        let names: Vec<_> = unit.sections().iter().map(Section::name).collect();
        assert_eq!(names, vec!["AAA", "BBB", "AAA"]);
        assert_eq!(unit.sections()[2].get("C"), Some("D"));
        assert_eq!(unit.sections()[2].get("A"), None);
    }

    #[test]
    fn option_before_section() {
        assert!(matches!(
            parse("A=B\n[Unit]\nC=D\n".as_bytes()),
            Err(ParseError::OptionBeforeSection)
        ));
    }

    #[test]
    fn assemble_rejects_option_first() {
        let events = vec![
            Ok(Event::OptionFound(OptionValue::new("A", "B"))),
            Ok(Event::SectionStarted("Unit".to_owned())),
        ];

        assert!(matches!(
            assemble(events),
            Err(ParseError::OptionBeforeSection)
        ));
    }

    #[test]
    fn assemble_propagates_scan_errors_verbatim() {
        let events = vec![
            Ok(Event::SectionStarted("Unit".to_owned())),
            Err(ParseError::UnterminatedSection),
        ];

        assert!(matches!(
            assemble(events),
            Err(ParseError::UnterminatedSection)
        ));
    }

    #[test]
    fn empty_sections_are_kept() {
        let unit = parse("[A]\n[B]\n".as_bytes()).unwrap();

        assert_eq!(unit.sections().len(), 2);
        assert!(unit.sections().iter().all(Section::is_empty));
    }

    #[test]
    fn concurrent_parse_matches_sequential() {
        let text = "# header\n[Unit]\nDescription=Test\n\n[Service]\nExecStart=/bin/a \\\n  -b\n";

        let sequential = parse(text.as_bytes()).unwrap();
        let concurrent = parse_concurrent(text.as_bytes(), Config::default()).unwrap();

        assert_eq!(sequential, concurrent);
    }

    #[test]
    fn concurrent_parse_reports_scan_errors() {
        assert!(matches!(
            parse_concurrent(&b"[Unit]\nA=B\n[Broken"[..], Config::default()),
            Err(ParseError::UnterminatedSection)
        ));
    }

    #[test]
    fn concurrent_parse_aborts_on_option_before_section() {
        let text = format!("A=B\n[Unit]\n{}", "X=Y\n".repeat(1000));

        assert!(matches!(
            parse_concurrent(std::io::Cursor::new(text), Config::default()),
            Err(ParseError::OptionBeforeSection)
        ));
    }
}
