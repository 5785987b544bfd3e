use std::fmt::{self, Write};
use std::io;

use crate::Unit;
use crate::section::{OptionValue, Section};

/// Render `unit` as canonical text.
///
/// Sections without options are left out entirely. A blank line follows every emitted section
/// whose position in `unit` is not the last one, whether or not anything is emitted after it.
#[must_use]
pub fn serialize(unit: &Unit) -> String {
    unit.to_string()
}

impl Unit {
    /// Write the canonical text of this unit to `writer`.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(serialize(self).as_bytes())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_unit(f, self)
    }
}

fn write_unit<W: Write>(out: &mut W, unit: &Unit) -> fmt::Result {
    let last = unit.sections().len().saturating_sub(1);

    for (i, section) in unit.sections().iter().enumerate() {
        if section.is_empty() {
            continue;
        }

        write_section_header(out, section)?;
        for option in section.options() {
            write_option_value(out, option)?;
        }
        if i < last {
            write_newline(out)?;
        }
    }

    Ok(())
}

fn write_newline<W: Write>(out: &mut W) -> fmt::Result {
    out.write_char('\n')
}

fn write_section_header<W: Write>(out: &mut W, section: &Section) -> fmt::Result {
    write!(out, "[{}]", section.name())?;
    write_newline(out)
}

fn write_option_value<W: Write>(out: &mut W, option: &OptionValue) -> fmt::Result {
    write!(out, "{}={}", option.name(), option.value())?;
    write_newline(out)
}
