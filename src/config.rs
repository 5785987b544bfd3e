/// Longest line, in bytes, systemd accepts in a unit file.
pub const LINE_MAX: usize = 2048;

/// Knobs for the scanner.
///
/// ```
/// use systemd_config::{Config, LINE_MAX};
///
/// assert_eq!(Config::default().line_max, LINE_MAX);
/// assert_eq!(Config::default().with_line_max(80).line_max, 80);
/// ```
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// A parse fails once this many bytes have been buffered without a line break among them.
    ///
    /// `0` rejects every input, even an empty one. `usize::MAX` effectively turns the check off.
    pub line_max: usize,
}

impl Config {
    /// See [`Config::line_max`] for the meaning of the extremes.
    pub fn with_line_max(mut self, line_max: usize) -> Self {
        self.line_max = line_max;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { line_max: LINE_MAX }
    }
}
