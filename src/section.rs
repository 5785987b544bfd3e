use std::fmt;

/// A named group of options, opened by a `[Name]` header.
///
/// Duplicate option names are legal and meaningful, so options are kept as an ordered list rather
/// than a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    options: Vec<OptionValue>,
}

impl Section {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, Vec::new())
    }

    #[must_use]
    pub fn with_options(name: impl Into<String>, options: Vec<OptionValue>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn options(&self) -> &[OptionValue] {
        &self.options
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Value of the first option called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name() == name)
            .map(OptionValue::value)
    }

    /// Every value of the options called `name`, in source order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.options
            .iter()
            .filter(move |option| option.name() == name)
            .map(OptionValue::value)
    }

    pub(crate) fn push(&mut self, option: OptionValue) {
        self.options.push(option);
    }
}

/// One `Key=Value` line. The value may contain line breaks if it was continued with a trailing
/// backslash in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OptionValue {
    name: String,
    value: String,
}

impl OptionValue {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
