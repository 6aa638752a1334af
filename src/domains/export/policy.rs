use crate::domains::export::types::{
    EmptyLinePolicy, FormattingPolicy, QuoteMode, SurroundingSpacesPolicy,
};

/// Accumulates formatting overrides and produces a [`FormattingPolicy`].
///
/// Unset options fall back to RFC-4180 style defaults: `,` delimiter, `"`
/// quote, `\n` line ending, normal quoting, blank rows ignored and surrounding
/// spaces quoted.
#[derive(Debug, Clone)]
pub struct FormattingPolicyBuilder {
    delimiter: char,
    quote_char: char,
    quote_mode: QuoteMode,
    end_of_line: String,
    empty_line_policy: EmptyLinePolicy,
    surrounding_spaces_policy: SurroundingSpacesPolicy,
}

impl Default for FormattingPolicyBuilder {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: '"',
            quote_mode: QuoteMode::Normal,
            end_of_line: "\n".to_string(),
            empty_line_policy: EmptyLinePolicy::Ignore,
            surrounding_spaces_policy: SurroundingSpacesPolicy::NeedsQuotes,
        }
    }
}

impl FormattingPolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn quote_char(mut self, quote_char: char) -> Self {
        self.quote_char = quote_char;
        self
    }

    #[must_use]
    pub fn quote_mode(mut self, quote_mode: QuoteMode) -> Self {
        self.quote_mode = quote_mode;
        self
    }

    #[must_use]
    pub fn end_of_line(mut self, end_of_line: impl Into<String>) -> Self {
        self.end_of_line = end_of_line.into();
        self
    }

    #[must_use]
    pub fn empty_lines(mut self, policy: EmptyLinePolicy) -> Self {
        self.empty_line_policy = policy;
        self
    }

    #[must_use]
    pub fn surrounding_spaces(mut self, policy: SurroundingSpacesPolicy) -> Self {
        self.surrounding_spaces_policy = policy;
        self
    }

    /// Freeze the accumulated options. Never fails.
    pub fn build(&self) -> FormattingPolicy {
        FormattingPolicy {
            delimiter: self.delimiter,
            quote_char: self.quote_char,
            quote_mode: self.quote_mode,
            end_of_line: self.end_of_line.clone(),
            empty_line_policy: self.empty_line_policy,
            surrounding_spaces_policy: self.surrounding_spaces_policy,
        }
    }
}
