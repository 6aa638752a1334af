use crate::domains::export::policy::FormattingPolicyBuilder;
use crate::domains::export::repository::QuerySession;
use crate::domains::export::service::ExportService;
use crate::domains::export::timing::summary_line;
use crate::domains::export::types::{
    CommandStatus, EmptyLinePolicy, ExportOutcome, ExportRequest, QuoteMode,
    SurroundingSpacesPolicy,
};
use crate::errors::{CommandError, ExportError, ParseResult};
use crate::messages::MessageSink;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Keyword the command is registered under.
pub const COMMAND_NAME: &str = "csv";

fn option_regex() -> &'static Regex {
    static OPTION_REGEX: OnceLock<Regex> = OnceLock::new();
    OPTION_REGEX.get_or_init(|| {
        Regex::new(r"^(quote-char|delim-char|quote-mode|empty-lines|surrounding-spaces|headers)=(.*)$")
            .unwrap()
    })
}

/// Byte range of the next whitespace-delimited token at or after `from`.
fn next_token(input: &str, from: usize) -> Option<(usize, usize)> {
    let start = from + input[from..].find(|c: char| !c.is_whitespace())?;
    let end = input[start..]
        .find(char::is_whitespace)
        .map(|offset| start + offset)
        .unwrap_or(input.len());
    Some((start, end))
}

fn single_char(option: &str, value: &str) -> ParseResult<char> {
    if value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CommandError::InvalidCharacter {
            option: option.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "on" | "yes")
}

/// Split the parameters of a `csv` command into an [`ExportRequest`].
///
/// Leading `key=value` options are consumed in any order; the first other
/// token is the destination and everything after it, trimmed but otherwise
/// untouched, is the query.
pub fn parse_parameters(parameters: &str) -> ParseResult<ExportRequest> {
    let mut builder = FormattingPolicyBuilder::new();
    let mut include_headers = true;
    let mut pos = 0;

    loop {
        let (start, end) = next_token(parameters, pos).ok_or(CommandError::MissingDestination)?;
        let token = &parameters[start..end];

        let Some(caps) = option_regex().captures(token) else {
            let query = parameters[end..].trim();
            if query.is_empty() {
                return Err(CommandError::MissingQuery(token.to_string()));
            }

            let policy = builder.build();
            if policy.delimiter() == policy.quote_char() {
                return Err(CommandError::ConflictingCharacters(policy.delimiter()));
            }

            return Ok(ExportRequest {
                destination: PathBuf::from(token),
                include_headers,
                query: query.to_string(),
                policy,
            });
        };

        let (option, value) = (&caps[1], &caps[2]);
        builder = match option {
            "quote-char" => builder.quote_char(single_char(option, value)?),
            "delim-char" => builder.delimiter(single_char(option, value)?),
            "quote-mode" => builder.quote_mode(value.parse::<QuoteMode>()?),
            "empty-lines" => builder.empty_lines(value.parse::<EmptyLinePolicy>()?),
            "surrounding-spaces" => builder.surrounding_spaces(value.parse::<SurroundingSpacesPolicy>()?),
            "headers" => {
                include_headers = parse_flag(value);
                builder
            }
            _ => unreachable!("option regex only matches known options"),
        };
        pos = end;
    }
}

/// What a command invocation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReport {
    pub status: CommandStatus,
    pub outcome: Option<ExportOutcome>,
}

impl CommandReport {
    fn failed(status: CommandStatus) -> Self {
        Self { status, outcome: None }
    }
}

/// The `csv` command: parses its parameters, runs the export and reports
/// progress through a [`MessageSink`].
#[derive(Debug, Clone, Default)]
pub struct CsvCommand {
    service: ExportService,
}

impl CsvCommand {
    pub fn new(service: ExportService) -> Self {
        Self { service }
    }

    pub fn command_list(&self) -> &'static [&'static str] {
        &[COMMAND_NAME]
    }

    pub fn requires_valid_session(&self) -> bool {
        true
    }

    pub fn short_description(&self) -> &'static str {
        "save results to csv file"
    }

    pub fn synopsis(&self) -> String {
        format!(
            "{} [headers=on|off] [quote-char=X] [quote-mode=always|normal] [delim-char=X] \
             [empty-lines=ignore|use] [surrounding-spaces=need-quotes|ignore] <csv-file> select ...",
            COMMAND_NAME
        )
    }

    pub fn long_description(&self) -> String {
        format!(
            "\tSave the output of a SELECT as CSV.\n\
             \n\
             \t\t{} <csv-file> select ...;\n\
             \n\
             \tOptions go before the file name, in any order:\n\
             \t\theaders=on|off                     write the column names first (default on)\n\
             \t\tquote-char=X                       quote character (default \")\n\
             \t\tdelim-char=X                       field delimiter, \\t for tab (default ,)\n\
             \t\tquote-mode=always|normal           quote every field or only when needed\n\
             \t\tempty-lines=ignore|use             drop or keep rows that encode as an empty line\n\
             \t\tsurrounding-spaces=need-quotes|ignore  quote fields with leading/trailing spaces\n\
             \n\
             \tThe file is overwritten on every run.\n",
            COMMAND_NAME
        )
    }

    /// Run the command with the text that followed the `csv` keyword.
    pub async fn execute(
        &self,
        session: Option<&mut dyn QuerySession>,
        parameters: &str,
        sink: &mut dyn MessageSink,
    ) -> CommandReport {
        let Some(session) = session else {
            sink.println(&ExportError::NoSession.to_string());
            return CommandReport::failed(CommandStatus::ExecFailed);
        };

        let request = match parse_parameters(parameters) {
            Ok(request) => request,
            Err(e) => {
                log::debug!("Rejected csv parameters '{}': {}", parameters, e);
                sink.println(&e.to_string());
                return CommandReport::failed(CommandStatus::SyntaxError);
            }
        };

        sink.println(&format!("Saving to {}", request.destination.display()));

        match self.service.export(session, &request).await {
            Ok(outcome) => {
                sink.println(&summary_line(&outcome));
                CommandReport {
                    status: CommandStatus::Success,
                    outcome: Some(outcome),
                }
            }
            Err(e) => {
                sink.println(&e.to_string());
                CommandReport::failed(CommandStatus::ExecFailed)
            }
        }
    }
}
