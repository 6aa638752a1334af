use query_csv_export::domains::export::COMMAND_NAME;
use query_csv_export::{
    is_complete, AppConfig, CommandStatus, ConsoleSink, CsvCommand, ExportService, QuerySession,
    SqliteQuerySession,
};
use std::io::Read;
use std::process::ExitCode;

fn exit_with(status: CommandStatus) -> ExitCode {
    ExitCode::from(status.exit_code() as u8)
}

/// `--is-complete`: read a statement buffer from stdin and exit 0 if it is
/// ready to submit, 1 otherwise.
fn check_completeness() -> ExitCode {
    let mut buffer = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
        eprintln!("failed to read stdin: {}", e);
        return exit_with(CommandStatus::ExecFailed);
    }
    if is_complete(&buffer) {
        println!("complete");
        ExitCode::SUCCESS
    } else {
        println!("incomplete");
        ExitCode::from(1)
    }
}

/// Strip the leading `--json` flag and `csv` keyword, in either order.
///
/// Anything after the first other token belongs to the command parameters
/// and is left alone, so a `--json` inside the query text is not a flag.
fn split_leading_args(args: Vec<String>) -> (bool, Vec<String>) {
    let mut json = false;
    let mut keyword_seen = false;
    let mut consumed = 0;
    for arg in &args {
        match arg.as_str() {
            "--json" if !json => json = true,
            name if name == COMMAND_NAME && !keyword_seen => keyword_seen = true,
            _ => break,
        }
        consumed += 1;
    }
    (json, args.into_iter().skip(consumed).collect())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--is-complete") {
        return check_completeness();
    }

    let (json, args) = split_leading_args(args);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return exit_with(CommandStatus::ExecFailed);
        }
    };
    let command = CsvCommand::new(ExportService::new(config.export.clone()));

    if args.is_empty() || matches!(args[0].as_str(), "-h" | "--help") {
        println!("{} - {}", COMMAND_NAME, command.short_description());
        println!("usage: {}", command.synopsis());
        println!();
        print!("{}", command.long_description());
        return if args.is_empty() {
            exit_with(CommandStatus::SyntaxError)
        } else {
            ExitCode::SUCCESS
        };
    }

    let mut session = match config.require_database_url() {
        Ok(url) => match SqliteQuerySession::connect(url).await {
            Ok(session) => Some(session),
            Err(e) => {
                log::error!("Could not connect to {}: {}", url, e);
                None
            }
        },
        Err(e) => {
            log::error!("{}", e);
            None
        }
    };

    let parameters = args.join(" ");
    let mut sink = ConsoleSink;
    let report = command
        .execute(
            session.as_mut().map(|s| s as &mut dyn QuerySession),
            &parameters,
            &mut sink,
        )
        .await;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => log::error!("Failed to serialize report: {}", e),
        }
    }

    if let Some(session) = session {
        if let Err(e) = session.close().await {
            log::warn!("Ignoring failure while closing session: {}", e);
        }
    }

    if report.status == CommandStatus::SyntaxError {
        eprintln!("usage: {}", command.synopsis());
    }
    exit_with(report.status)
}
