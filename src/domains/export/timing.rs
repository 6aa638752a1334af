use crate::domains::export::types::ExportOutcome;
use std::time::Duration;

/// Render a duration the way the summary line shows it.
///
/// Below one second: `350 msec`; below one minute: `2.045 sec`;
/// otherwise `1:02.500 min`, and `1:01:02 h` past the hour.
pub fn render_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms < 1_000 {
        return format!("{} msec", total_ms);
    }

    let ms = total_ms % 1_000;
    let total_secs = total_ms / 1_000;
    if total_secs < 60 {
        return format!("{}.{:03} sec", total_secs, ms);
    }

    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    if total_mins < 60 {
        return format!("{}:{:02}.{:03} min", total_mins, secs, ms);
    }

    format!("{}:{:02}:{:02} h", total_mins / 60, total_mins % 60, secs)
}

/// Summary printed after an export, e.g. `3 rows in result (first row: 2 msec; total: 9 msec)`.
///
/// Timings are left out when nothing was written.
pub fn summary_line(outcome: &ExportOutcome) -> String {
    let noun = if outcome.rows == 1 { "row" } else { "rows" };
    let mut line = format!("{} {} in result", outcome.rows, noun);

    if let Some(first_row) = outcome.first_row {
        line.push_str(&format!(
            " (first row: {}; total: {})",
            render_duration(first_row),
            render_duration(outcome.total)
        ));
    }
    line
}
