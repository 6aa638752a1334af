//! Decides whether the text typed so far forms a statement ready to submit.
//!
//! This is a lexical heuristic, not a parser: string literals and comments are
//! not taken into account, so a keyword inside a literal still counts.

const PROCEDURAL_KEYWORDS: [&str; 4] = ["PROCEDURE", "FUNCTION", "PACKAGE", "TRIGGER"];

/// True when the first occurrence of `word` in `text` is preceded by
/// whitespace (or starts the text) and followed by a whitespace character.
fn contains_word(text: &str, word: &str) -> bool {
    let Some(index) = text.find(word) else {
        return false;
    };

    let preceded = text[..index]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace);
    let followed = text[index + word.len()..]
        .chars()
        .next()
        .is_some_and(char::is_whitespace);

    preceded && followed
}

/// Blocks whose body contains `;` terminators of their own.
fn is_procedural(command: &str) -> bool {
    if command.starts_with("BEGIN") || command.starts_with("DECLARE") {
        return true;
    }
    (command.starts_with("CREATE") || command.starts_with("REPLACE"))
        && PROCEDURAL_KEYWORDS.iter().any(|kw| contains_word(command, kw))
}

/// Classify `buffer` as complete (ready to send) or not.
///
/// Rules, first match wins:
/// 1. `COMMIT` / `ROLLBACK` are always complete.
/// 2. Procedural blocks (`BEGIN`, `DECLARE`, `CREATE ... PROCEDURE` and friends)
///    are never completed by a trailing `;`.
/// 3. A trailing `;` completes anything else.
/// 4. A `/` alone on the last line completes any statement.
pub fn is_complete(buffer: &str) -> bool {
    let command = buffer.to_uppercase();

    if command.starts_with("COMMIT") || command.starts_with("ROLLBACK") {
        return true;
    }

    if !is_procedural(&command) && command.ends_with(';') {
        return true;
    }

    command.len() >= 3 && command.ends_with("\n/\n")
}
