//! Parsing of a single `/proc/<tid>/stat` line.
//!
//! The line looks like `1234 (worker (io)) S 1 ...`. The name may itself
//! contain parentheses or spaces, so it is taken from the first `(` to the
//! last `)`, and the state is the one character after the separator that
//! follows the closing `)`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub pid: u32,
    pub name: String,
    pub state: char,
}

/// Parses a stat line, returning `None` for anything malformed.
///
/// A `None` is handled exactly like an unreadable status file.
pub fn parse_status_line(line: &str) -> Option<StatusRecord> {
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if close < open {
        return None;
    }

    let pid = line[..open].trim().parse::<u32>().ok()?;
    let name = &line[open + 1..close];

    let mut after_name = line[close + 1..].chars();
    after_name.next()?;
    let state = after_name.next().filter(|c| !c.is_whitespace())?;

    Some(StatusRecord {
        pid,
        name: name.to_string(),
        state,
    })
}
