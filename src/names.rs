use std::path::{Path, PathBuf};

const CANDIDATE_DELIMITERS: [char; 4] = [',', '\t', ';', '|'];

#[derive(Debug, thiserror::Error)]
pub enum NamesError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8 text")]
    NotUtf8 { path: PathBuf },
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
}

impl NamesError {
    pub fn code(&self) -> &'static str {
        match self {
            NamesError::Io { .. } => "io_failed",
            NamesError::NotUtf8 { .. } | NamesError::UnterminatedQuote { .. } => "parse_failed",
        }
    }
}

/// One name per line; lines are trimmed and blank lines dropped.
pub fn parse_text_names(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}

/// Every cell of every record, row-major, trimmed, blanks dropped.
pub fn parse_delimited_names(text: &str, delimiter: Option<char>) -> Result<Vec<String>, NamesError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(text));
    let records = parse_records(text, delimiter)?;
    Ok(records
        .into_iter()
        .flatten()
        .map(|cell| cell.trim().to_string())
        .filter(|cell| !cell.is_empty())
        .collect())
}

pub fn read_delimited_names(path: &Path, delimiter: Option<char>) -> Result<Vec<String>, NamesError> {
    let bytes = std::fs::read(path).map_err(|source| NamesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| NamesError::NotUtf8 {
        path: path.to_path_buf(),
    })?;
    parse_delimited_names(&text, delimiter)
}

/// Picks the candidate that occurs most often outside quotes on the first line.
/// Ties and lines without any candidate fall back to a comma.
pub fn detect_delimiter(text: &str) -> char {
    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for ch in text.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if !in_quotes && (ch == '\n' || ch == '\r') {
            break;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|d| *d == ch) {
            counts[i] += 1;
        }
    }
    let mut best = 0usize;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    CANDIDATE_DELIMITERS[best]
}

fn parse_records(text: &str, delimiter: char) -> Result<Vec<Vec<String>>, NamesError> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut quote_line = 0usize;
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                buf.push('"');
                i += 2;
                continue;
            }
            if !in_quotes {
                quote_line = line;
            }
            in_quotes = !in_quotes;
            i += 1;
            continue;
        }
        if ch == '\n' {
            line += 1;
        }
        if in_quotes {
            buf.push(ch);
            i += 1;
            continue;
        }
        if ch == delimiter {
            record.push(std::mem::take(&mut buf));
        } else if ch == '\n' || ch == '\r' {
            // \r\n ends the record once.
            if !(ch == '\r' && chars.get(i + 1) == Some(&'\n')) {
                record.push(std::mem::take(&mut buf));
                records.push(std::mem::take(&mut record));
            }
        } else {
            buf.push(ch);
        }
        i += 1;
    }
    if in_quotes {
        return Err(NamesError::UnterminatedQuote { line: quote_line });
    }
    if !buf.is_empty() || !record.is_empty() {
        record.push(buf);
        records.push(record);
    }
    Ok(records)
}
