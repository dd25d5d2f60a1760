//! Parsing of range responses.
//!
//! A response body lists every known hash sharing the requested prefix, one
//! `SUFFIX:COUNT` record per `\r\n`-terminated line, e.g.
//!
//! ```text
//! 1E4C9B93F3F0682250B6CF8331B7EE68FD8:3303003
//! 1E4DCBAAD9A9C8A9F1B2C0D35B6A1F20F52:2
//! ```

use crate::error::{Error, MalformedLine};

/// Separator between records in a response body.
pub const LINE_DELIMITER: &str = "\r\n";

/// One `SUFFIX:COUNT` line of a range response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreachRecord<'a> {
    pub suffix: &'a str,
    pub count: u64,
}

impl<'a> BreachRecord<'a> {
    /// Splits a line on its first `:`.
    pub fn parse(line: &'a str) -> Result<Self, MalformedLine> {
        let (suffix, count) = line.split_once(':').ok_or(MalformedLine::MissingSeparator)?;
        let count = count
            .parse::<u64>()
            .map_err(|_| MalformedLine::InvalidCount(count.to_string()))?;
        Ok(Self { suffix, count })
    }
}

/// Result of scanning a body for one suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMatch {
    /// Number of records in the body.
    pub records: usize,
    /// Count of the matching record, if any.
    pub count: Option<u64>,
}

/// Interprets a response body as UTF-8.
pub fn decode_body(body: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(body).map_err(|e| {
        let line = 1 + count_delimiters(&body[..e.valid_up_to()]);
        Error::MalformedResponse {
            line,
            reason: MalformedLine::NotUtf8,
        }
    })
}

fn count_delimiters(bytes: &[u8]) -> usize {
    bytes
        .windows(LINE_DELIMITER.len())
        .filter(|w| *w == LINE_DELIMITER.as_bytes())
        .count()
}

/// Iterates over the records of a body, skipping empty lines.
///
/// Errors carry the 1-based line number of the offending line.
pub fn records(body: &str) -> impl Iterator<Item = Result<BreachRecord<'_>, Error>> {
    body.split(LINE_DELIMITER)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(idx, line)| {
            BreachRecord::parse(line).map_err(|reason| Error::MalformedResponse {
                line: idx + 1,
                reason,
            })
        })
}

/// Scans every record of `body` for an exact, case-sensitive `suffix` match.
///
/// The whole body is validated even after a match is found, so a malformed
/// response is never half-accepted.
pub fn scan(body: &str, suffix: &str) -> Result<RangeMatch, Error> {
    let mut result = RangeMatch {
        records: 0,
        count: None,
    };

    for record in records(body) {
        let record = record?;
        result.records += 1;
        if result.count.is_none() && record.suffix == suffix {
            result.count = Some(record.count);
        }
    }

    Ok(result)
}
