//! Choice line tags: `-> text [if cond] [time seconds]`.

use skein_types::{parse_number, ErrorCode};

/// A `->` line with its tags removed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChoiceLine {
    pub text: String,
    pub condition: Option<String>,
    pub time: Option<f64>,
}

/// A malformed tag. `offset` is the byte offset of the tag's `[` within the
/// text handed to [`parse_choice_line`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TagError {
    pub code: ErrorCode,
    pub message: String,
    pub offset: usize,
}

/// Split the text after `->` into label, condition and time limit.
///
/// The `[if …]` tag is removed first, then `[time …]` from what remains, so
/// the tags may appear in either order.
pub(crate) fn parse_choice_line(rest: &str) -> Result<ChoiceLine, TagError> {
    let (text, condition) = match take_tag(rest, "if", ErrorCode::MALFORMED_CONDITION_TAG)? {
        Some((text, inner, offset)) => {
            let condition = inner.trim();
            if condition.is_empty() {
                return Err(TagError {
                    code: ErrorCode::MALFORMED_CONDITION_TAG,
                    message: "empty condition in [if] tag".into(),
                    offset,
                });
            }
            (text, Some(condition.to_string()))
        }
        None => (rest.to_string(), None),
    };

    // Offsets are reported against `rest`, not the text left after `[if]`.
    let tagged = take_tag(&text, "time", ErrorCode::MALFORMED_TIME_TAG).map_err(|err| TagError {
        offset: time_tag_offset(rest),
        ..err
    })?;
    let (text, time) = match tagged {
        Some((stripped, inner, _)) => {
            let seconds = parse_number(inner.trim())
                .filter(|s| *s >= 0.0)
                .ok_or_else(|| TagError {
                    code: ErrorCode::MALFORMED_TIME_TAG,
                    message: format!("invalid seconds '{}' in [time] tag", inner.trim()),
                    offset: time_tag_offset(rest),
                })?;
            (stripped, Some(seconds))
        }
        None => (text, None),
    };

    Ok(ChoiceLine {
        text: text.trim().to_string(),
        condition,
        time,
    })
}

/// Remove the first `[keyword …]` tag from `text`.
///
/// Returns the text with the tag cut out (the pieces on either side joined
/// by one space), the tag's inner text and the byte offset of its `[`.
fn take_tag(
    text: &str,
    keyword: &str,
    code: ErrorCode,
) -> Result<Option<(String, String, usize)>, TagError> {
    let Some(start) = find_tag(text, keyword) else {
        return Ok(None);
    };
    let inner_start = start + 1 + keyword.len();
    let Some(close) = text[inner_start..].find(']') else {
        return Err(TagError {
            code,
            message: format!("[{keyword}] tag is missing its closing ']'"),
            offset: start,
        });
    };
    let inner = &text[inner_start..inner_start + close];
    let before = text[..start].trim_end();
    let after = text[inner_start + close + 1..].trim_start();
    let joined = match (before.is_empty(), after.is_empty()) {
        (false, false) => format!("{before} {after}"),
        _ => format!("{before}{after}"),
    };
    Ok(Some((joined, inner.to_string(), start)))
}

/// Byte offset of `[keyword` followed by whitespace or `]`, ignoring case.
fn find_tag(text: &str, keyword: &str) -> Option<usize> {
    let lowered = text.to_ascii_lowercase();
    let needle = format!("[{keyword}");
    let mut from = 0;
    while let Some(found) = lowered[from..].find(&needle) {
        let start = from + found;
        let after = start + needle.len();
        match lowered[after..].chars().next() {
            Some(c) if c.is_whitespace() || c == ']' => return Some(start),
            _ => from = after,
        }
    }
    None
}

fn time_tag_offset(text: &str) -> usize {
    find_tag(text, "time").unwrap_or(0)
}
