// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query stream ingestion.
//!
//! Two input shapes, auto-detected by the first byte of the file:
//!
//! - First byte is an ASCII digit: one query per line, `query_id` first,
//!   separated from the text by whitespace or `:`. Trailing whitespace is
//!   stripped; blank lines are skipped.
//! - Anything else: a standardised topic file of `<top>` blocks, where
//!   `<num>` carries the query id (digits extracted from the rest of the
//!   line) and `<title>` carries the query text. The parser normalises each
//!   block into the same `id text` record the line format produces.
//!
//! Either way the caller receives a flat list of records ready for
//! [`crate::search::split_query_record`].

use std::path::Path;

use crate::error::Result;

/// Read a query file into a list of `id text` records.
pub fn read_queries(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_queries(&content))
}

/// Format detection plus parsing, split from I/O for testability.
pub fn parse_queries(content: &str) -> Vec<String> {
    match content.bytes().next() {
        None => Vec::new(),
        Some(first) if first.is_ascii_digit() => parse_query_lines(content),
        Some(_) => parse_topic_file(content),
    }
}

fn parse_query_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

/// Extract `<num>`/`<title>` pairs from a topic file. Tags are matched
/// case-insensitively and a topic without both parts is dropped.
fn parse_topic_file(content: &str) -> Vec<String> {
    // ASCII-only lowering keeps byte offsets aligned with `content`.
    let lower = content.to_ascii_lowercase();
    let mut records = Vec::new();
    let mut at = 0usize;

    while let Some(num_at) = lower[at..].find("<num>") {
        let num_start = at + num_at + "<num>".len();
        let num_end = lower[num_start..]
            .find('<')
            .map_or(content.len(), |rel| num_start + rel);
        let id: String = content[num_start..num_end]
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();

        let next_num = lower[num_end..].find("<num>").map(|rel| num_end + rel);
        let title = lower[num_end..].find("<title>").and_then(|rel| {
            let title_tag = num_end + rel;
            // A title past the next <num> belongs to the next topic.
            if next_num.is_some_and(|n| title_tag > n) {
                return None;
            }
            let title_start = title_tag + "<title>".len();
            let title_end = lower[title_start..]
                .find('<')
                .map_or(content.len(), |rel| title_start + rel);
            Some(content[title_start..title_end].trim().to_string())
        });

        match title {
            Some(title) if !id.is_empty() && !title.is_empty() => {
                at = num_end;
                records.push(format!("{} {}", id, title));
            }
            _ => at = num_end,
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format_is_detected_by_leading_digit() {
        let records = parse_queries("1 first query\n2:second query  \n\n3\tthird\n");
        assert_eq!(records, vec!["1 first query", "2:second query", "3\tthird"]);
    }

    #[test]
    fn empty_input_yields_no_queries() {
        assert!(parse_queries("").is_empty());
    }

    #[test]
    fn topic_format_is_detected_otherwise() {
        let topics = "\
<top>
<num> Number: 301
<title> International Organized Crime
<desc> Description:
ignored
</top>
<top>
<num> Number: 302
<title> Poliomyelitis and Post-Polio
</top>
";
        let records = parse_queries(topics);
        assert_eq!(
            records,
            vec![
                "301 International Organized Crime",
                "302 Poliomyelitis and Post-Polio",
            ]
        );
    }

    #[test]
    fn topic_without_title_is_dropped() {
        let topics = "<top>\n<num> Number: 55\n</top>\n";
        assert!(parse_queries(topics).is_empty());
    }

    #[test]
    fn titleless_topic_does_not_steal_the_next_title() {
        let topics = "\
<top>
<num> Number: 55
</top>
<top>
<num> Number: 56
<title> Real Title
</top>
";
        assert_eq!(parse_queries(topics), vec!["56 Real Title"]);
    }

    #[test]
    fn topic_tags_match_case_insensitively() {
        let topics = "<TOP>\n<NUM> 9\n<TITLE> Mixed Case Query\n</TOP>\n";
        assert_eq!(parse_queries(topics), vec!["9 Mixed Case Query"]);
    }
}
