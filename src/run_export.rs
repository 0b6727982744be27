// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Result serialisation: the TREC run file and the per-query stats file.
//!
//! Both formats are stable text. The run file carries one line per returned
//! document — `query_id iter primary_key rank score run_name` with `Q0` as
//! the traditional iteration column — and the stats file wraps one line per
//! query in an XML-ish envelope so downstream tooling can grep either.

use std::fmt::Write as _;

use crate::index::IndexView;
use crate::topk::Hit;

/// Everything a worker records about one finished query.
#[derive(Debug, Clone)]
pub struct QueryRecord {
    pub query_id: String,
    pub query_text: String,
    pub hits: Vec<Hit>,
    pub postings_processed: u64,
    pub search_time_ns: u128,
}

/// Append one query's ranking in TREC run format, ranks starting at 1.
pub fn render_trec_run(out: &mut String, record: &QueryRecord, index: &IndexView, run_name: &str) {
    for (rank, hit) in record.hits.iter().enumerate() {
        let _ = writeln!(
            out,
            "{} Q0 {} {} {} {}",
            record.query_id,
            index.primary_key(hit.doc_id),
            rank + 1,
            hit.score,
            run_name
        );
    }
}

/// Append one query's stats line.
pub fn render_stats_line(out: &mut String, record: &QueryRecord) {
    let _ = writeln!(
        out,
        "<id>{}</id><query>{}</query><postings>{}</postings><time_ns>{}</time_ns>",
        record.query_id, record.query_text, record.postings_processed, record.search_time_ns
    );
}

/// The stats envelope.
pub fn render_stats(records: impl Iterator<Item = impl AsRef<str>>) -> String {
    let mut out = String::from("<impetusstats>\n");
    for line in records {
        out.push_str(line.as_ref());
    }
    out.push_str("</impetusstats>\n");
    out
}
