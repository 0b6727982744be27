// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The anytime segment scheduler: query in, ranked documents out, never more
//! than `postings_budget` postings of work.
//!
//! Evaluation is score-at-a-time over impact-ordered postings. Each query
//! term contributes one schedule entry per impact segment; entries across all
//! terms are sorted by effective impact (impact times the term's repetition
//! in the query) so the highest-yield work happens first. The budget check is
//! conservative: a segment that would overshoot is not started, so every
//! posting that was counted has been fully scored. That whole-segments-only
//! rule is what makes a truncated run a meaningful partial answer rather than
//! an arbitrary one.
//!
//! Queries that touch nothing (no known terms, zero budget, nothing fits)
//! return an empty ranking. Queries that touch anything rank the whole
//! collection: documents the budget never reached simply hold score zero and
//! fill out the tail in id order.

use crate::accumulator::{Accumulator, Score};
use crate::codecs::Codex;
use crate::error::{Error, Result};
use crate::index::IndexView;
use crate::limits::{MAX_QUANTUM, MAX_SCHEDULE_ENTRIES, MAX_TERMS_PER_QUERY};
use crate::topk::{pad_with_zero_scores, Hit};

/// One query as parsed: an id, the raw text, and the term multiset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub id: String,
    pub text: String,
    /// Distinct terms with their repetition counts, in first-seen order.
    pub terms: Vec<(String, u32)>,
}

/// One segment awaiting execution, ephemeral per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub effective_impact: u32,
    pub offset: usize,
    pub end: usize,
    pub segment_frequency: u32,
}

/// What one query produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub hits: Vec<Hit>,
    pub postings_processed: u64,
}

// ============================================================================
// QUERY PARSING
// ============================================================================

/// Split a query record into its id and text: the id runs to the first
/// space, tab, or colon; the text is everything after the separator run.
pub fn split_query_record(record: &str) -> (&str, &str) {
    let is_sep = |c: char| c == ' ' || c == '\t' || c == ':';
    match record.find(is_sep) {
        None => (record, ""),
        Some(at) => {
            let id = &record[..at];
            let rest = record[at..].trim_start_matches(is_sep);
            (id, rest.trim_end())
        }
    }
}

/// Tokenise query text into a term multiset.
///
/// The default parser lowercases and keeps alphanumeric runs, so `Dogs,cats!`
/// yields `dogs` and `cats`. The raw parser trusts its input: whitespace
/// separated, already casefolded, taken verbatim. Terms beyond the per-query
/// cap are dropped.
pub fn parse_query(id: &str, text: &str, raw: bool) -> ParsedQuery {
    let mut terms: Vec<(String, u32)> = Vec::new();
    let mut push = |token: String| {
        if token.is_empty() {
            return;
        }
        if let Some(entry) = terms.iter_mut().find(|(term, _)| *term == token) {
            entry.1 += 1;
        } else if terms.len() < MAX_TERMS_PER_QUERY {
            terms.push((token, 1));
        }
    };

    if raw {
        for token in text.split_whitespace() {
            push(token.to_string());
        }
    } else {
        let mut token = String::new();
        for c in text.chars() {
            if c.is_alphanumeric() {
                token.extend(c.to_lowercase());
            } else if !token.is_empty() {
                push(std::mem::take(&mut token));
            }
        }
        push(token);
    }

    ParsedQuery {
        id: id.to_string(),
        text: text.to_string(),
        terms,
    }
}

// ============================================================================
// SCHEDULING AND EXECUTION
// ============================================================================

/// Run one query against the index.
///
/// The caller owns the reusable buffers: `schedule` (cleared here), the
/// accumulator (reset here), and the decode `scratch`. A corrupt segment
/// surfaces as `MalformedCodecStream` and the caller degrades that query to
/// an empty result; nothing here panics on hostile index bytes.
#[allow(clippy::too_many_arguments)]
pub fn execute_query(
    index: &IndexView,
    codex: &mut Codex,
    query: &ParsedQuery,
    postings_budget: u64,
    k: usize,
    accumulator: &mut Accumulator,
    schedule: &mut Vec<ScheduleEntry>,
    scratch: &mut Vec<u32>,
) -> Result<SearchResults> {
    schedule.clear();

    // Materialise the schedule and the RSV bounds in one pass. The highest
    // impact is normally stored first, but some producers store it last, so
    // the bounds compare a term's first and last headers and take max/min.
    let mut largest_possible_rsv = 0u64;
    let mut smallest_possible_rsv = u64::MAX;
    for (term, repetition) in &query.terms {
        if *repetition == 0 {
            continue;
        }
        let Some(descriptor) = index.lookup(term) else {
            continue;
        };
        if descriptor.impact_count as usize > MAX_QUANTUM {
            return Err(Error::MalformedIndex(format!(
                "term has {} impact segments, limit {}",
                descriptor.impact_count, MAX_QUANTUM
            )));
        }
        let mut first_impact = 0u64;
        let mut last_impact = 0u64;
        for i in 0..descriptor.impact_count {
            let header = index.segment_header(&descriptor, i)?;
            if i == 0 {
                first_impact = u64::from(header.impact);
            }
            if i + 1 == descriptor.impact_count {
                last_impact = u64::from(header.impact);
            }
            let effective_impact = u32::from(header.impact).saturating_mul(*repetition);
            if effective_impact == 0 {
                continue;
            }
            schedule.push(ScheduleEntry {
                effective_impact,
                offset: header.offset,
                end: header.end,
                segment_frequency: header.segment_frequency,
            });
        }
        if descriptor.impact_count > 0 {
            largest_possible_rsv += first_impact.max(last_impact) * u64::from(*repetition);
            smallest_possible_rsv = smallest_possible_rsv.min(first_impact.min(last_impact));
        }
    }

    // The per-term and per-query caps bound the schedule by construction.
    debug_assert!(schedule.len() <= MAX_SCHEDULE_ENTRIES);

    if schedule.is_empty() {
        return Ok(SearchResults {
            hits: Vec::new(),
            postings_processed: 0,
        });
    }

    if largest_possible_rsv > u64::from(Score::MAX) {
        eprintln!(
            "warning: query {} can reach score {} which saturates the {}-bit \
             accumulator; rebuild with a wider accumulator feature for exact sums",
            query.id,
            largest_possible_rsv,
            Score::BITS
        );
    }

    // Highest impact first; at equal impact the cheaper segment first, so the
    // budget buys the most progress. Stable sort keeps ties deterministic.
    schedule.sort_by(|a, b| {
        b.effective_impact
            .cmp(&a.effective_impact)
            .then_with(|| a.segment_frequency.cmp(&b.segment_frequency))
    });

    accumulator.reset(
        smallest_possible_rsv.min(u64::from(u32::MAX)) as u32,
        schedule[0].effective_impact,
        largest_possible_rsv.min(u64::from(u32::MAX)) as u32,
    );

    let postings = index.postings_base();
    let mut postings_processed = 0u64;
    for entry in schedule.iter() {
        // The anytime rule: starting this segment must not be able to push us
        // past the budget. No partial segments, ever.
        if postings_processed + u64::from(entry.segment_frequency) > postings_budget {
            break;
        }
        postings_processed += u64::from(entry.segment_frequency);
        accumulator.decode_and_process(
            entry.effective_impact,
            entry.segment_frequency as usize,
            &postings[entry.offset..entry.end],
            codex.codec.as_mut(),
            codex.d_ness,
            scratch,
        )?;
    }

    if postings_processed == 0 {
        return Ok(SearchResults {
            hits: Vec::new(),
            postings_processed: 0,
        });
    }

    let mut hits = accumulator.finalize(k);
    pad_with_zero_scores(&mut hits, k, index.document_count());
    Ok(SearchResults {
        hits,
        postings_processed,
    })
}
