//! Shared fixtures for the end-to-end tests.

#![allow(dead_code)]

use std::path::Path;

use impetus::codecs::{self, Codec as _, Codex};
use impetus::testing::IndexBuilder;
use impetus::{Accumulator, Config, Hit, IndexView, ParsedQuery, SearchResults};

/// The three-document index the scenario tests are written against:
/// `A = 0`, `B = 1`, `C = 2`.
pub fn abc_builder(codec_tag: u8) -> IndexBuilder {
    let mut builder = IndexBuilder::new(codec_tag);
    builder.documents(&["A", "B", "C"]);
    builder
}

pub fn open_index(dir: &Path, builder: &IndexBuilder) -> IndexView {
    let paths = builder.write_to(dir).unwrap();
    IndexView::open(
        &paths.primary_keys,
        &paths.vocabulary,
        &paths.terms,
        &paths.postings,
    )
    .unwrap()
}

/// Run one query line through the full scheduler with fresh worker state.
pub fn search(index: &IndexView, query_line: &str, budget: u64, k: usize) -> SearchResults {
    let mut codex: Codex = codecs::select(index.codec_tag()).unwrap();
    let (id, text) = impetus::split_query_record(query_line);
    let parsed: ParsedQuery = impetus::parse_query(id, text, false);
    let mut accumulator = Accumulator::new(index.document_count(), 7);
    let mut schedule = Vec::new();
    let mut scratch = Vec::new();
    impetus::execute_query(
        index,
        &mut codex,
        &parsed,
        budget,
        k,
        &mut accumulator,
        &mut schedule,
        &mut scratch,
    )
    .unwrap()
}

pub fn hit(score: u32, doc_id: u32) -> Hit {
    Hit { score, doc_id }
}

/// Naive reference: score every posting of every query term, then rank.
/// Used to check exhaustive-budget equivalence.
pub fn naive_saat(index: &IndexView, query_line: &str, k: usize) -> Vec<Hit> {
    let mut codex = codecs::select(index.codec_tag()).unwrap();
    let (id, text) = impetus::split_query_record(query_line);
    let parsed = impetus::parse_query(id, text, false);

    let documents = index.document_count() as usize;
    let mut scores = vec![0u64; documents];
    let mut touched = false;
    for (term, repetition) in &parsed.terms {
        let Some(descriptor) = index.lookup(term) else {
            continue;
        };
        for i in 0..descriptor.impact_count {
            let header = index.segment_header(&descriptor, i).unwrap();
            let n = header.segment_frequency as usize;
            let mut values = vec![0u32; n];
            codex
                .codec
                .decode(
                    &index.postings_base()[header.offset..header.end],
                    n,
                    &mut values,
                )
                .unwrap();
            let mut doc_id = 0u64;
            for (j, &value) in values.iter().enumerate() {
                if (j as u32) < codex.d_ness {
                    doc_id = u64::from(value);
                } else {
                    doc_id += u64::from(value);
                }
                scores[doc_id as usize] += u64::from(header.impact) * u64::from(*repetition);
                touched = true;
            }
        }
    }
    if !touched {
        return Vec::new();
    }

    let mut ranked: Vec<Hit> = scores
        .iter()
        .enumerate()
        .map(|(doc_id, &score)| Hit {
            score: score.min(u64::from(impetus::Score::MAX)) as u32,
            doc_id: doc_id as u32,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id)));
    ranked.truncate(k);
    ranked
}

/// Convenience for running the same queries through the worker pool with a
/// given thread count and flattening to `(query_id, hits)` sorted by id.
pub fn pooled_rankings(
    index: &IndexView,
    queries: &[String],
    threads: usize,
    k: usize,
) -> Vec<(String, Vec<Hit>)> {
    let config = Config {
        threads,
        top_k: k,
        ..Config::default()
    };
    let mut flat: Vec<(String, Vec<Hit>)> = impetus::run_pool(index, queries, &config, None)
        .unwrap()
        .into_iter()
        .flatten()
        .map(|record| (record.query_id, record.hits))
        .collect();
    flat.sort_by(|a, b| a.0.cmp(&b.0));
    flat
}
