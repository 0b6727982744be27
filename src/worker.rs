// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The worker pool: one query per worker at a time, all buffers per-worker.
//!
//! The only shared mutable object is an atomic cursor into the immutable
//! query list. Each worker loops: fetch-and-increment the cursor, process
//! that query start to finish, record the result locally, repeat until the
//! cursor runs off the end. Fetch-and-increment is totally ordered, so every
//! query is processed exactly once regardless of thread count.
//!
//! Workers never share accumulators, decoders, or scratch buffers — those are
//! allocated once per worker and reused across its queries, which is what
//! keeps the hot loop allocation-free after warmup. A corrupt segment turns
//! into an empty result for that query, with a note on stderr; every other
//! query proceeds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use indicatif::ProgressBar;

use crate::accumulator::Accumulator;
use crate::codecs::{self, Codex};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::IndexView;
use crate::run_export::QueryRecord;
use crate::search::{execute_query, parse_query, split_query_record, ScheduleEntry};

/// Per-worker state, built once and reused for every query the worker pulls.
struct Worker {
    codex: Codex,
    accumulator: Accumulator,
    schedule: Vec<ScheduleEntry>,
    scratch: Vec<u32>,
    records: Vec<QueryRecord>,
}

impl Worker {
    fn new(index: &IndexView, config: &Config) -> Result<Worker> {
        Ok(Worker {
            codex: codecs::select(index.codec_tag())?,
            accumulator: Accumulator::new(index.document_count(), config.accumulator_width_exp),
            schedule: Vec::new(),
            scratch: Vec::new(),
            records: Vec::new(),
        })
    }

    fn run(
        &mut self,
        index: &IndexView,
        queries: &[String],
        next_query: &AtomicUsize,
        config: &Config,
        postings_budget: u64,
        progress: Option<&ProgressBar>,
    ) {
        loop {
            let slot = next_query.fetch_add(1, Ordering::SeqCst);
            if slot >= queries.len() {
                break;
            }
            let record = &queries[slot];
            let (id, text) = split_query_record(record);
            let parsed = parse_query(id, text, config.raw_parser);

            let started = Instant::now();
            let results = execute_query(
                index,
                &mut self.codex,
                &parsed,
                postings_budget,
                config.top_k,
                &mut self.accumulator,
                &mut self.schedule,
                &mut self.scratch,
            );
            let elapsed = started.elapsed().as_nanos();

            let (hits, postings_processed) = match results {
                Ok(results) => (results.hits, results.postings_processed),
                Err(err) => {
                    eprintln!("query {}: {}; returning empty result", parsed.id, err);
                    (Vec::new(), 0)
                }
            };

            self.records.push(QueryRecord {
                query_id: parsed.id,
                query_text: parsed.text,
                hits,
                postings_processed,
                search_time_ns: elapsed,
            });
            if let Some(progress) = progress {
                progress.inc(1);
            }
        }
    }
}

/// Run every query through a pool of `config.threads` workers. Returns one
/// record list per worker, in worker order; within a list, records are in the
/// order that worker observed queries.
pub fn run_pool(
    index: &IndexView,
    queries: &[String],
    config: &Config,
    progress: Option<&ProgressBar>,
) -> Result<Vec<Vec<QueryRecord>>> {
    let postings_budget = config.postings_budget(index.document_count());
    let mut workers = Vec::with_capacity(config.threads);
    for _ in 0..config.threads {
        workers.push(Worker::new(index, config)?);
    }

    let next_query = AtomicUsize::new(0);
    if config.threads == 1 {
        workers[0].run(index, queries, &next_query, config, postings_budget, progress);
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        pool.scope(|scope| {
            for worker in workers.iter_mut() {
                let next_query = &next_query;
                scope.spawn(move |_| {
                    worker.run(index, queries, next_query, config, postings_budget, progress);
                });
            }
        });
    }

    Ok(workers.into_iter().map(|worker| worker.records).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::TAG_CARRYOVER;
    use crate::testing::IndexBuilder;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir) -> IndexView {
        let mut builder = IndexBuilder::new(TAG_CARRYOVER);
        builder.documents(&["a", "b", "c"]);
        builder.term("x", &[(5, &[0, 2])]);
        builder.term("y", &[(3, &[1])]);
        let paths = builder.write_to(dir.path()).unwrap();
        IndexView::open(
            &paths.primary_keys,
            &paths.vocabulary,
            &paths.terms,
            &paths.postings,
        )
        .unwrap()
    }

    #[test]
    fn every_query_is_processed_exactly_once() {
        let dir = TempDir::new().unwrap();
        let index = fixture(&dir);
        let queries: Vec<String> = (0..37).map(|i| format!("{} x y", i)).collect();
        let config = Config {
            threads: 4,
            top_k: 3,
            ..Config::default()
        };
        let per_worker = run_pool(&index, &queries, &config, None).unwrap();
        assert_eq!(per_worker.len(), 4);
        let mut seen: Vec<String> = per_worker
            .iter()
            .flatten()
            .map(|record| record.query_id.clone())
            .collect();
        assert_eq!(seen.len(), 37);
        seen.sort_by_key(|id| id.parse::<u32>().unwrap());
        seen.dedup();
        assert_eq!(seen.len(), 37);
    }

    #[test]
    fn results_are_identical_across_thread_counts() {
        let dir = TempDir::new().unwrap();
        let index = fixture(&dir);
        let queries: Vec<String> = vec!["1 x".into(), "2 x y".into(), "3 y y".into()];

        let mut rankings: Vec<Vec<(String, Vec<crate::topk::Hit>)>> = Vec::new();
        for threads in [1, 2, 4] {
            let config = Config {
                threads,
                top_k: 3,
                ..Config::default()
            };
            let mut flat: Vec<(String, Vec<crate::topk::Hit>)> = run_pool(
                &index, &queries, &config, None,
            )
            .unwrap()
            .into_iter()
            .flatten()
            .map(|record| (record.query_id, record.hits))
            .collect();
            flat.sort_by(|a, b| a.0.cmp(&b.0));
            rankings.push(flat);
        }
        assert_eq!(rankings[0], rankings[1]);
        assert_eq!(rankings[1], rankings[2]);
    }
}
