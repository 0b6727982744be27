// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Anytime, impact-ordered, score-at-a-time top-k search.
//!
//! Given a precomputed impact index (quantised term-document scores, postings
//! grouped into equal-impact segments) and a stream of queries, the engine
//! returns the top-k documents per query while processing at most a budgeted
//! number of postings. The budget is the whole trick: postings are visited in
//! decreasing order of marginal impact, so wherever the budget cuts off, the
//! ranking built so far is the best partial answer available — an anytime
//! algorithm whose "time" is counted in postings.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │  index.rs    │───▶│  search.rs   │───▶│ accumulator/    │
//! │ (IndexView,  │    │ (schedule,   │    │ (bucket/maxblock│
//! │  mmap view)  │    │  budget loop)│    │  + topk.rs)     │
//! └──────────────┘    └──────────────┘    └─────────────────┘
//!        │                   │                    │
//!        ▼                   ▼                    ▼
//! ┌──────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │  codecs/     │    │  worker.rs   │    │ run_export.rs   │
//! │ (registry +  │    │ (atomic queue│    │ (TREC run +     │
//! │  decoders)   │    │  over rayon) │    │  stats files)   │
//! └──────────────┘    └──────────────┘    └─────────────────┘
//! ```
//!
//! The postings region is memory-mapped and shared immutably by every worker;
//! each worker owns its decoder, accumulator, and scratch buffers, so the hot
//! loop never allocates or locks.

pub mod accumulator;
pub mod channel;
pub mod codecs;
pub mod config;
pub mod error;
pub mod index;
pub mod limits;
pub mod run_export;
pub mod search;
pub mod testing;
pub mod topk;
pub mod worker;

pub use accumulator::{Accumulator, Score};
pub use config::Config;
pub use error::{Error, Result};
pub use index::{IndexView, SegmentHeader, TermDescriptor};
pub use run_export::{render_stats, render_stats_line, render_trec_run, QueryRecord};
pub use search::{execute_query, parse_query, split_query_record, ParsedQuery, SearchResults};
pub use topk::Hit;
pub use worker::run_pool;
