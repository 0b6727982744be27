// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Compile-time bounds on index and query sizes.
//!
//! These caps exist so per-worker buffers can be allocated once and reused
//! across queries. An index or query that exceeds them is refused at startup
//! with a message naming the constant to raise.

/// Maximum number of documents in a collection.
pub const MAX_DOCUMENTS: u32 = 55_000_000;

/// Maximum number of results a query may request.
pub const MAX_TOP_K: usize = 1_000;

/// Maximum number of distinct terms considered per query; extra terms are
/// dropped by the parser.
pub const MAX_TERMS_PER_QUERY: usize = 1_024;

/// Maximum number of impact segments a single term's postings list may hold.
pub const MAX_QUANTUM: usize = 0x0FFF;

/// Maximum accumulator width exponent (the block count is `2^w`).
pub const MAX_ACCUMULATOR_WIDTH_EXP: u32 = 24;

/// Upper bound on the per-query segment schedule, used to cap the growable
/// schedule buffer each worker preallocates.
pub const MAX_SCHEDULE_ENTRIES: usize = MAX_TERMS_PER_QUERY * MAX_QUANTUM;
