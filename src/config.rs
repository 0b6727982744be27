// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Immutable per-invocation configuration.
//!
//! Built once from the command line, validated, then shared by reference with
//! every worker. There is deliberately no mutable global anywhere: a worker
//! sees exactly what the controller saw.

use crate::limits::{MAX_ACCUMULATOR_WIDTH_EXP, MAX_TOP_K};

#[derive(Debug, Clone)]
pub struct Config {
    /// Worker thread count, `>= 1`.
    pub threads: usize,
    /// Results per query.
    pub top_k: usize,
    /// Hard posting cap, used while the ratio sits at its default.
    pub posting_budget_absolute: u64,
    /// Budget as a percentage of the collection size; when moved off its
    /// default of 100 it overwrites the absolute cap.
    pub posting_budget_ratio_pct: u64,
    /// The accumulator is split into `2^w` blocks.
    pub accumulator_width_exp: u32,
    /// Trust the query text: whitespace-separated, pre-casefolded tokens.
    pub raw_parser: bool,
    /// Run tag written into the TREC output.
    pub run_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            threads: 1,
            top_k: 10,
            posting_budget_absolute: 0,
            posting_budget_ratio_pct: 100,
            accumulator_width_exp: 7,
            raw_parser: false,
            run_name: "impetus".to_string(),
        }
    }
}

impl Config {
    /// Check the option ranges; returns a human-readable complaint.
    pub fn validate(&self) -> Result<(), String> {
        if self.threads == 0 {
            return Err("thread count must be at least 1".to_string());
        }
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(format!("top-k must be in 1..={}", MAX_TOP_K));
        }
        if self.posting_budget_ratio_pct > 100 {
            return Err("budget percentage must be in 0..=100".to_string());
        }
        if self.accumulator_width_exp > MAX_ACCUMULATOR_WIDTH_EXP {
            return Err(format!(
                "accumulator width exponent must be at most {}",
                MAX_ACCUMULATOR_WIDTH_EXP
            ));
        }
        Ok(())
    }

    /// The posting budget this configuration imposes for a collection of the
    /// given size. An explicit percentage wins; then the absolute cap; then
    /// unbounded.
    pub fn postings_budget(&self, documents: u32) -> u64 {
        if self.posting_budget_ratio_pct != 100 {
            u64::from(documents) * self.posting_budget_ratio_pct / 100
        } else if self.posting_budget_absolute != 0 {
            self.posting_budget_absolute
        } else {
            u64::MAX
        }
    }
}
