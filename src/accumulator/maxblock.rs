// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Block-max accumulator: top-k extraction with early abandonment.
//!
//! Same flat score array as the bucketed variant, but each block also tracks
//! the maximum score it holds. Extraction walks blocks in order and skips any
//! block whose maximum cannot beat the k-th best score found so far; distinct
//! blocks hold distinct documents, so a beaten block can be abandoned without
//! looking inside it.
//!
//! The impact schedule is monotonically non-increasing, which would also
//! permit skipping individual adds into beaten blocks mid-query. This
//! implementation processes every add and confines the heuristic to
//! extraction, so its results are bit-identical to the bucketed variant's.

use crate::codecs::Codec;
use crate::error::Result;
use crate::topk::{Hit, TopK};

use super::{decode_segment, Score};

pub struct MaxBlockAccumulator {
    documents: u32,
    block_size: u32,
    scores: Vec<Score>,
    block_max: Vec<Score>,
    dirty: Vec<bool>,
}

impl MaxBlockAccumulator {
    pub fn new(documents: u32, width_exp: u32) -> Self {
        let blocks = 1u32 << width_exp;
        let block_size = documents.div_ceil(blocks).max(1);
        let block_count = documents.div_ceil(block_size) as usize;
        MaxBlockAccumulator {
            documents,
            block_size,
            scores: vec![0; documents as usize],
            block_max: vec![0; block_count],
            dirty: vec![false; block_count],
        }
    }

    /// Start a new query; same lazy per-block zeroing as the bucketed layout.
    pub fn reset(&mut self, _min_score: u32, _top_score: u32, _max_score: u32) {
        for block in 0..self.dirty.len() {
            if self.dirty[block] {
                let start = block * self.block_size as usize;
                let end = (start + self.block_size as usize).min(self.documents as usize);
                self.scores[start..end].fill(0);
                self.block_max[block] = 0;
                self.dirty[block] = false;
            }
        }
    }

    #[inline]
    pub fn add(&mut self, impact: u32, doc_id: u32) {
        let clamped = impact.min(u32::from(Score::MAX)) as Score;
        let slot = &mut self.scores[doc_id as usize];
        *slot = slot.saturating_add(clamped);
        let score = *slot;
        let block = (doc_id / self.block_size) as usize;
        if score > self.block_max[block] {
            self.block_max[block] = score;
        }
        self.dirty[block] = true;
    }

    pub fn decode_and_process(
        &mut self,
        impact: u32,
        n: usize,
        encoded: &[u8],
        codec: &mut dyn Codec,
        d_ness: u32,
        scratch: &mut Vec<u32>,
    ) -> Result<()> {
        let ids = decode_segment(codec, d_ness, self.documents, n, encoded, scratch)?;
        for i in 0..ids.len() {
            self.add(impact, scratch[i]);
        }
        Ok(())
    }

    /// Extract the k best pairs, abandoning blocks that cannot compete.
    pub fn finalize(&self, k: usize) -> Vec<Hit> {
        let mut topk = TopK::new(k);
        for (block, &dirty) in self.dirty.iter().enumerate() {
            if !dirty {
                continue;
            }
            if topk.is_full() && u32::from(self.block_max[block]) < topk.threshold() {
                continue;
            }
            let start = block * self.block_size as usize;
            let end = (start + self.block_size as usize).min(self.documents as usize);
            for doc_id in start..end {
                let score = self.scores[doc_id];
                if score > 0 {
                    topk.push(Hit {
                        score: u32::from(score),
                        doc_id: doc_id as u32,
                    });
                }
            }
        }
        topk.into_sorted()
    }
}
