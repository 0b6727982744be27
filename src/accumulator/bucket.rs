// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bucketed accumulator with lazy, dirty-flag resets.
//!
//! One flat score array sized to the collection, partitioned into `2^w`
//! equal blocks. Adding to a document marks its block dirty; starting the
//! next query zeroes only the blocks the previous query dirtied. For a
//! selective query over a large collection that is the difference between
//! touching a few kilobytes and memsetting the whole array.

use crate::codecs::Codec;
use crate::error::Result;
use crate::topk::{Hit, TopK};

use super::{decode_segment, Score};

pub struct BucketAccumulator {
    documents: u32,
    block_size: u32,
    scores: Vec<Score>,
    dirty: Vec<bool>,
}

impl BucketAccumulator {
    /// `width_exp` is `w`: the array is split into `2^w` blocks.
    pub fn new(documents: u32, width_exp: u32) -> Self {
        let blocks = 1u32 << width_exp;
        let block_size = documents.div_ceil(blocks).max(1);
        let block_count = documents.div_ceil(block_size) as usize;
        BucketAccumulator {
            documents,
            block_size,
            scores: vec![0; documents as usize],
            dirty: vec![false; block_count],
        }
    }

    /// Start a new query. The bound arguments describe the possible score
    /// range of the coming query; this layout has nothing to size with them,
    /// but they are part of the accumulator contract shared with the
    /// block-max variant.
    pub fn reset(&mut self, _min_score: u32, _top_score: u32, _max_score: u32) {
        for block in 0..self.dirty.len() {
            if self.dirty[block] {
                let start = block * self.block_size as usize;
                let end = (start + self.block_size as usize).min(self.documents as usize);
                self.scores[start..end].fill(0);
                self.dirty[block] = false;
            }
        }
    }

    /// Add `impact` to one document, saturating at the score ceiling.
    #[inline]
    pub fn add(&mut self, impact: u32, doc_id: u32) {
        let clamped = impact.min(u32::from(Score::MAX)) as Score;
        let slot = &mut self.scores[doc_id as usize];
        *slot = slot.saturating_add(clamped);
        self.dirty[(doc_id / self.block_size) as usize] = true;
    }

    /// Decode one segment into `scratch` and score every document in it.
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

    /// Extract the k best `(score, doc_id)` pairs, walking only dirty blocks.
    pub fn finalize(&self, k: usize) -> Vec<Hit> {
        let mut topk = TopK::new(k);
        for (block, &dirty) in self.dirty.iter().enumerate() {
            if !dirty {
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
