// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-document score accumulators.
//!
//! A query's score state is logically `doc_id -> partial score` over the whole
//! collection. Two physical layouts implement that contract and the engine
//! picks one at build time:
//!
//! - [`bucket::BucketAccumulator`] (default): a flat score array partitioned
//!   into `2^w` blocks with per-block dirty flags, so resetting between
//!   queries costs only the blocks the previous query touched.
//! - [`maxblock::MaxBlockAccumulator`] (feature `maxblock`): the same array
//!   plus a per-block running maximum, letting top-k extraction abandon whole
//!   blocks that cannot beat the current threshold.
//!
//! Scores saturate rather than wrap. Impacts only ever add, so a saturated
//! document stays at the ceiling and cannot drop below a document it already
//! dominated.
//!
//! `decode_and_process` is the hot path: decode one segment into the caller's
//! scratch buffer, rebuild document ids from the stored first-id-plus-gaps
//! form, bounds-check them, and add the segment's impact to each.

pub mod bucket;
pub mod maxblock;

use crate::codecs::Codec;
use crate::error::{Error, Result};

/// Accumulator element type. 16 bits covers realistic impact sums; build with
/// `accum8` to halve the array or `accum32` when quantisation is coarse.
#[cfg(all(feature = "accum8", not(feature = "accum32")))]
pub type Score = u8;
#[cfg(all(feature = "accum32", not(feature = "accum8")))]
pub type Score = u32;
#[cfg(not(any(feature = "accum8", feature = "accum32")))]
pub type Score = u16;

/// The accumulator the engine uses; swapped wholesale by the build feature.
#[cfg(feature = "maxblock")]
pub type Accumulator = maxblock::MaxBlockAccumulator;
#[cfg(not(feature = "maxblock"))]
pub type Accumulator = bucket::BucketAccumulator;

/// Reconstruct absolute document ids in place from decoded values: the first
/// `d_ness` values are absolute, the rest are gaps on the running id. Every
/// id must land inside the collection or the segment is corrupt.
pub(crate) fn undelta_and_check(values: &mut [u32], d_ness: u32, documents: u32) -> Result<()> {
    let mut running = 0u64;
    for (i, value) in values.iter_mut().enumerate() {
        if (i as u32) < d_ness {
            running = u64::from(*value);
        } else {
            running += u64::from(*value);
        }
        if running >= u64::from(documents) {
            return Err(Error::MalformedCodecStream(
                "decoded document id outside collection",
            ));
        }
        *value = running as u32;
    }
    Ok(())
}

/// Decode one segment and add `impact` to every document in it. Shared by
/// both accumulator variants, which only differ in `add` and `finalize`.
pub(crate) fn decode_segment<'a>(
    codec: &mut dyn Codec,
    d_ness: u32,
    documents: u32,
    n: usize,
    encoded: &[u8],
    scratch: &'a mut Vec<u32>,
) -> Result<&'a [u32]> {
    scratch.clear();
    scratch.resize(n, 0);
    codec.decode(encoded, n, scratch)?;
    undelta_and_check(scratch, d_ness, documents)?;
    Ok(&scratch[..])
}
