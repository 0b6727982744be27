// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Posting-list integer codecs and the tag registry.
//!
//! Every impact segment in the postings region is a compressed run of
//! document-id deltas. Which compression scheme applies is decided once per
//! index: byte 0 of the postings region is a codec tag, and the registry maps
//! that tag to a decoder plus its D-ness (how many leading ids are stored as
//! absolute values before delta coding starts).
//!
//! The tag set is closed and stable on disk:
//!
//! | tag | codec | D |
//! |-----|----------------------------------|---|
//! | 0   | raw little-endian `u32`          | 1 |
//! | 1   | carryover transition coder       | 1 |
//! | 2   | Elias gamma (bitwise, value + 1) | 1 |
//! | 3   | Elias delta (bitwise, value + 1) | 1 |
//!
//! Decoders never read past the encoded slice they are handed; a stream that
//! would require it is reported as [`Error::MalformedCodecStream`] and the
//! query degrades to an empty result.

pub mod carryover;
pub mod elias;
pub mod raw;

use crate::error::{Error, Result};

/// One integer codec: a decode side used on the query path and an encode side
/// used by the test index writer and the round-trip laws.
pub trait Codec: Send {
    /// Decode exactly `n` integers from `encoded` into `out[..n]`.
    ///
    /// The slice is exactly one segment's bytes. Malformed input may produce
    /// unspecified *values* but must never read outside `encoded`.
    fn decode(&mut self, encoded: &[u8], n: usize, out: &mut [u32]) -> Result<()>;

    /// Encode `values` onto the end of `out`.
    fn encode(&self, values: &[u32], out: &mut Vec<u8>) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// A decoder selected by tag, bundled with its D-ness.
pub struct Codex {
    pub codec: Box<dyn Codec>,
    pub d_ness: u32,
    pub name: &'static str,
}

/// Known codec tags.
pub const TAG_RAW: u8 = 0;
pub const TAG_CARRYOVER: u8 = 1;
pub const TAG_ELIAS_GAMMA: u8 = 2;
pub const TAG_ELIAS_DELTA: u8 = 3;

/// Resolve a codec tag read from the postings region.
pub fn select(tag: u8) -> Result<Codex> {
    match tag {
        TAG_RAW => Ok(Codex {
            codec: Box::new(raw::Raw),
            d_ness: 1,
            name: "raw",
        }),
        TAG_CARRYOVER => Ok(Codex {
            codec: Box::new(carryover::Carryover),
            d_ness: 1,
            name: "carryover",
        }),
        TAG_ELIAS_GAMMA => Ok(Codex {
            codec: Box::new(elias::EliasGamma),
            d_ness: 1,
            name: "elias-gamma",
        }),
        TAG_ELIAS_DELTA => Ok(Codex {
            codec: Box::new(elias::EliasDelta),
            d_ness: 1,
            name: "elias-delta",
        }),
        other => Err(Error::UnsupportedCodec(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_resolve() {
        for (tag, name) in [
            (TAG_RAW, "raw"),
            (TAG_CARRYOVER, "carryover"),
            (TAG_ELIAS_GAMMA, "elias-gamma"),
            (TAG_ELIAS_DELTA, "elias-delta"),
        ] {
            let codex = select(tag).unwrap();
            assert_eq!(codex.name, name);
            assert_eq!(codex.d_ness, 1);
        }
    }

    #[test]
    fn unknown_tag_is_refused() {
        match select(0x42) {
            Err(Error::UnsupportedCodec(0x42)) => {}
            other => panic!("expected UnsupportedCodec, got {:?}", other.map(|c| c.name)),
        }
    }

    /// Every registered codec must round-trip a representative delta stream.
    #[test]
    fn all_codecs_round_trip() {
        let values: Vec<u32> = vec![0, 1, 1, 5, 200, 70_000, 1, 0, 3];
        for tag in [TAG_RAW, TAG_CARRYOVER, TAG_ELIAS_GAMMA, TAG_ELIAS_DELTA] {
            let mut codex = select(tag).unwrap();
            let mut encoded = Vec::new();
            codex.codec.encode(&values, &mut encoded).unwrap();
            let mut decoded = vec![0u32; values.len()];
            codex
                .codec
                .decode(&encoded, values.len(), &mut decoded)
                .unwrap();
            assert_eq!(decoded, values, "codec tag {} failed round-trip", tag);
        }
    }
}
