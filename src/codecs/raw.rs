// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Uncompressed codec: `n` little-endian `u32` words, nothing else.
//!
//! Exists as the degenerate member of the registry and as the oracle the
//! compressed codecs are tested against.

use crate::codecs::Codec;
use crate::error::{Error, Result};

pub struct Raw;

impl Codec for Raw {
    fn decode(&mut self, encoded: &[u8], n: usize, out: &mut [u32]) -> Result<()> {
        if encoded.len() < n * 4 {
            return Err(Error::MalformedCodecStream("raw segment shorter than count"));
        }
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            let at = i * 4;
            *slot = u32::from_le_bytes([
                encoded[at],
                encoded[at + 1],
                encoded[at + 2],
                encoded[at + 3],
            ]);
        }
        Ok(())
    }

    fn encode(&self, values: &[u32], out: &mut Vec<u8>) -> Result<()> {
        out.reserve(values.len() * 4);
        for value in values {
            out.extend_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "raw"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let values = vec![0, 1, u32::MAX, 42];
        let mut encoded = Vec::new();
        Raw.encode(&values, &mut encoded).unwrap();
        assert_eq!(encoded.len(), 16);

        let mut out = vec![0u32; 4];
        Raw.decode(&encoded, 4, &mut out).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let mut out = vec![0u32; 2];
        assert!(Raw.decode(&[1, 0, 0, 0, 9], 2, &mut out).is_err());
    }
}
