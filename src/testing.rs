// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Test-only index writer.
//!
//! Serialises the four on-disk files so tests can exercise the real load and
//! query paths against real bytes instead of mocks. This is the only place in
//! the crate that produces the format; production indexes come from an
//! external indexer.

#![doc(hidden)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::codecs::{self, Codec as _};
use crate::error::Result;

/// Paths of a written index.
pub struct IndexPaths {
    pub primary_keys: PathBuf,
    pub vocabulary: PathBuf,
    pub terms: PathBuf,
    pub postings: PathBuf,
}

/// One term's segment: an impact score and the ascending document ids that
/// share it.
struct SegmentSpec {
    impact: u16,
    doc_ids: Vec<u32>,
}

/// Builds a complete index in memory and writes it to a directory.
pub struct IndexBuilder {
    codec_tag: u8,
    primary_keys: Vec<String>,
    terms: BTreeMap<String, Vec<SegmentSpec>>,
}

impl IndexBuilder {
    pub fn new(codec_tag: u8) -> Self {
        IndexBuilder {
            codec_tag,
            primary_keys: Vec::new(),
            terms: BTreeMap::new(),
        }
    }

    /// Set the collection's primary keys; `doc_id` is the position here.
    pub fn documents(&mut self, primary_keys: &[&str]) -> &mut Self {
        self.primary_keys = primary_keys.iter().map(|key| key.to_string()).collect();
        self
    }

    /// Add a term with its impact segments as `(impact, ascending doc ids)`.
    pub fn term(&mut self, term: &str, segments: &[(u16, &[u32])]) -> &mut Self {
        let specs = segments
            .iter()
            .map(|(impact, doc_ids)| SegmentSpec {
                impact: *impact,
                doc_ids: doc_ids.to_vec(),
            })
            .collect();
        self.terms.insert(term.to_string(), specs);
        self
    }

    /// Serialise everything into `dir` under the conventional file names.
    pub fn write_to(&self, dir: &Path) -> Result<IndexPaths> {
        let paths = IndexPaths {
            primary_keys: dir.join("CIdoclist.bin"),
            vocabulary: dir.join("CIvocab.bin"),
            terms: dir.join("CIvocab_terms.bin"),
            postings: dir.join("CIpostings.bin"),
        };

        std::fs::write(&paths.primary_keys, self.primary_key_bytes())?;
        let (vocab, terms, postings) = self.index_bytes()?;
        std::fs::write(&paths.vocabulary, vocab)?;
        std::fs::write(&paths.terms, terms)?;
        std::fs::write(&paths.postings, postings)?;
        Ok(paths)
    }

    fn primary_key_bytes(&self) -> Vec<u8> {
        let mut strings = Vec::new();
        let mut offsets = Vec::new();
        for key in &self.primary_keys {
            offsets.push(strings.len() as u64);
            strings.extend_from_slice(key.as_bytes());
            strings.push(0);
        }
        for offset in offsets {
            strings.extend_from_slice(&offset.to_le_bytes());
        }
        strings.extend_from_slice(&(self.primary_keys.len() as u64).to_le_bytes());
        strings
    }

    fn index_bytes(&self) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
        let codex = codecs::select(self.codec_tag)?;
        let mut vocab = Vec::new();
        let mut terms = Vec::new();
        let mut postings = vec![self.codec_tag];

        // BTreeMap iteration keeps the vocabulary lexicographic.
        for (term, segments) in &self.terms {
            let term_offset = terms.len() as u64;
            terms.extend_from_slice(term.as_bytes());
            terms.push(0);

            // Payloads first, then headers, then the descriptor array.
            let mut headers = Vec::new();
            for segment in segments {
                let offset = postings.len() as u64;
                let mut values = Vec::with_capacity(segment.doc_ids.len());
                let mut previous = 0u32;
                for (i, &doc_id) in segment.doc_ids.iter().enumerate() {
                    if i == 0 {
                        values.push(doc_id);
                    } else {
                        values.push(doc_id - previous);
                    }
                    previous = doc_id;
                }
                codex.codec.encode(&values, &mut postings)?;
                headers.push((segment.impact, segment.doc_ids.len() as u32, offset));
            }

            let payload_end = postings.len() as u64;
            let mut header_offsets = Vec::new();
            for (i, &(impact, frequency, offset)) in headers.iter().enumerate() {
                let end = if i + 1 < headers.len() {
                    headers[i + 1].2
                } else {
                    payload_end
                };
                header_offsets.push(postings.len() as u64);
                postings.extend_from_slice(&impact.to_le_bytes());
                postings.extend_from_slice(&[0u8; 2]); // producer padding
                postings.extend_from_slice(&frequency.to_le_bytes());
                postings.extend_from_slice(&offset.to_le_bytes());
                postings.extend_from_slice(&end.to_le_bytes());
            }

            let descriptor_offset = postings.len() as u64;
            for header_offset in &header_offsets {
                postings.extend_from_slice(&header_offset.to_le_bytes());
            }

            vocab.extend_from_slice(&term_offset.to_le_bytes());
            vocab.extend_from_slice(&descriptor_offset.to_le_bytes());
            vocab.extend_from_slice(&(segments.len() as u64).to_le_bytes());
        }

        Ok((vocab, terms, postings))
    }
}
