// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Read-only view over a serialized impact index.
//!
//! Four files make up an index:
//!
//! 1. **Primary keys**: concatenated NUL-terminated document identifiers,
//!    then `documents x u64` offsets into that string region, then a trailing
//!    `u64` document count.
//! 2. **Vocabulary**: `terms x (u64 term_offset, u64 postings_offset,
//!    u64 impact_count)` triples, lexicographically ordered by term.
//! 3. **Terms**: concatenated NUL-terminated term strings.
//! 4. **Postings**: byte 0 is the codec tag; the rest holds per-term
//!    descriptors (`u64[impact_count]` arrays of segment-header offsets),
//!    24-byte segment headers, and the compressed payloads they point at.
//!
//! The postings region is memory-mapped read-only and unmapped on drop; the
//! other three regions are small and read whole. Everything is validated at
//! load so the query path can stay check-light: every offset dereferenced
//! later has already been proven in range, except segment headers, which are
//! re-checked as they are read because their offsets come from the region
//! itself.
//!
//! No pointer casts anywhere: fixed-width fields are decoded from byte slices
//! at named offsets, so alignment never matters.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::limits::MAX_DOCUMENTS;

/// The location of one term's postings inside the index.
#[derive(Debug, Clone, Copy)]
pub struct TermDescriptor {
    /// Number of impact segments in the term's postings list.
    pub impact_count: u32,
    /// Byte offset of the `u64[impact_count]` segment-header offset array,
    /// relative to the postings base.
    pub descriptor_offset: usize,
}

/// One impact segment's stored header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Quantised score shared by every posting in the segment, `1..=255`.
    pub impact: u16,
    /// Number of document ids encoded in the segment.
    pub segment_frequency: u32,
    /// Payload byte range `[offset, end)` inside the postings region.
    pub offset: usize,
    pub end: usize,
}

/// Stored size of a segment header: u16 impact, two producer padding bytes,
/// u32 segment frequency, u64 offset, u64 end.
pub const SEGMENT_HEADER_BYTES: usize = 24;

#[derive(Debug)]
struct VocabEntry {
    term_offset: usize,
    postings_offset: usize,
    impact_count: u64,
}

/// Immutable view over a loaded index, shared by reference across workers.
#[derive(Debug)]
pub struct IndexView {
    key_bytes: Vec<u8>,
    key_offsets: Vec<usize>,
    documents: u32,
    vocab: Vec<VocabEntry>,
    term_bytes: Vec<u8>,
    postings: Mmap,
}

fn read_u64_at(bytes: &[u8], at: usize) -> Result<u64> {
    let end = at
        .checked_add(8)
        .ok_or_else(|| Error::MalformedIndex("offset overflow".into()))?;
    if end > bytes.len() {
        return Err(Error::MalformedIndex(format!(
            "u64 read at {} past region of {} bytes",
            at,
            bytes.len()
        )));
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..end]);
    Ok(u64::from_le_bytes(raw))
}

fn read_u32_at(bytes: &[u8], at: usize) -> Result<u32> {
    if at + 4 > bytes.len() {
        return Err(Error::MalformedIndex(format!(
            "u32 read at {} past region of {} bytes",
            at,
            bytes.len()
        )));
    }
    Ok(u32::from_le_bytes([
        bytes[at],
        bytes[at + 1],
        bytes[at + 2],
        bytes[at + 3],
    ]))
}

/// The NUL-terminated string starting at `at`.
fn cstr_at(bytes: &[u8], at: usize) -> Result<&[u8]> {
    let tail = bytes
        .get(at..)
        .ok_or_else(|| Error::MalformedIndex(format!("string offset {} out of range", at)))?;
    let nul = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::MalformedIndex("unterminated string".into()))?;
    Ok(&tail[..nul])
}

impl IndexView {
    /// Load an index from its four files. Fails with `Io` on any file problem
    /// and `MalformedIndex`/`IndexTooLarge` on structural violations; after
    /// this returns, the view is fully validated.
    pub fn open(
        primary_keys_path: &Path,
        vocab_path: &Path,
        terms_path: &Path,
        postings_path: &Path,
    ) -> Result<IndexView> {
        let key_bytes = std::fs::read(primary_keys_path)?;
        let vocab_bytes = std::fs::read(vocab_path)?;
        let term_bytes = std::fs::read(terms_path)?;

        let postings_file = File::open(postings_path)?;
        // SAFETY: the mapping is read-only and the index contract says the
        // files are not mutated while the engine runs.
        let postings = unsafe { Mmap::map(&postings_file)? };
        if postings.is_empty() {
            return Err(Error::MalformedIndex(
                "postings region is empty (missing codec tag)".into(),
            ));
        }

        let (key_offsets, documents) = Self::parse_primary_keys(&key_bytes)?;
        let vocab = Self::parse_vocabulary(&vocab_bytes, &term_bytes, postings.len())?;

        Ok(IndexView {
            key_bytes,
            key_offsets,
            documents,
            vocab,
            term_bytes,
            postings,
        })
    }

    fn parse_primary_keys(bytes: &[u8]) -> Result<(Vec<usize>, u32)> {
        if bytes.len() < 8 {
            return Err(Error::MalformedIndex(
                "primary key file too short for document count".into(),
            ));
        }
        let documents = read_u64_at(bytes, bytes.len() - 8)?;
        if documents > u64::from(MAX_DOCUMENTS) {
            return Err(Error::IndexTooLarge {
                what: "documents",
                actual: documents,
                limit: u64::from(MAX_DOCUMENTS),
            });
        }
        let documents_usize = documents as usize;
        let table_bytes = documents_usize
            .checked_mul(8)
            .and_then(|t| t.checked_add(8))
            .ok_or_else(|| Error::MalformedIndex("primary key table overflow".into()))?;
        if table_bytes > bytes.len() {
            return Err(Error::MalformedIndex(format!(
                "primary key file holds {} bytes but claims {} documents",
                bytes.len(),
                documents
            )));
        }
        let string_region = bytes.len() - table_bytes;
        let mut offsets = Vec::with_capacity(documents_usize);
        for id in 0..documents_usize {
            let offset = read_u64_at(bytes, string_region + id * 8)? as usize;
            if offset >= string_region {
                return Err(Error::MalformedIndex(format!(
                    "primary key {} offset {} outside string region of {} bytes",
                    id, offset, string_region
                )));
            }
            // Keys are rendered into the run file; insist on UTF-8 up front.
            let key = cstr_at(&bytes[..string_region], offset)?;
            std::str::from_utf8(key)
                .map_err(|_| Error::MalformedIndex(format!("primary key {} is not UTF-8", id)))?;
            offsets.push(offset);
        }
        Ok((offsets, documents as u32))
    }

    fn parse_vocabulary(
        vocab_bytes: &[u8],
        term_bytes: &[u8],
        postings_len: usize,
    ) -> Result<Vec<VocabEntry>> {
        if vocab_bytes.len() % 24 != 0 {
            return Err(Error::MalformedIndex(format!(
                "vocabulary file of {} bytes is not a whole number of triples",
                vocab_bytes.len()
            )));
        }
        let terms = vocab_bytes.len() / 24;
        let mut vocab = Vec::with_capacity(terms);
        for term in 0..terms {
            let base = term * 24;
            let term_offset = read_u64_at(vocab_bytes, base)? as usize;
            let postings_offset = read_u64_at(vocab_bytes, base + 8)? as usize;
            let impact_count = read_u64_at(vocab_bytes, base + 16)?;
            if term_offset >= term_bytes.len() {
                return Err(Error::MalformedIndex(format!(
                    "term {} string offset {} outside terms region",
                    term, term_offset
                )));
            }
            cstr_at(term_bytes, term_offset)?;
            let descriptor_end = (impact_count as usize)
                .checked_mul(8)
                .and_then(|len| postings_offset.checked_add(len))
                .ok_or_else(|| Error::MalformedIndex("descriptor overflow".into()))?;
            if descriptor_end > postings_len {
                return Err(Error::MalformedIndex(format!(
                    "term {} descriptor [{}, {}) outside postings region of {} bytes",
                    term, postings_offset, descriptor_end, postings_len
                )));
            }
            vocab.push(VocabEntry {
                term_offset,
                postings_offset,
                impact_count,
            });
        }
        Ok(vocab)
    }

    pub fn document_count(&self) -> u32 {
        self.documents
    }

    pub fn term_count(&self) -> usize {
        self.vocab.len()
    }

    /// The external identifier for a document. O(1) table lookup plus a scan
    /// to the key's NUL; used only when rendering results.
    pub fn primary_key(&self, doc_id: u32) -> &str {
        let offset = self.key_offsets[doc_id as usize];
        let tail = &self.key_bytes[offset..];
        let nul = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        // Validated UTF-8 at load.
        std::str::from_utf8(&tail[..nul]).unwrap_or("")
    }

    fn term_at(&self, index: usize) -> &[u8] {
        let tail = &self.term_bytes[self.vocab[index].term_offset..];
        let nul = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        &tail[..nul]
    }

    /// Binary search over the lexicographically ordered vocabulary. A missing
    /// term is not an error; it is simply skipped by the scheduler.
    pub fn lookup(&self, term: &str) -> Option<TermDescriptor> {
        let needle = term.as_bytes();
        let mut lo = 0usize;
        let mut hi = self.vocab.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.term_at(mid).cmp(needle) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => {
                    let entry = &self.vocab[mid];
                    return Some(TermDescriptor {
                        impact_count: entry.impact_count as u32,
                        descriptor_offset: entry.postings_offset,
                    });
                }
            }
        }
        None
    }

    /// Decode the `i`-th segment header of a term's postings list. Headers
    /// live inside the postings region at offsets named by the descriptor, so
    /// both levels are bounds-checked here.
    pub fn segment_header(&self, descriptor: &TermDescriptor, i: u32) -> Result<SegmentHeader> {
        debug_assert!(i < descriptor.impact_count);
        let postings = &self.postings[..];
        let header_offset =
            read_u64_at(postings, descriptor.descriptor_offset + (i as usize) * 8)? as usize;
        let header_end = header_offset
            .checked_add(SEGMENT_HEADER_BYTES)
            .ok_or_else(|| Error::MalformedIndex("segment header offset overflow".into()))?;
        if header_end > postings.len() {
            return Err(Error::MalformedIndex(format!(
                "segment header at {} past postings region of {} bytes",
                header_offset,
                postings.len()
            )));
        }
        let impact = u16::from_le_bytes([postings[header_offset], postings[header_offset + 1]]);
        let segment_frequency = read_u32_at(postings, header_offset + 4)?;
        let offset = read_u64_at(postings, header_offset + 8)? as usize;
        let end = read_u64_at(postings, header_offset + 16)? as usize;
        if !(1..=255).contains(&impact) {
            return Err(Error::MalformedIndex(format!(
                "segment impact {} outside 1..=255",
                impact
            )));
        }
        if offset > end || end > postings.len() {
            return Err(Error::MalformedIndex(format!(
                "segment payload [{}, {}) outside postings region of {} bytes",
                offset,
                end,
                postings.len()
            )));
        }
        Ok(SegmentHeader {
            impact,
            segment_frequency,
            offset,
            end,
        })
    }

    /// The whole postings region; segment payload ranges index into this.
    pub fn postings_base(&self) -> &[u8] {
        &self.postings[..]
    }

    /// The codec tag every segment in this index was compressed with.
    pub fn codec_tag(&self) -> u8 {
        self.postings[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::TAG_RAW;
    use crate::testing::IndexBuilder;
    use tempfile::TempDir;

    fn small_index(dir: &TempDir) -> IndexView {
        let mut builder = IndexBuilder::new(TAG_RAW);
        builder.documents(&["doc-a", "doc-b", "doc-c"]);
        builder.term("alpha", &[(5, &[0, 2])]);
        builder.term("beta", &[(9, &[1]), (3, &[0, 2])]);
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
    fn loads_and_exposes_primary_keys() {
        let dir = TempDir::new().unwrap();
        let index = small_index(&dir);
        assert_eq!(index.document_count(), 3);
        assert_eq!(index.primary_key(0), "doc-a");
        assert_eq!(index.primary_key(2), "doc-c");
        assert_eq!(index.codec_tag(), TAG_RAW);
    }

    #[test]
    fn lookup_finds_present_terms_only() {
        let dir = TempDir::new().unwrap();
        let index = small_index(&dir);
        let alpha = index.lookup("alpha").unwrap();
        assert_eq!(alpha.impact_count, 1);
        let beta = index.lookup("beta").unwrap();
        assert_eq!(beta.impact_count, 2);
        assert!(index.lookup("gamma").is_none());
        assert!(index.lookup("").is_none());
    }

    #[test]
    fn segment_headers_decode() {
        let dir = TempDir::new().unwrap();
        let index = small_index(&dir);
        let beta = index.lookup("beta").unwrap();
        let first = index.segment_header(&beta, 0).unwrap();
        assert_eq!(first.impact, 9);
        assert_eq!(first.segment_frequency, 1);
        let second = index.segment_header(&beta, 1).unwrap();
        assert_eq!(second.impact, 3);
        assert_eq!(second.segment_frequency, 2);
        assert!(second.offset <= second.end);
    }

    #[test]
    fn truncated_primary_keys_are_malformed() {
        let dir = TempDir::new().unwrap();
        let mut builder = IndexBuilder::new(TAG_RAW);
        builder.documents(&["only"]);
        builder.term("x", &[(1, &[0])]);
        let paths = builder.write_to(dir.path()).unwrap();
        // Claim more documents than the offset table holds.
        let mut bytes = std::fs::read(&paths.primary_keys).unwrap();
        let len = bytes.len();
        bytes[len - 8..].copy_from_slice(&u64::MAX.to_le_bytes());
        std::fs::write(&paths.primary_keys, &bytes).unwrap();

        let err = IndexView::open(
            &paths.primary_keys,
            &paths.vocabulary,
            &paths.terms,
            &paths.postings,
        )
        .unwrap_err();
        assert!(matches!(err, Error::IndexTooLarge { .. }));
    }

    #[test]
    fn ragged_vocabulary_is_malformed() {
        let dir = TempDir::new().unwrap();
        let mut builder = IndexBuilder::new(TAG_RAW);
        builder.documents(&["only"]);
        builder.term("x", &[(1, &[0])]);
        let paths = builder.write_to(dir.path()).unwrap();
        let mut bytes = std::fs::read(&paths.vocabulary).unwrap();
        bytes.pop();
        std::fs::write(&paths.vocabulary, &bytes).unwrap();

        let err = IndexView::open(
            &paths.primary_keys,
            &paths.vocabulary,
            &paths.terms,
            &paths.postings,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedIndex(_)));
    }

    #[test]
    fn missing_file_is_io() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.bin");
        let err = IndexView::open(&missing, &missing, &missing, &missing).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
