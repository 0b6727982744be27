// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error types for index loading and query evaluation.
//!
//! The split that matters here is *when* an error can happen. Everything that
//! can go wrong while opening an index (missing file, truncated region, an
//! offset pointing past the end of a mapping) is fatal at startup and carries
//! its own exit code so scripts can tell the failure modes apart. The one
//! error that can happen per query — a corrupt compressed segment — degrades
//! that query to an empty result and leaves every other query alone.

use std::fmt;
use std::io;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All the ways loading or searching can fail.
#[derive(Debug)]
pub enum Error {
    /// File open/read/mmap failure. Fatal at startup, never raised while a
    /// query is in flight.
    Io(io::Error),
    /// Structural violation of the on-disk format: count mismatches, offsets
    /// out of range, regions too short. Fatal at startup.
    MalformedIndex(String),
    /// The index exceeds a compile-time bound. The message names the bound
    /// so the fix (recompile with a larger cap) is actionable.
    IndexTooLarge {
        what: &'static str,
        actual: u64,
        limit: u64,
    },
    /// The postings region names a codec this build does not know.
    UnsupportedCodec(u8),
    /// A decoder detected an out-of-bounds read or an impossible state.
    /// Query-level: the offending query returns empty, siblings continue.
    MalformedCodecStream(&'static str),
}

impl Error {
    /// Process exit code for startup failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Io(_) => 2,
            Error::MalformedIndex(_) | Error::UnsupportedCodec(_) => 3,
            Error::IndexTooLarge { .. } => 4,
            Error::MalformedCodecStream(_) => 5,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::MalformedIndex(why) => write!(f, "malformed index: {}", why),
            Error::IndexTooLarge {
                what,
                actual,
                limit,
            } => write!(
                f,
                "index too large: {} is {} but this build supports at most {} \
                 (raise the bound in limits.rs and recompile)",
                what, actual, limit
            ),
            Error::UnsupportedCodec(tag) => {
                write!(f, "unsupported codec tag {:#04x} in postings region", tag)
            }
            Error::MalformedCodecStream(why) => {
                write!(f, "malformed codec stream: {}", why)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinguishable() {
        let io = Error::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let malformed = Error::MalformedIndex("truncated vocabulary".into());
        let too_large = Error::IndexTooLarge {
            what: "documents",
            actual: 100,
            limit: 10,
        };
        let codec = Error::UnsupportedCodec(0x7f);

        let codes = [
            io.exit_code(),
            malformed.exit_code(),
            too_large.exit_code(),
            codec.exit_code(),
        ];
        assert_eq!(codes, [2, 3, 4, 3]);
    }

    #[test]
    fn too_large_message_names_the_bound() {
        let e = Error::IndexTooLarge {
            what: "documents",
            actual: 60_000_000,
            limit: 55_000_000,
        };
        let msg = e.to_string();
        assert!(msg.contains("documents"));
        assert!(msg.contains("60000000"));
        assert!(msg.contains("recompile"));
    }
}
