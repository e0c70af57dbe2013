//! # Codec Table
//!
//! Closed mapping from fourcc codes to logical video codecs.
//!
//! Encoders historically stamped streams with their own fourcc, so one codec
//! answers to many codes (`DIVX`, `XVID`, `DX50`, ... are all MPEG-4 Part 2).
//! Matching is exact and case-sensitive; there is no fuzzy fallback.

use crate::fourcc::FourCc;
use serde::{Deserialize, Serialize};

/// Logical codec a fourcc resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecId {
    MsMpeg4V1,
    MsMpeg4V2,
    MsMpeg4V3,
    Svq1,
    Mpeg4,
    H263,
    H263I,
    /// Codec outside the built-in table, identified by its fourcc.
    Other(FourCc),
}

/// A resolved codec: its id and human-readable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecDescriptor {
    pub id: CodecId,
    pub name: &'static str,
}

impl CodecDescriptor {
    pub const fn new(id: CodecId, name: &'static str) -> Self {
        Self { id, name }
    }
}

struct CodecEntry {
    descriptor: CodecDescriptor,
    fourccs: &'static [[u8; 4]],
}

const CODEC_TABLE: &[CodecEntry] = &[
    CodecEntry {
        descriptor: CodecDescriptor::new(CodecId::MsMpeg4V1, "MS MPEG-4 v1"),
        fourccs: &[*b"DIV1", *b"div1", *b"MPG4", *b"mpg4"],
    },
    CodecEntry {
        descriptor: CodecDescriptor::new(CodecId::MsMpeg4V2, "MS MPEG-4 v2"),
        fourccs: &[*b"DIV2", *b"div2", *b"MP42", *b"mp42"],
    },
    CodecEntry {
        descriptor: CodecDescriptor::new(CodecId::MsMpeg4V3, "MS MPEG-4 v3"),
        fourccs: &[
            *b"MPG3", *b"mpg3", *b"div3", *b"MP43", *b"mp43", *b"DIV3", *b"DIV4", *b"div4",
            *b"DIV5", *b"div5", *b"DIV6", *b"div6", *b"AP41", *b"3IV1",
        ],
    },
    CodecEntry {
        descriptor: CodecDescriptor::new(CodecId::Svq1, "SVQ-1 (Sorenson Video v1)"),
        fourccs: &[*b"SVQ1"],
    },
    CodecEntry {
        descriptor: CodecDescriptor::new(CodecId::Mpeg4, "MPEG-4"),
        fourccs: &[
            *b"DIVX", *b"divx", *b"MP4S", *b"mp4s", *b"M4S2", *b"m4s2", *b"xvid", *b"XVID",
            *b"XviD", *b"DX50", *b"mp4v", [4, 0, 0, 0],
        ],
    },
    CodecEntry {
        descriptor: CodecDescriptor::new(CodecId::H263, "H263"),
        fourccs: &[*b"H263", *b"h263", *b"U263"],
    },
    CodecEntry {
        descriptor: CodecDescriptor::new(CodecId::H263I, "I263.I"),
        fourccs: &[*b"I263", *b"i263"],
    },
];

/// Look up the codec for a fourcc.
pub fn lookup(fourcc: FourCc) -> Option<CodecDescriptor> {
    CODEC_TABLE
        .iter()
        .find(|entry| entry.fourccs.contains(fourcc.as_bytes()))
        .map(|entry| entry.descriptor)
}

/// All fourcc aliases known for a codec. Empty for [`CodecId::Other`].
pub fn aliases(id: CodecId) -> Vec<FourCc> {
    CODEC_TABLE
        .iter()
        .find(|entry| entry.descriptor.id == id)
        .map(|entry| entry.fourccs.iter().copied().map(FourCc::new).collect())
        .unwrap_or_default()
}
