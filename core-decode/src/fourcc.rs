//! Four-character format identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque 4-byte code identifying an encoding format or codec variant.
///
/// Codes are compared byte-for-byte, so `DIVX` and `divx` are distinct
/// identifiers even when they name the same logical codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FourCc([u8; 4]);

impl FourCc {
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Build from the little-endian `u32` packing used by container headers.
    pub const fn from_u32_le(value: u32) -> Self {
        Self(value.to_le_bytes())
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub const fn to_u32_le(self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

/// Error returned when a string is not exactly four bytes long.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fourcc must be exactly 4 bytes, got {0:?}")]
pub struct InvalidFourCc(pub String);

impl FromStr for FourCc {
    type Err = InvalidFourCc;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| InvalidFourCc(s.to_string()))?;
        Ok(Self(bytes))
    }
}
