//! Encoded units exchanged between the demuxer and a decoder.

use bytes::Bytes;

/// One packetized chunk of compressed data for an elementary stream.
///
/// A unit is either real data produced by the demuxer or a zero-payload
/// sentinel used only to wake a blocked consumer. Timestamps and the
/// discontinuity marker are carried through untouched; the orchestration
/// layer never inspects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedUnit {
    payload: Bytes,
    pts: Option<i64>,
    dts: Option<i64>,
    discontinuity: bool,
    sentinel: bool,
}

impl EncodedUnit {
    /// Create a data unit.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            pts: None,
            dts: None,
            discontinuity: false,
            sentinel: false,
        }
    }

    /// Create a sentinel unit (no payload, wake signaling only).
    pub fn sentinel() -> Self {
        Self {
            payload: Bytes::new(),
            pts: None,
            dts: None,
            discontinuity: false,
            sentinel: true,
        }
    }

    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = Some(pts);
        self
    }

    pub fn with_dts(mut self, dts: i64) -> Self {
        self.dts = Some(dts);
        self
    }

    /// Mark the unit as the first one after a stream discontinuity.
    pub fn with_discontinuity(mut self, discontinuity: bool) -> Self {
        self.discontinuity = discontinuity;
        self
    }

    pub fn is_sentinel(&self) -> bool {
        self.sentinel
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn pts(&self) -> Option<i64> {
        self.pts
    }

    pub fn dts(&self) -> Option<i64> {
        self.dts
    }

    pub fn is_discontinuity(&self) -> bool {
        self.discontinuity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_unit() {
        let unit = EncodedUnit::new(vec![1u8, 2, 3]).with_pts(90_000).with_dts(87_000);
        assert!(!unit.is_sentinel());
        assert_eq!(unit.len(), 3);
        assert_eq!(unit.pts(), Some(90_000));
        assert_eq!(unit.dts(), Some(87_000));
        assert!(!unit.is_discontinuity());
    }

    #[test]
    fn test_sentinel_unit() {
        let unit = EncodedUnit::sentinel();
        assert!(unit.is_sentinel());
        assert!(unit.is_empty());
        assert_eq!(unit.pts(), None);
    }

    #[test]
    fn test_empty_data_unit_is_not_sentinel() {
        let unit = EncodedUnit::new(Bytes::new());
        assert!(unit.is_empty());
        assert!(!unit.is_sentinel());
    }
}
