//! Turns raw byte chunks from a [`han_transport::ByteSource`] into the
//! items the [`crate::ConnectionManager`] hands to its destination
//! queue.
//!
//! Mirrors the teacher source's two protocol shapes
//! (`SmartMeterFrameProtocol`, raw frames; `SmartMeterFrameContentProtocol`,
//! validated content only) as one trait with two HDLC implementations,
//! plus a third for the Mode D transport.

use han_session::hdlc::{HdlcFrame, HdlcReader};
use han_session::mode_d::{DataReadout, ModeDReader};

/// Incrementally assembles byte chunks into complete items.
pub trait FrameAssembler: Send {
    type Item: Send + 'static;

    fn assemble(&mut self, chunk: &[u8]) -> Vec<Self::Item>;
}

/// Delivers every assembled HDLC frame, valid or not.
pub struct RawHdlcAssembler {
    reader: HdlcReader,
}

impl RawHdlcAssembler {
    pub fn new(reader: HdlcReader) -> Self {
        Self { reader }
    }
}

impl FrameAssembler for RawHdlcAssembler {
    type Item = HdlcFrame;

    fn assemble(&mut self, chunk: &[u8]) -> Vec<HdlcFrame> {
        self.reader.read(chunk)
    }
}

/// Delivers only the information field of frames that pass the FCS and
/// expected-length checks, logging a warning for the rest.
pub struct HdlcContentAssembler {
    reader: HdlcReader,
}

impl HdlcContentAssembler {
    pub fn new(reader: HdlcReader) -> Self {
        Self { reader }
    }
}

impl FrameAssembler for HdlcContentAssembler {
    type Item = Vec<u8>;

    fn assemble(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.reader
            .read(chunk)
            .into_iter()
            .filter_map(|frame| {
                if frame.is_good_ffc() && frame.is_expected_length() {
                    match frame.information() {
                        Some(content) if !content.is_empty() => Some(content.to_vec()),
                        _ => {
                            log::debug!("got empty frame");
                            None
                        }
                    }
                } else {
                    log::warn!("got invalid frame: {}", hex_encode(frame.frame_data()));
                    None
                }
            })
            .collect()
    }
}

/// Delivers complete, checksum-validated P1/Mode D readouts.
pub struct ModeDAssembler {
    reader: ModeDReader,
}

impl ModeDAssembler {
    pub fn new(reader: ModeDReader) -> Self {
        Self { reader }
    }
}

impl FrameAssembler for ModeDAssembler {
    type Item = DataReadout;

    fn assemble(&mut self, chunk: &[u8]) -> Vec<DataReadout> {
        self.reader.read(chunk)
    }
}

/// Delivers a bare DLMS APDU per chunk, with no HDLC framing to strip —
/// for meters that deliver one complete notification per physical read
/// instead of wrapping it in `7E ... 7E` flags.
#[derive(Debug, Default)]
pub struct RawApduAssembler;

impl RawApduAssembler {
    pub fn new() -> Self {
        Self
    }
}

impl FrameAssembler for RawApduAssembler {
    type Item = Vec<u8>;

    fn assemble(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        if chunk.is_empty() {
            Vec::new()
        } else {
            vec![chunk.to_vec()]
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_assembler_drops_frames_with_bad_fcs() {
        let mut assembler = HdlcContentAssembler::new(HdlcReader::new(false, true));
        let mut bad_frame = vec![0x7E, 0xA0, 0x07, 0x02, 0x10, 0x93, 0xAA, 0xBB, 0xFF, 0xFF, 0x7E];
        bad_frame[8] = 0x00; // corrupt a payload byte so the FCS no longer checks out
        let items = assembler.assemble(&bad_frame);
        assert!(items.is_empty());
    }

    #[test]
    fn raw_apdu_assembler_passes_each_chunk_through_unchanged() {
        let mut assembler = RawApduAssembler::new();
        assert_eq!(assembler.assemble(&[0x01, 0x02, 0x03]), vec![vec![0x01, 0x02, 0x03]]);
        assert!(assembler.assemble(&[]).is_empty());
    }
}
