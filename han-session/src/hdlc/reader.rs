//! Incremental HDLC frame assembly from an arbitrarily-chunked byte stream.
//!
//! [`HdlcReader::read`] accepts any chunk size, including a single byte
//! at a time, and returns the frames that became complete as a result.
//! State (a partially built frame, a pending escape) is carried between
//! calls so callers never need to buffer whole frames themselves.

use super::frame::HdlcFrame;

const FLAG: u8 = 0x7E;
const CONTROL_ESCAPE: u8 = 0x7D;
const ESCAPE_XOR: u8 = 0x20;

/// Cursor-based holding buffer for bytes not yet consumed into a frame.
#[derive(Debug, Default)]
struct ReaderBuffer {
    data: Vec<u8>,
    pos: usize,
}

impl ReaderBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    fn is_available(&self) -> bool {
        self.pos < self.data.len()
    }

    fn pop(&mut self) -> Option<u8> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    /// Drop everything already consumed, so the buffer doesn't grow
    /// without bound across many small reads.
    fn trim_to_current_position(&mut self) {
        self.data.drain(0..self.pos);
        self.pos = 0;
    }

    /// Resynchronization helper: skip forward past a run of garbage by
    /// jumping straight to the next flag, instead of re-examining each
    /// byte through the normal state machine.
    fn trim_to_flag_or_end(&mut self) {
        match self.data[self.pos..].iter().position(|&b| b == FLAG) {
            Some(offset) => {
                let cut = self.pos + offset;
                self.data.drain(0..cut);
                self.pos = 0;
            }
            None => {
                self.data.clear();
                self.pos = 0;
            }
        }
    }
}

/// Result of feeding one flag byte to the in-progress frame.
enum FlagOutcome {
    /// Not a frame boundary yet; keep collecting (flag byte has been
    /// appended to the frame as ordinary content).
    StillOpen,
    /// Frame discarded (too short to have a header, or an abort
    /// sequence); a new frame starts at this flag.
    Discarded,
    /// Frame complete and ready to hand back to the caller; a new
    /// frame starts at this flag.
    Emit(HdlcFrame),
}

/// Incremental reader that turns a byte stream into [`HdlcFrame`]s.
///
/// `use_octet_stuffing` selects RFC1662-style byte stuffing (0x7D
/// escape, XOR 0x20); most physical HDLC meter links do not use it.
/// `use_abort_sequence` treats a 0x7D immediately followed by a
/// closing flag as an abort rather than content.
pub struct HdlcReader {
    use_octet_stuffing: bool,
    use_abort_sequence: bool,
    buffer: ReaderBuffer,
    frame: Option<HdlcFrame>,
    previous_byte: Option<u8>,
    unescape_next: bool,
}

/// Minimum frame length for the header check sequence to be readable:
/// 2 format bytes + 1-byte addresses (minimum) + 1 control byte + 2
/// HCS bytes.
const MIN_HEADER_LEN: usize = 2 + 1 + 1 + 1 + 2;

impl HdlcReader {
    pub fn new(use_octet_stuffing: bool, use_abort_sequence: bool) -> Self {
        Self {
            use_octet_stuffing,
            use_abort_sequence,
            buffer: ReaderBuffer::default(),
            frame: None,
            previous_byte: None,
            unescape_next: false,
        }
    }

    pub fn is_in_hunt_mode(&self) -> bool {
        self.frame.is_none()
    }

    /// Feed a chunk of bytes and return every frame completed as a
    /// result. May return zero, one, or several frames.
    pub fn read(&mut self, chunk: &[u8]) -> Vec<HdlcFrame> {
        self.buffer.extend(chunk);
        let mut frames = Vec::new();
        while let Some(frame) = self.read_next() {
            frames.push(frame);
        }
        self.buffer.trim_to_current_position();
        frames
    }

    fn read_next(&mut self) -> Option<HdlcFrame> {
        loop {
            let byte = self.buffer.pop()?;

            if byte == FLAG {
                match self.handle_flag() {
                    FlagOutcome::StillOpen => {
                        self.previous_byte = Some(byte);
                        continue;
                    }
                    FlagOutcome::Discarded => {
                        self.start_frame();
                        self.previous_byte = Some(byte);
                        continue;
                    }
                    FlagOutcome::Emit(frame) => {
                        self.start_frame();
                        self.previous_byte = Some(byte);
                        return Some(frame);
                    }
                }
            }

            if self.frame.is_none() {
                // Garbage before the first flag: not a frame yet.
                self.previous_byte = Some(byte);
                continue;
            }

            if self.use_octet_stuffing && byte == CONTROL_ESCAPE {
                self.unescape_next = true;
                self.previous_byte = Some(byte);
                continue;
            }

            self.append_to_frame(byte);

            if let Some(frame) = &self.frame {
                if frame.len() as u16 > super::frame::MAX_FRAME_LENGTH {
                    // Runaway frame with no terminating flag in sight:
                    // give up and resynchronize on the next flag.
                    self.frame = None;
                    self.buffer.trim_to_flag_or_end();
                }
            }

            self.previous_byte = Some(byte);
        }
    }

    fn start_frame(&mut self) {
        self.frame = Some(HdlcFrame::new());
        self.unescape_next = false;
    }

    fn append_to_frame(&mut self, byte: u8) {
        let byte = if self.unescape_next {
            self.unescape_next = false;
            byte ^ ESCAPE_XOR
        } else {
            byte
        };
        if let Some(frame) = &mut self.frame {
            frame.append(byte);
        }
    }

    fn handle_flag(&mut self) -> FlagOutcome {
        let Some(frame) = &self.frame else {
            // Hunt mode: this flag opens the first frame.
            return FlagOutcome::Discarded;
        };

        if frame.is_empty() {
            // Two flags back to back: still waiting for the frame to
            // start, nothing to close.
            return FlagOutcome::StillOpen;
        }

        if frame.len() < MIN_HEADER_LEN {
            return FlagOutcome::Discarded;
        }

        let is_abort = self.use_abort_sequence && self.previous_byte == Some(CONTROL_ESCAPE);
        if is_abort {
            return FlagOutcome::Discarded;
        }

        if self.use_octet_stuffing {
            return FlagOutcome::Emit(self.take_frame());
        }

        if frame.is_expected_length() {
            return FlagOutcome::Emit(self.take_frame());
        }

        // Declared length says more data should follow: this flag is
        // ordinary content, not a terminator.
        self.append_to_frame(FLAG);
        FlagOutcome::StillOpen
    }

    fn take_frame(&mut self) -> HdlcFrame {
        self.frame.take().unwrap_or_default()
    }
}

impl Default for HdlcReader {
    fn default() -> Self {
        Self::new(false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(body: &[u8]) -> Vec<u8> {
        let mut fcs = super::super::fcs::FcsCalc::new();
        fcs.update_bytes(body);
        let trailer = fcs.fcs_value_bytes();
        let mut out = vec![FLAG];
        out.extend_from_slice(body);
        out.extend_from_slice(&trailer);
        out.push(FLAG);
        out
    }

    fn sample_body() -> Vec<u8> {
        // format(2) + dest addr(1) + src addr(1) + control(1) = 5 header
        // bytes before the 2-byte HCS; frame_length covers everything
        // between the flags including the trailing frame FCS.
        let mut body = vec![0xA0, 0x00, 0x02, 0x01, 0x13];
        let mut hcs_calc = super::super::fcs::FcsCalc::new();
        hcs_calc.update_bytes(&body);
        body.extend_from_slice(&hcs_calc.fcs_value_bytes());
        body.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let total_len = body.len() as u16 + 2; // + trailing frame FCS
        body[1] = (total_len & 0xFF) as u8;
        body
    }

    #[test]
    fn assembles_frame_delivered_whole() {
        let body = sample_body();
        let mut reader = HdlcReader::default();
        let frames = reader.read(&framed(&body));
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_good_ffc());
        assert!(frames[0].is_expected_length());
    }

    #[test]
    fn assembles_frame_delivered_one_byte_at_a_time() {
        let body = sample_body();
        let wire = framed(&body);
        let mut reader = HdlcReader::default();
        let mut frames = Vec::new();
        for byte in &wire {
            frames.extend(reader.read(&[*byte]));
        }
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_good_ffc());
    }

    #[test]
    fn resyncs_after_garbage_before_first_flag() {
        let body = sample_body();
        let mut wire = vec![0x00, 0x11, 0x22];
        wire.extend_from_slice(&framed(&body));
        let mut reader = HdlcReader::default();
        let frames = reader.read(&wire);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn discards_too_short_partial_frame() {
        let mut reader = HdlcReader::default();
        // A flag, two content bytes, then another flag: too short to
        // hold a readable header, must be discarded silently.
        let frames = reader.read(&[FLAG, 0x01, 0x02, FLAG]);
        assert!(frames.is_empty());
        assert!(reader.is_in_hunt_mode() || reader.frame.is_some());
    }

    #[test]
    fn unescapes_control_escape_and_embedded_flag_byte_with_octet_stuffing() {
        // Header + a content byte that happens to equal the flag byte
        // (0x7E), which octet stuffing must escape on the wire as
        // 0x7D 0x5E (0x7E ^ 0x20) and this reader must undo.
        let mut body = vec![0xA0, 0x00, 0x02, 0x01, 0x13];
        let mut hcs_calc = super::super::fcs::FcsCalc::new();
        hcs_calc.update_bytes(&body);
        body.extend_from_slice(&hcs_calc.fcs_value_bytes());
        body.push(FLAG); // content byte colliding with the flag
        body.extend_from_slice(&[0xDE, 0xAD]);

        let mut fcs = super::super::fcs::FcsCalc::new();
        fcs.update_bytes(&body);
        let trailer = fcs.fcs_value_bytes();
        let mut unescaped = body.clone();
        unescaped.extend_from_slice(&trailer);

        let mut wire = vec![FLAG];
        for &byte in &unescaped {
            if byte == FLAG || byte == CONTROL_ESCAPE {
                wire.push(CONTROL_ESCAPE);
                wire.push(byte ^ ESCAPE_XOR);
            } else {
                wire.push(byte);
            }
        }
        wire.push(FLAG);

        let mut reader = HdlcReader::new(true, true);
        let frames = reader.read(&wire);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_good_ffc());
        assert_eq!(frames[0].frame_data(), unescaped.as_slice());
    }

    #[test]
    fn two_frames_back_to_back_share_the_middle_flag() {
        let body = sample_body();
        let one = framed(&body);
        let mut wire = one.clone();
        // Drop the duplicate boundary flag the second frame would add.
        wire.extend_from_slice(&one[1..]);
        let mut reader = HdlcReader::default();
        let frames = reader.read(&wire);
        assert_eq!(frames.len(), 2);
    }
}
