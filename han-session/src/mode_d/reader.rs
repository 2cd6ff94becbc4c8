//! Incremental assembly of [`DataReadout`]s from a line-oriented
//! IEC 62056-21 Mode D byte stream.

use super::ident::Ident;
use super::readout::{DataReadout, END_CHARACTER, START_CHARACTER};

const LF: u8 = b'\n';

/// Readouts are bounded in practice; a buffer growing past this
/// without finding a start character means we are out of sync and
/// should resynchronize rather than keep accumulating garbage.
const MAX_BUFFER_LEN: usize = 8191;

#[derive(Debug, Default)]
struct LineBuffer {
    data: Vec<u8>,
    pos: usize,
}

impl LineBuffer {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn extend(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    /// Pop the next complete, LF-terminated line, if one is available.
    fn pop_line(&mut self) -> Option<Vec<u8>> {
        let lf_pos = self.data[self.pos..].iter().position(|&b| b == LF)?;
        let end = self.pos + lf_pos + 1;
        let line = self.data[self.pos..end].to_vec();
        self.pos = end;
        Some(line)
    }

    fn trim_to_current_position(&mut self) {
        self.data.drain(0..self.pos);
        self.pos = 0;
    }

    /// Resynchronize on the next `/` start character, discarding
    /// everything before it.
    fn trim_to_start_or_end(&mut self) {
        self.trim_to_current_position();
        match self.data.iter().position(|&b| b == START_CHARACTER) {
            Some(0) => {}
            Some(pos) => self.data.drain(0..pos).for_each(drop),
            None => self.data.clear(),
        }
    }
}

/// Incremental reader for IEC 62056-21 Mode D readouts.
pub struct ModeDReader {
    buffer: LineBuffer,
    raw_data: Vec<u8>,
    in_hunt_mode: bool,
}

impl ModeDReader {
    pub fn new() -> Self {
        Self {
            buffer: LineBuffer::default(),
            raw_data: Vec::new(),
            in_hunt_mode: true,
        }
    }

    pub fn is_in_hunt_mode(&self) -> bool {
        self.in_hunt_mode
    }

    /// Feed a chunk of bytes and return every readout completed as a
    /// result, whether or not its checksum validates.
    pub fn read(&mut self, data_chunk: &[u8]) -> Vec<DataReadout> {
        if self.buffer.len() > MAX_BUFFER_LEN {
            self.in_hunt_mode = true;
            self.buffer.trim_to_start_or_end();
        }

        self.buffer.extend(data_chunk);

        if self.in_hunt_mode {
            self.buffer.trim_to_start_or_end();
        }

        let mut readouts = Vec::new();
        while let Some(line) = self.buffer.pop_line() {
            if self.in_hunt_mode {
                if line.first() == Some(&START_CHARACTER) {
                    if let Ok(text) = std::str::from_utf8(&line) {
                        if Ident::is_ident_line(text.trim_end()) {
                            self.in_hunt_mode = false;
                            self.raw_data.extend_from_slice(&line);
                        }
                    }
                }
            } else {
                self.raw_data.extend_from_slice(&line);
                if line.first() == Some(&END_CHARACTER) {
                    if let Ok(readout) = DataReadout::new(std::mem::take(&mut self.raw_data)) {
                        readouts.push(readout);
                    }
                    self.raw_data.clear();
                    self.in_hunt_mode = true;
                }
            }
        }
        self.buffer.trim_to_current_position();
        readouts
    }
}

impl Default for ModeDReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire() -> Vec<u8> {
        let body = b"/ISK5\\2M550T-1013\r\n1-0:1.8.0(00123.456*kWh)\r\n!";
        let crc = super::super::crc16::compute(body);
        let mut raw = body.to_vec();
        raw.extend_from_slice(format!("{:04X}\r\n", crc).as_bytes());
        raw
    }

    #[test]
    fn assembles_readout_delivered_whole() {
        let mut reader = ModeDReader::new();
        let readouts = reader.read(&wire());
        assert_eq!(readouts.len(), 1);
        assert!(readouts[0].is_valid());
    }

    #[test]
    fn assembles_readout_one_byte_at_a_time() {
        let wire = wire();
        let mut reader = ModeDReader::new();
        let mut readouts = Vec::new();
        for byte in &wire {
            readouts.extend(reader.read(&[*byte]));
        }
        assert_eq!(readouts.len(), 1);
        assert!(readouts[0].is_valid());
    }

    #[test]
    fn resyncs_past_garbage_before_ident_line() {
        let mut garbage = b"garbage before start\n".to_vec();
        garbage.extend_from_slice(&wire());
        let mut reader = ModeDReader::new();
        let readouts = reader.read(&garbage);
        assert_eq!(readouts.len(), 1);
    }

    #[test]
    fn two_readouts_back_to_back() {
        let mut stream = wire();
        stream.extend_from_slice(&wire());
        let mut reader = ModeDReader::new();
        let readouts = reader.read(&stream);
        assert_eq!(readouts.len(), 2);
    }
}
