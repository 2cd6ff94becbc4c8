//! A complete IEC 62056-21 Mode D readout: identification line, data
//! block, end line and CRC16 trailer.

use han_core::HanError;

use super::crc16;
use super::ident::Ident;

pub const START_CHARACTER: u8 = b'/';
pub const END_CHARACTER: u8 = b'!';
const LF: u8 = b'\n';

/// A readout as received off the wire, with its checksum already
/// calculated. Both valid and invalid readouts are surfaced to
/// callers; [`DataReadout::is_valid`] tells them apart.
#[derive(Debug, Clone)]
pub struct DataReadout {
    raw: Vec<u8>,
    end_pos: usize,
    data_pos: usize,
    calculated_crc: u16,
}

impl DataReadout {
    pub fn new(raw: Vec<u8>) -> Result<Self, HanError> {
        if raw.first() != Some(&START_CHARACTER) {
            return Err(HanError::InvalidData(
                "readout must start with '/' character".into(),
            ));
        }
        let end_pos = raw
            .iter()
            .position(|&b| b == END_CHARACTER)
            .ok_or_else(|| HanError::InvalidData("readout has no '!' end line".into()))?;
        let data_pos = raw
            .iter()
            .position(|&b| b == LF)
            .map(|p| p + 1)
            .filter(|&p| p >= 1)
            .ok_or_else(|| HanError::InvalidData("readout data not found".into()))?;

        let calculated_crc = crc16::compute(&raw[0..=end_pos]);
        Ok(Self { raw, end_pos, data_pos, calculated_crc })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn payload(&self) -> &[u8] {
        &self.raw[self.data_pos..self.end_pos]
    }

    pub fn identification_line(&self) -> Result<Ident, HanError> {
        let line = String::from_utf8_lossy(&self.raw[..self.data_pos]);
        Ident::parse(line.trim())
    }

    pub fn end_line(&self) -> String {
        String::from_utf8_lossy(&self.raw[self.end_pos..]).trim().to_string()
    }

    /// Checksum carried in the end line, if the meter sent one.
    pub fn expected_checksum(&self) -> Option<u16> {
        let end = self.end_line();
        if end.len() > 1 {
            u16::from_str_radix(end[1..].trim(), 16).ok()
        } else {
            None
        }
    }

    pub fn data_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(self.payload())
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// True when the checksum (if present), identification line, and
    /// data block all check out.
    pub fn is_valid(&self) -> bool {
        if let Some(expected) = self.expected_checksum() {
            if self.calculated_crc != expected {
                return false;
            }
        }
        if self.identification_line().is_err() {
            return false;
        }
        self.raw[self.data_pos..self.end_pos].iter().all(|&b| b <= 0x80)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let body = b"/ISK5\\2M550T-1013\r\n1-0:1.8.0(00123.456*kWh)\r\n!";
        let crc = crc16::compute(body);
        let mut raw = body.to_vec();
        raw.extend_from_slice(format!("{:04X}\r\n", crc).as_bytes());
        raw
    }

    #[test]
    fn valid_readout_round_trips() {
        let readout = DataReadout::new(sample()).unwrap();
        assert!(readout.is_valid());
        assert_eq!(readout.identification_line().unwrap().manufacturer_id(), "ISK");
    }

    #[test]
    fn corrupted_checksum_is_invalid() {
        let mut raw = sample();
        let last = raw.len() - 3;
        raw[last] ^= 0xFF;
        let readout = DataReadout::new(raw).unwrap();
        assert!(!readout.is_valid());
    }

    #[test]
    fn missing_end_character_is_rejected_at_construction() {
        assert!(DataReadout::new(b"/ISK5\\2M550T-1013\r\n1-0:1.8.0(1*kWh)\r\n".to_vec()).is_err());
    }
}
