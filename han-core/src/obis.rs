use crate::error::{HanError, HanResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OBIS (Object Identification System) code identifying a COSEM object.
///
/// Six value groups `A.B.C.D.E.F`, each 0..=255. Lookups against the
/// canonical field table use only the reduced `C.D.E` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObisCode {
    bytes: [u8; 6],
}

impl ObisCode {
    pub fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self {
            bytes: [a, b, c, d, e, f],
        }
    }

    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    /// Parse a dot-separated 6-group OBIS string, e.g. `"1.1.1.8.0.255"`.
    pub fn from_string(s: &str) -> HanResult<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 6 {
            return Err(HanError::InvalidData(format!(
                "expected 6 dot-separated values, got {}: {}",
                parts.len(),
                s
            )));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = part
                .parse::<u8>()
                .map_err(|_| HanError::InvalidData(format!("invalid OBIS byte value: {}", part)))?;
        }

        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> [u8; 6] {
        self.bytes
    }

    pub fn a(&self) -> u8 {
        self.bytes[0]
    }
    pub fn b(&self) -> u8 {
        self.bytes[1]
    }
    pub fn c(&self) -> u8 {
        self.bytes[2]
    }
    pub fn d(&self) -> u8 {
        self.bytes[3]
    }
    pub fn e(&self) -> u8 {
        self.bytes[4]
    }
    pub fn f(&self) -> u8 {
        self.bytes[5]
    }

    /// The `C.D.E` triple used to look up a canonical field name.
    pub fn to_cde_string(&self) -> String {
        format!("{}.{}.{}", self.bytes[2], self.bytes[3], self.bytes[4])
    }
}

impl fmt::Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}",
            self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3], self.bytes[4], self.bytes[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_and_accessors() {
        let code = ObisCode::new(1, 1, 1, 8, 0, 255);
        assert_eq!(code.a(), 1);
        assert_eq!(code.f(), 255);
    }

    #[test]
    fn from_string_roundtrip() {
        let code = ObisCode::from_string("1.1.1.8.0.255").unwrap();
        assert_eq!(code, ObisCode::new(1, 1, 1, 8, 0, 255));
        assert_eq!(format!("{}", code), "1.1.1.8.0.255");
    }

    #[test]
    fn cde_triple() {
        let code = ObisCode::new(1, 1, 31, 7, 0, 255);
        assert_eq!(code.to_cde_string(), "31.7.0");
    }

    #[test]
    fn from_string_rejects_wrong_arity() {
        assert!(ObisCode::from_string("1.1.1").is_err());
    }
}
