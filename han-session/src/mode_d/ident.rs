//! The identification line that opens an IEC 62056-21 Mode D readout.

use han_core::HanError;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?P<manid>[A-Z][A-Z][a-zA-Z])(?P<baudid>\d)(?:\\\w)*(?P<id>[ -~]{1,16})\r?\n?$")
        .expect("identification line pattern is valid")
});

/// Manufacturer identification and meter identification parsed from the
/// first line of a readout, e.g. `/KFM5KAIFA-METER\r\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    line: String,
    manufacturer_id: String,
    identification: String,
}

impl Ident {
    pub fn parse(ident_line: &str) -> Result<Self, HanError> {
        let captures = IDENT_PATTERN
            .captures(ident_line)
            .ok_or_else(|| HanError::InvalidData("not an identification line".into()))?;
        Ok(Self {
            line: ident_line.to_string(),
            manufacturer_id: captures["manid"].to_string(),
            identification: captures["id"].to_string(),
        })
    }

    pub fn is_ident_line(line: &str) -> bool {
        IDENT_PATTERN.is_match(line)
    }

    /// Three-letter manufacturer flag ID (see https://www.dlms.com/flag-id/flag-id-list).
    pub fn manufacturer_id(&self) -> &str {
        &self.manufacturer_id
    }

    pub fn identification(&self) -> &str {
        &self.identification
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manufacturer_and_identification() {
        let ident = Ident::parse("/KFM5KAIFA-METER\r\n").unwrap();
        assert_eq!(ident.manufacturer_id(), "KFM");
        assert_eq!(ident.identification(), "KAIFA-METER");
    }

    #[test]
    fn rejects_non_ident_line() {
        assert!(Ident::parse("1-0:1.8.0(12345.678*kWh)").is_err());
    }

    #[test]
    fn is_ident_line_matches_without_parsing() {
        assert!(Ident::is_ident_line("/ISK5\\2M550T-1013\r\n"));
        assert!(!Ident::is_ident_line("(12345)"));
    }
}
