//! Data set parsing: `address(value*unit)(value*unit)...` elements
//! that make up the body of an IEC 62056-21 Mode D readout.

use han_core::HanError;

/// One value inside a data set, with its optional unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSetValue {
    pub value: String,
    pub unit: Option<String>,
}

impl DataSetValue {
    pub fn parse(raw: &str) -> Result<Self, HanError> {
        let parts: Vec<&str> = raw.split('*').collect();
        match parts.as_slice() {
            [value] => Ok(Self { value: value.to_string(), unit: None }),
            [value, unit] => Ok(Self { value: value.to_string(), unit: Some(unit.to_string()) }),
            _ => Err(HanError::InvalidData(
                "found multiple value/unit separators (*)".into(),
            )),
        }
    }
}

/// A data line's address and the values attached to it, e.g.
/// `1-0:1.8.0(00123.456*kWh)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSet {
    pub address: String,
    pub values: Vec<DataSetValue>,
}

impl DataSet {
    /// Parse every data set out of a readout's data block (one or more
    /// lines). The address and/or unit may be omitted when it is
    /// unambiguous from a preceding line in a sequence; such elements
    /// produce no address or surface as bare numbered value groups and
    /// are skipped here since they carry no addressable meaning on
    /// their own.
    pub fn parse_data_block(data: &str) -> Vec<DataSet> {
        let mut items = Vec::new();
        for line in data.lines().filter(|l| !l.trim().is_empty()) {
            items.extend(Self::parse_line(line));
        }
        items
    }

    fn parse_line(line: &str) -> Vec<DataSet> {
        let bytes = line.as_bytes();
        let mut items = Vec::new();
        let mut pos = 0usize;

        loop {
            let address_end = line[pos..].find('(').map(|i| pos + i);
            let (address, mut from_pos) = match address_end {
                Some(end) if end > pos => (Some(line[pos..end].to_string()), end),
                Some(end) => (None, end),
                None => break,
            };

            let mut values = Vec::new();
            loop {
                let close = match line[from_pos..].find(')') {
                    Some(i) => from_pos + i,
                    None => break,
                };
                match DataSetValue::parse(&line[from_pos + 1..close]) {
                    Ok(value) => values.push(value),
                    Err(_) => break,
                }
                from_pos = close + 1;
                if from_pos == bytes.len() {
                    break;
                }
                if bytes[from_pos] != b'(' {
                    break;
                }
            }

            if !values.is_empty() {
                items.push(DataSet {
                    address: address.unwrap_or_default(),
                    values,
                });
            }

            if from_pos >= bytes.len() {
                break;
            }
            pos = from_pos;
            if bytes[pos] == b'(' {
                // Anonymous value group with no further '(' to anchor
                // on: nothing more to extract from this line.
                break;
            }
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_value_with_unit() {
        let sets = DataSet::parse_data_block("1-0:1.8.0(00123.456*kWh)\r\n");
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].address, "1-0:1.8.0");
        assert_eq!(sets[0].values[0].value, "00123.456");
        assert_eq!(sets[0].values[0].unit.as_deref(), Some("kWh"));
    }

    #[test]
    fn parses_value_without_unit() {
        let sets = DataSet::parse_data_block("0-0:96.1.1(4B384547303034303436333935353037)\r\n");
        assert_eq!(sets[0].values[0].unit, None);
    }

    #[test]
    fn parses_multiple_lines() {
        let block = "1-0:1.7.0(00.424*kW)\r\n1-0:21.7.0(00.123*kW)\r\n";
        let sets = DataSet::parse_data_block(block);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[1].address, "1-0:21.7.0");
    }

    #[test]
    fn value_unit_parse_rejects_double_separator() {
        assert!(DataSetValue::parse("1*kWh*extra").is_err());
    }
}
