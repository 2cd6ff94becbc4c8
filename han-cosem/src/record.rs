//! The canonical decoded-measurement map every vendor grammar produces.

use std::collections::HashMap;

/// One decoded measurement. Vendor grammars carry values typed only as
/// loosely as the wire format does; scaling (e.g. applying a COSEM
/// scaler-unit exponent) has already been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Text(String),
    Integer(i64),
    Float(f64),
    /// ISO-8601 timestamp, as composed by [`han_core::datatypes::CosemDateTime::to_iso8601`].
    Timestamp(String),
}

pub type Record = HashMap<String, RecordValue>;
