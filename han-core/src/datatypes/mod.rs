//! Date/time types shared by the COSEM decoder and the P1 (Mode-D) decoder.

pub mod cosem_date;
pub mod cosem_date_time;
pub mod cosem_time;

pub use cosem_date::{CosemDate, CosemDateFormat, Field};
pub use cosem_date_time::{ClockStatus, CosemDateTime};
pub use cosem_time::CosemTime;
