//! ADXL345 line protocol: frequency handshake and CSV sample parsing

mod driver;
pub mod parser;
mod types;

pub use driver::{ProtocolDriver, Reading};
pub use parser::{parse_header, parse_sample, ParseError};
pub use types::{HeaderSchema, Sample};
