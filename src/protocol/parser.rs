//! Header and CSV data-line parsing

use super::types::{HeaderSchema, Sample};

/// Why a data line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected} fields, got {got}")]
    WrongArity { expected: usize, got: usize },

    #[error("field {index} is not numeric: {value:?}")]
    NotNumeric { index: usize, value: String },
}

/// Recognize a header line and derive its schema.
pub fn parse_header(line: &str) -> Option<HeaderSchema> {
    let line = line.trim();
    if line.eq_ignore_ascii_case(HeaderSchema::Single.header_line()) {
        Some(HeaderSchema::Single)
    } else if line.eq_ignore_ascii_case(HeaderSchema::Dual.header_line()) {
        Some(HeaderSchema::Dual)
    } else {
        None
    }
}

/// Parse one CSV data row against the negotiated schema.
pub fn parse_sample(line: &str, schema: HeaderSchema) -> Result<Sample, ParseError> {
    let expected = schema.columns();
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != expected {
        return Err(ParseError::WrongArity {
            expected,
            got: fields.len(),
        });
    }

    let mut values = [0f64; 7];
    for (index, field) in fields.iter().enumerate() {
        values[index] = field.trim().parse().map_err(|_| ParseError::NotNumeric {
            index,
            value: (*field).to_string(),
        })?;
    }

    Ok(Sample {
        time_s: values[0],
        primary: [values[1], values[2], values[3]],
        secondary: match schema {
            HeaderSchema::Single => None,
            HeaderSchema::Dual => Some([values[4], values[5], values[6]]),
        },
    })
}
