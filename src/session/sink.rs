//! Sample sinks: console rows and the optional capture file

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::protocol::{HeaderSchema, Sample};

/// Fan-out writer for parsed samples.
///
/// Console and file receive every row in arrival order; neither sink can
/// reorder or drop a row relative to the other.
pub struct SampleSink {
    console: bool,
    file: Option<BufWriter<File>>,
}

impl SampleSink {
    pub fn new(console: bool, path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => {
                let f = File::create(p)
                    .with_context(|| format!("creating capture file {}", p.display()))?;
                debug!("writing capture file {}", p.display());
                Some(BufWriter::new(f))
            }
            None => None,
        };
        Ok(Self { console, file })
    }

    /// Emit the CSV header once, before any data row.
    pub fn write_header(&mut self, schema: HeaderSchema) -> Result<()> {
        if self.console {
            println!("{}", schema.header_line());
        }
        if let Some(f) = self.file.as_mut() {
            writeln!(f, "{}", schema.header_line()).context("writing capture file header")?;
        }
        Ok(())
    }

    /// Console first, then file - the same order for every row.
    pub fn write_sample(&mut self, sample: &Sample) -> Result<()> {
        if self.console {
            println!("{sample}");
        }
        if let Some(f) = self.file.as_mut() {
            writeln!(f, "{sample}").context("writing capture file row")?;
        }
        Ok(())
    }

    /// Flush both sinks; runs on every stop path.
    pub fn flush(&mut self) -> Result<()> {
        io::stdout().flush().ok();
        if let Some(f) = self.file.as_mut() {
            f.flush().context("flushing capture file")?;
        }
        Ok(())
    }
}
