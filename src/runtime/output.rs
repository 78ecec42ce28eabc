use std::io::Write;

use crate::runtime::error::RuntimeError;

/// Destination of lines written by the `print` builtin.
pub trait OutputSink {
    fn write_line(&mut self, line: &str) -> Result<(), RuntimeError>;
}

impl OutputSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> Result<(), RuntimeError> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Streams printed lines to any writer, e.g. a locked stdout.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> Result<(), RuntimeError> {
        writeln!(self.writer, "{line}").map_err(|error| RuntimeError::OutputFailed {
            message: error.to_string(),
        })
    }
}
