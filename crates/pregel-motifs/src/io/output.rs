//! Per-vertex result output

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

use crate::error::OutputError;
use crate::motif::Counter;
use crate::pregel::VertexId;

/// Line format for written results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<id>: in <in> out <out> through <through> cycle <cycle>`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected text or json)")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
struct VertexLine<'a> {
    id: VertexId,
    #[serde(flatten)]
    counter: &'a Counter,
}

/// Writes one line per vertex
pub struct ResultWriter<W: Write> {
    inner: W,
    format: OutputFormat,
    lines: usize,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(inner: W, format: OutputFormat) -> Self {
        Self {
            inner,
            format,
            lines: 0,
        }
    }

    pub fn write_vertex(&mut self, id: VertexId, counter: &Counter) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => writeln!(self.inner, "{id}: {counter}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.inner, &VertexLine { id, counter })?;
                self.inner.write_all(b"\n")?;
            }
        }
        self.lines += 1;
        Ok(())
    }

    /// Write every vertex in ascending id order
    pub fn write_all(&mut self, values: &BTreeMap<VertexId, Counter>) -> Result<usize, OutputError> {
        for (id, counter) in values {
            self.write_vertex(*id, counter)?;
        }
        Ok(values.len())
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W, OutputError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> BTreeMap<VertexId, Counter> {
        BTreeMap::from([
            (VertexId::new(2), Counter::new(0, 0, 1, 1)),
            (VertexId::new(1), Counter::new(2, 2, 0, 0)),
        ])
    }

    #[test]
    fn test_text_lines_sorted_by_id() {
        let mut writer = ResultWriter::new(Vec::new(), OutputFormat::Text);
        assert_eq!(writer.write_all(&values()).unwrap(), 2);
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();

        assert_eq!(
            out,
            "1: in 2 out 2 through 0 cycle 0\n2: in 0 out 0 through 1 cycle 1\n"
        );
    }

    #[test]
    fn test_json_lines() {
        let mut writer = ResultWriter::new(Vec::new(), OutputFormat::Json);
        writer.write_all(&values()).unwrap();
        assert_eq!(writer.lines_written(), 2);
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();

        let first: serde_json::Value = serde_json::from_str(out.lines().next().unwrap()).unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(first["in"], 2);
        assert_eq!(first["cycle"], 0);
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("csv".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().to_string(), "text");
    }
}
