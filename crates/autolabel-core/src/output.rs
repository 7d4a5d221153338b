//! Serialization of per-image records and the final frequency table.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use serde::Serialize;

use crate::aggregate::TagFrequencyTable;
use crate::types::ImageLabels;

/// How records are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// A single JSON document
    #[default]
    Json,
    /// One compact JSON object per line
    JsonLines,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            other => Err(format!("unknown output format {other:?} (expected json or jsonl)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::JsonLines => f.write_str("jsonl"),
        }
    }
}

/// Streams [`ImageLabels`] records and writes the final table.
///
/// In JSON Lines mode every record is one line; pretty-printing only applies
/// to [`OutputFormat::Json`].
pub struct RecordWriter<W: Write> {
    sink: W,
    format: OutputFormat,
    pretty: bool,
    records: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            sink,
            format,
            pretty,
            records: 0,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Number of per-image records written so far.
    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Write one per-image record.
    pub fn write_record(&mut self, labels: &ImageLabels) -> io::Result<()> {
        self.emit(labels)?;
        self.records += 1;
        Ok(())
    }

    /// Write a batch of records: one JSON array, or one line per record.
    pub fn write_records(&mut self, records: &[ImageLabels]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                self.emit(records)?;
                self.records += records.len();
            }
            OutputFormat::JsonLines => {
                for labels in records {
                    self.write_record(labels)?;
                }
            }
        }
        Ok(())
    }

    /// Write the corpus-wide frequency table as a JSON object.
    pub fn write_table(&mut self, table: &TagFrequencyTable) -> io::Result<()> {
        self.emit(table)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn emit<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        let pretty = self.pretty && self.format == OutputFormat::Json;
        if pretty {
            serde_json::to_writer_pretty(&mut self.sink, value).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.sink, value).map_err(io::Error::other)?;
        }
        writeln!(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::FrequencyAggregator;

    fn labels(file_name: &str) -> ImageLabels {
        ImageLabels {
            file_name: file_name.to_string(),
            ordering_key: 1,
            width: 4,
            height: 4,
            caption: "a cat".to_string(),
            tags: "cat".to_string(),
            prompt: "cat.".to_string(),
            detections: Vec::new(),
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("JSONL".parse::<OutputFormat>().unwrap(), OutputFormat::JsonLines);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::JsonLines.to_string(), "jsonl");
    }

    #[test]
    fn test_jsonl_one_record_per_line() {
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::JsonLines, true);
        writer.write_record(&labels("img1.png")).unwrap();
        writer.write_record(&labels("img2.png")).unwrap();
        assert_eq!(writer.records_written(), 2);

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"file_name\":\"img2.png\""));
    }

    #[test]
    fn test_json_batch_is_array() {
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Json, false);
        writer
            .write_records(&[labels("img1.png"), labels("img2.png")])
            .unwrap();
        assert_eq!(writer.records_written(), 2);

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[1]["file_name"], "img2.png");
    }

    #[test]
    fn test_table_is_json_object() {
        let table = FrequencyAggregator::default().aggregate(vec![vec!["cat", "cup", "cat"]]);
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Json, false);
        writer.write_table(&table).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(output, "{\"cat\":2,\"cup\":1}\n");
    }

    #[test]
    fn test_pretty_json() {
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Json, true);
        writer.write_record(&labels("img1.png")).unwrap();
        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.contains("\n  \"file_name\""));
    }
}
