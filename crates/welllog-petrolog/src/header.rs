//! The `.header` document: record layout, depth range and one descriptor
//! per stored log.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use welllog_model::SampleEncoding;

use crate::dialect::{self, Element};
use crate::error::{PetrologError, Result};
use crate::layout::{RecordLayout, COLUMN_WIDTH};
use crate::preamble;

/// Root element of a header document.
pub const HEADER_ROOT: &str = "PetrologHeader";

/// One stored log (a group of `dimension` consecutive sample columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDescriptor {
    /// `TypeDouble`, `TypeFloat` or a type this crate cannot decode.
    pub log_type: String,
    pub name: String,
    /// 1-based column number.
    pub column: usize,
    pub number: usize,
    pub unit: String,
    pub description: String,
    pub tool: String,
    pub dimension: usize,
    /// 0-based first column within the record.
    pub column_start: usize,
}

impl LogDescriptor {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, dimension: usize) -> Self {
        Self {
            log_type: SampleEncoding::Float.tag().to_string(),
            name: name.into(),
            column: 0,
            number: 0,
            unit: unit.into(),
            description: String::new(),
            tool: String::new(),
            dimension,
            column_start: 0,
        }
    }

    pub fn encoding(&self) -> SampleEncoding {
        SampleEncoding::from_tag(&self.log_type)
    }

    fn from_element(element: &Element, position: usize, path: &Path) -> Result<Self> {
        let field = |name: &str| format!("Log[{position}].{name}");
        let name = element
            .child_text("LogName")
            .filter(|n| !n.is_empty())
            .ok_or_else(|| malformed(path, &field("LogName"), "missing"))?;
        let column_start: usize = required(element, "LogColumnStart", path)
            .map_err(|_| malformed(path, &field("LogColumnStart"), "missing or not a number"))?;
        let text = |tag: &str| element.child_text(tag).unwrap_or_default().to_string();
        let number = |tag: &str, default: usize| {
            element
                .child_text(tag)
                .and_then(|t| t.trim().parse().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            log_type: element
                .child_text("LogType")
                .unwrap_or(SampleEncoding::Float.tag())
                .to_string(),
            name: name.to_string(),
            column: number("LogColumn", column_start + 1),
            number: number("LogNumber", position),
            unit: text("LogUnit"),
            description: text("LogDescription"),
            tool: text("LogTool"),
            dimension: number("LogDimension", 1).max(1),
            column_start,
        })
    }

    fn to_element(&self) -> Element {
        let mut log = Element::new("Log");
        log.push_leaf("LogType", self.log_type.as_str())
            .push_leaf("LogName", self.name.as_str())
            .push_leaf("LogColumn", self.column.to_string())
            .push_leaf("LogNumber", self.number.to_string())
            .push_leaf("LogUnit", self.unit.as_str())
            .push_leaf("LogDescription", self.description.as_str())
            .push_leaf("LogTool", self.tool.as_str())
            .push_leaf("LogDimension", self.dimension.to_string())
            .push_leaf("LogColumnStart", self.column_start.to_string());
        log
    }
}

/// Parsed header document.
///
/// Depths are stored in feet. `data_start` equals the preamble block length
/// of the `.data` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetrologHeader {
    pub number_of_logs: usize,
    pub number_of_columns: usize,
    pub number_of_empty_columns: usize,
    pub number_of_records: usize,
    pub depth_start: f64,
    pub depth_end: f64,
    pub depth_frame: f64,
    pub record_width: usize,
    pub data_start: u64,
    pub data_block_size: u64,
    pub logs: Vec<LogDescriptor>,
}

impl PetrologHeader {
    /// Empty header for `records` records starting at `depth_start` feet.
    pub fn new(depth_start: f64, depth_frame: f64, records: usize) -> Self {
        let mut header = Self {
            number_of_logs: 0,
            number_of_columns: 0,
            number_of_empty_columns: 0,
            number_of_records: records,
            depth_start,
            depth_end: depth_start,
            depth_frame,
            record_width: 0,
            data_start: 0,
            data_block_size: 0,
            logs: Vec::new(),
        };
        header.set_depth_range(depth_start, records);
        header.recompute_layout();
        header
    }

    /// Read and parse the header document at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PetrologError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse header text. `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let root = dialect::parse(text).map_err(|e| malformed(path, HEADER_ROOT, &e.to_string()))?;
        if root.name != HEADER_ROOT {
            return Err(malformed(
                path,
                HEADER_ROOT,
                &format!("unexpected root element <{}>", root.name),
            ));
        }

        let mut logs = Vec::new();
        let blocks = root
            .child("Logs")
            .map(|l| l.children_named("Log").collect::<Vec<_>>())
            .unwrap_or_default();
        for (position, block) in blocks.into_iter().enumerate() {
            logs.push(LogDescriptor::from_element(block, position, path)?);
        }

        let header = Self {
            number_of_logs: required(&root, "NumberOfLogs", path)?,
            number_of_columns: required(&root, "NumberOfColumns", path)?,
            number_of_empty_columns: optional(&root, "NumberOfEmptyColumns", path)?.unwrap_or(0),
            number_of_records: required(&root, "NumberOfDataRecords", path)?,
            depth_start: required(&root, "DepthStart", path)?,
            depth_end: required(&root, "DepthEnd", path)?,
            depth_frame: required(&root, "DepthFrame", path)?,
            record_width: required(&root, "LogDataRecordWidth", path)?,
            data_start: required(&root, "LogDataStartPosition", path)?,
            data_block_size: optional(&root, "LogDataBlockSize", path)?.unwrap_or(0),
            logs,
        };

        let fits = |columns: usize| {
            columns <= header.record_width / COLUMN_WIDTH
                && RecordLayout::record_width_for(columns, 0) <= header.record_width
        };
        if !fits(header.number_of_columns) {
            return Err(malformed(
                path,
                "LogDataRecordWidth",
                &format!(
                    "{} bytes cannot hold {} columns",
                    header.record_width, header.number_of_columns
                ),
            ));
        }
        for log in &header.logs {
            if !log.column_start.checked_add(log.dimension).is_some_and(fits) {
                return Err(malformed(
                    path,
                    &format!("{}.LogColumnStart", log.name),
                    "columns extend past the record",
                ));
            }
        }
        Ok(header)
    }

    pub fn to_document(&self) -> String {
        let mut root = Element::new(HEADER_ROOT);
        root.push_leaf("NumberOfLogs", self.number_of_logs.to_string())
            .push_leaf("NumberOfColumns", self.number_of_columns.to_string())
            .push_leaf("NumberOfEmptyColumns", self.number_of_empty_columns.to_string())
            .push_leaf("DepthStart", self.depth_start.to_string())
            .push_leaf("DepthEnd", self.depth_end.to_string())
            .push_leaf("DepthFrame", self.depth_frame.to_string())
            .push_leaf("LogDataRecordWidth", self.record_width.to_string())
            .push_leaf("LogDataStartPosition", self.data_start.to_string())
            .push_leaf("NumberOfDataRecords", self.number_of_records.to_string())
            .push_leaf("LogDataBlockSize", self.data_block_size.to_string());
        let mut logs = Element::new("Logs");
        for log in &self.logs {
            logs.push(log.to_element());
        }
        root.push(logs);
        root.to_document()
    }

    /// Write the document to `path` through a temporary file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_document();
        crate::rewrite::replace_file(path, |w| Ok(w.write_all(text.as_bytes())?))
    }

    /// Reassign column starts, column numbers and log numbers sequentially
    /// from zero, then derive every size field from them.
    pub fn recompute_layout(&mut self) {
        let mut next_column = 0;
        for (number, log) in self.logs.iter_mut().enumerate() {
            log.number = number;
            log.column_start = next_column;
            log.column = next_column + 1;
            next_column += log.dimension;
        }
        self.number_of_logs = self.logs.len();
        self.number_of_columns = next_column;
        self.record_width =
            RecordLayout::record_width_for(self.number_of_columns, self.number_of_empty_columns);
        self.data_start =
            preamble::block_length(self.number_of_columns, self.number_of_empty_columns) as u64;
        self.data_block_size = self.record_width as u64 * self.number_of_records as u64;
    }

    /// Set the record count and the depth end it implies.
    pub fn set_depth_range(&mut self, depth_start: f64, records: usize) {
        self.depth_start = depth_start;
        self.number_of_records = records;
        self.depth_end = depth_start + records.saturating_sub(1) as f64 * self.depth_frame;
        self.data_block_size = self.record_width as u64 * records as u64;
    }

    pub fn log(&self, name: &str) -> Option<&LogDescriptor> {
        self.logs.iter().find(|l| l.name == name)
    }

    pub fn log_mut(&mut self, name: &str) -> Option<&mut LogDescriptor> {
        self.logs.iter_mut().find(|l| l.name == name)
    }

    /// Addressing for the `.data` file, depths in feet.
    pub fn record_layout(&self) -> RecordLayout {
        RecordLayout {
            data_start: self.data_start,
            record_width: self.record_width,
            records: self.number_of_records,
            depth_start: self.depth_start,
            depth_end: self.depth_end,
            depth_step: self.depth_frame,
        }
    }
}

fn malformed(path: &Path, field: &str, reason: &str) -> PetrologError {
    PetrologError::MalformedHeader {
        path: path.to_path_buf(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn optional<T: FromStr>(element: &Element, field: &str, path: &Path) -> Result<Option<T>> {
    match element.child_text(field) {
        None => Ok(None),
        Some(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| malformed(path, field, &format!("invalid value '{text}'"))),
    }
}

fn required<T: FromStr>(element: &Element, field: &str, path: &Path) -> Result<T> {
    optional(element, field, path)?.ok_or_else(|| malformed(path, field, "missing"))
}
