//! Terminal rendering
//!
//! Writes successive snapshots of one run as incremental output

use std::collections::HashMap;
use std::io::{self, Write};

use serde_json::Value;

use crate::chat::assembler::{Snapshot, ToolState};

/// Longest tool argument/result preview, in characters
const PREVIEW_CHARS: usize = 160;

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= PREVIEW_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

/// Incremental snapshot printer for one run
///
/// Tool lines are written when a tool first appears and when it completes.
/// Text is written as appended suffixes; when the text is replaced rather
/// than extended, it is printed again in full.
pub struct SnapshotPrinter<W: Write> {
    out: W,
    /// Text already written for the current run
    printed_text: String,
    /// Tool ID -> completion already reported
    tools: HashMap<String, bool>,
    /// Whether the cursor is at the start of a line
    at_line_start: bool,
}

impl<W: Write> SnapshotPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed_text: String::new(),
            tools: HashMap::new(),
            at_line_start: true,
        }
    }

    fn ensure_line_start(&mut self) -> io::Result<()> {
        if !self.at_line_start {
            writeln!(self.out)?;
            self.at_line_start = true;
        }
        Ok(())
    }

    fn write_tool(&mut self, tool: &ToolState) -> io::Result<()> {
        let reported = self.tools.get(&tool.id).copied();
        let completed = tool.status.is_completed();

        if reported.is_none() {
            self.ensure_line_start()?;
            writeln!(self.out, "[tool] {} {}", tool.name, preview(&tool.args))?;
        }
        if completed && reported != Some(true) {
            self.ensure_line_start()?;
            match tool.status.result() {
                Some(result) => writeln!(self.out, "[done] {} -> {}", tool.name, preview(result))?,
                None => writeln!(self.out, "[done] {}", tool.name)?,
            }
        }

        self.tools.insert(tool.id.clone(), completed);
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        if let Some(suffix) = text.strip_prefix(self.printed_text.as_str()) {
            if suffix.is_empty() {
                return Ok(());
            }
            write!(self.out, "{}", suffix)?;
        } else {
            // Replaced by authoritative text
            self.ensure_line_start()?;
            writeln!(self.out, "---")?;
            write!(self.out, "{}", text)?;
        }

        self.printed_text = text.to_string();
        self.at_line_start = text.ends_with('\n');
        Ok(())
    }

    /// Write whatever changed since the previous snapshot
    pub fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        for tool in snapshot.tool_calls() {
            self.write_tool(tool)?;
        }
        if let Some(text) = snapshot.text() {
            self.write_text(text)?;
        }
        self.out.flush()
    }

    /// Write a run failure below the partial output
    pub fn render_error(&mut self, message: &str) -> io::Result<()> {
        self.ensure_line_start()?;
        writeln!(self.out, "error: {}", message)?;
        self.out.flush()
    }

    /// End the run and reset for the next one
    pub fn finish(&mut self) -> io::Result<()> {
        self.ensure_line_start()?;
        self.printed_text.clear();
        self.tools.clear();
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
