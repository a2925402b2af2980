// Reports module - notification text built line by line

pub mod delta;

pub use delta::{compute_delta, DeltaFormatter, Movement, TrackedDelta};

use std::fmt;

/// A finished multi-line report. Each line is rendered with a trailing newline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Collects report lines; rendering happens once, through `Display`.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    lines: Vec<String>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn build(self) -> Report {
        Report { lines: self.lines }
    }
}
