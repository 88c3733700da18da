// src/search/report.rs

//! Per-run result records and where they go.

use crate::core::Result;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column header of the CSV report.
pub const CSV_HEADER: &str = "N_INDEX,N_SHOTS,SUM_GL,PROBABILITY";

/// One finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Key width in bits.
    pub n_index: usize,
    /// Shots per stage.
    pub n_shots: u64,
    /// Iteration counts summed over every stage.
    pub sum_gl: usize,
    /// Fraction of final-stage shots that read the key with a clean mirror.
    pub probability: f64,
}

impl RunReport {
    pub fn to_csv_row(&self) -> String {
        format!("{},{},{},{}", self.n_index, self.n_shots, self.sum_gl, self.probability)
    }
}

/// Append-only destination for run reports.
pub trait ReportSink {
    fn record(&mut self, report: &RunReport) -> Result<()>;
}

impl ReportSink for Vec<RunReport> {
    fn record(&mut self, report: &RunReport) -> Result<()> {
        self.push(report.clone());
        Ok(())
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn record(&mut self, report: &RunReport) -> Result<()> {
        (**self).record(report)
    }
}

/// Writes reports as CSV rows.
pub struct CsvReport<W: Write> {
    writer: W,
}

impl<W: Write> CsvReport<W> {
    /// Starts a fresh table on `writer`, header first.
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(writer, "{}", CSV_HEADER)?;
        Ok(Self { writer })
    }

    /// Continues an existing table; no header is written.
    pub fn resume(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl CsvReport<BufWriter<std::fs::File>> {
    /// Opens `path` for appending. The header is written only when the file
    /// is new or empty.
    pub fn open_append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        let writer = BufWriter::new(file);
        if is_empty {
            Self::new(writer)
        } else {
            Ok(Self::resume(writer))
        }
    }
}

impl<W: Write> ReportSink for CsvReport<W> {
    fn record(&mut self, report: &RunReport) -> Result<()> {
        writeln!(self.writer, "{}", report.to_csv_row())?;
        self.writer.flush()?;
        Ok(())
    }
}
