//! Output formatting and progress reporting
//!
//! The scan engine only talks to [`ProgressObserver`]; the binary drives a
//! [`Reporter`] around it.

use crate::device::DeviceRecord;
use crate::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Per-host notifications, called concurrently from every worker
pub trait ProgressObserver: Send + Sync {
    fn host_scanned(&self);
}

/// Presentation side of a scan
pub trait Reporter: ProgressObserver {
    /// Called once before scanning with the number of hosts to expect
    fn begin(&self, total_hosts: usize);

    /// Called once with the final, ordered records
    fn report(&self, records: &[DeviceRecord]) -> Result<()>;
}

/// Plain atomic counter
#[derive(Debug, Default)]
pub struct ProgressCounter {
    scanned: AtomicUsize,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.scanned.load(Ordering::SeqCst)
    }
}

impl ProgressObserver for ProgressCounter {
    fn host_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::SeqCst);
    }
}

/// Column headings of the table and CSV renderings
const HEADERS: [&str; 7] = ["IP", "HW", "FW", "S/N", "Model", "ServerName", "Name"];

fn columns(record: &DeviceRecord) -> [String; 7] {
    [
        record.address.to_string(),
        record.hardware_revision.clone(),
        record.firmware_version.clone(),
        record.serial_number.clone(),
        record.model.clone(),
        record.server_name.clone(),
        record.device_name.clone(),
    ]
}

/// Render records as an aligned, borderless table
pub fn format_table(records: &[DeviceRecord], colored: bool) -> String {
    let rows: Vec<[String; 7]> = records.iter().map(columns).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut output = String::new();
    let header = render_line(&HEADERS.map(str::to_string)[..]);
    if colored {
        output.push_str(&header.bold().to_string());
    } else {
        output.push_str(&header);
    }
    output.push('\n');

    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");
    output.push_str(&rule);
    output.push('\n');

    for row in &rows {
        output.push_str(&render_line(&row[..]));
        output.push('\n');
    }

    output
}

/// Render records as a pretty-printed JSON array
pub fn format_json(records: &[DeviceRecord]) -> Result<String> {
    serde_json::to_string_pretty(records)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e).into())
}

/// Render records as CSV with the table's headings
pub fn format_csv(records: &[DeviceRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_io = |e: csv::Error| io::Error::new(io::ErrorKind::Other, e);

    writer.write_record(HEADERS).map_err(to_io)?;
    for record in records {
        writer.write_record(columns(record)).map_err(to_io)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub progress: bool,
    pub colored: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            progress: true,
            colored: true,
        }
    }
}

/// Progress bar on stderr, report on stdout
pub struct ConsoleReporter {
    config: OutputConfig,
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            bar: ProgressBar::hidden(),
        }
    }

    pub fn render(&self, records: &[DeviceRecord]) -> Result<String> {
        match self.config.format {
            OutputFormat::Table => Ok(format_table(records, self.config.colored)),
            OutputFormat::Json => format_json(records),
            OutputFormat::Csv => format_csv(records),
        }
    }
}

impl ProgressObserver for ConsoleReporter {
    fn host_scanned(&self) {
        self.bar.inc(1);
    }
}

impl Reporter for ConsoleReporter {
    fn begin(&self, total_hosts: usize) {
        self.bar.set_length(total_hosts as u64);
        if self.config.progress {
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{prefix} {bar:40.cyan/blue} {pos}/{len} {percent}%")
            {
                self.bar.set_style(style.progress_chars("=>-"));
            }
            self.bar.set_prefix("Scan net");
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
        }
    }

    fn report(&self, records: &[DeviceRecord]) -> Result<()> {
        self.bar.finish();

        let output = self.render(records)?;
        let mut stdout = io::stdout().lock();
        if self.config.format == OutputFormat::Table {
            writeln!(stdout)?;
        }
        write!(stdout, "{}", output)?;
        if self.config.format == OutputFormat::Table {
            writeln!(stdout)?;
        }
        Ok(())
    }
}
