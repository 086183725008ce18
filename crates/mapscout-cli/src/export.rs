//! Export of collected records to CSV, JSON, and Excel files.
//!
//! The exporter is agnostic to how records were collected: it consumes the
//! ordered sequence the sink produced and encodes it. Filenames carry the
//! sanitized query/location plus a timestamp so repeated runs never clobber
//! each other.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::ValueEnum;
use thiserror::Error;

use mapscout_core::BusinessRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Excel encoding error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),
}

/// Output encodings selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Excel,
    All,
}

const EXCEL_HEADERS: &[&str] = &[
    "name",
    "rating",
    "review_count",
    "category",
    "address",
    "phone",
    "website",
    "map_url",
];

/// Writes record collections into an output directory.
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    /// Creates the output directory if needed.
    ///
    /// # Errors
    ///
    /// [`ExportError::Io`] when the directory cannot be created.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Writes `records` in `format`; `All` writes every encoding.
    /// Returns the paths written.
    ///
    /// # Errors
    ///
    /// Any [`ExportError`] from the underlying encoder.
    pub fn export(
        &self,
        format: ExportFormat,
        records: &[BusinessRecord],
        query: &str,
        location: &str,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let stem = self.file_stem(query, location);
        let paths = match format {
            ExportFormat::Csv => vec![self.to_csv(records, &stem)?],
            ExportFormat::Json => vec![self.to_json(records, &stem)?],
            ExportFormat::Excel => vec![self.to_excel(records, &stem)?],
            ExportFormat::All => vec![
                self.to_csv(records, &stem)?,
                self.to_json(records, &stem)?,
                self.to_excel(records, &stem)?,
            ],
        };
        Ok(paths)
    }

    fn to_csv(&self, records: &[BusinessRecord], stem: &str) -> Result<PathBuf, ExportError> {
        let path = self.output_dir.join(format!("{stem}.csv"));
        let mut writer = csv::Writer::from_writer(File::create(&path)?);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        tracing::info!(path = %path.display(), rows = records.len(), "wrote CSV export");
        Ok(path)
    }

    fn to_json(&self, records: &[BusinessRecord], stem: &str) -> Result<PathBuf, ExportError> {
        let path = self.output_dir.join(format!("{stem}.json"));
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, records)?;
        tracing::info!(path = %path.display(), rows = records.len(), "wrote JSON export");
        Ok(path)
    }

    fn to_excel(&self, records: &[BusinessRecord], stem: &str) -> Result<PathBuf, ExportError> {
        let path = self.output_dir.join(format!("{stem}.xlsx"));
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, header) in EXCEL_HEADERS.iter().enumerate() {
            worksheet.write_string(0, col_idx(col), *header)?;
        }
        for (row, record) in records.iter().enumerate() {
            let row = u32::try_from(row + 1).unwrap_or(u32::MAX);
            worksheet.write_string(row, 0, record.name.as_str())?;
            if let Some(rating) = record.rating {
                worksheet.write_number(row, 1, rating)?;
            }
            if let Some(count) = record.review_count {
                worksheet.write_number(row, 2, f64::from(count))?;
            }
            if let Some(category) = record.category.as_deref() {
                worksheet.write_string(row, 3, category)?;
            }
            if let Some(address) = record.address.as_deref() {
                worksheet.write_string(row, 4, address)?;
            }
            if let Some(phone) = record.phone.as_deref() {
                worksheet.write_string(row, 5, phone)?;
            }
            if let Some(website) = record.website.as_deref() {
                worksheet.write_string(row, 6, website)?;
            }
            worksheet.write_string(row, 7, record.map_url.as_str())?;
        }

        workbook.save(&path)?;
        tracing::info!(path = %path.display(), rows = records.len(), "wrote Excel export");
        Ok(path)
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<query>_<location>_<timestamp>`, lowercased and filesystem-safe.
    fn file_stem(&self, query: &str, location: &str) -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        format!(
            "{}_{}_{timestamp}",
            sanitize_component(query),
            sanitize_component(location)
        )
    }
}

/// Lowercases, maps whitespace to underscores, and drops anything that is
/// not alphanumeric, `-`, or `_`. Capped so absurd queries stay usable as
/// filenames.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    cleaned.chars().take(20).collect()
}

fn col_idx(col: usize) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}

/// Joins export paths for the end-of-run report.
pub fn describe_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
