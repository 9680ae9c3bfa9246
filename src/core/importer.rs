use crate::config::ImportConfig;
use crate::core::ReportStore;
use crate::domain::model::{ImportMode, ImportSummary, RejectedRow, ReportRow};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::resolve_within;

pub struct ReportImporter<S: ReportStore> {
    store: S,
    config: ImportConfig,
}

/// Rows split into the ones to persist and the ones turned away.
#[derive(Debug, Default)]
struct ParsedReport {
    rows: Vec<ReportRow>,
    rejected: Vec<RejectedRow>,
    rows_read: usize,
}

impl<S: ReportStore> ReportImporter<S> {
    pub fn new(store: S, config: ImportConfig) -> Self {
        Self { store, config }
    }

    pub async fn process_report(&self, filename: &str) -> Result<ImportSummary> {
        let resolved = resolve_within(&self.config.base_dir, filename)?;
        let source = resolved.key;
        tracing::info!("📥 Importing report {}", resolved.path.display());

        let data = tokio::fs::read(&resolved.path).await?;
        let parsed = parse_rows(&data, self.config.min_fields, self.config.mode)?;

        tracing::debug!(
            "Parsed {} rows ({} valid, {} rejected)",
            parsed.rows_read,
            parsed.rows.len(),
            parsed.rejected.len()
        );

        let inserted = if parsed.rows.is_empty() {
            0
        } else {
            self.store.save_rows(&source, &parsed.rows).await?
        };
        let duplicates = parsed.rows.len() as u64 - inserted;

        if !parsed.rejected.is_empty() {
            tracing::warn!(
                "⚠️ Skipped {} malformed rows in {}",
                parsed.rejected.len(),
                source
            );
        }
        tracing::info!(
            "✅ Imported {}: {} inserted, {} already present",
            source,
            inserted,
            duplicates
        );

        Ok(ImportSummary {
            source,
            rows_read: parsed.rows_read,
            inserted,
            duplicates,
            rejected: parsed.rejected,
        })
    }
}

/// Parses one physical line at a time so `line` always matches the file,
/// blank lines included. Quoted fields may not span lines.
fn parse_rows(data: &[u8], min_fields: usize, mode: ImportMode) -> Result<ParsedReport> {
    let mut parsed = ParsedReport::default();
    let mut record = csv::StringRecord::new();

    for (index, raw) in data.split(|&b| b == b'\n').enumerate() {
        let line = index as u64 + 1;
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(raw);
        if !reader.read_record(&mut record)? {
            continue;
        }
        parsed.rows_read += 1;

        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        // 行尾空欄位不算數 ("1,2,3,4," 只有 4 欄)
        while fields.last().is_some_and(|field| field.is_empty()) {
            fields.pop();
        }

        if fields.len() < min_fields {
            let err = AppError::MalformedRow {
                line,
                found: fields.len(),
                expected: min_fields,
            };
            match mode {
                ImportMode::Abort => return Err(err),
                ImportMode::Skip => {
                    tracing::debug!("Rejecting line {}: {}", line, err);
                    parsed.rejected.push(RejectedRow {
                        line,
                        reason: err.to_string(),
                    });
                    continue;
                }
            }
        }

        tracing::trace!("Processing line {}", line);
        parsed.rows.push(ReportRow { line, fields });
    }

    Ok(parsed)
}
