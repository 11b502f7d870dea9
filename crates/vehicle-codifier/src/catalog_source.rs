//! CSV-backed `CatalogSource`: loads the CVEGS catalog from a flat file.
//!
//! Expected columns: `cvegs,marca,submarca,tipveh,modelo,descveh`. Every
//! text field is run through the same normalizer the pipeline applies to
//! queries, so catalog rows and extracted fields compare on equal footing.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use vehicle_codifier_core::{normalize, CatalogRecord, CatalogSource, PipelineError};

pub struct CsvCatalogSource {
    path: PathBuf,
}

impl CsvCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn file_version(&self) -> u64 {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map(|t| t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs())
            .unwrap_or(1)
    }
}

impl CatalogSource for CsvCatalogSource {
    fn load_active_version(&self) -> Result<(u64, Vec<CatalogRecord>), PipelineError> {
        let version = self.file_version();
        let records = read_records(&self.path, version)?;
        Ok((version, records))
    }
}

#[derive(serde::Deserialize)]
struct CatalogRow {
    cvegs: String,
    marca: String,
    submarca: String,
    tipveh: String,
    modelo: i32,
    descveh: String,
}

fn read_records(path: &Path, version: u64) -> Result<Vec<CatalogRecord>, PipelineError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::InvalidInput(
        format!("failed to open catalog file {}: {e}", path.display()),
    ))?;

    let mut records = Vec::new();
    for row in reader.deserialize::<CatalogRow>() {
        let row = row.map_err(|e| {
            PipelineError::InvalidInput(format!("malformed catalog row: {e}"))
        })?;
        records.push(CatalogRecord {
            cvegs: row.cvegs,
            marca: normalize(&row.marca),
            submarca: normalize(&row.submarca),
            tipveh: normalize(&row.tipveh),
            modelo: row.modelo,
            descveh: normalize(&row.descveh),
            embedding: None,
            catalog_version: version,
        });
    }
    Ok(records)
}
