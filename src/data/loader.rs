//! Loading the ABT (analytical base table) from disk
//!
//! The training pipeline receives the churn ABT as a materialized
//! `DataFrame`; this module is the file-reading collaborator that produces
//! it. CSV, Parquet and line-delimited JSON are supported, with format
//! detection from the file extension.

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use std::fs::File;

/// Loads tabular data files into polars DataFrames
pub struct DataLoader {
    /// Rows used for CSV schema inference
    infer_schema_rows: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_rows: Some(100),
        }
    }

    /// Set the number of rows inspected for CSV schema inference
    pub fn with_infer_schema_rows(mut self, n: usize) -> Self {
        self.infer_schema_rows = Some(n);
        self
    }

    /// Load a CSV file
    pub fn load_csv(&self, path: &str) -> Result<DataFrame> {
        self.load_csv_with_options(path, b',', true)
    }

    /// Load a CSV file with an explicit delimiter and header flag
    pub fn load_csv_with_options(
        &self,
        path: &str,
        delimiter: u8,
        has_header: bool,
    ) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| ChurnError::DataError(e.to_string()))?;

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);

        let reader = CsvReadOptions::default()
            .with_has_header(has_header)
            .with_infer_schema_length(self.infer_schema_rows)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file);

        reader
            .finish()
            .map_err(|e| ChurnError::DataError(e.to_string()))
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: &str) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| ChurnError::DataError(e.to_string()))?;

        ParquetReader::new(file)
            .finish()
            .map_err(|e| ChurnError::DataError(e.to_string()))
    }

    /// Load a line-delimited JSON file
    pub fn load_json(&self, path: &str) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| ChurnError::DataError(e.to_string()))?;

        JsonReader::new(file)
            .finish()
            .map_err(|e| ChurnError::DataError(e.to_string()))
    }

    /// Detect the file format from the extension and load
    pub fn load_auto(&self, path: &str) -> Result<DataFrame> {
        let path_lower = path.to_lowercase();

        if path_lower.ends_with(".csv") || path_lower.ends_with(".tsv") {
            let delimiter = if path_lower.ends_with(".tsv") { b'\t' } else { b',' };
            self.load_csv_with_options(path, delimiter, true)
        } else if path_lower.ends_with(".parquet") || path_lower.ends_with(".pq") {
            self.load_parquet(path)
        } else if path_lower.ends_with(".json") || path_lower.ends_with(".jsonl") {
            self.load_json(path)
        } else {
            // Try CSV as default
            self.load_csv(path)
        }
    }
}

/// Writes DataFrames back to disk (scored outputs)
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV
    pub fn save_csv(df: &mut DataFrame, path: &str) -> Result<()> {
        let mut file = File::create(path).map_err(|e| ChurnError::DataError(e.to_string()))?;

        CsvWriter::new(&mut file)
            .finish(df)
            .map_err(|e| ChurnError::DataError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "dtReferencia,idVendedor,flChurn,vlMedioPeso").unwrap();
        writeln!(file, "2018-01-01,s1,true,1.5").unwrap();
        writeln!(file, "2018-01-01,s2,false,2.0").unwrap();
        writeln!(file, "2018-02-01,s3,false,0.5").unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv();
        let loader = DataLoader::new();

        let df = loader.load_csv(file.path().to_str().unwrap()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 4);
        assert_eq!(df.column("flChurn").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_load_auto_detects_csv() {
        let file = create_test_csv();
        let loader = DataLoader::new();

        let df = loader.load_auto(file.path().to_str().unwrap()).unwrap();
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let loader = DataLoader::new();
        let result = loader.load_csv("/nonexistent/abt.csv");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_csv_round_trip() {
        let mut df = DataFrame::new(vec![
            Column::new("idVendedor".into(), &["s1", "s2", "s3"]),
            Column::new("score".into(), &[0.1, 0.5, 0.9]),
        ])
        .unwrap();

        let file = NamedTempFile::new().unwrap();
        DataSaver::save_csv(&mut df, file.path().to_str().unwrap()).unwrap();

        let loader = DataLoader::new();
        let loaded = loader.load_csv(file.path().to_str().unwrap()).unwrap();

        assert_eq!(loaded.height(), 3);
        assert_eq!(loaded.width(), 2);
    }
}
