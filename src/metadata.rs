use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Serialize;

use crate::domain::StudyId;
use crate::error::ExplorerError;

const FALLBACK_KEY_COLUMN: &str = "image";

/// One row of the metadata table, shaped as a single-row table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataRow {
    columns: Vec<String>,
    values: Vec<String>,
}

impl MetadataRow {
    pub fn key_column(&self) -> &str {
        &self.columns[0]
    }

    pub fn key(&self) -> &str {
        &self.values[0]
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|index| self.values[index].as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone)]
pub struct MetadataStore {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl MetadataStore {
    pub fn load(path: &Path) -> Result<Self, ExplorerError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|err| ExplorerError::MetadataRead {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        let store = Self::from_reader(reader)?;
        tracing::info!(
            rows = store.len(),
            columns = store.columns.len(),
            path = %path.display(),
            "metadata table loaded"
        );
        Ok(store)
    }

    pub fn from_csv(content: &str) -> Result<Self, ExplorerError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, ExplorerError> {
        let headers = reader
            .headers()
            .map_err(|err| ExplorerError::MetadataParse(err.to_string()))?;
        if headers.is_empty() {
            return Err(ExplorerError::MetadataParse(
                "missing header row".to_string(),
            ));
        }
        let mut columns: Vec<String> = headers.iter().map(str::to_string).collect();
        if columns[0].is_empty() {
            columns[0] = FALLBACK_KEY_COLUMN.to_string();
        }

        let mut rows = Vec::new();
        let mut index = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|err| ExplorerError::MetadataParse(err.to_string()))?;
            let mut values: Vec<String> = record.iter().map(str::to_string).collect();
            if values.len() > columns.len() {
                tracing::warn!(
                    key = %values[0],
                    fields = values.len(),
                    columns = columns.len(),
                    "metadata row has extra fields, dropping them"
                );
            }
            // Short rows get empty cells.
            values.resize(columns.len(), String::new());
            let key = values[0].clone();
            if index.contains_key(&key) {
                tracing::warn!(key = %key, "duplicate metadata key, keeping first row");
            } else {
                index.insert(key, rows.len());
            }
            rows.push(values);
        }

        Ok(Self {
            columns,
            rows,
            index,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: StudyId) -> bool {
        self.index.contains_key(&id.image_key())
    }

    pub fn lookup(&self, id: StudyId) -> Result<MetadataRow, ExplorerError> {
        let key = id.image_key();
        let row = self
            .index
            .get(&key)
            .map(|position| &self.rows[*position])
            .ok_or(ExplorerError::MetadataNotFound(key))?;
        Ok(MetadataRow {
            columns: self.columns.clone(),
            values: row.clone(),
        })
    }

    /// Row with the key filled in and every other cell empty.
    pub fn placeholder_row(&self, id: StudyId) -> MetadataRow {
        let mut values = vec![String::new(); self.columns.len()];
        values[0] = id.image_key();
        MetadataRow {
            columns: self.columns.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const TABLE: &str = "\
,Density,Abnormality,Classification
IMG001, B, CALC, BENIGN
IMG004,A,NORM,
IMG004,C,MASS,MALIGNANT
";

    #[test]
    fn blank_key_header_gets_a_name() {
        let store = MetadataStore::from_csv(TABLE).unwrap();
        assert_eq!(store.columns()[0], "image");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn lookup_trims_and_keeps_first_duplicate() {
        let store = MetadataStore::from_csv(TABLE).unwrap();
        let row = store.lookup(StudyId::new(1)).unwrap();
        assert_eq!(row.get("Density"), Some("B"));

        let row = store.lookup(StudyId::new(4)).unwrap();
        assert_eq!(row.key(), "IMG004");
        assert_eq!(row.get("Abnormality"), Some("NORM"));
        assert_eq!(row.get("Classification"), Some(""));
    }

    #[test]
    fn missing_key_and_placeholder() {
        let store = MetadataStore::from_csv(TABLE).unwrap();
        assert_matches!(
            store.lookup(StudyId::new(9)),
            Err(ExplorerError::MetadataNotFound(key)) if key == "IMG009"
        );
        let row = store.placeholder_row(StudyId::new(9));
        assert_eq!(row.key(), "IMG009");
        assert_eq!(row.columns().len(), 4);
        assert!(row.values()[1..].iter().all(String::is_empty));
    }

    #[test]
    fn ragged_rows_are_padded_or_truncated() {
        let store = MetadataStore::from_csv("id,a,b\nIMG001,1\nIMG002,1,2,3\n").unwrap();
        let short = store.lookup(StudyId::new(1)).unwrap();
        assert_eq!(short.values(), &["IMG001", "1", ""]);
        let long = store.lookup(StudyId::new(2)).unwrap();
        assert_eq!(long.values(), &["IMG002", "1", "2"]);
    }
}
