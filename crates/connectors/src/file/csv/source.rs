use crate::{
    error::ConnectorError, memory::MemorySource, requests::FetchRequest, source::KeysetSource,
};
use async_trait::async_trait;
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use std::{fs::File, io::Read, path::Path};
use tracing::{info, warn};

/// A CSV file loaded into memory and served in keyset order.
///
/// The first record holds the column names. Cell types are inferred per
/// cell: empty cells are NULL, then integers, floats, booleans, RFC 3339
/// timestamps and dates are tried before falling back to text. A column
/// may end up holding several kinds; they order by `Value::total_cmp`.
#[derive(Debug, Clone)]
pub struct CsvSource {
    inner: MemorySource,
    headers: Vec<String>,
}

impl CsvSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConnectorError> {
        let path = path.as_ref();
        let entity = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("csv")
            .to_string();
        let file = File::open(path)?;
        Self::from_reader(&entity, file)
    }

    pub fn from_reader<R: Read>(entity: &str, reader: R) -> Result<Self, ConnectorError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(ConnectorError::InvalidFormat(format!(
                "'{entity}' has no header row"
            )));
        }

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != headers.len() {
                warn!(
                    "Skipping record {}: expected {} fields, found {}",
                    line + 1,
                    headers.len(),
                    record.len()
                );
                continue;
            }

            let fields = headers
                .iter()
                .zip(record.iter())
                .map(|(name, cell)| FieldValue::new(name, Value::infer(cell)))
                .collect();
            rows.push(RowData::new(entity, fields));
        }

        info!("Loaded {} rows from '{entity}'", rows.len());

        Ok(CsvSource {
            inner: MemorySource::with_rows(entity, rows),
            headers,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The in-memory table backing this file.
    pub fn table(&self) -> &MemorySource {
        &self.inner
    }
}

#[async_trait]
impl KeysetSource for CsvSource {
    type Error = ConnectorError;

    async fn fetch(&self, request: FetchRequest) -> Result<Vec<RowData>, Self::Error> {
        self.inner.fetch(request).await
    }
}
