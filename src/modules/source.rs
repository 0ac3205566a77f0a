use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use itertools::Itertools;
use std::{fs::File, io::Read, path::Path};
use tracing::debug;
use super::config::ColumnMap;
use super::error::{IngestError, IngestResult};

// one data row as the vendor wrote it, the rest of the item comes from the vendor config
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub line: u64,
    pub product_id: String,
    pub name: String,
    pub raw_price: String,
    pub image_url: String,
    pub raw_color: String,

    // the row as read, kept for the rejects csv
    pub raw: StringRecord,
}

// column positions resolved from the header
struct Positions {
    product_id: Option<usize>,
    name: Option<usize>,
    price: Option<usize>,
    image_url: Option<usize>,
    color: Option<usize>,
}

pub struct ProductSource<R: Read> {
    records: StringRecordsIntoIter<R>,
    headers: StringRecord,
    columns: ColumnMap,
    positions: Positions,
}

impl ProductSource<File> {
    pub fn from_path<P: AsRef<Path>>(path: P, columns: &ColumnMap) -> IngestResult<Self> {
        let file = File::open(path)?;
        ProductSource::from_reader(file, columns)
    }
}

impl<R: Read> ProductSource<R> {
    // only product_id is checked up front, other columns fail at the first row
    pub fn from_reader(reader: R, columns: &ColumnMap) -> IngestResult<Self> {
        let mut reader = ReaderBuilder::new()
            // short rows are reported as missing fields, not as csv errors
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        let position = |name: &str| headers.iter().position(|header| header.trim() == name);
        let positions = Positions {
            product_id: position(&columns.product_id),
            name: position(&columns.name),
            price: position(&columns.price),
            image_url: position(&columns.image_url),
            color: position(&columns.color),
        };

        if positions.product_id.is_none() {
            return Err(IngestError::MissingField {
                column: columns.product_id.clone(),
                line: 1,
            });
        }

        debug!(header = %headers.iter().join(", "), "resolved csv header");

        Ok(ProductSource {
            records: reader.into_records(),
            headers,
            columns: columns.clone(),
            positions,
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    fn build_record(&self, raw: StringRecord) -> IngestResult<ProductRecord> {
        let line = raw.position().map(|p| p.line()).unwrap_or_default();
        let field = |position: Option<usize>, column: &str| {
            position
                .and_then(|index| raw.get(index))
                .map(str::to_string)
                .ok_or_else(|| IngestError::MissingField {
                    column: column.to_string(),
                    line,
                })
        };

        Ok(ProductRecord {
            line,
            product_id: field(self.positions.product_id, &self.columns.product_id)?,
            name: field(self.positions.name, &self.columns.name)?,
            raw_price: field(self.positions.price, &self.columns.price)?,
            image_url: field(self.positions.image_url, &self.columns.image_url)?,
            raw_color: field(self.positions.color, &self.columns.color)?,
            raw,
        })
    }
}

impl<R: Read> Iterator for ProductSource<R> {
    type Item = IngestResult<ProductRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(error) => return Some(Err(error.into())),
        };
        Some(self.build_record(record))
    }
}
