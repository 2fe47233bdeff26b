use super::row::RawRow;
use super::CatalogImportError;
use encoding_rs::Encoding;
use std::io::Read;
use tracing::debug;

pub(crate) const FIELD_DELIMITER: u8 = b';';

/// Decodes the raw export and splits it into rows keyed by the header line.
/// A byte-order mark overrides `encoding`.
pub(crate) fn parse_rows<R: Read>(
    mut reader: R,
    encoding: &'static Encoding,
) -> Result<Vec<RawRow>, CatalogImportError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        debug!(encoding = used.name(), "catalog contained undecodable bytes, replaced");
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .collect();
        rows.push(row);
    }

    Ok(rows)
}
