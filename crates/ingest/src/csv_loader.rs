use crate::error::DataFormatError;
use crate::table::RawTable;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads a trade log CSV into a `RawTable`.
///
/// Rows are read flexibly so that a short or long row reaches the ingestor,
/// which reports it with its row number instead of a bare CSV error.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, DataFormatError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(columns = headers.len(), rows = rows.len(), "Read CSV input.");
    Ok(RawTable::new(headers, rows))
}

pub fn read_csv_path(path: impl AsRef<Path>) -> Result<RawTable, DataFormatError> {
    let file = File::open(path.as_ref())?;
    read_csv(file)
}
