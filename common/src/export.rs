use anyhow::Result;

use crate::record::Record;

/// Columnas del CSV exportado, en este orden.
pub const CSV_HEADERS: [&str; 7] = [
    "lastUpdated",
    "title",
    "url",
    "rating",
    "ratingsCount",
    "length",
    "lectures",
];

/// Serializa los registros a CSV (con header). Comillas según RFC 4180.
pub fn records_to_csv(records: &[Record]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;

    for r in records {
        writer.write_record([
            r.last_updated.as_str(),
            r.title.as_str(),
            r.url.as_str(),
            r.rating.as_str(),
            r.ratings_count.as_str(),
            r.length.as_str(),
            r.lectures.as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}
