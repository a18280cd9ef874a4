//! CSV export of item records

use crate::crawler::ItemRecord;
use crate::{ConfigError, SpiderError};
use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column names, in record order
pub const HEADER: [&str; 9] = [
    "name",
    "quantity",
    "delivery",
    "unit",
    "price",
    "sku",
    "manufacturer",
    "photo",
    "properties",
];

/// Path of today's export file inside `directory`, e.g. `out/19_10_2026.csv`
pub fn output_path(directory: &Path) -> PathBuf {
    directory.join(format!("{}.csv", chrono::Local::now().format("%d_%m_%Y")))
}

/// Looks up the encoding for a configured label such as `"windows-1251"`
///
/// Only encodings that can be written are accepted; UTF-16 and the
/// replacement encoding are decode-only.
pub fn output_encoding(label: &str) -> Result<&'static Encoding, ConfigError> {
    let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        ConfigError::Validation(format!("Unknown output encoding '{}'", label))
    })?;

    if encoding.output_encoding() != encoding {
        return Err(ConfigError::Validation(format!(
            "Output encoding '{}' can only be read, not written",
            label
        )));
    }

    Ok(encoding)
}

/// Writes a header row and one row per record
///
/// The `properties` column holds the property map as a JSON object.
pub fn write_records<W: Write>(
    writer: W,
    records: &[ItemRecord],
    delimiter: u8,
) -> Result<(), SpiderError> {
    let mut csv = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    csv.write_record(HEADER)?;

    for record in records {
        let quantity = record.quantity.to_string();
        let delivery = record.delivery.to_string();
        let photo = record.photo_url.as_ref().map(|u| u.as_str()).unwrap_or("");
        let properties = serde_json::to_string(&record.properties)?;

        csv.write_record([
            record.name.as_str(),
            quantity.as_str(),
            delivery.as_str(),
            record.unit.as_str(),
            record.price.as_str(),
            record.sku.as_str(),
            record.manufacturer.as_str(),
            photo,
            properties.as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Creates `directory` if needed and writes today's export file into it
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(SpiderError)` - The directory or file could not be written
pub fn export_records(
    directory: &Path,
    records: &[ItemRecord],
    delimiter: char,
    encoding: &'static Encoding,
) -> Result<PathBuf, SpiderError> {
    fs::create_dir_all(directory)?;

    // Validation only lets ASCII delimiters through
    let delimiter = u8::try_from(delimiter).unwrap_or(b';');
    let mut buffer = Vec::new();
    write_records(&mut buffer, records, delimiter)?;

    let path = output_path(directory);
    fs::write(&path, encode_output(&buffer, encoding))?;

    tracing::info!(
        "Wrote {} records to {} ({})",
        records.len(),
        path.display(),
        encoding.name()
    );
    Ok(path)
}

/// Re-encodes UTF-8 CSV bytes into the output encoding
///
/// Characters the target cannot represent become HTML numeric character
/// references, as `encoding_rs` does.
fn encode_output<'a>(utf8: &'a [u8], encoding: &'static Encoding) -> Cow<'a, [u8]> {
    if encoding == UTF_8 {
        return utf8.into();
    }

    let text = String::from_utf8_lossy(utf8);
    let (encoded, _, unmappable) = encoding.encode(&text);
    if unmappable {
        tracing::warn!(
            "Some characters have no {} form and were written as character references",
            encoding.name()
        );
    }

    encoded.into_owned().into()
}
