use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone};

use crate::{Error, Result, record::MessageRecord, util};

/// Writes `records` to `<dir>/<contact> <YYYY-MM-DD HH.MM.SS>.csv`.
///
/// Nothing is written for an empty slice; `Ok(None)` is returned instead.
pub fn export<Tz>(
    records: &[MessageRecord],
    dir: &Path,
    contact: &str,
    at: &DateTime<Tz>,
) -> Result<Option<PathBuf>>
where
    Tz: TimeZone,
    Tz::Offset: core::fmt::Display,
{
    if records.is_empty() {
        return Ok(None);
    }

    let path = dir.join(format!(
        "{} {}.csv",
        util::file_stem(contact),
        at.format("%Y-%m-%d %H.%M.%S")
    ));
    let failure = |source: io::Error| Error::ExportFailure {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(failure)?;
    let table = to_csv(records).map_err(failure)?;
    util::write_atomically(&path, &table).map_err(failure)?;

    tracing::info!(target: "export", "<{contact}> {} rows -> {}", records.len(), path.display());
    Ok(Some(path))
}

fn to_csv(records: &[MessageRecord]) -> io::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))
}
