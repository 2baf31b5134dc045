use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error::FetchError;

/// Renders `value` the way the published files look: 4-space indent, no trailing newline.
pub fn render(value: &Value) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(out)
}

/// Writes `<dir>/<slug>.json`, creating `dir` if needed.
///
/// Each call renders into its own `.<slug>.*.part` file and renames it into
/// place, so a previous record is either kept whole or replaced whole and
/// concurrent writers of the same slug never share a temp file.
pub async fn write_record(dir: &Path, slug: &str, value: &Value) -> Result<PathBuf, FetchError> {
    let path = dir.join(format!("{slug}.json"));
    let bytes = render(value)?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| write_error(dir, source))?;

    // Runs to completion even if the calling task is aborted.
    let (dir, slug, target) = (dir.to_path_buf(), slug.to_string(), path.clone());
    match tokio::task::spawn_blocking(move || persist(&dir, &slug, &target, &bytes)).await {
        Ok(written) => written.map(|()| path),
        Err(err) => std::panic::resume_unwind(err.into_panic()),
    }
}

/// The temp file is removed on drop unless `persist` moved it into place.
fn persist(dir: &Path, slug: &str, path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{slug}."))
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|source| write_error(dir, source))?;
    tmp.write_all(bytes)
        .map_err(|source| write_error(tmp.path(), source))?;
    tmp.persist(path).map_err(|err| write_error(path, err.error))?;
    Ok(())
}

fn write_error(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Write {
        path: path.to_path_buf(),
        source,
    }
}
