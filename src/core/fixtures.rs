//! Recording of raw query responses as test fixtures.
//! Compiled only when the `test-mode` feature is enabled.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) fn fixture_dir() -> PathBuf {
    env::var("FB_FIXDIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

/// Writes `body` to `<fixture_dir>/<endpoint>_<label>_<seq>.<ext>`.
pub(crate) fn record_fixture(
    endpoint: &str,
    label: &str,
    ext: &str,
    body: &str,
) -> Result<PathBuf, std::io::Error> {
    record_fixture_in(&fixture_dir(), endpoint, label, ext, body)
}

fn record_fixture_in(
    dir: &Path,
    endpoint: &str,
    label: &str,
    ext: &str,
    body: &str,
) -> Result<PathBuf, std::io::Error> {
    fs::create_dir_all(dir)?;

    let mut seq = 0usize;
    let path = loop {
        let candidate = dir.join(format!("{endpoint}_{label}_{seq}.{ext}"));
        if !candidate.exists() {
            break candidate;
        }
        seq += 1;
    };
    fs::write(&path, body)?;
    tracing::debug!(path = %path.display(), "recorded fixture");
    Ok(path)
}
