//! One-time download of the vehicle registration export.
//!
//! The fetch happens at cold start only and is idempotent: when the local
//! copy already exists it is left untouched, so repeated invocations never
//! hit the network in the hot path.

use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Make sure a local copy of `url` exists at `dest`.
///
/// Returns `true` when the file was downloaded, `false` when an existing
/// copy was reused.
pub fn ensure_local_copy(url: &str, dest: &Path) -> Result<bool> {
    if dest.exists() {
        info!("Reusing existing copy at {}", dest.display());
        return Ok(false);
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!("Downloading {} -> {}", url, dest.display());
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let bytes = response.bytes()?;
    std::fs::write(dest, &bytes)?;
    info!("Downloaded {} bytes", bytes.len());

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_file_is_not_refetched() {
        let dir = std::env::temp_dir().join("laadview-fetch-test");
        std::fs::create_dir_all(&dir).unwrap();
        let dest = dir.join("voertuigen.csv");
        std::fs::write(&dest, "merk;handelsbenaming\n").unwrap();

        // An unroutable URL: must not be touched because the file exists.
        let fetched = ensure_local_copy("http://192.0.2.1/voertuigen.csv", &dest).unwrap();
        assert!(!fetched);

        std::fs::remove_file(&dest).unwrap();
    }
}
