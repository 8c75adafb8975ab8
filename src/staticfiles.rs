use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

pub const MANIFEST_NAME: &str = "staticfiles.json";

#[derive(RustEmbed)]
#[folder = "assets/static/"]
struct StaticAssets;

/// Written next to the collected files: relative path to sha256 of its contents.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub version: u32,
    pub paths: BTreeMap<String, String>,
}

/// Names of the bundled static assets, sorted.
pub fn bundled_files() -> Vec<String> {
    let mut names: Vec<String> = StaticAssets::iter().map(|name| name.into_owned()).collect();
    names.sort();
    names
}

/// Copy the bundled assets into `root` and write the manifest.
/// With `clear`, everything already under `root` is removed first.
/// Returns the relative paths written, excluding the manifest.
pub fn collect_static(root: &Path, clear: bool) -> io::Result<Vec<String>> {
    if clear && root.exists() {
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
    }
    fs::create_dir_all(root)?;

    let mut manifest = Manifest {
        version: 1,
        paths: BTreeMap::new(),
    };
    for name in bundled_files() {
        let Some(file) = StaticAssets::get(&name) else {
            continue;
        };
        let target = root.join(&name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, file.data.as_ref())?;
        manifest
            .paths
            .insert(name, hex::encode(Sha256::digest(file.data.as_ref())));
    }

    let json = serde_json::to_vec_pretty(&manifest)?;
    fs::write(root.join(MANIFEST_NAME), json)?;
    Ok(manifest.paths.into_keys().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundles_the_landing_assets() {
        let files = bundled_files();
        assert!(files.contains(&"robots.txt".to_string()));
        assert!(files.contains(&"index.html".to_string()));
        assert!(files.iter().any(|f| f.starts_with("css/")));
    }
}
