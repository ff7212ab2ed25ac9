//! Static asset copying.
//!
//! Theme assets land under `content/themes/<theme>/assets/**` and uploads
//! under `content/uploads/**`, mirroring the paths templates reference at
//! request time. Upload metadata sidecars are not published.

use crate::log;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{fs, path::Path};
use walkdir::WalkDir;

/// Copy a directory tree, skipping `.metadata.json` sidecars.
///
/// Returns the number of files copied. Individual copy failures are logged
/// and do not abort the rest of the tree.
pub fn copy_tree(source: &Path, dest: &Path) -> Result<usize> {
    if !source.is_dir() {
        return Ok(0);
    }

    let files: Vec<_> = WalkDir::new(source)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| !is_metadata_sidecar(entry.path()))
        .collect();

    let copied = files
        .par_iter()
        .map(|entry| copy_one(entry.path(), source, dest))
        .filter(|result| match result {
            Ok(()) => true,
            Err(e) => {
                log!("error"; "asset copy: {e:#}");
                false
            }
        })
        .count();
    Ok(copied)
}

fn copy_one(path: &Path, source: &Path, dest: &Path) -> Result<()> {
    let relative = path
        .strip_prefix(source)
        .with_context(|| format!("not under {}: {}", source.display(), path.display()))?;
    let target = dest.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::copy(path, &target).with_context(|| format!("copying {}", path.display()))?;
    Ok(())
}

fn is_metadata_sidecar(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".metadata.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_copy_tree_skips_metadata_sidecars() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("uploads");
        fs::create_dir_all(source.join("images")).unwrap();
        fs::write(source.join("images/photo.png"), b"png").unwrap();
        fs::write(source.join("images/photo.png.metadata.json"), b"{}").unwrap();
        fs::write(source.join("doc.pdf"), b"pdf").unwrap();

        let dest = dir.path().join("out/content/uploads");
        let copied = copy_tree(&source, &dest).unwrap();
        assert_eq!(copied, 2);
        assert!(dest.join("images/photo.png").is_file());
        assert!(dest.join("doc.pdf").is_file());
        assert!(!dest.join("images/photo.png.metadata.json").exists());
    }

    #[test]
    fn test_missing_source_is_noop() {
        let dir = tempdir().unwrap();
        let copied = copy_tree(&dir.path().join("nope"), &dir.path().join("out")).unwrap();
        assert_eq!(copied, 0);
    }
}
