//! SS-007: Output directory management (document and lock files).

use super::types::{Document, DocumentFormat, ResourceFingerprint, SynthLock};
use crate::tripwire::hasher;
use std::path::{Path, PathBuf};

/// Derive the lock file path within the output directory.
pub fn lock_file_path(out_dir: &Path) -> PathBuf {
    out_dir.join("synth.lock.yaml")
}

/// File name of the document for `name` in `format`.
pub fn document_file_name(name: &str, format: DocumentFormat) -> String {
    format!("{}.{}", name, format.extension())
}

/// Load the lock file. Returns None if the file doesn't exist.
pub fn load_lock(out_dir: &Path) -> Result<Option<SynthLock>, String> {
    let path = lock_file_path(out_dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let lock: SynthLock = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("invalid lock file {}: {}", path.display(), e))?;
    Ok(Some(lock))
}

/// Save the lock file atomically.
pub fn save_lock(out_dir: &Path, lock: &SynthLock) -> Result<(), String> {
    let yaml = serde_yaml_ng::to_string(lock).map_err(|e| format!("serialize error: {}", e))?;
    write_atomic(&lock_file_path(out_dir), &yaml)
}

/// Write `content` to `path` via temp file + rename, so readers never see a
/// partial file.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), String> {
    let tmp_path = stage(path, content)?;
    commit(&tmp_path, path)
}

/// Write `content` next to `path` under a `.tmp` suffix.
fn stage(path: &Path, content: &str) -> Result<PathBuf, String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, content)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    Ok(tmp_path)
}

fn commit(tmp_path: &Path, path: &Path) -> Result<(), String> {
    std::fs::rename(tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(tmp_path);
        format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })
}

/// Build the lock describing `document` as rendered to `rendered`.
pub fn build_lock(
    document: &Document,
    rendered: &str,
    format: DocumentFormat,
) -> Result<SynthLock, String> {
    let mut resources = indexmap::IndexMap::new();
    for record in &document.resources {
        resources.insert(
            record.path.clone(),
            ResourceFingerprint {
                resource_type: record.resource_type.clone(),
                hash: hasher::hash_record(record)?,
                depends_on: record.depends_on.clone(),
            },
        );
    }
    Ok(SynthLock {
        schema: "1.0".to_string(),
        name: document.name.clone(),
        generator: format!("synthstack {}", env!("CARGO_PKG_VERSION")),
        document: document_file_name(&document.name, format),
        document_hash: hasher::hash_string(rendered),
        resources,
    })
}

/// Write the rendered document and its lock into `out_dir`. Returns the
/// document path.
pub fn write_output(
    out_dir: &Path,
    document: &Document,
    rendered: &str,
    format: DocumentFormat,
) -> Result<PathBuf, String> {
    let lock = build_lock(document, rendered, format)?;
    let lock_yaml =
        serde_yaml_ng::to_string(&lock).map_err(|e| format!("serialize error: {}", e))?;
    let doc_path = out_dir.join(&lock.document);
    let lock_path = lock_file_path(out_dir);

    // Stage both before committing either, so the pair stays consistent.
    let doc_tmp = stage(&doc_path, rendered)?;
    let lock_tmp = match stage(&lock_path, &lock_yaml) {
        Ok(tmp) => tmp,
        Err(e) => {
            let _ = std::fs::remove_file(&doc_tmp);
            return Err(e);
        }
    };

    let previous = std::fs::read(&doc_path).ok();
    if let Err(e) = commit(&doc_tmp, &doc_path) {
        let _ = std::fs::remove_file(&lock_tmp);
        return Err(e);
    }
    if let Err(e) = commit(&lock_tmp, &lock_path) {
        // Put the old document back (or drop the new one) to match the old lock.
        let _ = match previous {
            Some(bytes) => std::fs::write(&doc_path, bytes),
            None => std::fs::remove_file(&doc_path),
        };
        return Err(e);
    }
    Ok(doc_path)
}
