//! SS-015: Drift detection. Compares a fresh synthesis against the lock, and
//! the written document against its recorded hash.

use crate::core::types::{Document, SynthLock};
use crate::tripwire::hasher;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Kind of difference found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftKind {
    /// Resource present in the new synthesis but not in the lock
    Added,
    /// Resource in the lock but no longer synthesized
    Removed,
    /// Record content differs
    Changed,
    /// Written document does not match the lock's document hash
    Tampered,
}

impl fmt::Display for DriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "ADDED"),
            Self::Removed => write!(f, "REMOVED"),
            Self::Changed => write!(f, "CHANGED"),
            Self::Tampered => write!(f, "TAMPERED"),
        }
    }
}

/// A single drift finding.
#[derive(Debug, Clone)]
pub struct DriftFinding {
    pub path: String,
    pub kind: DriftKind,
    pub expected_hash: String,
    pub actual_hash: String,
    pub detail: String,
}

/// Compare `document` (freshly synthesized) with `lock`.
pub fn detect_drift(lock: &SynthLock, document: &Document) -> Result<Vec<DriftFinding>, String> {
    let mut findings = Vec::new();
    let mut seen = HashSet::new();

    for record in &document.resources {
        seen.insert(record.path.as_str());
        let actual = hasher::hash_record(record)?;
        match lock.resources.get(&record.path) {
            None => findings.push(DriftFinding {
                path: record.path.clone(),
                kind: DriftKind::Added,
                expected_hash: "NONE".to_string(),
                actual_hash: actual,
                detail: format!("{} ({}) not in lock", record.path, record.resource_type),
            }),
            Some(fp) if fp.hash != actual => findings.push(DriftFinding {
                path: record.path.clone(),
                kind: DriftKind::Changed,
                expected_hash: fp.hash.clone(),
                actual_hash: actual,
                detail: format!("{} ({}) record changed", record.path, record.resource_type),
            }),
            Some(_) => {}
        }
    }

    for (path, fp) in &lock.resources {
        if !seen.contains(path.as_str()) {
            findings.push(DriftFinding {
                path: path.clone(),
                kind: DriftKind::Removed,
                expected_hash: fp.hash.clone(),
                actual_hash: "MISSING".to_string(),
                detail: format!("{} ({}) no longer declared", path, fp.resource_type),
            });
        }
    }

    Ok(findings)
}

/// Check the written document in `out_dir` against the lock's document hash.
pub fn check_document_file(out_dir: &Path, lock: &SynthLock) -> Option<DriftFinding> {
    let doc_path = out_dir.join(&lock.document);
    if !doc_path.exists() {
        return Some(DriftFinding {
            path: lock.document.clone(),
            kind: DriftKind::Tampered,
            expected_hash: lock.document_hash.clone(),
            actual_hash: "MISSING".to_string(),
            detail: format!("{} does not exist", doc_path.display()),
        });
    }

    let actual = hasher::hash_file(&doc_path).unwrap_or_else(|e| format!("ERROR:{}", e));
    if actual != lock.document_hash {
        Some(DriftFinding {
            path: lock.document.clone(),
            kind: DriftKind::Tampered,
            expected_hash: lock.document_hash.clone(),
            actual_hash: actual,
            detail: format!("{} content changed since synthesis", doc_path.display()),
        })
    } else {
        None
    }
}
