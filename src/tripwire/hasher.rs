//! SS-014: BLAKE3 hashing for documents, records, and written files.

use crate::core::types::ResourceRecord;
use std::io::Read;
use std::path::Path;

const STREAM_BUF_SIZE: usize = 65536;

/// Hash a file's contents. Returns `"blake3:{hex}"`.
pub fn hash_file(path: &Path) -> Result<String, String> {
    let mut file =
        std::fs::File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; STREAM_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| format!("read error {}: {}", path.display(), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("blake3:{}", hasher.finalize().to_hex()))
}

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Hash a record's canonical (compact, key-sorted) JSON encoding.
pub fn hash_record(record: &ResourceRecord) -> Result<String, String> {
    let json = serde_json::to_string(record)
        .map_err(|e| format!("cannot encode {}: {}", record.path, e))?;
    Ok(hash_string(&json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Mode;
    use std::collections::BTreeMap;

    fn record(cidr: &str) -> ResourceRecord {
        ResourceRecord {
            path: "vpc".to_string(),
            resource_type: "vpc".to_string(),
            mode: Mode::Managed,
            attributes: BTreeMap::from([("cidr".to_string(), serde_json::json!(cidr))]),
            depends_on: vec![],
        }
    }

    #[test]
    fn test_ss014_hash_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.json");
        std::fs::write(&path, "{}\n").unwrap();
        let h = hash_file(&path).unwrap();
        assert!(h.starts_with("blake3:"));
        assert_eq!(h.len(), 7 + 64); // "blake3:" + 64 hex chars
        assert_eq!(h, hash_string("{}\n"));
    }

    #[test]
    fn test_ss014_hash_string() {
        assert_eq!(hash_string("hello"), hash_string("hello"));
        assert_ne!(hash_string("hello"), hash_string("world"));
    }

    #[test]
    fn test_ss014_hash_record_sensitive_to_attributes() {
        let a = hash_record(&record("10.0.0.0/16")).unwrap();
        let b = hash_record(&record("10.0.0.0/16")).unwrap();
        let c = hash_record(&record("10.1.0.0/16")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ss014_hash_file_not_found() {
        assert!(hash_file(Path::new("/nonexistent/doc.json")).is_err());
    }
}
