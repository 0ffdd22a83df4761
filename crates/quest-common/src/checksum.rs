//! Checksum utilities for artifact deduplication
//!
//! The ingest task stores the MD5 of every uploaded blob as object metadata
//! (`local_md5`) and skips re-uploading a source file whose digest is
//! unchanged since the last run.

/// Object metadata key under which the content digest is stored.
pub const MD5_METADATA_KEY: &str = "local_md5";

/// Compute the hex-encoded MD5 digest of a byte slice
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(md5::compute(data).0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_hex() {
        assert_eq!(md5_hex(b"hello world"), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_md5_hex_empty_input() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }
}
