//! Content hashing.
//!
//! Every hash in the system is a SHA-1 digest rendered as 40 lowercase hex
//! characters: blob hashes cover raw file bytes, commit hashes cover the
//! canonical serialized form built in [`crate::commit`].

use sha1::{Digest, Sha1};

pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_hash() {
        assert_eq!(sha1_hex(b"hello"), sha1_hex(b"hello"));
    }

    #[test]
    fn different_bytes_different_hash() {
        assert_ne!(sha1_hex(b"hello"), sha1_hex(b"world"));
    }

    #[test]
    fn known_vector() {
        // echo -n "" | sha1sum
        assert_eq!(sha1_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }
}
