use sha2::{Digest, Sha256};

/// SHA-256 of arbitrary bytes → 32-byte array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 of arbitrary bytes, hex-encoded. The kernel never stores raw
/// hash bytes — all ids (`actionId`, `evidenceId`, `stateHash`, snapshot
/// `hash`) are hex strings so they serialize identically everywhere.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// `H(prev ‖ next)` — the chaining construction used by both the per-metric
/// state-hash chain (`stateHash = H(prevStateHash ‖ evidenceId)`) and the
/// evidence log (`evidenceId` hashes over the previous id).
pub fn chain_hash(prev: &str, next: &str) -> String {
    sha256_hex(format!("{prev}{next}").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256_hex(b"abc"), sha256_hex(b"abc"));
        assert_ne!(sha256_hex(b"abc"), sha256_hex(b"abd"));
    }

    #[test]
    fn known_vector() {
        // NIST known-answer test for SHA-256("abc").
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
