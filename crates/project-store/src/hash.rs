use blake3::Hasher;

/// Content fingerprint used to detect changed files.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}
