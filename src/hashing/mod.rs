//! BLAKE3 helpers: content fingerprints and token bucketing.

/// Full 32-byte BLAKE3 fingerprint of a text.
///
/// Used to detect that a community description changed since its embedding
/// was cached.
#[inline]
pub fn fingerprint(text: &str) -> [u8; 32] {
    *blake3::hash(text.as_bytes()).as_bytes()
}

/// First 8 bytes of the BLAKE3 hash, little-endian.
///
/// Collisions only merge two feature buckets of the stub embedder; nothing
/// security-relevant depends on this value.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Maps a token to a `(bucket, sign)` pair for feature hashing.
///
/// The sign comes from a bit the bucket index doesn't use, so two colliding
/// tokens cancel out about half of the time instead of always adding up.
#[inline]
pub fn token_bucket(token: &str, dim: usize) -> (usize, f32) {
    let h = hash_to_u64(token.as_bytes());
    let bucket = (h % dim.max(1) as u64) as usize;
    let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
    (bucket, sign)
}
