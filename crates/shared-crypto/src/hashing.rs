//! # BLAKE3 Hashing
//!
//! 256-bit digests for header hashes and ordered roots.

use blake3::Hasher;

/// BLAKE3 hash output (256-bit).
pub type Hash = [u8; 32];

/// Stateful BLAKE3 hasher.
pub struct Blake3Hasher {
    inner: Hasher,
}

impl Blake3Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Hasher::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(&self) -> Hash {
        let hash = self.inner.finalize();
        *hash.as_bytes()
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Binary Merkle root over an ordered list of items.
///
/// Leaves are `blake3(index_le || item)` so that reordering items changes the
/// root. An odd node at any level is promoted unchanged. The root of an empty
/// list is `blake3("")`.
pub fn ordered_root<T: AsRef<[u8]>>(items: &[T]) -> Hash {
    if items.is_empty() {
        return blake3_hash(&[]);
    }

    let mut level: Vec<Hash> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut hasher = Blake3Hasher::new();
            hasher.update(&(index as u64).to_le_bytes());
            hasher.update(item.as_ref());
            hasher.finalize()
        })
        .collect();

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => {
                    let mut hasher = Blake3Hasher::new();
                    hasher.update(left).update(right);
                    hasher.finalize()
                }
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two elements"),
            })
            .collect();
    }

    level[0]
}
