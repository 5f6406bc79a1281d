//! Derivation of independent random streams from a single master seed.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Master seed from which every random stream of a run is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeedContext {
    master_seed: u64,
}

impl SeedContext {
    /// Creates a context around a known master seed.
    #[must_use]
    pub const fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Creates a context around a freshly drawn master seed.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Master seed the streams derive from.
    #[must_use]
    pub const fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Random stream dedicated to `label`.
    ///
    /// Streams with different labels are independent, so adding a consumer
    /// never shifts the draws another consumer sees.
    #[must_use]
    pub fn stream(&self, label: &str) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(derive_labeled_seed(self.master_seed, label))
    }
}

/// Hashes `base` together with `label` into a stream seed.
#[must_use]
pub fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
