use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{CodeGenerator, GeneratorError, base62};

/// Allocates codes from a truncated SHA-256 digest of the long URL.
///
/// The first attempt hashes the URL itself, so shortening the same URL twice
/// proposes the same code. Retries append `#<attempt>` to the input, which
/// moves a colliding request onto a different code.
///
/// Salting retries is a provisional policy, not settled behaviour: a URL whose
/// first code is already taken (including by an earlier shorten of the same
/// URL) is given a new code instead of the existing one. Changing this is a
/// product decision.
pub struct HashGenerator {
    n_bytes: usize,
}

impl HashGenerator {
    /// Creates a generator that keeps the first `n_bytes` (1..=8) of the digest.
    pub fn new(n_bytes: usize) -> Result<Self, GeneratorError> {
        if !(1..=8).contains(&n_bytes) {
            return Err(GeneratorError::InvalidConfig(format!(
                "hash bytes must be between 1 and 8, got {n_bytes}"
            )));
        }
        Ok(Self { n_bytes })
    }

    /// Computes the code for `input` without any salting.
    pub fn code_for(&self, input: &str) -> String {
        let digest = Sha256::digest(input.as_bytes());

        // big-endian, right-justified in a 64-bit word
        let mut buf = [0u8; 8];
        buf[8 - self.n_bytes..].copy_from_slice(&digest[..self.n_bytes]);

        base62::encode(u64::from_be_bytes(buf))
    }
}

#[async_trait]
impl CodeGenerator for HashGenerator {
    async fn generate(&self, long_url: &str, attempt: u32) -> Result<String, GeneratorError> {
        if attempt == 0 {
            Ok(self.code_for(long_url))
        } else {
            Ok(self.code_for(&format!("{long_url}#{attempt}")))
        }
    }
}
