//! Operating system entropy for reseeding the noise generator

use pink_noise_core::domain::audio::{AudioError, EntropySource, Result};
use rand::rngs::OsRng;
use rand::TryRngCore;
use tracing::trace;

/// Seeds drawn from the kernel's random source
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl OsEntropy {
    pub fn new() -> Self {
        Self
    }
}

impl EntropySource for OsEntropy {
    fn next_seed(&mut self) -> Result<u64> {
        let seed = OsRng
            .try_next_u64()
            .map_err(|e| AudioError::OsError(format!("entropy unavailable: {}", e)))?;
        trace!("Drew seed from OS entropy");
        Ok(seed)
    }
}
