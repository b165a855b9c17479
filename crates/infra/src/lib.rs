//! Platform adapters for the pink noise player
//!
//! Sound output through cpal, seeds from the operating system, and a
//! state publisher that reports through `tracing`.

pub mod audio;
pub mod entropy;
pub mod publish;

pub use audio::{BlockReader, NoisePlayer};
pub use entropy::OsEntropy;
pub use publish::TracingPublisher;
