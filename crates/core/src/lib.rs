//! Pink Noise core: colored-noise synthesis, shelf EQ and the stereo mixer
//!
//! Everything that touches audio samples lives here. Device I/O and OS
//! integration live in `pink-noise-infra`.

pub mod domain;

pub use domain::*;
