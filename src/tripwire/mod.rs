//! Tripwire: BLAKE3 fingerprints of synthesized documents and drift detection.

pub mod drift;
pub mod hasher;
