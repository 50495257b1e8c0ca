//! Synthstack composes cloud infrastructure as a typed construct tree and
//! synthesizes it into a declarative provisioning document.
//!
//! Cross-resource references are deferred tokens rendered as `${...}`
//! expressions. BLAKE3-locked output for drift detection.

pub mod cli;
pub mod core;
pub mod resources;
pub mod tripwire;
pub mod units;
