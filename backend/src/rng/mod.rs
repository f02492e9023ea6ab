//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in the simulator MUST go through this module, and
//! every engine owns its own generator. There is no process-wide seed.

mod xorshift;

pub use xorshift::RngManager;
