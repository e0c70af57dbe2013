//! Workspace placeholder crate.
//!
//! Hosts can depend on `decode-workspace` and pick the member crates they
//! need through feature flags: `decode` pulls in `core-decode`, `runtime`
//! pulls in `core-runtime` for subscriber setup.

#[cfg(feature = "decode")]
pub use core_decode as decode;

#[cfg(feature = "runtime")]
pub use core_runtime as runtime;
