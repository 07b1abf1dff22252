//! Derive and attribute macros for wirebox.
//!
//! Use them through the `wirebox` crate; the generated code names it.

pub use wirebox_macros::{Autowire, forward};
