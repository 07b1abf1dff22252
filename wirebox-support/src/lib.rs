//! # Wirebox Support
//!
//! Text helpers shared by the wirebox crates, mostly for error messages.

pub mod rendering;
