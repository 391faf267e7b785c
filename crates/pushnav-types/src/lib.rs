//! Foundation types shared by the pushnav crates.
//!
//! Currently this is the error taxonomy every engine entry point reports
//! through.

pub mod error;
