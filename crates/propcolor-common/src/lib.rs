//! Common utilities for PropColor.
//!
//! This crate provides the foundational pieces shared by the PropColor crates:
//!
//! - [`BinaryReader`] - Bounds-checked little-endian reading from byte slices
//! - [`Error`] / [`Result`] - Errors raised by the reader

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;
