//! Filesystem utilities for atomicio.
//!
//! This module provides the write-replace protocol every non-append write
//! goes through.

pub mod atomic;

pub use atomic::{atomic_write, atomic_write_str, atomic_write_with};
