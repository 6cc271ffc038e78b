//! Configuration model for atomicio.
//!
//! A YAML file supplies the default lock timeout and the tuning of the
//! inter-process sentinel lock. Unknown fields are ignored for forward
//! compatibility, missing fields take defaults, and values are validated on
//! load.

mod model;
mod operations;


// Re-export public API
pub use model::Config;
