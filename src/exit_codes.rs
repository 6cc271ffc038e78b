//! Exit code constants for the atomicio CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, file not found, invalid config or timeout)
//! - 2: Operation failure (read/write error, lock timeout)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, missing input file, or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// Operation failure: I/O, decode/encode, or lock acquisition failure.
pub const OPERATION_FAILURE: i32 = 2;
