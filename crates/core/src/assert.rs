//! Guard helpers that turn a failed precondition into a typed error.
//!
//! The error is built lazily so callers can format messages without paying
//! for them on the happy path.

/// Return `Ok(())` when `condition` holds, otherwise the error built by `err`.
pub fn ensure<E>(condition: bool, err: impl FnOnce() -> E) -> Result<(), E> {
    if condition { Ok(()) } else { Err(err()) }
}

/// Unwrap `value`, or fail with the error built by `err`.
pub fn ensure_some<T, E>(value: Option<T>, err: impl FnOnce() -> E) -> Result<T, E> {
    value.ok_or_else(err)
}
