//! Best-effort side computations
//!
//! A derived value that is nice to have but must never block the write it
//! accompanies. Failure is logged and replaced by the type's default.

use std::fmt::Display;
use std::future::Future;

/// Await `computation`; on error log it and fall back to `T::default()`
pub async fn best_effort<T, E, F>(what: &'static str, computation: F) -> T
where
    T: Default,
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match computation.await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(computation = what, error = %e, "Best-effort computation failed, using default");
            T::default()
        }
    }
}
