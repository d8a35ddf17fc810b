//! Async combinators used by the health pipeline.

use futures_util::future::join_all;
use std::future::Future;
use std::time::Duration;
use tracing::trace;

/// Runs `op` until it succeeds or `attempts` runs have failed.
///
/// The first attempt starts immediately; `interval` is slept between
/// attempts only. An `attempts` of zero still runs once. On exhaustion the
/// last error is returned.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn retry<F, Fut, T, E>(mut op: F, attempts: u32, interval: Duration) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(_) => {
                trace!(attempt, attempts, "retrying after failure");
                attempt += 1;
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}

/// Inverts the outcome of `op`.
///
/// Succeeds with `resolution` if `op` fails, fails with `rejection` if `op`
/// succeeds.
///
/// # Errors
///
/// Returns `rejection` when `op` succeeds.
pub async fn negate<Fut, T, E, R, V>(op: Fut, rejection: R, resolution: V) -> Result<V, R>
where
    Fut: Future<Output = Result<T, E>>,
{
    match op.await {
        Ok(_) => Err(rejection),
        Err(_) => Ok(resolution),
    }
}

/// Runs every operation concurrently and returns the first success in input
/// order.
///
/// All operations are driven to completion before the result is chosen.
///
/// # Errors
///
/// Returns every error, in input order, when no operation succeeds.
pub async fn any_ok<I, Fut, T, E>(ops: I) -> Result<T, Vec<E>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    let mut errors = Vec::new();
    let mut success = None;
    for outcome in join_all(ops).await {
        match outcome {
            Ok(value) if success.is_none() => success = Some(value),
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }
    success.ok_or(errors)
}
