use std::{fmt::Display, future::Future};

/// perform_with_compensation
///
/// Awaits `action`. On success `compensate` is dropped unpolled and the value is returned.
/// On failure `compensate` runs once to undo an earlier side effect (for example deleting
/// an asset that was uploaded before the failing write). A failing compensation is logged
/// and otherwise ignored: the caller always gets the action's original error.
pub async fn perform_with_compensation<T, E, A, C, CE>(action: A, compensate: C) -> Result<T, E>
where
    A: Future<Output = Result<T, E>>,
    C: Future<Output = Result<(), CE>>,
    E: Display,
    CE: Display,
{
    match action.await {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!(error = %err, "action failed, running compensation");
            if let Err(compensation_err) = compensate.await {
                tracing::error!(
                    error = %compensation_err,
                    original = %err,
                    "compensation failed"
                );
            }
            Err(err)
        }
    }
}
