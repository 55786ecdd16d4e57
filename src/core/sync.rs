//! Lock poisoning mapped onto module error types

use std::sync::LockResult;

/// Turn a poisoned lock into an error instead of a panic
///
/// Converts a poisoned lock (or a poisoned condition-variable wait, which
/// reports through the same `LockResult`) into an application error built by
/// `error_constructor`. A poisoned lock means a thread panicked while holding
/// it, so the protected state can no longer be trusted.
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use ipc_dispatch::core::sync::handle_mutex_poison;
/// use ipc_dispatch::queue::QueueError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |message| QueueError::OperationFailed { message }
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Lock poisoned: a thread panicked while holding it ({:?})",
            poison_err
        ))
    })
}
