pub mod board;
pub mod calendar;
pub mod events;
pub mod overrides;
pub mod report;
pub mod shutdown;

/// Lock a mutex, recovering the data if another thread panicked while holding it.
pub(crate) fn lock<T>(m: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
