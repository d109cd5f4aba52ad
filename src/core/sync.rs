//! Synchronization utilities for robust lock handling
//!
//! Session state, the scan throttle and the offline cache storage all sit
//! behind std locks. A poisoned lock is turned into the owning module's error
//! type instead of a panic so one failed scan never takes the session down.

use std::sync::{LockResult, RwLockReadGuard, RwLockWriteGuard};

/// Convert a poisoned mutex lock into an application error
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use fieldscan::core::sync::handle_mutex_poison;
/// use fieldscan::session::SessionError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(mutex.lock(), |message| SessionError::StatePoisoned { message })
///     .unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). A panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Convert a poisoned RwLock read into an application error
pub fn handle_rwlock_read<T, E>(
    result: LockResult<RwLockReadGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock read poisoned). A panic occurred while holding a write lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Convert a poisoned RwLock write into an application error
pub fn handle_rwlock_write<T, E>(
    result: LockResult<RwLockWriteGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock write poisoned). A panic occurred while holding the lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex, RwLock};
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct TestError {
        message: String,
    }

    #[test]
    fn test_handle_mutex_poison_success() {
        let mutex = Mutex::new(42);
        let result = handle_mutex_poison(mutex.lock(), |message| TestError { message });

        assert_eq!(*result.unwrap(), 42);
    }

    #[test]
    fn test_handle_mutex_poison_with_poisoned_mutex() {
        let mutex = Arc::new(Mutex::new(42));
        let mutex_clone = Arc::clone(&mutex);

        let _ = thread::spawn(move || {
            let _guard = mutex_clone.lock().unwrap();
            panic!("Intentional panic to poison mutex");
        })
        .join();

        let error = handle_mutex_poison(mutex.lock(), |message| TestError { message }).unwrap_err();
        assert!(error.message.contains("mutex poisoned"));
    }

    #[test]
    fn test_handle_rwlock_read_and_write() {
        let rwlock = RwLock::new(42);

        *handle_rwlock_write(rwlock.write(), |message| TestError { message }).unwrap() = 100;
        let value = *handle_rwlock_read(rwlock.read(), |message| TestError { message }).unwrap();

        assert_eq!(value, 100);
    }

    #[test]
    fn test_handle_rwlock_read_poisoned() {
        let rwlock = Arc::new(RwLock::new(1));
        let clone = Arc::clone(&rwlock);

        let _ = thread::spawn(move || {
            let _guard = clone.write().unwrap();
            panic!("Intentional panic to poison rwlock");
        })
        .join();

        let error = handle_rwlock_read(rwlock.read(), |message| TestError { message }).unwrap_err();
        assert!(error.message.contains("RwLock read poisoned"));
    }
}
