//! Process-shared mutex stored inside a mapped region.
//!
//! [`ShmMutex`] wraps a `pthread_mutex_t` initialized with
//! `PTHREAD_PROCESS_SHARED`, so every process mapping the region locks the same
//! physical instance. On Linux the mutex is also robust: if its owner dies the
//! next locker gets the lock back together with a `recovered` flag instead of
//! hanging. Acquisition can be bounded by a timeout.

use std::cell::UnsafeCell;
use std::io;
use std::time::Duration;
#[cfg(not(target_os = "linux"))]
use std::time::Instant;

#[cfg(not(target_os = "linux"))]
const TRYLOCK_BACKOFF: Duration = Duration::from_micros(50);

/// Why a lock attempt failed
#[derive(Debug)]
pub enum LockError {
    /// The deadline passed while another holder kept the lock
    Timeout,
    /// The owner died and a previous recovery was not completed
    Unrecoverable,
    Os(io::Error),
}

/// A mutex whose whole state lives in the memory it is placed in.
///
/// The type is only ever accessed through a pointer into shared memory; it is
/// never constructed by value.
#[repr(C)]
pub struct ShmMutex {
    raw: UnsafeCell<libc::pthread_mutex_t>,
}

unsafe impl Send for ShmMutex {}
unsafe impl Sync for ShmMutex {}

impl ShmMutex {
    /// Construct the mutex in place.
    ///
    /// # Safety
    ///
    /// `self` must point into zeroed, writable memory that no other thread or
    /// process uses as a mutex yet, and this must run exactly once per region.
    pub unsafe fn init_in_place(&self) -> io::Result<()> {
        let mut attr: libc::pthread_mutexattr_t = std::mem::zeroed();
        check(libc::pthread_mutexattr_init(&mut attr))?;

        let configured = check(libc::pthread_mutexattr_setpshared(
            &mut attr,
            libc::PTHREAD_PROCESS_SHARED,
        ))
        .and_then(|_| set_robust(&mut attr))
        .and_then(|_| check(libc::pthread_mutex_init(self.raw.get(), &attr)));

        libc::pthread_mutexattr_destroy(&mut attr);
        configured
    }

    /// Acquire the mutex, waiting at most `timeout` (forever when `None`).
    pub fn lock(&self, timeout: Option<Duration>) -> Result<ShmMutexGuard<'_>, LockError> {
        let rc = match timeout {
            None => unsafe { libc::pthread_mutex_lock(self.raw.get()) },
            Some(timeout) => self.timed_lock(timeout),
        };
        self.finish_acquire(rc)
    }

    fn finish_acquire(&self, rc: libc::c_int) -> Result<ShmMutexGuard<'_>, LockError> {
        match rc {
            0 => Ok(ShmMutexGuard {
                mutex: self,
                recovered: false,
            }),
            libc::ETIMEDOUT => Err(LockError::Timeout),
            #[cfg(target_os = "linux")]
            libc::EOWNERDEAD => {
                // We own the lock now; mark it usable again before releasing
                let rc = unsafe { libc::pthread_mutex_consistent(self.raw.get()) };
                if rc != 0 {
                    unsafe { libc::pthread_mutex_unlock(self.raw.get()) };
                    return Err(LockError::Os(io::Error::from_raw_os_error(rc)));
                }
                Ok(ShmMutexGuard {
                    mutex: self,
                    recovered: true,
                })
            }
            #[cfg(target_os = "linux")]
            libc::ENOTRECOVERABLE => Err(LockError::Unrecoverable),
            rc => Err(LockError::Os(io::Error::from_raw_os_error(rc))),
        }
    }

    #[cfg(target_os = "linux")]
    fn timed_lock(&self, timeout: Duration) -> libc::c_int {
        // pthread_mutex_timedlock takes an absolute CLOCK_REALTIME deadline
        let mut now: libc::timespec = unsafe { std::mem::zeroed() };
        unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) };

        let total_nanos = now.tv_nsec as u64 + u64::from(timeout.subsec_nanos());
        let deadline = libc::timespec {
            tv_sec: now
                .tv_sec
                .saturating_add(timeout.as_secs() as libc::time_t)
                .saturating_add((total_nanos / 1_000_000_000) as libc::time_t),
            tv_nsec: (total_nanos % 1_000_000_000) as _,
        };
        unsafe { libc::pthread_mutex_timedlock(self.raw.get(), &deadline) }
    }

    #[cfg(not(target_os = "linux"))]
    fn timed_lock(&self, timeout: Duration) -> libc::c_int {
        let deadline = Instant::now() + timeout;
        loop {
            let rc = unsafe { libc::pthread_mutex_trylock(self.raw.get()) };
            if rc != libc::EBUSY {
                return rc;
            }
            if Instant::now() >= deadline {
                return libc::ETIMEDOUT;
            }
            std::thread::sleep(TRYLOCK_BACKOFF);
        }
    }

    /// Acquire the mutex only if nobody holds it; `None` when it is busy.
    ///
    /// A lock abandoned by a dead owner is acquired and reported through
    /// [`ShmMutexGuard::recovered`], same as [`ShmMutex::lock`].
    pub fn try_lock(&self) -> Result<Option<ShmMutexGuard<'_>>, LockError> {
        let rc = unsafe { libc::pthread_mutex_trylock(self.raw.get()) };
        if rc == libc::EBUSY {
            return Ok(None);
        }
        self.finish_acquire(rc).map(Some)
    }
}

/// Holds a [`ShmMutex`] until dropped
pub struct ShmMutexGuard<'a> {
    mutex: &'a ShmMutex,
    recovered: bool,
}

impl ShmMutexGuard<'_> {
    /// True if the previous owner died while holding the lock. The protected
    /// data may be half-updated and should be validated by the caller.
    pub fn recovered(&self) -> bool {
        self.recovered
    }
}

impl Drop for ShmMutexGuard<'_> {
    fn drop(&mut self) {
        unsafe { libc::pthread_mutex_unlock(self.mutex.raw.get()) };
    }
}

#[cfg(target_os = "linux")]
unsafe fn set_robust(attr: &mut libc::pthread_mutexattr_t) -> io::Result<()> {
    check(libc::pthread_mutexattr_setrobust(attr, libc::PTHREAD_MUTEX_ROBUST))
}

#[cfg(not(target_os = "linux"))]
unsafe fn set_robust(_attr: &mut libc::pthread_mutexattr_t) -> io::Result<()> {
    Ok(())
}

fn check(rc: libc::c_int) -> io::Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Heap-backed zeroed storage standing in for a mapped region
    struct Storage(Box<[u64]>);

    impl Storage {
        fn new() -> Self {
            let words = std::mem::size_of::<ShmMutex>() / 8 + 1;
            Storage(vec![0u64; words].into_boxed_slice())
        }

        fn mutex(&self) -> &ShmMutex {
            unsafe { &*(self.0.as_ptr() as *const ShmMutex) }
        }
    }

    #[test]
    fn test_lock_and_timeout() {
        let storage = Storage::new();
        let mutex = storage.mutex();
        unsafe { mutex.init_in_place().unwrap() };

        let guard = mutex.lock(Some(Duration::from_millis(10))).unwrap();
        assert!(!guard.recovered());

        // A second holder gives up once the bound expires
        std::thread::scope(|s| {
            s.spawn(|| {
                let second = mutex.lock(Some(Duration::from_millis(20)));
                assert!(matches!(second, Err(LockError::Timeout)));
            });
        });
        drop(guard);

        assert!(mutex.lock(Some(Duration::from_millis(10))).is_ok());
    }

    #[test]
    fn test_mutual_exclusion_across_threads() {
        let storage = Arc::new(Storage::new());
        unsafe { storage.mutex().init_in_place().unwrap() };
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let storage = storage.clone();
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let _guard = storage.mutex().lock(None).unwrap();
                        // Non-atomic read-modify-write protected by the mutex
                        let v = counter.load(Ordering::Relaxed);
                        counter.store(v + 1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::Relaxed), 4000);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_recovers_from_dead_owner() {
        let storage = Arc::new(Storage::new());
        unsafe { storage.mutex().init_in_place().unwrap() };

        // A thread exiting while holding a robust mutex behaves like a dead owner
        let holder = storage.clone();
        std::thread::spawn(move || {
            let guard = holder.mutex().lock(None).unwrap();
            std::mem::forget(guard);
        })
        .join()
        .unwrap();

        let guard = storage.mutex().lock(Some(Duration::from_millis(100))).unwrap();
        assert!(guard.recovered());
        drop(guard);

        let guard = storage.mutex().lock(Some(Duration::from_millis(100))).unwrap();
        assert!(!guard.recovered());
    }

    #[test]
    fn test_try_lock_never_waits() {
        let storage = Storage::new();
        let mutex = storage.mutex();
        unsafe { mutex.init_in_place().unwrap() };

        let held = mutex.try_lock().unwrap().unwrap();
        std::thread::scope(|s| {
            s.spawn(|| assert!(mutex.try_lock().unwrap().is_none()));
        });
        drop(held);
        assert!(mutex.try_lock().unwrap().is_some());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_try_lock_reports_dead_owner() {
        let storage = Arc::new(Storage::new());
        unsafe { storage.mutex().init_in_place().unwrap() };

        let holder = storage.clone();
        std::thread::spawn(move || {
            std::mem::forget(holder.mutex().lock(None).unwrap());
        })
        .join()
        .unwrap();

        let guard = storage.mutex().try_lock().unwrap().unwrap();
        assert!(guard.recovered());
        drop(guard);
        assert!(!storage.mutex().try_lock().unwrap().unwrap().recovered());
    }
}
