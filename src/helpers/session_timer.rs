//! One-shot countdown timers used for the idle and the absolute session deadline.
//!
//! Every arming starts a small waiter thread that blocks on a channel with a timeout. Dropping
//! the sending half cancels the waiter. Cancelling joins the waiter thread, so once `arm` or
//! `cancel` returns the previous expiry callback has either run to completion or will never run.
//! Expiry callbacks must therefore not arm or cancel the timer that invoked them.

use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, trace, warn};

/// A re-armable one-shot timer
pub struct SessionTimer {
    /// Name used for logging and the waiter thread
    name: String,
    /// Countdown length, `None` when the timer is disabled
    duration: Option<Duration>,
    /// The currently armed waiter, if any
    armed: Mutex<Option<ArmedTimer>>,
}

struct ArmedTimer {
    cancel: Sender<()>,
    waiter: JoinHandle<()>,
}

impl ArmedTimer {
    fn cancel_and_join(self) {
        drop(self.cancel);

        if self.waiter.thread().id() == thread::current().id() {
            return;
        }
        if self.waiter.join().is_err() {
            warn!("Timer waiter thread panicked");
        }
    }
}

impl SessionTimer {
    /// Create a timer. A missing or zero duration disables it: arming is then a no-op.
    pub fn new(name: &str, duration: Option<Duration>) -> Self {
        Self {
            name: name.to_string(),
            duration: duration.filter(|d| !d.is_zero()),
            armed: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.duration.is_some()
    }

    /// Check whether a countdown is pending
    pub fn is_armed(&self) -> bool {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|armed| !armed.waiter.is_finished())
    }

    /// Start the countdown, cancelling any countdown still pending.
    ///
    /// `on_expiry` runs on the waiter thread when the countdown elapses without being
    /// cancelled.
    pub fn arm<F>(&self, on_expiry: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = armed.take() {
            previous.cancel_and_join();
        }

        let Some(duration) = self.duration else {
            return;
        };

        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let name = self.name.clone();
        let spawned = thread::Builder::new()
            .name(format!("{}-timer", self.name))
            .spawn(move || match cancel_rx.recv_timeout(duration) {
                Err(RecvTimeoutError::Timeout) => {
                    debug!("{} timer expired after {:?}", name, duration);
                    on_expiry();
                }
                _ => trace!("{} timer cancelled", name),
            });

        match spawned {
            Ok(waiter) => {
                *armed = Some(ArmedTimer {
                    cancel: cancel_tx,
                    waiter,
                });
            }
            Err(e) => warn!("Failed to start {} timer: {}", self.name, e),
        }
    }

    /// Stop a pending countdown
    pub fn cancel(&self) {
        let previous = self.armed.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(previous) = previous {
            previous.cancel_and_join();
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let make = move || {
            let c = c.clone();
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[test]
    fn test_timer_fires_once() {
        let (count, make) = counter();
        let timer = SessionTimer::new("test", Some(Duration::from_millis(50)));
        timer.arm(make());
        thread::sleep(Duration::from_millis(300));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_cancel_prevents_expiry() {
        let (count, make) = counter();
        let timer = SessionTimer::new("test", Some(Duration::from_millis(100)));
        timer.arm(make());
        timer.cancel();
        thread::sleep(Duration::from_millis(250));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rearm_restarts_countdown() {
        let (count, make) = counter();
        let timer = SessionTimer::new("test", Some(Duration::from_millis(200)));
        timer.arm(make());
        for _ in 0..4 {
            thread::sleep(Duration::from_millis(100));
            timer.arm(make());
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
        thread::sleep(Duration::from_millis(450));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_timer_never_arms() {
        let (count, make) = counter();
        let timer = SessionTimer::new("test", Some(Duration::ZERO));
        assert!(!timer.is_enabled());
        timer.arm(make());
        assert!(!timer.is_armed());

        let timer = SessionTimer::new("test", None);
        timer.arm(make());
        thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_waits_for_running_callback() {
        let done = Arc::new(AtomicUsize::new(0));
        let d = done.clone();
        let timer = SessionTimer::new("test", Some(Duration::from_millis(10)));
        timer.arm(move || {
            thread::sleep(Duration::from_millis(150));
            d.store(1, Ordering::SeqCst);
        });
        thread::sleep(Duration::from_millis(60));
        timer.cancel();
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
