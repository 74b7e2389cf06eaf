use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

enum Command<T> {
    Call(T),
    Cancel,
}

/// Leading + trailing edge rate limiter.
///
/// A call made while the window is open fires immediately and starts a new
/// window. Calls made inside a running window overwrite a single pending
/// value, which fires once at the end of the window. At most one value fires
/// per window and the trailing one is always the latest.
///
/// The limiter runs on its own task; dropping the handle stops it and
/// discards any pending value.
pub struct Throttle<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
}

impl<T: Send + 'static> Throttle<T> {
    /// Spawn the limiter on the current tokio runtime.
    pub fn spawn<F>(window: Duration, mut fire: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command<T>>();

        tokio::spawn(async move {
            let mut last_fired: Option<Instant> = None;
            let mut pending: Option<T> = None;

            loop {
                let window_end = last_fired.map(|at| at + window);

                tokio::select! {
                    command = rx.recv() => match command {
                        None => break,
                        Some(Command::Call(value)) => {
                            let now = Instant::now();
                            let open = window_end.map_or(true, |end| now >= end);
                            if open && pending.is_none() {
                                fire(value);
                                last_fired = Some(now);
                            } else {
                                pending = Some(value);
                            }
                        }
                        Some(Command::Cancel) => pending = None,
                    },
                    _ = sleep_until(window_end.unwrap_or_else(Instant::now)), if pending.is_some() => {
                        if let Some(value) = pending.take() {
                            fire(value);
                            last_fired = Some(Instant::now());
                        }
                    }
                }
            }
        });

        Self { tx }
    }

    pub fn call(&self, value: T) {
        let _ = self.tx.send(Command::Call(value));
    }

    /// Drop the pending trailing value, if any. The window itself keeps running.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }
}
