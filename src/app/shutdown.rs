use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// How a shutdown flush ended
#[derive(Debug)]
pub enum ShutdownOutcome<E> {
    Flushed,
    Failed(E),
    /// The flush was still running when the timeout elapsed (it is left to
    /// finish on its own thread), or its thread could not be started.
    TimedOut,
}

impl<E> ShutdownOutcome<E> {
    pub fn is_flushed(&self) -> bool {
        matches!(self, ShutdownOutcome::Flushed)
    }
}

/// Run `flush` on a worker thread and wait at most `timeout` for it.
pub fn flush_with_timeout<F, E>(flush: F, timeout: Duration) -> ShutdownOutcome<E>
where
    F: FnOnce() -> Result<(), E> + Send + 'static,
    E: Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("shutdown-flush".into())
        .spawn(move || {
            let _ = tx.send(flush());
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "could not start shutdown flush");
        return ShutdownOutcome::TimedOut;
    }

    match rx.recv_timeout(timeout) {
        Ok(Ok(())) => ShutdownOutcome::Flushed,
        Ok(Err(e)) => ShutdownOutcome::Failed(e),
        Err(_) => {
            tracing::warn!(?timeout, "shutdown flush did not finish in time");
            ShutdownOutcome::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_success() {
        let outcome = flush_with_timeout(|| Ok::<(), String>(()), Duration::from_secs(1));
        assert!(outcome.is_flushed());
    }

    #[test]
    fn reports_failure() {
        let outcome = flush_with_timeout(|| Err("disk full".to_string()), Duration::from_secs(1));
        assert!(matches!(outcome, ShutdownOutcome::Failed(e) if e == "disk full"));
    }

    #[test]
    fn gives_up_after_timeout() {
        let outcome = flush_with_timeout(
            || {
                thread::sleep(Duration::from_millis(500));
                Ok::<(), String>(())
            },
            Duration::from_millis(20),
        );
        assert!(matches!(outcome, ShutdownOutcome::TimedOut));
    }
}
