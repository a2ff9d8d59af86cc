//! One-shot delayed tasks for call removal.

use log::warn;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Run `fire` once after `delay` on the current tokio runtime.
///
/// Returns `None` when called outside a runtime; the task is then never run.
pub(crate) fn schedule<F>(delay: Duration, fire: F) -> Option<AbortHandle>
where
    F: FnOnce() + Send + 'static,
{
    let handle = match Handle::try_current() {
        Ok(handle) => handle,
        Err(err) => {
            warn!("no tokio runtime for delayed task (delay_ms={}, err={})", delay.as_millis(), err);
            return None;
        }
    };
    let task = handle.spawn(async move {
        tokio::time::sleep(delay).await;
        fire();
    });
    Some(task.abort_handle())
}

#[cfg(test)]
mod tests {
    use super::schedule;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn outside_runtime_schedules_nothing() {
        assert!(schedule(Duration::from_secs(1), || {}).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        schedule(Duration::from_secs(30), move || flag.store(true, Ordering::SeqCst))
            .expect("runtime");

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(!fired.load(Ordering::SeqCst));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_task_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = schedule(Duration::from_secs(5), move || flag.store(true, Ordering::SeqCst))
            .expect("runtime");
        handle.abort();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
