// ABOUTME: Restart handoff invoked after a successful setup commit.
// ABOUTME: The default exits the process so a supervisor restarts it with the new configuration.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Something that can hand the process over to a freshly configured instance.
pub trait RestartHandoff: Send + Sync {
    fn request_restart(&self);
}

/// Exit with status 0 and rely on the container or service manager to restart.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl RestartHandoff for ProcessExit {
    fn request_restart(&self) {
        tracing::info!("setup complete, exiting for restart");
        std::process::exit(0);
    }
}

/// Counts restart requests instead of acting on them. For embedding hosts
/// that restart on their own schedule, and for tests.
#[derive(Debug, Default)]
pub struct RecordingRestart {
    requests: AtomicUsize,
}

impl RecordingRestart {
    pub fn count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl RestartHandoff for RecordingRestart {
    fn request_restart(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fire the handoff after `delay`, giving the HTTP response time to flush.
/// Aborting the returned handle cancels the restart.
pub fn schedule_restart(handoff: Arc<dyn RestartHandoff>, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        handoff.request_restart();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scheduled_restart_fires_after_delay() {
        let recorder = Arc::new(RecordingRestart::default());

        let handle = schedule_restart(recorder.clone(), Duration::from_millis(5));
        handle.await.unwrap();

        assert_eq!(recorder.count(), 1);
    }

    #[tokio::test]
    async fn aborted_restart_never_fires() {
        let recorder = Arc::new(RecordingRestart::default());

        let handle = schedule_restart(recorder.clone(), Duration::from_secs(60));
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert_eq!(recorder.count(), 0);
    }
}
