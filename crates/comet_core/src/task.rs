use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Handle to a spawned background loop with cooperative shutdown: `stop`
/// raises the signal and waits for the task to observe it at its next
/// sleep boundary.
pub struct TaskHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(shutdown: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self { shutdown, task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "background task join failed");
        }
    }
}
