use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use crate::AssetError;

/// Outcome of polling a [`LoadTask`].
#[derive(Debug)]
pub enum TaskStatus<T> {
    Pending,
    Ready(Result<T, AssetError>),
    Cancelled,
}

/// A load running on a worker thread, joined by polling from the frame loop.
///
/// Cancelling (or dropping) the task discards whatever the worker produces.
/// The worker itself is not interrupted; decoding finishes in the background.
pub struct LoadTask<T> {
    label: String,
    receiver: Option<Receiver<Result<T, AssetError>>>,
    cancelled: Arc<AtomicBool>,
}

impl<T: Send + 'static> LoadTask<T> {
    pub fn spawn<F>(label: impl Into<String>, load: F) -> Self
    where
        F: FnOnce() -> Result<T, AssetError> + Send + 'static,
    {
        let label = label.into();
        let (tx, rx) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker_tx = tx.clone();
        let worker_flag = Arc::clone(&cancelled);
        let worker_label = label.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("load-{label}"))
            .spawn(move || {
                let _span = tracing::debug_span!("asset_load", label = %worker_label).entered();
                let result = load();
                if worker_flag.load(Ordering::Acquire) {
                    tracing::debug!("load finished after cancel, result dropped");
                    return;
                }
                let _ = worker_tx.send(result);
            });

        if let Err(e) = spawned {
            tracing::error!(%label, "failed to spawn load thread: {e}");
            let _ = tx.send(Err(AssetError::Io(e)));
        }

        Self {
            label,
            receiver: Some(rx),
            cancelled,
        }
    }

    /// Non-blocking check. `Ready` is returned at most once.
    pub fn poll(&mut self) -> TaskStatus<T> {
        if self.is_cancelled() {
            return TaskStatus::Cancelled;
        }
        let Some(rx) = &self.receiver else {
            return TaskStatus::Ready(Err(AssetError::TaskFailed(format!(
                "{} (already joined)",
                self.label
            ))));
        };
        match rx.try_recv() {
            Ok(result) => {
                self.receiver = None;
                TaskStatus::Ready(result)
            }
            Err(TryRecvError::Empty) => TaskStatus::Pending,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                TaskStatus::Ready(Err(AssetError::TaskFailed(self.label.clone())))
            }
        }
    }

    /// Block until the load finishes.
    pub fn wait(mut self) -> Result<T, AssetError> {
        if self.is_cancelled() {
            return Err(AssetError::Cancelled(self.label.clone()));
        }
        let Some(rx) = self.receiver.take() else {
            return Err(AssetError::TaskFailed(self.label.clone()));
        };
        rx.recv()
            .map_err(|_| AssetError::TaskFailed(self.label.clone()))?
    }
}

impl<T> LoadTask<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            tracing::debug!(label = %self.label, "load cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl<T> Drop for LoadTask<T> {
    fn drop(&mut self) {
        if self.receiver.is_some() {
            self.cancelled.store(true, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::{Duration, Instant};

    fn poll_until_done<T: Send + 'static>(task: &mut LoadTask<T>) -> TaskStatus<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match task.poll() {
                TaskStatus::Pending if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(1));
                }
                other => return other,
            }
        }
    }

    #[test]
    fn poll_yields_result_once() {
        let mut task = LoadTask::spawn("answer", || Ok(42));
        match poll_until_done(&mut task) {
            TaskStatus::Ready(Ok(v)) => assert_eq!(v, 42),
            other => panic!("unexpected status {other:?}"),
        }
        assert!(matches!(
            task.poll(),
            TaskStatus::Ready(Err(AssetError::TaskFailed(_)))
        ));
    }

    #[test]
    fn errors_are_delivered() {
        let mut task: LoadTask<()> =
            LoadTask::spawn("broken", || Err(AssetError::EmptyModel("car.obj".into())));
        assert!(matches!(
            poll_until_done(&mut task),
            TaskStatus::Ready(Err(AssetError::EmptyModel(_)))
        ));
    }

    #[test]
    fn pending_until_worker_finishes() {
        let (release_tx, release_rx) = channel::<()>();
        let mut task = LoadTask::spawn("gated", move || {
            release_rx.recv().ok();
            Ok("done")
        });
        assert!(matches!(task.poll(), TaskStatus::Pending));
        release_tx.send(()).unwrap();
        assert!(matches!(
            poll_until_done(&mut task),
            TaskStatus::Ready(Ok("done"))
        ));
    }

    #[test]
    fn cancel_discards_result() {
        let (release_tx, release_rx) = channel::<()>();
        let mut task = LoadTask::spawn("slow", move || {
            release_rx.recv().ok();
            Ok(1)
        });
        task.cancel();
        release_tx.send(()).unwrap();
        assert!(task.is_cancelled());
        assert!(matches!(task.poll(), TaskStatus::Cancelled));
        assert!(matches!(task.wait(), Err(AssetError::Cancelled(_))));
    }

    #[test]
    fn panicking_worker_reports_failure() {
        let mut task: LoadTask<u8> = LoadTask::spawn("panics", || panic!("decoder blew up"));
        assert!(matches!(
            poll_until_done(&mut task),
            TaskStatus::Ready(Err(AssetError::TaskFailed(_)))
        ));
    }

    #[test]
    fn wait_blocks_for_result() {
        let task = LoadTask::spawn("blocking", || Ok(vec![1u8, 2, 3]));
        assert_eq!(task.wait().unwrap(), vec![1, 2, 3]);
    }
}
