use std::sync::Arc;

use revlog_content::MutationNotification;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::capture::ChangeCapture;

/// Runs change capture off the mutation path.
pub struct CaptureWorker;

impl CaptureWorker {
    /// Observe every notification from `receiver` on a background task.
    ///
    /// The task ends when every sender of the channel has been dropped.
    pub fn spawn(
        capture: Arc<ChangeCapture>,
        mut receiver: UnboundedReceiver<MutationNotification>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                capture.observe(&notification).await;
            }
            debug!("mutation channel closed; capture worker stopping");
        })
    }
}
