use std::sync::Arc;

use revlog_capture::{CaptureConfig, CaptureOutcome, CaptureWorker, ChangeCapture};
use revlog_content::{ContentStore, InMemoryContentStore, MutationNotification};
use revlog_history::{AggregateLocks, FileRevisionLog, InMemoryRevisionLog, RevisionLog};
use revlog_revert::{RevertEngine, RevertReport};
use revlog_types::AggregateId;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::RevisionsConfig;
use crate::error::{SdkError, SdkResult};
use crate::request::{History, RevertRequest};

/// Version history and revert for one content collection.
pub struct Revisions {
    config: RevisionsConfig,
    store: Arc<dyn ContentStore>,
    log: Arc<dyn RevisionLog>,
    capture: Arc<ChangeCapture>,
    engine: RevertEngine,
    /// Notifications not yet handed to a capture worker.
    pending: Mutex<Option<UnboundedReceiver<MutationNotification>>>,
}

impl Revisions {
    /// Revisions over a fresh in-memory content store.
    pub fn new(config: RevisionsConfig) -> SdkResult<Self> {
        let store = Arc::new(InMemoryContentStore::new(
            config.collection.clone(),
            config.document_fields(),
            config.root_type.clone(),
        ));
        let notifications = store.subscribe();
        Self::with_store(config, store, notifications, None)
    }

    /// Revisions over an existing content store.
    ///
    /// `notifications` must carry every mutation `store` reports. Without an
    /// explicit `log`, one is opened as `config.log_dir` says.
    pub fn with_store(
        config: RevisionsConfig,
        store: Arc<dyn ContentStore>,
        notifications: UnboundedReceiver<MutationNotification>,
        log: Option<Arc<dyn RevisionLog>>,
    ) -> SdkResult<Self> {
        let log = match log {
            Some(log) => log,
            None => open_log(&config)?,
        };
        let locks = Arc::new(AggregateLocks::new());
        let capture_config = CaptureConfig {
            fields: store.fields().clone(),
            ..config.capture_config()
        };
        let capture = Arc::new(ChangeCapture::new(log.clone(), locks.clone(), capture_config));
        let engine = RevertEngine::new(store.clone(), log.clone(), locks);

        info!(
            collection = %store.collection(),
            root_type = %config.root_type,
            "revisions ready"
        );
        Ok(Self {
            config,
            store,
            log,
            capture,
            engine,
            pending: Mutex::new(Some(notifications)),
        })
    }

    pub fn config(&self) -> &RevisionsConfig {
        &self.config
    }

    /// The content store whose mutations are recorded.
    pub fn content(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    pub fn log(&self) -> &dyn RevisionLog {
        self.log.as_ref()
    }

    /// Record every notification emitted so far. Returns how many were observed.
    ///
    /// Does nothing once [`spawn_capture`](Self::spawn_capture) has taken over.
    pub async fn settle(&self) -> usize {
        let mut pending = self.pending.lock().await;
        let Some(receiver) = pending.as_mut() else {
            return 0;
        };
        let mut observed = 0;
        while let Ok(notification) = receiver.try_recv() {
            if let CaptureOutcome::Failed(reason) = self.capture.observe(&notification).await {
                debug!(%reason, "capture failure while settling");
            }
            observed += 1;
        }
        observed
    }

    /// Move capture onto a background task.
    pub async fn spawn_capture(&self) -> SdkResult<JoinHandle<()>> {
        let receiver = self
            .pending
            .lock()
            .await
            .take()
            .ok_or(SdkError::CaptureRunning)?;
        Ok(CaptureWorker::spawn(self.capture.clone(), receiver))
    }

    /// The aggregate's root document and its newest entries, newest first.
    ///
    /// `limit` defaults to the configured history limit.
    pub async fn history(&self, aggregate_id: &str, limit: Option<usize>) -> SdkResult<History> {
        let aggregate = AggregateId::new(aggregate_id)?;
        let root = self
            .store
            .find_one(&aggregate)
            .await?
            .ok_or_else(|| SdkError::NotFound(format!("aggregate {aggregate}")))?;
        let set = self
            .log
            .read(&aggregate)?
            .ok_or_else(|| SdkError::NotFound(format!("revisions for {aggregate}")))?;

        Ok(History {
            aggregate: root,
            entries: set.newest_first(limit.unwrap_or(self.config.history_limit)),
        })
    }

    /// Undo the latest entry, or reset to a target sequence when `recursive`.
    pub async fn revert(&self, request: RevertRequest) -> SdkResult<RevertReport> {
        let aggregate = AggregateId::new(request.aggregate_id)?;
        let report = if request.recursive {
            let target = request.target_sequence.ok_or_else(|| {
                SdkError::InvalidRequest("a recursive revert needs a target sequence".into())
            })?;
            self.engine.reset_to(&aggregate, target).await?
        } else {
            self.engine.undo_last(&aggregate).await?
        };
        Ok(report)
    }
}

fn open_log(config: &RevisionsConfig) -> SdkResult<Arc<dyn RevisionLog>> {
    Ok(match &config.log_dir {
        Some(dir) => Arc::new(FileRevisionLog::open(dir)?),
        None => Arc::new(InMemoryRevisionLog::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use revlog_content::{Query, WriteOrigin};
    use revlog_revert::{EntityWrite, RevertError};
    use revlog_types::{EntityId, RevisionAction};
    use serde_json::{json, Map, Value};

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn changes(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    async fn course(revs: &Revisions) {
        let content = revs.content();
        content
            .insert(json!({"_id": "c1", "_type": "course", "title": "Rust"}), WriteOrigin::Editor)
            .await
            .unwrap();
        for b in ["b1", "b2"] {
            content
                .insert(
                    json!({"_id": b, "_type": "block", "_courseId": "c1", "title": b}),
                    WriteOrigin::Editor,
                )
                .await
                .unwrap();
        }
        revs.settle().await;
    }

    #[tokio::test]
    async fn history_is_newest_first_and_capped() {
        let revs = Revisions::new(RevisionsConfig::default()).unwrap();
        course(&revs).await;

        let history = revs.history("c1", None).await.unwrap();
        assert_eq!(history.aggregate["title"], "Rust");
        let seqs: Vec<u64> = history.entries.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![3, 2, 1]);

        let history = revs.history("c1", Some(1)).await.unwrap();
        assert_eq!(history.entries.len(), 1);
        assert_eq!(history.entries[0].sequence, 3);

        assert!(matches!(
            revs.history("c2", None).await,
            Err(SdkError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn timestamp_only_update_is_not_recorded() {
        let revs = Revisions::new(RevisionsConfig::default()).unwrap();
        course(&revs).await;

        revs.content()
            .update(
                &Query::by_id(id("b1")),
                changes(&[("updatedAt", json!("2030-01-01T00:00:00.000Z"))]),
                WriteOrigin::Editor,
            )
            .await
            .unwrap();
        assert_eq!(revs.settle().await, 1);
        assert_eq!(revs.log().entry_count(&id("c1")).unwrap(), 3);
    }

    #[tokio::test]
    async fn deleting_a_block_appends_and_deleting_the_course_destroys() {
        let revs = Revisions::new(RevisionsConfig::default()).unwrap();
        course(&revs).await;

        revs.content()
            .delete(&Query::by_id(id("b2")), WriteOrigin::Editor)
            .await
            .unwrap();
        revs.settle().await;
        let history = revs.history("c1", None).await.unwrap();
        assert_eq!(history.entries[0].action, RevisionAction::Delete);
        assert_eq!(history.entries.len(), 4);

        revs.content()
            .delete(&Query::by_id(id("c1")), WriteOrigin::Editor)
            .await
            .unwrap();
        revs.settle().await;
        assert!(revs.content().find(&Query::default()).await.unwrap().is_empty());
        assert!(revs.log().read(&id("c1")).unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_two_courses_at_once_destroys_both_sets() {
        let revs = Revisions::new(RevisionsConfig::default()).unwrap();
        course(&revs).await;
        revs.content()
            .insert(json!({"_id": "c2", "_type": "course", "title": "Go"}), WriteOrigin::Editor)
            .await
            .unwrap();
        revs.settle().await;
        assert_eq!(revs.log().aggregates().unwrap().len(), 2);

        let deleted = revs
            .content()
            .delete(&Query::default().with_kind("course"), WriteOrigin::Editor)
            .await
            .unwrap();
        assert_eq!(deleted.len(), 4);
        revs.settle().await;
        assert!(revs.log().aggregates().unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_store_and_log_are_used() {
        let config = RevisionsConfig {
            owner_field: "_parentId".into(),
            ..RevisionsConfig::default()
        };
        let store = Arc::new(InMemoryContentStore::new(
            "lessons",
            config.document_fields(),
            "course",
        ));
        let notifications = store.subscribe();
        let log: Arc<dyn RevisionLog> = Arc::new(InMemoryRevisionLog::new());
        let revs = Revisions::with_store(
            config,
            store.clone(),
            notifications,
            Some(log.clone()),
        )
        .unwrap();
        assert_eq!(revs.content().collection(), "lessons");

        store
            .insert(json!({"_id": "c1", "_type": "course"}), WriteOrigin::Editor)
            .await
            .unwrap();
        store
            .insert(
                json!({"_id": "b1", "_type": "block", "_parentId": "c1"}),
                WriteOrigin::Editor,
            )
            .await
            .unwrap();
        assert_eq!(revs.settle().await, 2);
        assert_eq!(log.entry_count(&id("c1")).unwrap(), 2);
        assert_eq!(log.read(&id("c1")).unwrap().unwrap().aggregate_collection, "lessons");

        let report = revs.revert(RevertRequest::undo_last("c1")).await.unwrap();
        assert_eq!(report.undone, vec![2]);
        assert!(store.find_one(&id("b1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn revert_requests_route_to_undo_and_reset() {
        let revs = Revisions::new(RevisionsConfig::default()).unwrap();
        course(&revs).await;
        revs.content()
            .update(
                &Query::by_id(id("b1")),
                changes(&[("title", json!("Intro"))]),
                WriteOrigin::Editor,
            )
            .await
            .unwrap();
        revs.settle().await;

        let report = revs.revert(RevertRequest::undo_last("c1")).await.unwrap();
        revs.settle().await;
        assert_eq!(report.undone, vec![4]);
        let b1 = revs.content().find_one(&id("b1")).await.unwrap().unwrap();
        assert_eq!(b1["title"], "b1");

        let report = revs.revert(RevertRequest::reset_to("c1", 1)).await.unwrap();
        revs.settle().await;
        assert_eq!(report.undone, vec![3, 2]);
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.write == EntityWrite::Deleted));
        assert_eq!(revs.content().find(&Query::default()).await.unwrap().len(), 1);
        assert_eq!(revs.log().entry_count(&id("c1")).unwrap(), 1);
    }

    #[tokio::test]
    async fn recursive_revert_needs_target() {
        let revs = Revisions::new(RevisionsConfig::default()).unwrap();
        course(&revs).await;
        let request = RevertRequest {
            aggregate_id: "c1".into(),
            target_sequence: None,
            recursive: true,
        };
        assert!(matches!(
            revs.revert(request).await,
            Err(SdkError::InvalidRequest(_))
        ));
        assert!(matches!(
            revs.revert(RevertRequest::reset_to("c1", 9)).await,
            Err(SdkError::Revert(RevertError::SequenceNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn background_capture_and_file_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = RevisionsConfig {
            log_dir: Some(dir.path().to_path_buf()),
            ..RevisionsConfig::default()
        };
        let revs = Revisions::new(config.clone()).unwrap();
        let worker = revs.spawn_capture().await.unwrap();
        assert!(matches!(
            revs.spawn_capture().await,
            Err(SdkError::CaptureRunning)
        ));

        revs.content()
            .insert(json!({"_id": "c1", "_type": "course"}), WriteOrigin::Editor)
            .await
            .unwrap();
        for _ in 0..100 {
            if revs.log().entry_count(&id("c1")).unwrap() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(revs.log().entry_count(&id("c1")).unwrap(), 1);
        worker.abort();

        let reopened = FileRevisionLog::open(dir.path()).unwrap();
        assert_eq!(reopened.entry_count(&id("c1")).unwrap(), 1);
    }
}
