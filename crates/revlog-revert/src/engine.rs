use std::collections::HashMap;
use std::sync::Arc;

use revlog_content::{ContentStore, Query, WriteOrigin};
use revlog_diff::{normalize_ids, restore_ids};
use revlog_history::{AggregateLocks, LogError, RevisionLog};
use revlog_types::{AggregateId, EntityId, RevisionEntry, RevisionSet, Sequence, Target};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{RevertError, RevertResult};
use crate::plan::{reconstruct, Reconstruction};
use crate::report::{EntityOutcome, EntityWrite, RevertReport};

/// Undoes recorded changes of an aggregate.
///
/// Every call holds the aggregate's exclusive section from reading the log
/// until the truncation, so no capture append or other revert on the same
/// aggregate can interleave.
pub struct RevertEngine {
    store: Arc<dyn ContentStore>,
    log: Arc<dyn RevisionLog>,
    locks: Arc<AggregateLocks>,
}

/// One entity's pending write.
enum Write {
    Delete,
    Insert(Value),
    Replace(Value),
}

struct Step {
    target: Target,
    write: Option<Write>,
    /// Outcome reported when no write is needed.
    settled: EntityOutcome,
}

impl RevertEngine {
    pub fn new(
        store: Arc<dyn ContentStore>,
        log: Arc<dyn RevisionLog>,
        locks: Arc<AggregateLocks>,
    ) -> Self {
        Self { store, log, locks }
    }

    /// Undo the most recent entry of the aggregate.
    pub async fn undo_last(&self, aggregate: &AggregateId) -> RevertResult<RevertReport> {
        let _guard = self.locks.lock(aggregate).await;
        let set = self.read_set(aggregate)?;
        let latest = set
            .latest()
            .cloned()
            .ok_or_else(|| RevertError::NotFound(format!("{aggregate} has no revisions")))?;
        self.revert(aggregate, vec![latest]).await
    }

    /// Undo every entry with a sequence above `target`.
    ///
    /// `target` is `0` (before any entry) or the sequence of an entry still
    /// held by the aggregate's set.
    pub async fn reset_to(
        &self,
        aggregate: &AggregateId,
        target: Sequence,
    ) -> RevertResult<RevertReport> {
        let _guard = self.locks.lock(aggregate).await;
        let set = self.read_set(aggregate)?;
        if target != 0 && !set.contains(target) {
            return Err(RevertError::SequenceNotFound {
                aggregate: aggregate.to_string(),
                sequence: target,
            });
        }
        let selection = set.entries_after(target).to_vec();
        if selection.is_empty() {
            return Err(RevertError::NotFound(format!(
                "{aggregate} has no revisions after {target}"
            )));
        }
        self.revert(aggregate, selection).await
    }

    fn read_set(&self, aggregate: &AggregateId) -> RevertResult<RevisionSet> {
        self.log
            .read(aggregate)?
            .ok_or_else(|| RevertError::NotFound(format!("no revision set for {aggregate}")))
    }

    async fn revert(
        &self,
        aggregate: &AggregateId,
        mut selection: Vec<RevisionEntry>,
    ) -> RevertResult<RevertReport> {
        selection.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        let undone: Vec<Sequence> = selection.iter().map(|e| e.sequence).collect();
        let truncated_from = undone.last().copied().unwrap_or_default();
        debug!(aggregate = %aggregate, entries = ?undone, "reverting");

        // Every outcome is computed before the first write.
        let mut steps = Vec::new();
        for (target, entries) in group_by_target(&selection) {
            steps.push(self.plan(target, &entries).await?);
        }

        let outcomes = self.execute(steps).await?;

        let dropped = match self.log.truncate_from(aggregate, truncated_from) {
            Ok(dropped) => dropped,
            // Reverting the root's own creation deletes the aggregate, and its set with it.
            Err(LogError::NotFound(_)) => 0,
            Err(err) => return Err(err.into()),
        };
        info!(
            aggregate = %aggregate,
            from = truncated_from,
            dropped,
            entities = outcomes.len(),
            "revert committed"
        );

        Ok(RevertReport {
            aggregate_id: aggregate.clone(),
            undone,
            truncated_from,
            outcomes,
        })
    }

    async fn plan(&self, target: Target, entries: &[&RevisionEntry]) -> RevertResult<Step> {
        let persisted = self.store.find_one(&target.id).await?;
        let current = persisted.as_ref().map(normalize_ids);
        let reconstruction = reconstruct(&target.id, current.clone(), entries)?;

        let (write, settled) = match (reconstruction, current) {
            (Reconstruction::Missing, _) => {
                warn!(entity = %target.id, "entity no longer exists; nothing to revert");
                (None, EntityWrite::Missing)
            }
            (Reconstruction::Absent, None) => (None, EntityWrite::Unchanged),
            (Reconstruction::Absent, Some(_)) => (Some(Write::Delete), EntityWrite::Deleted),
            (Reconstruction::Exists(value), None) => {
                (Some(Write::Insert(self.restore(value))), EntityWrite::Inserted)
            }
            (Reconstruction::Exists(value), Some(current)) if value == current => {
                (None, EntityWrite::Unchanged)
            }
            (Reconstruction::Exists(value), Some(_)) => {
                (Some(Write::Replace(self.restore(value))), EntityWrite::Replaced)
            }
        };

        let state = match settled {
            EntityWrite::Unchanged => persisted,
            _ => None,
        };
        Ok(Step {
            settled: EntityOutcome {
                target: target.clone(),
                write: settled,
                state,
            },
            target,
            write,
        })
    }

    fn restore(&self, value: Value) -> Value {
        restore_ids(value, self.store.id_fields())
    }

    /// Issue the writes concurrently and collect every result.
    async fn execute(&self, steps: Vec<Step>) -> RevertResult<Vec<EntityOutcome>> {
        let mut outcomes: Vec<Option<EntityOutcome>> = vec![None; steps.len()];
        let mut scheduled: Vec<(usize, EntityId)> = Vec::new();
        let mut tasks = JoinSet::new();

        for (index, step) in steps.into_iter().enumerate() {
            let Some(write) = step.write else {
                outcomes[index] = Some(step.settled);
                continue;
            };
            scheduled.push((index, step.target.id.clone()));
            let store = self.store.clone();
            let outcome = step.settled;
            tasks.spawn(async move {
                let query = Query::by_id(step.target.id.clone());
                let result = match write {
                    Write::Delete => store
                        .delete(&query, WriteOrigin::Revert)
                        .await
                        .map(|_| None),
                    Write::Insert(value) => {
                        store.insert(value, WriteOrigin::Revert).await.map(Some)
                    }
                    Write::Replace(value) => store
                        .replace(&query, value, WriteOrigin::Revert)
                        .await
                        .map(Some),
                };
                (index, outcome, result)
            });
        }

        let mut failed: Vec<(EntityId, String)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, mut outcome, result) = match joined {
                Ok(done) => done,
                Err(err) => {
                    warn!(error = %err, "revert write task did not complete");
                    continue;
                }
            };
            match result {
                Ok(state) => {
                    outcome.state = state;
                    outcomes[index] = Some(outcome);
                }
                Err(err) => {
                    warn!(entity = %outcome.target.id, error = %err, "revert write failed");
                    failed.push((outcome.target.id.clone(), err.to_string()));
                }
            }
        }

        // A task that panicked or was cancelled never reported back.
        for (index, id) in scheduled {
            if outcomes[index].is_none() && !failed.iter().any(|(f, _)| *f == id) {
                failed.push((id, "write task did not complete".into()));
            }
        }

        if !failed.is_empty() {
            let succeeded: Vec<EntityId> = outcomes
                .iter()
                .flatten()
                .map(|o| o.target.id.clone())
                .collect();
            return Err(RevertError::PartialWrite { succeeded, failed });
        }
        Ok(outcomes.into_iter().flatten().collect())
    }
}

/// Group entries by entity, keeping newest-first order inside and across groups.
fn group_by_target(selection: &[RevisionEntry]) -> Vec<(Target, Vec<&RevisionEntry>)> {
    let mut groups: Vec<(Target, Vec<&RevisionEntry>)> = Vec::new();
    let mut index: HashMap<&EntityId, usize> = HashMap::new();
    for entry in selection {
        match index.get(&entry.target.id) {
            Some(&at) => groups[at].1.push(entry),
            None => {
                index.insert(&entry.target.id, groups.len());
                groups.push((entry.target.clone(), vec![entry]));
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use revlog_capture::{CaptureConfig, ChangeCapture};
    use revlog_content::{
        ContentError, ContentResult, InMemoryContentStore, MutationNotification,
    };
    use revlog_diff::diff;
    use revlog_history::InMemoryRevisionLog;
    use revlog_types::{DocumentFields, NewRevision, RevisionAction};
    use serde_json::{json, Map};
    use tokio::sync::mpsc::UnboundedReceiver;

    #[derive(Clone, Copy)]
    enum Failure {
        Refuse,
        Panic,
    }

    /// Fails every write touching one chosen entity.
    struct FlakyStore {
        inner: InMemoryContentStore,
        failing: Mutex<Option<(String, Failure)>>,
        id_fields: Vec<String>,
    }

    impl FlakyStore {
        fn fail_on(&self, id: Option<&str>) {
            *self.failing.lock().unwrap() = id.map(|id| (id.to_string(), Failure::Refuse));
        }

        fn crash_on(&self, id: &str) {
            *self.failing.lock().unwrap() = Some((id.to_string(), Failure::Panic));
        }

        fn check(&self, id: &str) -> ContentResult<()> {
            let failing = self.failing.lock().unwrap().clone();
            match failing {
                Some((failing, Failure::Refuse)) if failing == id => {
                    Err(ContentError::Unavailable(format!("write to {id} refused")))
                }
                Some((failing, Failure::Panic)) if failing == id => {
                    panic!("write to {id} crashed")
                }
                _ => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ContentStore for FlakyStore {
        fn collection(&self) -> &str {
            self.inner.collection()
        }

        fn fields(&self) -> &DocumentFields {
            self.inner.fields()
        }

        fn id_fields(&self) -> &[String] {
            &self.id_fields
        }

        async fn find(&self, query: &Query) -> ContentResult<Vec<Value>> {
            self.inner.find(query).await
        }

        async fn insert(&self, document: Value, origin: WriteOrigin) -> ContentResult<Value> {
            let id = self.inner.fields().id_of(&document)?;
            self.check(id.as_str())?;
            self.inner.insert(document, origin).await
        }

        async fn update(
            &self,
            query: &Query,
            changes: Map<String, Value>,
            origin: WriteOrigin,
        ) -> ContentResult<Value> {
            self.inner.update(query, changes, origin).await
        }

        async fn replace(
            &self,
            query: &Query,
            document: Value,
            origin: WriteOrigin,
        ) -> ContentResult<Value> {
            if let Some(id) = &query.id {
                self.check(id.as_str())?;
            }
            self.inner.replace(query, document, origin).await
        }

        async fn delete(&self, query: &Query, origin: WriteOrigin) -> ContentResult<Vec<Value>> {
            if let Some(id) = &query.id {
                self.check(id.as_str())?;
            }
            self.inner.delete(query, origin).await
        }
    }

    struct Fixture {
        store: Arc<FlakyStore>,
        log: Arc<InMemoryRevisionLog>,
        capture: ChangeCapture,
        engine: RevertEngine,
        notifications: UnboundedReceiver<MutationNotification>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_id_fields(&[])
        }

        /// A fixture whose store keeps `fields` as `{"$oid"}` handles.
        fn with_id_fields(fields: &[&str]) -> Self {
            let inner = InMemoryContentStore::default();
            let notifications = inner.subscribe();
            let store = Arc::new(FlakyStore {
                inner,
                failing: Mutex::new(None),
                id_fields: fields.iter().map(|f| f.to_string()).collect(),
            });
            let log = Arc::new(InMemoryRevisionLog::new());
            let locks = Arc::new(AggregateLocks::new());
            let capture = ChangeCapture::new(log.clone(), locks.clone(), CaptureConfig::default());
            let engine = RevertEngine::new(store.clone(), log.clone(), locks);
            Self {
                store,
                log,
                capture,
                engine,
                notifications,
            }
        }

        /// Seed documents without recording history.
        fn seed(&self, documents: Vec<Value>) {
            self.store
                .inner
                .insert_many(documents, WriteOrigin::Revert)
                .unwrap();
        }

        async fn settle(&mut self) {
            while let Ok(notification) = self.notifications.try_recv() {
                self.capture.observe(&notification).await;
            }
        }

        async fn set_title(&mut self, id: &str, title: &str) {
            let mut changes = Map::new();
            changes.insert("title".into(), json!(title));
            self.store
                .update(&Query::by_id(eid(id)), changes, WriteOrigin::Editor)
                .await
                .unwrap();
            self.settle().await;
        }

        async fn title(&self, id: &str) -> Option<String> {
            self.store
                .find_one(&eid(id))
                .await
                .unwrap()
                .and_then(|doc| doc["title"].as_str().map(String::from))
        }

        fn sequences(&self) -> Vec<Sequence> {
            self.log
                .read(&eid("c1"))
                .unwrap()
                .map(|set| set.entries.iter().map(|e| e.sequence).collect())
                .unwrap_or_default()
        }
    }

    fn eid(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn block(id: &str, title: &str) -> Value {
        json!({"_id": id, "_type": "block", "_courseId": "c1", "title": title})
    }

    fn course() -> Value {
        json!({"_id": "c1", "_type": "course", "title": "Rust"})
    }

    #[tokio::test]
    async fn undo_last_steps_back_one_entry_at_a_time() {
        let mut fx = Fixture::new();
        fx.seed(vec![course()]);
        fx.store
            .insert(block("b1", "A"), WriteOrigin::Editor)
            .await
            .unwrap();
        fx.settle().await;
        fx.set_title("b1", "B").await;
        fx.set_title("b1", "C").await;
        assert_eq!(fx.sequences(), vec![1, 2, 3]);

        let report = fx.engine.undo_last(&eid("c1")).await.unwrap();
        fx.settle().await;
        assert_eq!(report.undone, vec![3]);
        assert_eq!(report.truncated_from, 3);
        assert_eq!(report.outcome("b1").unwrap().write, EntityWrite::Replaced);
        assert_eq!(fx.title("b1").await.as_deref(), Some("B"));
        assert_eq!(fx.sequences(), vec![1, 2]);

        fx.engine.undo_last(&eid("c1")).await.unwrap();
        fx.settle().await;
        assert_eq!(fx.title("b1").await.as_deref(), Some("A"));
        assert_eq!(fx.sequences(), vec![1]);

        let report = fx.engine.undo_last(&eid("c1")).await.unwrap();
        fx.settle().await;
        assert_eq!(report.outcome("b1").unwrap().write, EntityWrite::Deleted);
        assert!(fx.store.find_one(&eid("b1")).await.unwrap().is_none());
        assert!(fx.sequences().is_empty());

        let err = fx.engine.undo_last(&eid("c1")).await.unwrap_err();
        assert!(matches!(err, RevertError::NotFound(_)));
    }

    #[tokio::test]
    async fn reset_restores_every_entity_in_one_call() {
        let mut fx = Fixture::new();
        fx.seed(vec![course(), block("x", "X0"), block("y", "Y0")]);
        fx.set_title("x", "X1").await;
        fx.set_title("y", "Y1").await;
        fx.set_title("x", "X2").await;

        let report = fx.engine.reset_to(&eid("c1"), 0).await.unwrap();
        fx.settle().await;

        assert_eq!(report.undone, vec![3, 2, 1]);
        assert_eq!(report.truncated_from, 1);
        assert_eq!(report.writes(), 2);
        assert_eq!(fx.title("x").await.as_deref(), Some("X0"));
        assert_eq!(fx.title("y").await.as_deref(), Some("Y0"));
        assert!(fx.sequences().is_empty());
    }

    #[tokio::test]
    async fn reset_keeps_entries_up_to_target() {
        let mut fx = Fixture::new();
        fx.seed(vec![course(), block("x", "X0")]);
        fx.set_title("x", "X1").await;
        fx.set_title("x", "X2").await;
        fx.set_title("x", "X3").await;

        fx.engine.reset_to(&eid("c1"), 1).await.unwrap();
        fx.settle().await;
        assert_eq!(fx.title("x").await.as_deref(), Some("X1"));
        assert_eq!(fx.sequences(), vec![1]);

        fx.set_title("x", "X4").await;
        assert_eq!(fx.sequences(), vec![1, 4]);
    }

    #[tokio::test]
    async fn partial_failure_keeps_log_and_retry_completes() {
        let mut fx = Fixture::new();
        fx.seed(vec![course(), block("x", "X0"), block("y", "Y0")]);
        fx.set_title("x", "X1").await;
        fx.set_title("y", "Y1").await;
        fx.set_title("x", "X2").await;

        fx.store.fail_on(Some("y"));
        let err = fx.engine.reset_to(&eid("c1"), 0).await.unwrap_err();
        fx.settle().await;
        match err {
            RevertError::PartialWrite { succeeded, failed } => {
                assert_eq!(succeeded, vec![eid("x")]);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, eid("y"));
            }
            other => panic!("expected partial write, got {other:?}"),
        }
        assert_eq!(fx.sequences(), vec![1, 2, 3]);
        assert_eq!(fx.title("x").await.as_deref(), Some("X0"));
        assert_eq!(fx.title("y").await.as_deref(), Some("Y1"));

        fx.store.fail_on(None);
        let report = fx.engine.reset_to(&eid("c1"), 0).await.unwrap();
        fx.settle().await;
        assert_eq!(report.outcome("x").unwrap().write, EntityWrite::Unchanged);
        assert_eq!(report.outcome("y").unwrap().write, EntityWrite::Replaced);
        assert_eq!(fx.title("x").await.as_deref(), Some("X0"));
        assert_eq!(fx.title("y").await.as_deref(), Some("Y0"));
        assert!(fx.sequences().is_empty());
    }

    #[tokio::test]
    async fn panicked_write_is_reported_failed() {
        let mut fx = Fixture::new();
        fx.seed(vec![course(), block("x", "X0"), block("y", "Y0")]);
        fx.set_title("x", "X1").await;
        fx.set_title("y", "Y1").await;

        fx.store.crash_on("y");
        let err = fx.engine.reset_to(&eid("c1"), 0).await.unwrap_err();
        fx.settle().await;
        match err {
            RevertError::PartialWrite { succeeded, failed } => {
                assert_eq!(succeeded, vec![eid("x")]);
                assert_eq!(
                    failed,
                    vec![(eid("y"), "write task did not complete".to_string())]
                );
            }
            other => panic!("expected partial write, got {other:?}"),
        }
        assert_eq!(fx.sequences(), vec![1, 2]);

        fx.store.fail_on(None);
        fx.engine.reset_to(&eid("c1"), 0).await.unwrap();
        assert_eq!(fx.title("y").await.as_deref(), Some("Y0"));
        assert!(fx.sequences().is_empty());
    }

    #[tokio::test]
    async fn handles_are_written_back_and_retry_sees_them_unchanged() {
        let handle = |id: &str| json!({"$oid": id});
        let doc = |id: &str, title: &str| {
            json!({"_id": handle(id), "_type": "block", "_courseId": handle("c1"), "title": title})
        };
        let mut fx = Fixture::with_id_fields(&["_id", "_courseId"]);
        fx.seed(vec![
            json!({"_id": handle("c1"), "_type": "course"}),
            doc("x", "X0"),
            doc("y", "Y0"),
            doc("z", "Z0"),
        ]);
        fx.set_title("x", "X1").await;
        fx.set_title("y", "Y1").await;
        fx.store
            .delete(&Query::by_id(eid("z")), WriteOrigin::Editor)
            .await
            .unwrap();
        fx.settle().await;
        assert_eq!(fx.sequences(), vec![1, 2, 3]);

        fx.store.fail_on(Some("y"));
        let err = fx.engine.reset_to(&eid("c1"), 0).await.unwrap_err();
        fx.settle().await;
        assert!(matches!(err, RevertError::PartialWrite { .. }));
        for (id, title) in [("x", "X0"), ("z", "Z0")] {
            let stored = fx.store.find_one(&eid(id)).await.unwrap().unwrap();
            assert_eq!(stored["_id"], handle(id));
            assert_eq!(stored["_courseId"], handle("c1"));
            assert_eq!(stored["title"], title);
        }

        fx.store.fail_on(None);
        let report = fx.engine.reset_to(&eid("c1"), 0).await.unwrap();
        fx.settle().await;
        assert_eq!(report.outcome("x").unwrap().write, EntityWrite::Unchanged);
        assert_eq!(report.outcome("z").unwrap().write, EntityWrite::Unchanged);
        assert_eq!(report.outcome("y").unwrap().write, EntityWrite::Replaced);
        let y = fx.store.find_one(&eid("y")).await.unwrap().unwrap();
        assert_eq!(y["_id"], handle("y"));
        assert_eq!(y["title"], "Y0");
        assert!(fx.sequences().is_empty());
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let entry = |sequence: Sequence, id: &str| RevisionEntry {
            sequence,
            target: Target {
                id: eid(id),
                kind: "block".into(),
                collection: "content".into(),
            },
            action: RevisionAction::Update,
            diff: diff(Some(&json!({"n": 0})), Some(&json!({"n": sequence}))).unwrap(),
            timestamp: Utc::now(),
        };
        let selection = vec![
            entry(5, "x"),
            entry(4, "y"),
            entry(3, "x"),
            entry(2, "z"),
            entry(1, "y"),
        ];

        let groups = group_by_target(&selection);
        let summary: Vec<(&str, Vec<Sequence>)> = groups
            .iter()
            .map(|(t, es)| (t.id.as_str(), es.iter().map(|e| e.sequence).collect()))
            .collect();
        assert_eq!(
            summary,
            vec![("x", vec![5, 3]), ("y", vec![4, 1]), ("z", vec![2])]
        );
    }

    #[tokio::test]
    async fn undoing_a_deletion_recreates_the_entity() {
        let mut fx = Fixture::new();
        fx.seed(vec![course(), block("b1", "Intro")]);
        fx.store
            .delete(&Query::by_id(eid("b1")), WriteOrigin::Editor)
            .await
            .unwrap();
        fx.settle().await;
        assert_eq!(fx.sequences(), vec![1]);

        let report = fx.engine.undo_last(&eid("c1")).await.unwrap();
        fx.settle().await;
        let outcome = report.outcome("b1").unwrap();
        assert_eq!(outcome.write, EntityWrite::Inserted);
        assert_eq!(outcome.state.as_ref().unwrap()["title"], "Intro");
        assert_eq!(fx.title("b1").await.as_deref(), Some("Intro"));
        assert!(fx.sequences().is_empty());
    }

    #[tokio::test]
    async fn contradictory_history_aborts_before_writing() {
        let fx = Fixture::new();
        fx.seed(vec![course(), block("b1", "Now")]);
        let target = Target {
            id: eid("b1"),
            kind: "block".into(),
            collection: "content".into(),
        };
        let old = block("b1", "Old");
        for (action, delta) in [
            (RevisionAction::Update, diff(Some(&old), Some(&block("b1", "Now")))),
            (RevisionAction::Delete, diff(Some(&old), None)),
            (RevisionAction::Insert, diff(None, Some(&old))),
        ] {
            fx.log
                .append(
                    &eid("c1"),
                    "content",
                    NewRevision {
                        target: target.clone(),
                        action,
                        diff: delta.unwrap(),
                        timestamp: Utc::now(),
                    },
                )
                .unwrap();
        }

        let err = fx.engine.reset_to(&eid("c1"), 0).await.unwrap_err();
        assert!(matches!(err, RevertError::IntegrityFault { .. }));
        assert_eq!(fx.title("b1").await.as_deref(), Some("Now"));
        assert_eq!(fx.sequences(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn vanished_entity_is_reported_missing() {
        let mut fx = Fixture::new();
        fx.seed(vec![course(), block("b1", "A")]);
        fx.set_title("b1", "B").await;
        fx.store
            .inner
            .delete(&Query::by_id(eid("b1")), WriteOrigin::Revert)
            .await
            .unwrap();

        let report = fx.engine.undo_last(&eid("c1")).await.unwrap();
        assert_eq!(report.outcome("b1").unwrap().write, EntityWrite::Missing);
        assert!(fx.sequences().is_empty());
    }

    #[tokio::test]
    async fn unknown_aggregate_and_sequence() {
        let mut fx = Fixture::new();
        fx.seed(vec![course(), block("b1", "A")]);
        fx.set_title("b1", "B").await;

        let err = fx.engine.undo_last(&eid("nope")).await.unwrap_err();
        assert!(matches!(err, RevertError::NotFound(_)));

        let err = fx.engine.reset_to(&eid("c1"), 42).await.unwrap_err();
        assert!(matches!(
            err,
            RevertError::SequenceNotFound { sequence: 42, .. }
        ));

        let err = fx.engine.reset_to(&eid("c1"), 1).await.unwrap_err();
        assert!(matches!(err, RevertError::NotFound(_)));
    }

    #[tokio::test]
    async fn undoing_root_creation_removes_the_aggregate() {
        let mut fx = Fixture::new();
        fx.store.insert(course(), WriteOrigin::Editor).await.unwrap();
        fx.settle().await;
        assert_eq!(fx.sequences(), vec![1]);

        let report = fx.engine.undo_last(&eid("c1")).await.unwrap();
        assert_eq!(report.outcome("c1").unwrap().write, EntityWrite::Deleted);
        fx.settle().await;
        assert!(fx.store.find_one(&eid("c1")).await.unwrap().is_none());
        assert!(fx.log.read(&eid("c1")).unwrap().is_none());
    }
}
