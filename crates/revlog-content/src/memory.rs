//! In-memory content store for tests, demos, and embedding.
//!
//! Documents live in a `BTreeMap` keyed by normalized id behind a `RwLock`.
//! Subscribers receive [`MutationNotification`]s over unbounded channels
//! after each write has been applied.

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use revlog_types::{DocumentFields, EntityId};
use serde_json::{Map, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::{ContentError, ContentResult};
use crate::event::{MutationEvent, MutationNotification, WriteOrigin};
use crate::query::Query;
use crate::traits::ContentStore;

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

/// An in-memory implementation of [`ContentStore`].
///
/// Editor writes are stamped with `createdAt`/`updatedAt`; revert writes are
/// stored verbatim so reconstructed documents come back exactly as recorded.
pub struct InMemoryContentStore {
    collection: String,
    fields: DocumentFields,
    root_type: String,
    documents: RwLock<BTreeMap<EntityId, Value>>,
    subscribers: Mutex<Vec<UnboundedSender<MutationNotification>>>,
}

impl InMemoryContentStore {
    pub fn new(
        collection: impl Into<String>,
        fields: DocumentFields,
        root_type: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            fields,
            root_type: root_type.into(),
            documents: RwLock::new(BTreeMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a new notification subscriber.
    pub fn subscribe(&self) -> UnboundedReceiver<MutationNotification> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// The entity type treated as aggregate root for cascading deletes.
    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert several documents as one batched mutation.
    pub fn insert_many(
        &self,
        documents: Vec<Value>,
        origin: WriteOrigin,
    ) -> ContentResult<Vec<Value>> {
        let mut docs = self.write_lock()?;
        let mut staged = Vec::with_capacity(documents.len());
        for document in documents {
            let (id, document) = self.prepare_insert(document, origin)?;
            if docs.contains_key(&id) || staged.iter().any(|(i, _)| i == &id) {
                return Err(ContentError::AlreadyExists(id.to_string()));
            }
            staged.push((id, document));
        }
        let mut stored = Vec::with_capacity(staged.len());
        for (id, document) in staged {
            docs.insert(id, document.clone());
            stored.push(document);
        }
        if !stored.is_empty() {
            self.notify(origin, MutationEvent::Insert(stored.clone()));
        }
        Ok(stored)
    }

    fn prepare_insert(
        &self,
        document: Value,
        origin: WriteOrigin,
    ) -> ContentResult<(EntityId, Value)> {
        let Value::Object(mut map) = document else {
            return Err(ContentError::InvalidDocument(
                "document must be a JSON object".into(),
            ));
        };
        let id = match map.get(&self.fields.id) {
            Some(value) => EntityId::from_value(value)?,
            None => {
                let id = EntityId::generate();
                map.insert(self.fields.id.clone(), id.to_value());
                id
            }
        };
        if !map.contains_key(&self.fields.kind) {
            return Err(ContentError::InvalidDocument(format!(
                "document {id} has no `{}` field",
                self.fields.kind
            )));
        }
        if origin == WriteOrigin::Editor {
            let now = Value::String(now());
            map.entry(CREATED_AT).or_insert_with(|| now.clone());
            map.insert(UPDATED_AT.into(), now);
        }
        Ok((id, Value::Object(map)))
    }

    fn single_match(
        &self,
        docs: &BTreeMap<EntityId, Value>,
        query: &Query,
    ) -> ContentResult<EntityId> {
        let matches: Vec<&EntityId> = docs
            .iter()
            .filter(|(_, doc)| query.matches(doc, &self.fields))
            .map(|(id, _)| id)
            .collect();
        match matches.as_slice() {
            [] => Err(ContentError::NotFound(query.to_string())),
            [id] => Ok((*id).clone()),
            many => Err(ContentError::Ambiguous {
                query: query.to_string(),
                count: many.len(),
            }),
        }
    }

    fn is_root(&self, document: &Value) -> bool {
        document.get(&self.fields.kind).and_then(Value::as_str) == Some(self.root_type.as_str())
    }

    fn write_lock(
        &self,
    ) -> ContentResult<std::sync::RwLockWriteGuard<'_, BTreeMap<EntityId, Value>>> {
        self.documents
            .write()
            .map_err(|_| ContentError::Unavailable("content write lock poisoned".into()))
    }

    fn notify(&self, origin: WriteOrigin, event: MutationEvent) {
        let notification = MutationNotification {
            collection: self.collection.clone(),
            origin,
            event,
        };
        match self.subscribers.lock() {
            Ok(mut subscribers) => {
                subscribers.retain(|tx| tx.send(notification.clone()).is_ok());
            }
            Err(_) => tracing::warn!(
                event = notification.event.name(),
                "subscriber list poisoned; dropping notification"
            ),
        }
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new("content", DocumentFields::default(), "course")
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn fields(&self) -> &DocumentFields {
        &self.fields
    }

    async fn find(&self, query: &Query) -> ContentResult<Vec<Value>> {
        let docs = self
            .documents
            .read()
            .map_err(|_| ContentError::Unavailable("content read lock poisoned".into()))?;
        if let Some(id) = &query.id {
            return Ok(docs
                .get(id)
                .filter(|doc| query.matches(doc, &self.fields))
                .cloned()
                .into_iter()
                .collect());
        }
        Ok(docs
            .values()
            .filter(|doc| query.matches(doc, &self.fields))
            .cloned()
            .collect())
    }

    async fn insert(&self, document: Value, origin: WriteOrigin) -> ContentResult<Value> {
        let mut stored = self.insert_many(vec![document], origin)?;
        stored
            .pop()
            .ok_or_else(|| ContentError::InvalidDocument("nothing inserted".into()))
    }

    async fn update(
        &self,
        query: &Query,
        changes: Map<String, Value>,
        origin: WriteOrigin,
    ) -> ContentResult<Value> {
        let mut docs = self.write_lock()?;
        let id = self.single_match(&docs, query)?;
        let before = docs[&id].clone();

        let mut map = before.as_object().cloned().unwrap_or_default();
        for (key, value) in changes {
            if key == self.fields.id {
                continue;
            }
            map.insert(key, value);
        }
        if origin == WriteOrigin::Editor {
            map.insert(UPDATED_AT.into(), Value::String(now()));
        }
        let after = Value::Object(map);
        docs.insert(id, after.clone());
        // Sent under the guard so notifications follow write order.
        self.notify(
            origin,
            MutationEvent::Update {
                before,
                after: after.clone(),
            },
        );
        Ok(after)
    }

    async fn replace(
        &self,
        query: &Query,
        document: Value,
        origin: WriteOrigin,
    ) -> ContentResult<Value> {
        let Value::Object(mut map) = document else {
            return Err(ContentError::InvalidDocument(
                "document must be a JSON object".into(),
            ));
        };
        let mut docs = self.write_lock()?;
        let id = self.single_match(&docs, query)?;
        let before = docs[&id].clone();

        map.insert(self.fields.id.clone(), before[&self.fields.id].clone());
        if origin == WriteOrigin::Editor {
            if let Some(created) = before.get(CREATED_AT) {
                map.entry(CREATED_AT).or_insert_with(|| created.clone());
            }
            map.insert(UPDATED_AT.into(), Value::String(now()));
        }
        let after = Value::Object(map);
        docs.insert(id, after.clone());
        self.notify(
            origin,
            MutationEvent::Replace {
                before,
                after: after.clone(),
            },
        );
        Ok(after)
    }

    async fn delete(&self, query: &Query, origin: WriteOrigin) -> ContentResult<Vec<Value>> {
        let mut docs = self.write_lock()?;
        let matched: Vec<EntityId> = docs
            .iter()
            .filter(|(_, doc)| query.matches(doc, &self.fields))
            .map(|(id, _)| id.clone())
            .collect();
        let (roots, others): (Vec<EntityId>, Vec<EntityId>) =
            matched.into_iter().partition(|id| self.is_root(&docs[id]));

        // One batch per root: the root first, then everything it owns.
        let mut batches: Vec<Vec<Value>> = Vec::with_capacity(roots.len() + 1);
        for root in roots {
            let owned = Query::owned_by(root.clone());
            let children: Vec<EntityId> = docs
                .iter()
                .filter(|(_, doc)| owned.matches(doc, &self.fields))
                .map(|(id, _)| id.clone())
                .collect();
            let batch: Vec<Value> = std::iter::once(root)
                .chain(children)
                .filter_map(|id| docs.remove(&id))
                .collect();
            batches.push(batch);
        }
        batches.push(others.into_iter().filter_map(|id| docs.remove(&id)).collect());

        let mut deleted = Vec::new();
        for batch in batches.into_iter().filter(|b| !b.is_empty()) {
            deleted.extend(batch.iter().cloned());
            self.notify(origin, MutationEvent::Delete(batch));
        }
        if !deleted.is_empty() {
            tracing::debug!(
                collection = %self.collection,
                count = deleted.len(),
                "deleted documents"
            );
        }
        Ok(deleted)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
