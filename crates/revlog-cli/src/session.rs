use revlog_sdk::{
    EntityId, History, Query, RevertReport, RevertRequest, Revisions, SdkResult,
    Sequence, WriteOrigin,
};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A scripted editing session.
#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    Insert {
        document: Value,
    },
    Update {
        id: String,
        changes: Map<String, Value>,
    },
    Replace {
        id: String,
        document: Value,
    },
    Delete {
        id: String,
    },
    Undo {
        aggregate: String,
    },
    Reset {
        aggregate: String,
        target: Sequence,
    },
    History {
        aggregate: String,
        #[serde(default)]
        limit: Option<usize>,
    },
}

pub enum StepOutput {
    Mutated { op: &'static str, ids: Vec<String> },
    Reverted(RevertReport),
    History(History),
}

/// Run one step and let capture record whatever it wrote.
pub async fn run_step(revs: &Revisions, step: &Step) -> SdkResult<StepOutput> {
    let content = revs.content();
    let output = match step {
        Step::Insert { document } => {
            let stored = content.insert(document.clone(), WriteOrigin::Editor).await?;
            mutated("insert", std::slice::from_ref(&stored), revs)
        }
        Step::Update { id, changes } => {
            let query = Query::by_id(EntityId::new(id.as_str())?);
            let stored = content
                .update(&query, changes.clone(), WriteOrigin::Editor)
                .await?;
            mutated("update", std::slice::from_ref(&stored), revs)
        }
        Step::Replace { id, document } => {
            let query = Query::by_id(EntityId::new(id.as_str())?);
            let stored = content
                .replace(&query, document.clone(), WriteOrigin::Editor)
                .await?;
            mutated("replace", std::slice::from_ref(&stored), revs)
        }
        Step::Delete { id } => {
            let query = Query::by_id(EntityId::new(id.as_str())?);
            let deleted = content.delete(&query, WriteOrigin::Editor).await?;
            mutated("delete", &deleted, revs)
        }
        Step::Undo { aggregate } => {
            StepOutput::Reverted(revs.revert(RevertRequest::undo_last(aggregate.as_str())).await?)
        }
        Step::Reset { aggregate, target } => StepOutput::Reverted(
            revs.revert(RevertRequest::reset_to(aggregate.as_str(), *target))
                .await?,
        ),
        Step::History { aggregate, limit } => {
            StepOutput::History(revs.history(aggregate, *limit).await?)
        }
    };
    revs.settle().await;
    Ok(output)
}

fn mutated(op: &'static str, documents: &[Value], revs: &Revisions) -> StepOutput {
    let fields = revs.content().fields();
    StepOutput::Mutated {
        op,
        ids: documents
            .iter()
            .filter_map(|doc| fields.id_of(doc).ok())
            .map(|id| id.to_string())
            .collect(),
    }
}
