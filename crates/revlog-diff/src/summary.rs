//! Flattened, path-addressed view of a delta for display.

use serde_json::Value;

use crate::delta::Delta;

/// What happened at one path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Added,
    Removed,
    Changed,
}

/// A single leaf change, addressed by a `/`-separated path.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeLine {
    pub path: String,
    pub kind: LineKind,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Flatten `delta` into one line per leaf change, in path order.
pub fn summarize(delta: &Delta) -> Vec<ChangeLine> {
    let mut lines = Vec::new();
    walk(delta, String::new(), &mut lines);
    lines
}

fn walk(delta: &Delta, path: String, lines: &mut Vec<ChangeLine>) {
    let at = |path: &str| {
        if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        }
    };
    match delta {
        Delta::Added { value } => lines.push(ChangeLine {
            path: at(&path),
            kind: LineKind::Added,
            old: None,
            new: Some(value.clone()),
        }),
        Delta::Removed { value } => lines.push(ChangeLine {
            path: at(&path),
            kind: LineKind::Removed,
            old: Some(value.clone()),
            new: None,
        }),
        Delta::Replaced { old, new } => lines.push(ChangeLine {
            path: at(&path),
            kind: LineKind::Changed,
            old: Some(old.clone()),
            new: Some(new.clone()),
        }),
        Delta::Object { fields } => {
            for (key, child) in fields {
                walk(child, format!("{path}/{key}"), lines);
            }
        }
        Delta::Array { items } => {
            for (index, child) in items {
                walk(child, format!("{path}/{index}"), lines);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::diff;
    use serde_json::json;

    #[test]
    fn lines_are_path_addressed() {
        let old = json!({"title": "a", "body": {"text": "x"}, "tags": ["t"]});
        let new = json!({"title": "b", "body": {}, "tags": ["t", "u"]});
        let lines = summarize(&diff(Some(&old), Some(&new)).unwrap());

        let paths: Vec<_> = lines.iter().map(|l| (l.path.as_str(), l.kind)).collect();
        assert_eq!(
            paths,
            vec![
                ("/body/text", LineKind::Removed),
                ("/tags/1", LineKind::Added),
                ("/title", LineKind::Changed),
            ]
        );
    }

    #[test]
    fn whole_value_change_is_root_line() {
        let lines = summarize(&diff(None, Some(&json!({"_id": "x"}))).unwrap());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].path, "/");
        assert_eq!(lines[0].kind, LineKind::Added);
    }
}
