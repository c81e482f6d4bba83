//! Action references and their declared interface.

use std::collections::HashMap;

/// Outcome of a metadata lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// Metadata is available; inputs and outputs are authoritative.
    Resolved,
    /// The lookup failed or has not happened yet.
    Unresolved,
    /// A `./path` reference into the same repository.
    Local,
}

/// A parsed `uses:` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    /// The reference as written.
    pub raw: String,
    /// `owner/repo` for remote references, the path for local ones.
    pub name: String,
    /// Path inside the repository, for `owner/repo/sub/dir@ref` forms.
    pub sub_path: Option<String>,
    /// The part after `@`.
    pub git_ref: Option<String>,
}

impl ActionRef {
    /// Parse a reference. Local references are exactly those without `@`.
    pub fn parse(raw: &str) -> ActionRef {
        match raw.split_once('@') {
            None => ActionRef {
                raw: raw.to_string(),
                name: raw.to_string(),
                sub_path: None,
                git_ref: None,
            },
            Some((path, git_ref)) => {
                let mut parts = path.splitn(3, '/');
                let owner = parts.next().unwrap_or_default();
                let repo = parts.next().unwrap_or_default();
                let sub_path = parts.next().filter(|p| !p.is_empty());
                ActionRef {
                    raw: raw.to_string(),
                    name: if repo.is_empty() {
                        owner.to_string()
                    } else {
                        format!("{owner}/{repo}")
                    },
                    sub_path: sub_path.map(str::to_string),
                    git_ref: Some(git_ref.to_string()),
                }
            }
        }
    }

    /// Whether the reference points into the current repository.
    pub fn is_local(&self) -> bool {
        self.git_ref.is_none()
    }
}

/// The declared interface of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMetadata {
    pub reference: String,
    pub status: ActionStatus,
    /// Input name to description.
    pub inputs: HashMap<String, String>,
    /// Output name to description.
    pub outputs: HashMap<String, String>,
}

impl ActionMetadata {
    /// Metadata for a failed or not-yet-attempted lookup.
    pub fn unresolved(reference: &str) -> ActionMetadata {
        ActionMetadata {
            reference: reference.to_string(),
            status: ActionStatus::Unresolved,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    /// Metadata for a local reference whose file has not been read.
    pub fn local(reference: &str) -> ActionMetadata {
        ActionMetadata {
            reference: reference.to_string(),
            status: ActionStatus::Local,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    /// Parse an `action.yml` source into resolved metadata.
    pub fn from_action_source(reference: &str, source: &str) -> ActionMetadata {
        let mut metadata = ActionMetadata {
            reference: reference.to_string(),
            status: ActionStatus::Resolved,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        };
        let Some(tree) = flowlens_tree::parse(source) else {
            metadata.status = ActionStatus::Unresolved;
            return metadata;
        };
        let root = tree.root();
        for (key, table) in [
            ("inputs", &mut metadata.inputs),
            ("outputs", &mut metadata.outputs),
        ] {
            if let Some(block) = tree.child_with_key(root, key) {
                for child in tree.children(block.id) {
                    if let Some(name) = child.key.as_deref() {
                        let description = tree
                            .child_text(child.id, "description")
                            .unwrap_or_default()
                            .to_string();
                        table.insert(name.to_string(), description);
                    }
                }
            }
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_reference() {
        let r = ActionRef::parse("actions/checkout@v4");
        assert_eq!(r.name, "actions/checkout");
        assert_eq!(r.git_ref.as_deref(), Some("v4"));
        assert!(r.sub_path.is_none());
        assert!(!r.is_local());
    }

    #[test]
    fn test_parse_sub_path() {
        let r = ActionRef::parse("github/codeql-action/analyze@v3");
        assert_eq!(r.name, "github/codeql-action");
        assert_eq!(r.sub_path.as_deref(), Some("analyze"));
    }

    #[test]
    fn test_local_reference() {
        let r = ActionRef::parse("./.github/actions/setup");
        assert!(r.is_local());
        assert_eq!(r.name, "./.github/actions/setup");
    }

    #[test]
    fn test_metadata_from_action_source() {
        let source = "\
name: setup
inputs:
  version:
    description: toolchain version
    required: true
outputs:
  cache-hit:
    description: whether the cache was warm
";
        let metadata = ActionMetadata::from_action_source("./setup", source);
        assert_eq!(metadata.status, ActionStatus::Resolved);
        assert_eq!(
            metadata.inputs.get("version").map(String::as_str),
            Some("toolchain version")
        );
        assert!(metadata.outputs.contains_key("cache-hit"));
    }
}
