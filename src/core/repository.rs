//! Story repository: built-in catalog loading, custom story ingestion, and
//! graph overview tooling.
//!
//! Built-in stories load from `.adventure`/`.json` files in a directory;
//! one malformed file never aborts the batch. Custom stories live in the
//! persistence store and are merged into every catalog view.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::store::{ProgressStore, StoreError};
use crate::schema::story::{EndingType, Story, StoryFormatError, StoryNode};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Format(#[from] StoryFormatError),
    #[error("a story with id '{0}' already exists")]
    DuplicateId(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One file the batch loader rejected, with the reason it was skipped.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a directory load: ids accepted plus per-file rejections.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub loaded: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

/// Shape summary of one story graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStats {
    pub total_nodes: usize,
    pub total_endings: usize,
    pub good_endings: usize,
}

/// Cycle-safe expansion of a story graph from its start node.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryTree {
    pub story_id: String,
    pub title: String,
    pub root: TreeNode,
}

/// One expanded node. `circular` marks a node already present on the path
/// from the root; its children are not expanded again.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub node_id: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_ending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_type: Option<EndingType>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub circular: bool,
    pub children: Vec<TreeEdge>,
}

/// A labeled edge in the expansion. `child` is `None` when the choice
/// points at a node the story does not define.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEdge {
    pub choice_text: String,
    pub child: Option<TreeNode>,
}

/// The merged story catalog: built-in stories held here, custom stories
/// read through the store on every query.
#[derive(Debug, Default)]
pub struct StoryRepository {
    built_in: Vec<Story>,
}

impl StoryRepository {
    pub fn new() -> StoryRepository {
        StoryRepository::default()
    }

    /// Register one built-in story. Rejects duplicate ids.
    pub fn add_built_in(&mut self, story: Story) -> Result<(), RepositoryError> {
        story.validate()?;
        if self.built_in.iter().any(|s| s.id == story.id) {
            return Err(RepositoryError::DuplicateId(story.id));
        }
        self.built_in.push(story);
        Ok(())
    }

    /// Load every `.adventure`/`.json` file in a directory. Failures are
    /// isolated per file; only an unreadable directory is fatal.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<LoadOutcome, RepositoryError> {
        let dir = dir.as_ref();
        let mut outcome = LoadOutcome::default();

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("adventure") | Some("json")
                )
            })
            .collect();
        paths.sort();

        for path in paths {
            match load_file(&path) {
                Ok(story) => {
                    let id = story.id.clone();
                    match self.add_built_in(story) {
                        Ok(()) => outcome.loaded.push(id),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "skipping story file");
                            outcome.failures.push(LoadFailure {
                                path,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping story file");
                    outcome.failures.push(LoadFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            dir = %dir.display(),
            loaded = outcome.loaded.len(),
            failed = outcome.failures.len(),
            "loaded story directory"
        );
        Ok(outcome)
    }

    pub fn built_in(&self) -> &[Story] {
        &self.built_in
    }

    /// Built-in stories followed by the store's custom stories.
    pub fn all_stories<'a>(&'a self, store: &'a ProgressStore) -> Vec<&'a Story> {
        self.built_in
            .iter()
            .chain(store.custom_stories().iter())
            .collect()
    }

    /// Look up a story by id across both sources.
    pub fn story<'a>(&'a self, store: &'a ProgressStore, story_id: &str) -> Option<&'a Story> {
        self.built_in
            .iter()
            .find(|s| s.id == story_id)
            .or_else(|| store.custom_stories().iter().find(|s| s.id == story_id))
    }

    /// Look up one node of one story.
    pub fn node<'a>(
        &'a self,
        store: &'a ProgressStore,
        story_id: &str,
        node_id: &str,
    ) -> Option<&'a StoryNode> {
        self.story(store, story_id)?.node(node_id)
    }

    /// Validate and persist a custom story document. The story is marked
    /// custom regardless of what the document claims.
    pub fn ingest_story(
        &self,
        store: &mut ProgressStore,
        document: &str,
    ) -> Result<Story, RepositoryError> {
        let mut story = Story::from_document_str(document)?;
        let taken = self.built_in.iter().any(|s| s.id == story.id)
            || store.custom_stories().iter().any(|s| s.id == story.id);
        if taken {
            return Err(RepositoryError::DuplicateId(story.id));
        }
        story.is_custom = true;
        store.add_custom_story(story.clone())?;
        info!(story = %story.id, "ingested custom story");
        Ok(story)
    }

    /// Remove a custom story. Built-in stories cannot be deleted.
    pub fn delete_custom_story(
        &self,
        store: &mut ProgressStore,
        story_id: &str,
    ) -> Result<bool, RepositoryError> {
        Ok(store.delete_custom_story(story_id)?)
    }

    /// Expand a story into its cycle-safe overview tree.
    pub fn story_tree(&self, store: &ProgressStore, story_id: &str) -> Option<StoryTree> {
        let story = self.story(store, story_id)?;
        let mut path = Vec::new();
        let root = expand_node(story, &story.start_node, &mut path)?;
        Some(StoryTree {
            story_id: story.id.clone(),
            title: story.title.clone(),
            root,
        })
    }
}

/// Node/ending counts for one story.
pub fn story_stats(story: &Story) -> StoryStats {
    let endings: Vec<_> = story.nodes.values().filter(|n| n.is_ending).collect();
    StoryStats {
        total_nodes: story.nodes.len(),
        total_endings: endings.len(),
        good_endings: endings
            .iter()
            .filter(|n| n.ending_kind() == EndingType::Good)
            .count(),
    }
}

fn load_file(path: &Path) -> Result<Story, RepositoryError> {
    let text = fs::read_to_string(path)?;
    Ok(Story::from_document_str(&text)?)
}

/// Depth-first expansion. `path` holds the node ids from the root to the
/// current node; revisiting one of those emits a circular marker instead
/// of recursing. Reconvergence via a different path expands normally.
fn expand_node(story: &Story, node_id: &str, path: &mut Vec<String>) -> Option<TreeNode> {
    let node = story.node(node_id)?;

    if path.iter().any(|id| id == node_id) {
        return Some(TreeNode {
            node_id: node_id.to_string(),
            summary: node.short_summary(),
            emoji: node.emoji.clone(),
            is_ending: node.is_ending,
            ending_type: node.ending_type,
            circular: true,
            children: Vec::new(),
        });
    }

    path.push(node_id.to_string());
    let children = node
        .choices
        .iter()
        .map(|choice| TreeEdge {
            choice_text: choice.text.clone(),
            child: expand_node(story, &choice.next_node_id, path),
        })
        .collect();
    path.pop();

    Some(TreeNode {
        node_id: node_id.to_string(),
        summary: node.short_summary(),
        emoji: node.emoji.clone(),
        is_ending: node.is_ending,
        ending_type: node.ending_type,
        circular: false,
        children,
    })
}
