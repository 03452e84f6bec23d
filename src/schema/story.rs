//! Story graph types and `.adventure` document normalization.
//!
//! A story is a directed graph of nodes; cycles and reconvergence are
//! permitted, so nothing in here may assume a tree. Two wire shapes are
//! accepted — the legacy flat layout and the metadata-wrapped `.adventure`
//! layout — and both normalize into the canonical [`Story`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Rejection reasons for a story document. One bad document never aborts a
/// batch load; callers collect these per item.
#[derive(Debug, Error)]
pub enum StoryFormatError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("story document has an empty id")]
    MissingId,
    #[error("story '{0}' has no nodes")]
    EmptyStory(String),
    #[error("story '{story}': start node '{node}' does not exist")]
    MissingStartNode { story: String, node: String },
    #[error("story '{story}': node '{node}' is both choice-bearing and an ending")]
    AmbiguousNode { story: String, node: String },
    #[error("story '{story}': node '{node}' has neither choices nor ending markers")]
    DeadEndNode { story: String, node: String },
}

/// The categorical outcome carried by an ending node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndingType {
    Good,
    Bad,
    Neutral,
}

impl EndingType {
    /// Wire/display string: "good", "bad", "neutral".
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Bad => "bad",
            Self::Neutral => "neutral",
        }
    }
}

/// A labeled directed edge from one node to another. The target should
/// exist in the same story; a dangling target is a data error surfaced at
/// navigation time, never a panic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    pub next_node_id: String,
}

/// A single narrative beat. Exactly one of: choice-bearing (non-empty
/// `choices`) or an ending (`is_ending` with optional wrap-up fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Short human-readable summary for overview tooling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_ending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_type: Option<EndingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_title: Option<String>,
}

impl StoryNode {
    /// Ending type with the wire default of `neutral` applied.
    pub fn ending_kind(&self) -> EndingType {
        self.ending_type.unwrap_or(EndingType::Neutral)
    }

    /// The authored summary, or a short excerpt of the narrative text.
    pub fn short_summary(&self) -> String {
        if let Some(ref s) = self.summary {
            return s.clone();
        }
        let words: Vec<&str> = self.text.split_whitespace().collect();
        if words.len() > 5 {
            format!("{}...", words[..5].join(" "))
        } else {
            words.join(" ")
        }
    }
}

/// Canonical in-memory story. This is also the legacy flat wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub themes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_notes: Vec<String>,
    pub start_node: String,
    pub nodes: HashMap<String, StoryNode>,
    /// True for user-generated stories held in the persistence store.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<u32>,
}

/// Story metadata block of the wrapped `.adventure` shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_emoji: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub content_notes: Vec<String>,
    pub start_node: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The metadata-wrapped `.adventure` wire shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedStory {
    pub metadata: StoryMetadata,
    pub nodes: HashMap<String, StoryNode>,
    #[serde(default)]
    pub format_version: Option<u32>,
}

/// Sum type over the two accepted wire shapes. Anything fitting neither is
/// rejected at parse time as a malformed document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoryDocument {
    Wrapped(WrappedStory),
    Flat(Story),
}

impl StoryDocument {
    /// Parse a document from JSON text.
    pub fn parse(input: &str) -> Result<StoryDocument, StoryFormatError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Collapse either shape into the canonical story.
    pub fn normalize(self) -> Story {
        match self {
            StoryDocument::Flat(story) => story,
            StoryDocument::Wrapped(wrapped) => {
                let m = wrapped.metadata;
                Story {
                    id: m.id,
                    title: m.title,
                    author: m.author,
                    description: m.description,
                    cover_emoji: m.cover_emoji,
                    cover_image: m.cover_image,
                    age_range: m.age_range,
                    estimated_minutes: m.estimated_minutes,
                    themes: m.themes,
                    content_notes: m.content_notes,
                    start_node: m.start_node,
                    nodes: wrapped.nodes,
                    is_custom: false,
                    created_at: m.created_at,
                    updated_at: m.updated_at,
                    format_version: wrapped.format_version,
                }
            }
        }
    }
}

impl Story {
    /// Parse, normalize, and validate a document in one step.
    pub fn from_document_str(input: &str) -> Result<Story, StoryFormatError> {
        let story = StoryDocument::parse(input)?.normalize();
        story.validate()?;
        Ok(story)
    }

    /// Structural validation: non-empty id and node map, resolvable start
    /// node, and every node exactly one of choice-bearing or ending.
    /// Dangling choice targets are deliberately NOT an error here — they
    /// surface as navigation failures (and lint warnings), not load errors.
    pub fn validate(&self) -> Result<(), StoryFormatError> {
        if self.id.trim().is_empty() {
            return Err(StoryFormatError::MissingId);
        }
        if self.nodes.is_empty() {
            return Err(StoryFormatError::EmptyStory(self.id.clone()));
        }
        if !self.nodes.contains_key(&self.start_node) {
            return Err(StoryFormatError::MissingStartNode {
                story: self.id.clone(),
                node: self.start_node.clone(),
            });
        }
        for (key, node) in &self.nodes {
            if node.is_ending && !node.choices.is_empty() {
                return Err(StoryFormatError::AmbiguousNode {
                    story: self.id.clone(),
                    node: key.clone(),
                });
            }
            if !node.is_ending && node.choices.is_empty() {
                return Err(StoryFormatError::DeadEndNode {
                    story: self.id.clone(),
                    node: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<&StoryNode> {
        self.nodes.get(node_id)
    }
}
