//! Persisted state records: per-story progress, unlock collections,
//! settings, and backup shapes. Timestamps are epoch milliseconds to match
//! the `.adventure` ecosystem's wire format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::player::PlayerPair;
use super::story::{EndingType, Story};

/// Progress for one story id.
///
/// `times_played` only increases. `current_node` and `visited_nodes` are
/// cleared exactly when an ending is reached and repopulated on new
/// navigation; an abandoned mid-story pointer never expires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryProgress {
    #[serde(default)]
    pub times_played: u32,
    #[serde(default)]
    pub last_played: Option<i64>,
    #[serde(default)]
    pub current_node: Option<String>,
    /// Distinct visited node ids for the in-progress run, first-visit order.
    #[serde(default)]
    pub visited_nodes: Vec<String>,
    /// Distinct ending types ever reached. Never loses an entry.
    #[serde(default)]
    pub endings: Vec<EndingType>,
    /// Distinct specific endings ever reached, with unlock stamps.
    #[serde(default)]
    pub endings_data: Vec<EndingUnlock>,
}

/// A specific ending unlocked within one story's progress record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndingUnlock {
    pub id: String,
    #[serde(rename = "type")]
    pub ending_type: EndingType,
    pub unlocked_at: i64,
}

/// Entry in the global endings collection, keyed `"storyId:endingId"`.
/// Monotonically growing, updated in lockstep with [`StoryProgress`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedEnding {
    pub story_id: String,
    pub ending_id: String,
    #[serde(rename = "type")]
    pub ending_type: EndingType,
    pub unlocked_at: i64,
}

/// Page transition style used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TransitionType {
    #[default]
    #[serde(rename = "page-turn")]
    PageTurn,
    #[serde(rename = "card-flip")]
    CardFlip,
    #[serde(rename = "swipe")]
    Swipe,
}

/// Reader settings. The engine only stores these; honoring them is the
/// presentation layer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub sound_enabled: bool,
    pub typewriter_enabled: bool,
    pub transition_type: TransitionType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            typewriter_enabled: true,
            transition_type: TransitionType::PageTurn,
        }
    }
}

/// Remote generator credentials. Persisted namespace only — the engine
/// never performs HTTP itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub provider: String,
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            api_key: String::new(),
        }
    }
}

/// Aggregate play statistics derived from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayStats {
    pub total_plays: u32,
    pub stories_completed: usize,
    pub achievements_unlocked: usize,
    pub endings_collected: usize,
    pub total_achievements: usize,
}

/// Full-data backup record for export/import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedData {
    pub players: Option<PlayerPair>,
    pub progress: HashMap<String, StoryProgress>,
    pub achievements: Vec<String>,
    pub settings: Settings,
    pub endings: HashMap<String, CollectedEnding>,
    pub theme: String,
    pub custom_stories: Vec<Story>,
    pub exported_at: i64,
}
