//! Durable key/value store over named logical namespaces.
//!
//! Each namespace (players, progress, achievements, …) lives in its own
//! JSON file under the store root and is replaced atomically — temp file
//! then rename — on every mutation, so a reader never observes a
//! half-written record. Every read has a well-defined default when the
//! namespace is absent. [`ProgressStore::in_memory`] skips the disk
//! entirely for tests and ephemeral sessions.
//!
//! The engine is the sole writer within a session; concurrent instances
//! over one root are last-writer-wins.

use chrono::Utc;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::achievements;
use crate::schema::player::PlayerPair;
use crate::schema::progress::{
    ApiConfig, CollectedEnding, EndingUnlock, ExportedData, PlayStats, Settings, StoryProgress,
};
use crate::schema::story::{EndingType, Story};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The logical namespaces, one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Players,
    ApiConfig,
    Progress,
    CustomStories,
    Theme,
    Achievements,
    Settings,
    Endings,
}

impl Namespace {
    const ALL: [Namespace; 8] = [
        Namespace::Players,
        Namespace::ApiConfig,
        Namespace::Progress,
        Namespace::CustomStories,
        Namespace::Theme,
        Namespace::Achievements,
        Namespace::Settings,
        Namespace::Endings,
    ];

    fn file_name(self) -> &'static str {
        match self {
            Namespace::Players => "players.json",
            Namespace::ApiConfig => "api_config.json",
            Namespace::Progress => "progress.json",
            Namespace::CustomStories => "custom_stories.json",
            Namespace::Theme => "theme.json",
            Namespace::Achievements => "achievements.json",
            Namespace::Settings => "settings.json",
            Namespace::Endings => "endings.json",
        }
    }
}

#[derive(Debug)]
struct StoreData {
    players: Option<PlayerPair>,
    api_config: ApiConfig,
    progress: HashMap<String, StoryProgress>,
    custom_stories: Vec<Story>,
    theme: String,
    achievements: Vec<String>,
    settings: Settings,
    endings: HashMap<String, CollectedEnding>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            players: None,
            api_config: ApiConfig::default(),
            progress: HashMap::new(),
            custom_stories: Vec::new(),
            theme: "dark".to_string(),
            achievements: Vec::new(),
            settings: Settings::default(),
            endings: HashMap::new(),
        }
    }
}

/// Write-through persistence for players, progress, unlocks, settings, and
/// user-generated stories.
#[derive(Debug)]
pub struct ProgressStore {
    root: Option<PathBuf>,
    data: StoreData,
}

impl ProgressStore {
    /// Open (or create) a store rooted at a directory. Absent namespaces
    /// yield their defaults; a corrupt namespace file is an error rather
    /// than silent data loss.
    pub fn open(root: impl Into<PathBuf>) -> Result<ProgressStore, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let mut data = StoreData::default();
        if let Some(players) = read_namespace(&root, Namespace::Players)? {
            data.players = players;
        }
        if let Some(api_config) = read_namespace(&root, Namespace::ApiConfig)? {
            data.api_config = api_config;
        }
        if let Some(progress) = read_namespace(&root, Namespace::Progress)? {
            data.progress = progress;
        }
        if let Some(stories) = read_namespace(&root, Namespace::CustomStories)? {
            data.custom_stories = stories;
        }
        if let Some(theme) = read_namespace(&root, Namespace::Theme)? {
            data.theme = theme;
        }
        if let Some(achievements) = read_namespace(&root, Namespace::Achievements)? {
            data.achievements = achievements;
        }
        if let Some(settings) = read_namespace(&root, Namespace::Settings)? {
            data.settings = settings;
        }
        if let Some(endings) = read_namespace(&root, Namespace::Endings)? {
            data.endings = endings;
        }

        debug!(root = %root.display(), "opened progress store");
        Ok(ProgressStore {
            root: Some(root),
            data,
        })
    }

    /// A store with no backing directory. All operations behave the same
    /// but nothing survives the process.
    pub fn in_memory() -> ProgressStore {
        ProgressStore {
            root: None,
            data: StoreData::default(),
        }
    }

    // --- theme ---

    pub fn theme(&self) -> &str {
        &self.data.theme
    }

    pub fn set_theme(&mut self, theme: impl Into<String>) -> Result<(), StoreError> {
        self.data.theme = theme.into();
        self.persist(Namespace::Theme)
    }

    // --- players ---

    pub fn players(&self) -> Option<&PlayerPair> {
        self.data.players.as_ref()
    }

    pub fn save_players(&mut self, players: PlayerPair) -> Result<(), StoreError> {
        self.data.players = Some(players);
        self.persist(Namespace::Players)
    }

    // --- api config ---

    pub fn api_config(&self) -> &ApiConfig {
        &self.data.api_config
    }

    pub fn save_api_config(&mut self, config: ApiConfig) -> Result<(), StoreError> {
        self.data.api_config = config;
        self.persist(Namespace::ApiConfig)
    }

    // --- per-story progress ---

    pub fn progress(&self, story_id: &str) -> Option<&StoryProgress> {
        self.data.progress.get(story_id)
    }

    pub fn all_progress(&self) -> &HashMap<String, StoryProgress> {
        &self.data.progress
    }

    /// Upsert the in-progress pointer and visited list for a story without
    /// touching completion counters.
    pub fn save_progress(
        &mut self,
        story_id: &str,
        node_id: &str,
        visited_nodes: &[String],
    ) -> Result<(), StoreError> {
        let entry = self.data.progress.entry(story_id.to_string()).or_default();
        entry.current_node = Some(node_id.to_string());
        entry.last_played = Some(Utc::now().timestamp_millis());
        entry.visited_nodes = visited_nodes.to_vec();
        self.persist(Namespace::Progress)
    }

    /// Record a completed run: bump `times_played`, clear in-progress
    /// state, and record the ending type plus (when given) the specific
    /// ending id — mirrored into the global endings collection. Returns
    /// whether this story reached this ending type for the first time.
    pub fn complete_story(
        &mut self,
        story_id: &str,
        ending_type: EndingType,
        ending_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let now = Utc::now().timestamp_millis();
        let entry = self.data.progress.entry(story_id.to_string()).or_default();

        let is_first_completion = !entry.endings.contains(&ending_type);

        entry.times_played += 1;
        entry.last_played = Some(now);
        entry.current_node = None;
        entry.visited_nodes.clear();

        if is_first_completion {
            entry.endings.push(ending_type);
        }
        if let Some(id) = ending_id {
            if !entry.endings_data.iter().any(|e| e.id == id) {
                entry.endings_data.push(EndingUnlock {
                    id: id.to_string(),
                    ending_type,
                    unlocked_at: now,
                });
            }
        }
        self.persist(Namespace::Progress)?;

        // Lockstep update of the global collection, with a synthesized id
        // when the ending node carries none.
        let collection_id = ending_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("{story_id}_{}", ending_type.tag()));
        self.track_ending(story_id, &collection_id, ending_type)?;

        Ok(is_first_completion)
    }

    /// Stories with at least one completed run.
    pub fn completions(&self) -> Vec<(&str, &StoryProgress)> {
        self.data
            .progress
            .iter()
            .filter(|(_, p)| p.times_played > 0)
            .map(|(id, p)| (id.as_str(), p))
            .collect()
    }

    // --- endings collection ---

    /// Add an entry to the global endings collection. Returns true when
    /// the ending is newly collected; re-collecting is a no-op.
    pub fn track_ending(
        &mut self,
        story_id: &str,
        ending_id: &str,
        ending_type: EndingType,
    ) -> Result<bool, StoreError> {
        let key = format!("{story_id}:{ending_id}");
        if self.data.endings.contains_key(&key) {
            return Ok(false);
        }
        self.data.endings.insert(
            key,
            CollectedEnding {
                story_id: story_id.to_string(),
                ending_id: ending_id.to_string(),
                ending_type,
                unlocked_at: Utc::now().timestamp_millis(),
            },
        );
        self.persist(Namespace::Endings)?;
        Ok(true)
    }

    pub fn endings(&self) -> &HashMap<String, CollectedEnding> {
        &self.data.endings
    }

    pub fn endings_for_story(&self, story_id: &str) -> Vec<&CollectedEnding> {
        self.data
            .endings
            .values()
            .filter(|e| e.story_id == story_id)
            .collect()
    }

    pub fn endings_count(&self) -> usize {
        self.data.endings.len()
    }

    // --- user-generated stories ---

    pub fn custom_stories(&self) -> &[Story] {
        &self.data.custom_stories
    }

    pub fn add_custom_story(&mut self, story: Story) -> Result<(), StoreError> {
        self.data.custom_stories.push(story);
        self.persist(Namespace::CustomStories)
    }

    /// Remove a user-generated story. Returns whether anything was removed.
    pub fn delete_custom_story(&mut self, story_id: &str) -> Result<bool, StoreError> {
        let before = self.data.custom_stories.len();
        self.data.custom_stories.retain(|s| s.id != story_id);
        if self.data.custom_stories.len() == before {
            return Ok(false);
        }
        self.persist(Namespace::CustomStories)?;
        Ok(true)
    }

    // --- achievements ---

    pub fn achievements(&self) -> &[String] {
        &self.data.achievements
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.data.achievements.iter().any(|a| a == id)
    }

    /// Grant an achievement. Returns true when newly unlocked; granting a
    /// held achievement is a no-op, never an error.
    pub fn add_achievement(&mut self, id: &str) -> Result<bool, StoreError> {
        if self.has_achievement(id) {
            return Ok(false);
        }
        self.data.achievements.push(id.to_string());
        self.persist(Namespace::Achievements)?;
        Ok(true)
    }

    // --- settings ---

    pub fn settings(&self) -> &Settings {
        &self.data.settings
    }

    pub fn save_settings(&mut self, settings: Settings) -> Result<(), StoreError> {
        self.data.settings = settings;
        self.persist(Namespace::Settings)
    }

    // --- statistics and data management ---

    pub fn stats(&self) -> PlayStats {
        let total_plays = self.data.progress.values().map(|p| p.times_played).sum();
        let stories_completed = self
            .data
            .progress
            .values()
            .filter(|p| p.times_played > 0)
            .count();
        PlayStats {
            total_plays,
            stories_completed,
            achievements_unlocked: self.data.achievements.len(),
            endings_collected: self.data.endings.len(),
            total_achievements: achievements::catalog().len(),
        }
    }

    /// Snapshot all user data for backup.
    pub fn export(&self) -> ExportedData {
        ExportedData {
            players: self.data.players.clone(),
            progress: self.data.progress.clone(),
            achievements: self.data.achievements.clone(),
            settings: self.data.settings.clone(),
            endings: self.data.endings.clone(),
            theme: self.data.theme.clone(),
            custom_stories: self.data.custom_stories.clone(),
            exported_at: Utc::now().timestamp_millis(),
        }
    }

    /// Replace all namespaces from a backup snapshot.
    pub fn import(&mut self, data: ExportedData) -> Result<(), StoreError> {
        self.data.players = data.players;
        self.data.progress = data.progress;
        self.data.achievements = data.achievements;
        self.data.settings = data.settings;
        self.data.endings = data.endings;
        self.data.theme = data.theme;
        self.data.custom_stories = data.custom_stories;
        for ns in Namespace::ALL {
            self.persist(ns)?;
        }
        Ok(())
    }

    /// Full data reset — the only operation that shrinks unlock state.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.data = StoreData::default();
        if let Some(root) = self.root.clone() {
            for ns in Namespace::ALL {
                match fs::remove_file(root.join(ns.file_name())) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }

    fn persist(&self, ns: Namespace) -> Result<(), StoreError> {
        let Some(ref root) = self.root else {
            return Ok(());
        };
        let bytes = match ns {
            Namespace::Players => serde_json::to_vec_pretty(&self.data.players)?,
            Namespace::ApiConfig => serde_json::to_vec_pretty(&self.data.api_config)?,
            Namespace::Progress => serde_json::to_vec_pretty(&self.data.progress)?,
            Namespace::CustomStories => serde_json::to_vec_pretty(&self.data.custom_stories)?,
            Namespace::Theme => serde_json::to_vec_pretty(&self.data.theme)?,
            Namespace::Achievements => serde_json::to_vec_pretty(&self.data.achievements)?,
            Namespace::Settings => serde_json::to_vec_pretty(&self.data.settings)?,
            Namespace::Endings => serde_json::to_vec_pretty(&self.data.endings)?,
        };
        atomic_write(&root.join(ns.file_name()), &bytes)?;
        debug!(namespace = ns.file_name(), "persisted namespace");
        Ok(())
    }
}

fn read_namespace<T: DeserializeOwned>(
    root: &Path,
    ns: Namespace,
) -> Result<Option<T>, StoreError> {
    let path = root.join(ns.file_name());
    match fs::read_to_string(&path) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replace a namespace file atomically: write a sibling temp file, then
/// rename over the target.
fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
