//! The navigation engine: one reading session over one story.
//!
//! A reader owns a snapshot of its story plus the run state (current node,
//! visited list) and writes progress through to the store on every step.
//! Reaching an ending records the completion and evaluates achievements in
//! the same step, so a crash can never leave a completed run unrecorded
//! behind an unlocked achievement.

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::achievements::{self, AchievementDef, CompletionEvent};
use crate::core::repository::StoryRepository;
use crate::core::store::{ProgressStore, StoreError};
use crate::core::variables::VariableSet;
use crate::schema::story::{EndingType, Story, StoryNode};

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("no story with id '{0}'")]
    StoryNotFound(String),
    #[error("story '{story}' has no node '{node}'")]
    NodeNotFound { story: String, node: String },
    #[error("node '{node}' has no choice {index}")]
    NoSuchChoice { node: String, index: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a navigation step produced.
#[derive(Debug)]
pub enum NavOutcome {
    /// Landed on a choice-bearing node; the session continues.
    Continued,
    /// Landed on an ending; the run is recorded and over.
    Completed(CompletionSummary),
}

/// Everything recorded when a run reaches an ending.
#[derive(Debug)]
pub struct CompletionSummary {
    pub ending_type: EndingType,
    pub ending_id: String,
    /// True when this story reached this ending type for the first time.
    pub first_of_type: bool,
    pub new_achievements: Vec<&'static AchievementDef>,
}

/// One reading session. Holds its own copy of the story so catalog
/// mutations mid-session cannot pull the graph out from under it.
#[derive(Debug)]
pub struct Reader {
    story: Story,
    current: String,
    visited: Vec<String>,
    completed: bool,
}

impl Reader {
    /// Begin (or resume) a session. With saved progress the reader picks
    /// up at the stored node with the stored visited list; a stored node
    /// the story no longer defines falls back to the start node.
    pub fn start(
        repository: &StoryRepository,
        store: &mut ProgressStore,
        story_id: &str,
    ) -> Result<(Reader, NavOutcome), ReaderError> {
        let story = repository
            .story(store, story_id)
            .ok_or_else(|| ReaderError::StoryNotFound(story_id.to_string()))?
            .clone();

        let mut visited = Vec::new();
        let mut entry = story.start_node.clone();
        if let Some(progress) = store.progress(&story.id) {
            if let Some(ref saved) = progress.current_node {
                if story.node(saved).is_some() {
                    entry = saved.clone();
                    visited = progress.visited_nodes.clone();
                } else {
                    warn!(story = %story.id, node = %saved, "saved node is gone, restarting");
                }
            }
        }

        let mut reader = Reader {
            story,
            current: entry,
            visited,
            completed: false,
        };
        let outcome = reader.enter_current(store)?;
        Ok((reader, outcome))
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    /// The node the session is currently on.
    pub fn current_node(&self) -> Option<&StoryNode> {
        self.story.node(&self.current)
    }

    /// Distinct node ids visited this run, first-visit order.
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// The current node with variable substitution applied.
    pub fn rendered_node(&self, variables: &VariableSet) -> Option<StoryNode> {
        self.current_node().map(|n| variables.substitute_node(n))
    }

    /// Jump to a node by id. An unknown id is an error and leaves the
    /// session state untouched.
    pub fn navigate_to(
        &mut self,
        store: &mut ProgressStore,
        node_id: &str,
    ) -> Result<NavOutcome, ReaderError> {
        if self.story.node(node_id).is_none() {
            return Err(ReaderError::NodeNotFound {
                story: self.story.id.clone(),
                node: node_id.to_string(),
            });
        }
        self.current = node_id.to_string();
        self.completed = false;
        self.enter_current(store)
    }

    /// Follow a choice from the current node.
    pub fn make_choice(
        &mut self,
        store: &mut ProgressStore,
        choice_index: usize,
    ) -> Result<NavOutcome, ReaderError> {
        let target = self
            .current_node()
            .and_then(|n| n.choices.get(choice_index))
            .map(|c| c.next_node_id.clone())
            .ok_or_else(|| ReaderError::NoSuchChoice {
                node: self.current.clone(),
                index: choice_index,
            })?;
        self.navigate_to(store, &target)
    }

    /// Drop the run state and re-enter the start node.
    pub fn restart(&mut self, store: &mut ProgressStore) -> Result<NavOutcome, ReaderError> {
        self.visited.clear();
        self.current = self.story.start_node.clone();
        self.completed = false;
        self.enter_current(store)
    }

    /// Record arrival at `self.current`: extend the visited list, then
    /// either persist in-progress state or record the completion.
    fn enter_current(&mut self, store: &mut ProgressStore) -> Result<NavOutcome, ReaderError> {
        if !self.visited.iter().any(|v| v == &self.current) {
            self.visited.push(self.current.clone());
        }

        let node = match self.story.node(&self.current) {
            Some(node) => node.clone(),
            None => {
                return Err(ReaderError::NodeNotFound {
                    story: self.story.id.clone(),
                    node: self.current.clone(),
                })
            }
        };

        if !node.is_ending {
            store.save_progress(&self.story.id, &self.current, &self.visited)?;
            debug!(story = %self.story.id, node = %self.current, "advanced");
            return Ok(NavOutcome::Continued);
        }

        let ending_type = node.ending_kind();
        let first_of_type = store.complete_story(&self.story.id, ending_type, Some(&node.id))?;
        self.completed = true;

        let event = CompletionEvent {
            completed_story_count: store.completions().len(),
            ending_type,
            first_of_type,
            visited_count: self.visited.len(),
        };
        let earned = achievements::evaluate(store.achievements(), event);
        let mut new_achievements = Vec::with_capacity(earned.len());
        for def in earned {
            if store.add_achievement(def.id)? {
                new_achievements.push(def);
            }
        }

        debug!(
            story = %self.story.id,
            ending = %node.id,
            kind = ending_type.tag(),
            unlocked = new_achievements.len(),
            "completed"
        );
        Ok(NavOutcome::Completed(CompletionSummary {
            ending_type,
            ending_id: node.id.clone(),
            first_of_type,
            new_achievements,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::story::Story;

    fn fork_story() -> Story {
        Story::from_document_str(
            r#"{
                "id": "fork",
                "title": "The Fork",
                "startNode": "start",
                "nodes": {
                    "start": {
                        "id": "start",
                        "text": "A fork in the road.",
                        "choices": [
                            {"text": "Left", "nextNodeId": "cave"},
                            {"text": "Right", "nextNodeId": "pit"}
                        ]
                    },
                    "cave": {
                        "id": "cave",
                        "text": "Treasure!",
                        "isEnding": true,
                        "endingType": "good"
                    },
                    "pit": {
                        "id": "pit",
                        "text": "Oof.",
                        "isEnding": true,
                        "endingType": "bad"
                    }
                }
            }"#,
        )
        .unwrap()
    }

    fn setup() -> (StoryRepository, ProgressStore) {
        let mut repo = StoryRepository::new();
        repo.add_built_in(fork_story()).unwrap();
        (repo, ProgressStore::in_memory())
    }

    #[test]
    fn start_enters_start_node_and_persists() {
        let (repo, mut store) = setup();
        let (reader, outcome) = Reader::start(&repo, &mut store, "fork").unwrap();
        assert!(matches!(outcome, NavOutcome::Continued));
        assert_eq!(reader.current_node().unwrap().id, "start");
        assert_eq!(reader.visited(), ["start"]);
        assert_eq!(
            store.progress("fork").unwrap().current_node.as_deref(),
            Some("start")
        );
    }

    #[test]
    fn unknown_story_is_an_error() {
        let (repo, mut store) = setup();
        assert!(matches!(
            Reader::start(&repo, &mut store, "nope"),
            Err(ReaderError::StoryNotFound(_))
        ));
    }

    #[test]
    fn choice_to_good_ending_records_everything() {
        let (repo, mut store) = setup();
        let (mut reader, _) = Reader::start(&repo, &mut store, "fork").unwrap();

        let outcome = reader.make_choice(&mut store, 0).unwrap();
        let summary = match outcome {
            NavOutcome::Completed(s) => s,
            NavOutcome::Continued => panic!("expected completion"),
        };
        assert_eq!(summary.ending_type, EndingType::Good);
        assert_eq!(summary.ending_id, "cave");
        assert!(summary.first_of_type);
        let unlocked: Vec<_> = summary.new_achievements.iter().map(|d| d.id).collect();
        assert_eq!(unlocked, vec!["first_story", "first_good_ending"]);

        assert!(reader.is_completed());
        assert_eq!(reader.visited(), ["start", "cave"]);
        let p = store.progress("fork").unwrap();
        assert_eq!(p.times_played, 1);
        assert!(p.current_node.is_none());
        assert_eq!(p.endings, vec![EndingType::Good]);
        assert!(store.has_achievement("first_good_ending"));
        assert!(store.endings().contains_key("fork:cave"));
    }

    #[test]
    fn replaying_same_ending_is_not_a_first() {
        let (repo, mut store) = setup();
        let (mut reader, _) = Reader::start(&repo, &mut store, "fork").unwrap();
        reader.make_choice(&mut store, 0).unwrap();

        let (mut reader, _) = Reader::start(&repo, &mut store, "fork").unwrap();
        let outcome = reader.make_choice(&mut store, 0).unwrap();
        let summary = match outcome {
            NavOutcome::Completed(s) => s,
            NavOutcome::Continued => panic!("expected completion"),
        };
        assert!(!summary.first_of_type);
        assert!(summary.new_achievements.is_empty());
        assert_eq!(store.progress("fork").unwrap().times_played, 2);
        assert_eq!(store.achievements().len(), 2);
    }

    #[test]
    fn bad_ending_skips_happy_ending_achievement() {
        let (repo, mut store) = setup();
        let (mut reader, _) = Reader::start(&repo, &mut store, "fork").unwrap();
        let outcome = reader.make_choice(&mut store, 1).unwrap();
        let summary = match outcome {
            NavOutcome::Completed(s) => s,
            NavOutcome::Continued => panic!("expected completion"),
        };
        assert_eq!(summary.ending_type, EndingType::Bad);
        let unlocked: Vec<_> = summary.new_achievements.iter().map(|d| d.id).collect();
        assert_eq!(unlocked, vec!["first_story"]);
        assert!(!store.has_achievement("first_good_ending"));
    }

    #[test]
    fn bad_navigation_leaves_state_untouched() {
        let (repo, mut store) = setup();
        let (mut reader, _) = Reader::start(&repo, &mut store, "fork").unwrap();

        assert!(matches!(
            reader.navigate_to(&mut store, "nowhere"),
            Err(ReaderError::NodeNotFound { .. })
        ));
        assert!(matches!(
            reader.make_choice(&mut store, 9),
            Err(ReaderError::NoSuchChoice { index: 9, .. })
        ));
        assert_eq!(reader.current_node().unwrap().id, "start");
        assert_eq!(reader.visited(), ["start"]);
    }

    #[test]
    fn resume_picks_up_saved_node_and_visited() {
        let story = Story::from_document_str(
            r#"{
                "id": "long",
                "title": "Long Road",
                "startNode": "a",
                "nodes": {
                    "a": {"id": "a", "text": "One", "choices": [{"text": "on", "nextNodeId": "b"}]},
                    "b": {"id": "b", "text": "Two", "choices": [{"text": "on", "nextNodeId": "c"}]},
                    "c": {"id": "c", "text": "End", "isEnding": true}
                }
            }"#,
        )
        .unwrap();
        let mut repo = StoryRepository::new();
        repo.add_built_in(story).unwrap();
        let mut store = ProgressStore::in_memory();

        let (mut reader, _) = Reader::start(&repo, &mut store, "long").unwrap();
        reader.make_choice(&mut store, 0).unwrap();
        drop(reader);

        let (reader, outcome) = Reader::start(&repo, &mut store, "long").unwrap();
        assert!(matches!(outcome, NavOutcome::Continued));
        assert_eq!(reader.current_node().unwrap().id, "b");
        assert_eq!(reader.visited(), ["a", "b"]);
    }

    #[test]
    fn stale_saved_node_falls_back_to_start() {
        let (repo, mut store) = setup();
        store
            .save_progress("fork", "removed-node", &["removed-node".to_string()])
            .unwrap();
        let (reader, _) = Reader::start(&repo, &mut store, "fork").unwrap();
        assert_eq!(reader.current_node().unwrap().id, "start");
        assert_eq!(reader.visited(), ["start"]);
    }

    #[test]
    fn restart_clears_run_state() {
        let (repo, mut store) = setup();
        let (mut reader, _) = Reader::start(&repo, &mut store, "fork").unwrap();
        reader.make_choice(&mut store, 1).unwrap();
        assert!(reader.is_completed());

        let outcome = reader.restart(&mut store).unwrap();
        assert!(matches!(outcome, NavOutcome::Continued));
        assert!(!reader.is_completed());
        assert_eq!(reader.visited(), ["start"]);
        assert_eq!(
            store.progress("fork").unwrap().current_node.as_deref(),
            Some("start")
        );
        // Completion history survives the restart.
        assert_eq!(store.progress("fork").unwrap().times_played, 1);
    }

    #[test]
    fn revisits_do_not_duplicate_visited_entries() {
        let story = Story::from_document_str(
            r#"{
                "id": "loop",
                "title": "Loop",
                "startNode": "a",
                "nodes": {
                    "a": {"id": "a", "text": "Here", "choices": [
                        {"text": "around", "nextNodeId": "b"}
                    ]},
                    "b": {"id": "b", "text": "There", "choices": [
                        {"text": "back", "nextNodeId": "a"},
                        {"text": "out", "nextNodeId": "end"}
                    ]},
                    "end": {"id": "end", "text": "Out", "isEnding": true}
                }
            }"#,
        )
        .unwrap();
        let mut repo = StoryRepository::new();
        repo.add_built_in(story).unwrap();
        let mut store = ProgressStore::in_memory();

        let (mut reader, _) = Reader::start(&repo, &mut store, "loop").unwrap();
        reader.make_choice(&mut store, 0).unwrap();
        reader.make_choice(&mut store, 0).unwrap();
        reader.make_choice(&mut store, 0).unwrap();
        assert_eq!(reader.visited(), ["a", "b"]);
    }

    #[test]
    fn rendered_node_applies_variables() {
        use crate::schema::player::{PlayerPair, PlayerProfile, Pronoun};

        let story = Story::from_document_str(
            r#"{
                "id": "named",
                "title": "Named",
                "startNode": "a",
                "nodes": {
                    "a": {"id": "a", "text": "{{PLAYER1_NAME}} waves.", "choices": [
                        {"text": "Wave back", "nextNodeId": "a"}
                    ]}
                }
            }"#,
        )
        .unwrap();
        let mut repo = StoryRepository::new();
        repo.add_built_in(story).unwrap();
        let mut store = ProgressStore::in_memory();

        let vars = VariableSet::from_players(&PlayerPair {
            player1: PlayerProfile::new("Ava", Pronoun::She),
            player2: PlayerProfile::new("Milo", Pronoun::He),
        });
        let (reader, _) = Reader::start(&repo, &mut store, "named").unwrap();
        let rendered = reader.rendered_node(&vars).unwrap();
        assert_eq!(rendered.text, "Ava waves.");
    }
}
