//! Achievement catalog and unlock evaluation.
//!
//! The catalog is a fixed table; unlock state lives in the store and only
//! ever grows. [`evaluate`] is pure — it looks at a completion event and
//! reports which achievements it newly earns, leaving persistence to the
//! caller.

use serde::Serialize;

use crate::schema::story::EndingType;

/// One entry in the achievement catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

const CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: "first_story",
        icon: "📖",
        title: "First Adventure",
        description: "Complete your first story",
    },
    AchievementDef {
        id: "first_good_ending",
        icon: "🌟",
        title: "Happy Ending",
        description: "Reach your first good ending",
    },
    AchievementDef {
        id: "explorer",
        icon: "🗺️",
        title: "Explorer",
        description: "Visit 10 different story paths",
    },
    AchievementDef {
        id: "collector",
        icon: "🏆",
        title: "Collector",
        description: "Find all endings in one story",
    },
    AchievementDef {
        id: "bookworm",
        icon: "📚",
        title: "Bookworm",
        description: "Complete 5 different stories",
    },
    AchievementDef {
        id: "speedrunner",
        icon: "⚡",
        title: "Speedrunner",
        description: "Complete a story in under 2 minutes",
    },
    AchievementDef {
        id: "night_owl",
        icon: "🦉",
        title: "Night Owl",
        description: "Play a story after midnight",
    },
    AchievementDef {
        id: "replay_master",
        icon: "🔄",
        title: "Replay Master",
        description: "Replay the same story 3 times",
    },
];

/// The full catalog, display order.
pub fn catalog() -> &'static [AchievementDef] {
    CATALOG
}

/// Look up one definition by id.
pub fn definition(id: &str) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|d| d.id == id)
}

/// A completion event as seen by the evaluator.
#[derive(Debug, Clone, Copy)]
pub struct CompletionEvent {
    /// Number of distinct stories with at least one completed run,
    /// counted after this completion was recorded.
    pub completed_story_count: usize,
    pub ending_type: EndingType,
    /// Whether this run reached its ending type for the first time in
    /// this story.
    pub first_of_type: bool,
    /// Distinct nodes visited during the run that just ended.
    pub visited_count: usize,
}

/// Decide which achievements a completion newly earns. Already-held ids
/// are filtered out, so re-evaluating the same event is a no-op.
pub fn evaluate(held: &[String], event: CompletionEvent) -> Vec<&'static AchievementDef> {
    let mut earned = Vec::new();
    let mut award = |id: &str| {
        if !held.iter().any(|h| h == id) {
            if let Some(def) = definition(id) {
                earned.push(def);
            }
        }
    };

    if event.completed_story_count == 1 && event.first_of_type {
        award("first_story");
    }
    if event.ending_type == EndingType::Good && event.first_of_type {
        award("first_good_ending");
    }
    if event.visited_count >= 10 {
        award("explorer");
    }

    earned
}
