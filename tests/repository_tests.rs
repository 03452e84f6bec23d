//! Integration tests for catalog loading and graph tooling over the
//! fixture story files.

use adventure_engine::core::repository::{story_stats, StoryRepository};
use adventure_engine::core::store::ProgressStore;
use adventure_engine::schema::story::EndingType;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixtures() -> (StoryRepository, ProgressStore) {
    let mut repository = StoryRepository::new();
    repository.load_dir(fixtures_dir()).unwrap();
    (repository, ProgressStore::in_memory())
}

#[test]
fn loads_both_shapes_and_isolates_the_broken_file() {
    let mut repository = StoryRepository::new();
    let outcome = repository.load_dir(fixtures_dir()).unwrap();

    assert_eq!(outcome.loaded, vec!["dragon-cave", "legacy-tale"]);
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0]
        .path
        .to_string_lossy()
        .ends_with("broken.adventure"));
    assert_eq!(repository.built_in().len(), 2);
}

#[test]
fn wrapped_metadata_normalizes_into_the_canonical_story() {
    let (repository, store) = load_fixtures();
    let story = repository.story(&store, "dragon-cave").unwrap();

    assert_eq!(story.title, "The Dragon Cave");
    assert_eq!(story.author.as_deref(), Some("Fixture Author"));
    assert_eq!(story.cover_emoji.as_deref(), Some("🐉"));
    assert_eq!(story.estimated_minutes, Some(5));
    assert_eq!(story.themes, vec!["fantasy", "friendship"]);
    assert_eq!(story.format_version, Some(2));
    assert_eq!(story.start_node, "start");
    assert!(!story.is_custom);
}

#[test]
fn flat_document_loads_with_defaults() {
    let (repository, store) = load_fixtures();
    let story = repository.story(&store, "legacy-tale").unwrap();

    assert_eq!(story.title, "The Legacy Tale");
    assert!(story.author.is_none());
    assert!(story.format_version.is_none());
    // Ending node with no explicit type reads as neutral.
    assert_eq!(story.node("read").unwrap().ending_kind(), EndingType::Neutral);
}

#[test]
fn stats_for_the_fixture_stories() {
    let (repository, store) = load_fixtures();

    let dragon = story_stats(repository.story(&store, "dragon-cave").unwrap());
    assert_eq!(dragon.total_nodes, 4);
    assert_eq!(dragon.total_endings, 2);
    assert_eq!(dragon.good_endings, 1);

    let legacy = story_stats(repository.story(&store, "legacy-tale").unwrap());
    assert_eq!(legacy.total_nodes, 2);
    assert_eq!(legacy.total_endings, 1);
    assert_eq!(legacy.good_endings, 0);
}

#[test]
fn tree_expansion_marks_the_hill_loop() {
    let (repository, store) = load_fixtures();
    let tree = repository.story_tree(&store, "dragon-cave").unwrap();

    assert_eq!(tree.story_id, "dragon-cave");
    assert_eq!(tree.root.node_id, "start");
    assert_eq!(tree.root.summary, "The cave mouth");
    assert_eq!(tree.root.children.len(), 2);

    let cave = tree.root.children[0].child.as_ref().unwrap();
    assert!(cave.is_ending);
    assert_eq!(cave.ending_type, Some(EndingType::Good));

    let hill = tree.root.children[1].child.as_ref().unwrap();
    assert!(!hill.is_ending);
    let back = hill.children[1].child.as_ref().unwrap();
    assert_eq!(back.node_id, "start");
    assert!(back.circular);
    assert!(back.children.is_empty());
}

#[test]
fn custom_story_lifecycle_through_the_store() {
    let (repository, mut store) = load_fixtures();

    let document = r#"{
        "id": "my-story",
        "title": "My Story",
        "startNode": "a",
        "nodes": {
            "a": {"id": "a", "text": "Short and sweet.", "isEnding": true, "endingType": "good"}
        }
    }"#;
    let story = repository.ingest_story(&mut store, document).unwrap();
    assert!(story.is_custom);

    let all = repository.all_stories(&store);
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].id, "my-story");

    assert!(repository.story_tree(&store, "my-story").is_some());
    assert!(repository.delete_custom_story(&mut store, "my-story").unwrap());
    assert!(repository.story(&store, "my-story").is_none());
}
