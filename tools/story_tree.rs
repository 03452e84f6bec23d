/// Story Tree — prints a story's branch structure from its start node.
///
/// Usage: story_tree <story-file> [--json]
///
/// Cycles are marked `(loops back)` and not expanded again; choices that
/// point at missing nodes are marked `(missing)`.
use adventure_engine::core::repository::{StoryRepository, TreeEdge, TreeNode};
use adventure_engine::core::store::ProgressStore;
use adventure_engine::schema::story::Story;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: story_tree <story-file> [--json]");
        process::exit(0);
    }

    let file = &args[1];
    let as_json = args.iter().any(|a| a == "--json");

    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("ERROR: Failed to read '{}': {}", file, e);
            process::exit(1);
        }
    };
    let story = match Story::from_document_str(&text) {
        Ok(story) => story,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let mut repository = StoryRepository::new();
    let story_id = story.id.clone();
    if let Err(e) = repository.add_built_in(story) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
    let store = ProgressStore::in_memory();

    let tree = match repository.story_tree(&store, &story_id) {
        Some(tree) => tree,
        None => {
            eprintln!("ERROR: story '{}' has no expandable start node", story_id);
            process::exit(1);
        }
    };

    if as_json {
        match serde_json::to_string_pretty(&tree) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("{} ({})", tree.title, tree.story_id);
    print_node(&tree.root, "");
}

fn print_node(node: &TreeNode, indent: &str) {
    let emoji = node
        .emoji
        .as_deref()
        .map(|e| format!("{} ", e))
        .unwrap_or_default();
    let marker = if node.circular {
        " (loops back)"
    } else if node.is_ending {
        match node.ending_type {
            Some(t) => match t.tag() {
                "good" => " [good ending]",
                "bad" => " [bad ending]",
                _ => " [neutral ending]",
            },
            None => " [neutral ending]",
        }
    } else {
        ""
    };
    println!("{}{}{}: {}{}", indent, emoji, node.node_id, node.summary, marker);

    let child_indent = format!("{}    ", indent);
    for edge in &node.children {
        print_edge(edge, &child_indent);
    }
}

fn print_edge(edge: &TreeEdge, indent: &str) {
    match &edge.child {
        Some(child) => {
            println!("{}-> \"{}\"", indent, edge.choice_text);
            print_node(child, indent);
        }
        None => println!("{}-> \"{}\" (missing)", indent, edge.choice_text),
    }
}
