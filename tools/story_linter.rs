/// Story Linter — validates `.adventure` story files.
///
/// Usage: story_linter <file-or-dir> [more paths...]
///
/// Errors (exit 1): unparseable documents, structural validation failures,
/// choices pointing at nodes the story does not define.
/// Warnings: nodes unreachable from the start node, stories with no
/// good ending.
use adventure_engine::core::repository::story_stats;
use adventure_engine::schema::story::Story;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: story_linter <file-or-dir> [more paths...]");
        process::exit(0);
    }

    let mut files = Vec::new();
    for arg in &args[1..] {
        let path = Path::new(arg);
        if path.is_file() {
            files.push(path.to_path_buf());
        } else if path.is_dir() {
            collect_story_files(path, &mut files);
        } else {
            eprintln!("ERROR: Path '{}' does not exist", arg);
            process::exit(1);
        }
    }
    files.sort();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut checked = 0;

    for file in &files {
        match lint_file(file) {
            Ok((errs, warns)) => {
                checked += 1;
                errors.extend(errs);
                warnings.extend(warns);
            }
            Err(e) => errors.push(format!("{}: {}", file.display(), e)),
        }
    }

    println!("=== Story Lint Report ===\n");
    println!("Checked {} file(s)", checked);

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }
    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn collect_story_files(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_story_files(&path, files);
            } else if matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("adventure") | Some("json")
            ) {
                files.push(path);
            }
        }
    }
}

fn lint_file(path: &Path) -> Result<(Vec<String>, Vec<String>), String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let story = Story::from_document_str(&text).map_err(|e| e.to_string())?;

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let label = format!("{} [{}]", path.display(), story.id);

    // Dangling choice targets are legal at load time but always a lint error.
    for (node_id, node) in &story.nodes {
        for choice in &node.choices {
            if story.node(&choice.next_node_id).is_none() {
                errors.push(format!(
                    "{}: node '{}' choice '{}' points at missing node '{}'",
                    label, node_id, choice.text, choice.next_node_id
                ));
            }
        }
    }

    // Reachability from the start node.
    let mut reachable = HashSet::new();
    let mut stack = vec![story.start_node.clone()];
    while let Some(id) = stack.pop() {
        if !reachable.insert(id.clone()) {
            continue;
        }
        if let Some(node) = story.node(&id) {
            for choice in &node.choices {
                stack.push(choice.next_node_id.clone());
            }
        }
    }
    let mut unreachable: Vec<&String> = story
        .nodes
        .keys()
        .filter(|id| !reachable.contains(*id))
        .collect();
    unreachable.sort();
    for id in unreachable {
        warnings.push(format!("{}: node '{}' is unreachable from start", label, id));
    }

    let stats = story_stats(&story);
    if stats.good_endings == 0 {
        warnings.push(format!("{}: story has no good ending", label));
    }

    Ok((errors, warnings))
}
