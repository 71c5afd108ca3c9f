use crate::error::ServerResult;
use std::collections::HashMap;
use std::path::Path;

/// File extensions that show up in directory listings
const LISTED_EXTENSIONS: [&str; 5] = ["pdf", "png", "jpg", "jpeg", "gif"];

/// Render a directory tree as an HTML fragment of nested list items.
///
/// Pure function over the filesystem and one counter snapshot: the caller
/// takes the snapshot once and it is threaded through the whole recursion,
/// so every count in one listing reflects the same instant even though the
/// listing is stale relative to concurrent traffic.
///
/// Entries are sorted lexicographically by name. Directories become
/// collapsible `<details>` blocks wrapping their own recursive listing;
/// files are linked only when their extension is in the allow-list, each
/// annotated with its request count. `index.html` never appears in a
/// listing (it is served, not listed).
pub fn render(
    dir: &Path,
    rel_prefix: &str,
    counts: &HashMap<String, u64>,
) -> ServerResult<String> {
    let mut names: Vec<String> = Vec::new();
    for entry in dir.read_dir()? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let mut html: Vec<String> = Vec::new();
    for name in names {
        if name == "index.html" {
            continue;
        }

        let full_path = dir.join(&name);
        let rel_path = if rel_prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", rel_prefix, name)
        };

        if full_path.is_dir() {
            html.push(format!("<li><details><summary>{}/</summary>", name));
            html.push(render(&full_path, &rel_path, counts)?);
            html.push("</details></li>".to_string());
        } else if has_listed_extension(&name) {
            let count = counts.get(&rel_path).copied().unwrap_or(0);
            html.push(format!(
                "<li><a href=\"/{}\">{}</a> ({} requests)</li>",
                rel_path, name, count
            ));
        }
    }

    Ok(html.join("\n"))
}

fn has_listed_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    LISTED_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}
