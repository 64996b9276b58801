use std::path::Path;

use anyhow::{Context, Result};

/// One row of the movie list: how to find the movie on OMDb and which
/// encyclopedia article describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRow {
    pub id: String,
    pub title: String,
    pub omdb_query: String,
    pub wiki_resource: String,
}

/// Reads `id,title,omdb_query,wiki_resource` rows; the header line is skipped.
pub fn read_movie_list(path: &Path) -> Result<Vec<MovieRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open movie list {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or_default().trim().to_string();
        rows.push(MovieRow {
            id: field(0),
            title: field(1),
            omdb_query: field(2),
            wiki_resource: field(3),
        });
    }
    Ok(rows)
}
