use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};

const RESOURCE_PREFIX: &str = "http://dbpedia.org/resource/";
const PROPERTY_PREFIX: &str = "http://dbpedia.org/property/";

/// Split file holding `resource`: infobox triples are partitioned by the
/// first character of the resource name, with `/` replaced by `_`.
pub fn split_file_for(split_root: &Path, resource: &str) -> Result<PathBuf> {
    let name = resource.replace('/', "_");
    let first = name
        .chars()
        .next()
        .ok_or_else(|| anyhow!("empty resource name"))?;
    Ok(split_root.join(format!("{first}.tql")))
}

pub fn load_flat_json(split_root: &Path, resource: &str) -> Result<Value> {
    let path = split_file_for(split_root, resource)?;
    let content = fs::read_to_string(&path)
        .with_context(|| format!("no split file for {resource:?} at {}", path.display()))?;
    Ok(flat_json_from_lines(resource, &content))
}

/// `{property: object}` for every triple whose subject is `resource`. Later
/// triples for the same property overwrite earlier ones.
pub fn flat_json_from_lines(resource: &str, content: &str) -> Value {
    let subject = format!("<{RESOURCE_PREFIX}{resource}>");
    let mut flat = Map::new();
    for line in content.lines() {
        let Some(rest) = line.strip_prefix(&subject) else {
            continue;
        };
        let (Some(open), Some(close)) = (rest.find('<'), rest.find('>')) else {
            continue;
        };
        if close < open {
            continue;
        }
        let predicate = &rest[open + 1..close];
        let property = predicate.strip_prefix(PROPERTY_PREFIX).unwrap_or(predicate);
        let tail = &rest[close + 1..];
        let object = match tail.find('<') {
            Some(end) => &tail[..end],
            None => tail,
        };
        let object = object.trim_matches(|c| c == ' ' || c == '^' || c == '"');
        flat.insert(property.to_string(), Value::String(object.to_string()));
    }
    flat.into()
}
