use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Context string (space-joined neighbours) to the token it encloses.
pub type ContextMap = IndexMap<String, String>;

/// Maps the window around every included token to that token. Up to `radius`
/// tokens are taken on each side; windows are clipped at the sequence edges.
/// Tokens are processed left to right and a repeated context string keeps its
/// first position but takes the later token.
pub fn build_context_map<F>(tokens: &[String], radius: usize, include_if: F) -> ContextMap
where
    F: Fn(&str) -> bool,
{
    let mut map = ContextMap::new();
    insert_windows(&mut map, tokens, radius, &include_if);
    map
}

/// Runs [`build_context_map`] for each radius in order and merges the results;
/// later radii overwrite earlier ones on identical context strings.
pub fn build_context_map_multi<F>(tokens: &[String], radii: &[usize], include_if: F) -> ContextMap
where
    F: Fn(&str) -> bool,
{
    let mut map = ContextMap::new();
    for &radius in radii {
        insert_windows(&mut map, tokens, radius, &include_if);
    }
    map
}

fn insert_windows<F>(map: &mut ContextMap, tokens: &[String], radius: usize, include_if: &F)
where
    F: Fn(&str) -> bool,
{
    for (idx, token) in tokens.iter().enumerate() {
        if !include_if(token) {
            continue;
        }
        let start = idx.saturating_sub(radius);
        let end = idx.saturating_add(radius).saturating_add(1).min(tokens.len());
        let context = tokens[start..idx]
            .iter()
            .chain(tokens[idx + 1..end].iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(previous) = map.insert(context, token.clone()) {
            if previous != *token {
                tracing::trace!("context collision: {previous:?} replaced by {token:?}");
            }
        }
    }
}

/// The map as a flat JSON object, ready for the context extractor.
pub fn context_map_to_json(map: &ContextMap) -> Value {
    let object: Map<String, Value> = map
        .iter()
        .map(|(context, token)| (context.clone(), Value::String(token.clone())))
        .collect();
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::is_numeric_looking;

    fn tokens(raw: &str) -> Vec<String> {
        raw.split(' ').map(str::to_string).collect()
    }

    #[test]
    fn centres_windows_on_included_tokens() {
        let map = build_context_map(&tokens("a b 5 c d"), 2, is_numeric_looking);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a b c d").map(String::as_str), Some("5"));
    }

    #[test]
    fn clips_windows_at_the_edges() {
        let map = build_context_map(&tokens("1 a b c 2"), 2, is_numeric_looking);
        let entries: Vec<(&str, &str)> = map
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(entries, vec![("a b", "1"), ("b c", "2")]);
    }

    #[test]
    fn multi_radius_keeps_distinct_contexts() {
        let map = build_context_map_multi(&tokens("a b 5 c d"), &[1, 2], is_numeric_looking);
        assert_eq!(map.get("b c").map(String::as_str), Some("5"));
        assert_eq!(map.get("a b c d").map(String::as_str), Some("5"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn identical_contexts_keep_the_later_token() {
        let map = build_context_map(&tokens("x 1 y x 2 y"), 1, is_numeric_looking);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x y").map(String::as_str), Some("2"));
    }

    #[test]
    fn later_radius_wins_on_collision() {
        // radius 1 maps "x y" to 1; radius 2 clips the window of the leading 2
        // to the same string.
        let map = build_context_map_multi(&tokens("2 x y q x 1 y"), &[1, 2], is_numeric_looking);
        assert_eq!(map.get("x y").map(String::as_str), Some("2"));
        assert_eq!(map.get_index(1).map(|(k, _)| k.as_str()), Some("x y"));
        assert_eq!(map.get("q x y").map(String::as_str), Some("1"));
    }

    #[test]
    fn zero_radius_has_empty_context() {
        let map = build_context_map(&tokens("a 5"), 0, is_numeric_looking);
        assert_eq!(map.get("").map(String::as_str), Some("5"));
    }

    #[test]
    fn converts_to_ordered_json_object() {
        let map = build_context_map(&tokens("in 1977 and 1980 too"), 1, is_numeric_looking);
        let json = context_map_to_json(&map);
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["in and", "and too"]);
    }
}
