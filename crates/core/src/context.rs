use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{is_well_formed, EmbeddingModel};
use crate::numeric::is_numeric_looking;
use crate::tokenize::{split_key_words, tokenize_text};

/// A value found in a document together with the embedding of the words
/// around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberContext {
    /// Literal text of the value, formatting preserved (`$1,200,000`, `12%`).
    pub raw_value: String,
    pub context_vector: Vec<f32>,
    /// Space-joined words the vector was computed from.
    pub raw_context: String,
}

impl NumberContext {
    pub fn is_well_formed(&self, dimension: usize) -> bool {
        is_well_formed(&self.context_vector, dimension)
    }
}

/// Flattens nested JSON into [`NumberContext`] triples, using the ancestor key
/// path of every quantity as its context.
pub struct ContextExtractor<'a> {
    model: &'a dyn EmbeddingModel,
}

impl<'a> ContextExtractor<'a> {
    pub fn new(model: &'a dyn EmbeddingModel) -> Self {
        Self { model }
    }

    pub fn extract(&self, node: &Value) -> Vec<NumberContext> {
        self.extract_with_context(node, &[])
    }

    /// Same as [`ContextExtractor::extract`] but seeded with ancestor words.
    /// Output follows the object's key order.
    pub fn extract_with_context(&self, node: &Value, ancestors: &[String]) -> Vec<NumberContext> {
        let mut out = Vec::new();
        self.visit_node(node, ancestors, &mut out);
        out
    }

    fn visit_node(&self, node: &Value, ancestors: &[String], out: &mut Vec<NumberContext>) {
        match node {
            Value::Object(map) => self.visit_object(map, ancestors, out),
            Value::Array(items) => {
                for item in items {
                    self.visit_node(item, ancestors, out);
                }
            }
            scalar => self.visit_scalar(scalar, ancestors.to_vec(), out),
        }
    }

    fn visit_object(
        &self,
        map: &Map<String, Value>,
        ancestors: &[String],
        out: &mut Vec<NumberContext>,
    ) {
        for (key, value) in map {
            self.visit_entry(key, value, ancestors, out);
        }
    }

    fn visit_entry(
        &self,
        key: &str,
        value: &Value,
        ancestors: &[String],
        out: &mut Vec<NumberContext>,
    ) {
        // List elements behave like `{key: element}` under the same ancestors,
        // so the position in the list never becomes a context word.
        if let Value::Array(items) = value {
            for item in items {
                self.visit_entry(key, item, ancestors, out);
            }
            return;
        }
        let mut extended = ancestors.to_vec();
        extended.extend(split_key_words(key));
        match value {
            Value::Object(map) => self.visit_object(map, &extended, out),
            scalar => self.visit_scalar(scalar, extended, out),
        }
    }

    fn visit_scalar(&self, value: &Value, context: Vec<String>, out: &mut Vec<NumberContext>) {
        match value {
            Value::String(text) => self.visit_string(text, context, out),
            Value::Number(number) => self.emit(number.to_string(), context, out),
            Value::Bool(flag) => self.emit(flag.to_string(), context, out),
            Value::Null | Value::Object(_) | Value::Array(_) => {}
        }
    }

    fn visit_string(&self, text: &str, context: Vec<String>, out: &mut Vec<NumberContext>) {
        if is_numeric_looking(text) {
            self.emit(text.to_string(), context, out);
            return;
        }
        let tokens = tokenize_text(text);
        for (idx, token) in tokens.iter().enumerate() {
            if !is_numeric_looking(token) {
                continue;
            }
            let mut words = context.clone();
            words.extend(
                tokens
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != idx)
                    .map(|(_, word)| word.clone()),
            );
            self.emit(token.clone(), words, out);
        }
    }

    fn emit(&self, raw_value: String, words: Vec<String>, out: &mut Vec<NumberContext>) {
        let raw_context = words.join(" ");
        let Some(context_vector) = self.model.vectorize_context(&words) else {
            tracing::debug!("dropping {raw_value:?}: no vector for context {raw_context:?}");
            return;
        };
        if !is_well_formed(&context_vector, self.model.dimension()) {
            tracing::debug!("dropping {raw_value:?}: malformed context vector");
            return;
        }
        out.push(NumberContext {
            raw_value,
            context_vector,
            raw_context,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::WordTable;
    use serde_json::json;

    /// Every word known, all vectors equal: emission depends only on whether
    /// any context word exists.
    struct Uniform;

    impl EmbeddingModel for Uniform {
        fn dimension(&self) -> usize {
            2
        }

        fn vectorize_word(&self, _word: &str) -> Option<Vec<f32>> {
            Some(vec![1.0, 1.0])
        }

        fn vectorize_words(&self, words: &[String]) -> Vec<Vec<f32>> {
            words.iter().map(|_| vec![1.0, 1.0]).collect()
        }
    }

    fn contexts(found: &[NumberContext]) -> Vec<(&str, &str)> {
        found
            .iter()
            .map(|nc| (nc.raw_value.as_str(), nc.raw_context.as_str()))
            .collect()
    }

    #[test]
    fn list_elements_do_not_add_positional_context() {
        let model = Uniform;
        let extractor = ContextExtractor::new(&model);
        let found = extractor.extract(&json!({
            "Ratings": [{"Source": "IMDb", "Value": "8.6/10"}]
        }));
        assert_eq!(contexts(&found), vec![("8.6/10", "Ratings Value")]);
    }

    #[test]
    fn nested_keys_are_camel_split_and_accumulated() {
        let model = Uniform;
        let extractor = ContextExtractor::new(&model);
        let found = extractor.extract(&json!({
            "boxOffice": {"openingWeekend": "$1,554,475", "Country": "USA"},
            "Year": 1977,
            "Response": true,
            "Poster": null
        }));
        assert_eq!(
            contexts(&found),
            vec![
                ("$1,554,475", "box Office opening Weekend"),
                ("1977", "Year"),
                ("true", "Response"),
            ]
        );
    }

    #[test]
    fn free_text_numbers_use_the_rest_of_the_sentence() {
        let model = Uniform;
        let extractor = ContextExtractor::new(&model);
        let found = extractor.extract(&json!({"Awards": "Won 6 Oscars in 1978"}));
        assert_eq!(
            contexts(&found),
            vec![
                ("6", "Awards Won Oscars in 1978"),
                ("1978", "Awards Won 6 Oscars in"),
            ]
        );
    }

    #[test]
    fn root_scalars_have_no_context_and_are_dropped() {
        let model = Uniform;
        let extractor = ContextExtractor::new(&model);
        assert!(extractor.extract(&json!(42)).is_empty());
        assert!(extractor.extract(&json!("12%")).is_empty());
        assert!(extractor.extract(&json!([1, 2, {"Runtime": "121"}])).len() == 1);
    }

    #[test]
    fn seeded_ancestors_prefix_the_context() {
        let model = Uniform;
        let extractor = ContextExtractor::new(&model);
        let found = extractor.extract_with_context(&json!(7), &["Season".to_string()]);
        assert_eq!(contexts(&found), vec![("7", "Season")]);
    }

    #[test]
    fn unknown_contexts_are_dropped() {
        let table = WordTable::from_entries(2, vec![("Year".to_string(), vec![1.0, 0.0])]).unwrap();
        let extractor = ContextExtractor::new(&table);
        let found = extractor.extract(&json!({"Year": "1977", "Metascore": "90"}));
        assert_eq!(contexts(&found), vec![("1977", "Year")]);
        assert_eq!(found[0].context_vector, vec![1.0, 0.0]);
    }

    #[test]
    fn nan_vectors_never_leave_the_extractor() {
        let table =
            WordTable::from_entries(2, vec![("Year".to_string(), vec![f32::NAN, 0.0])]).unwrap();
        let extractor = ContextExtractor::new(&table);
        assert!(extractor.extract(&json!({"Year": 1977})).is_empty());
    }
}
