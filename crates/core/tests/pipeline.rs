use ctxmatch_core::{
    build_model_with, k_closest, tokenize_text, BackendConfig, ContextExtractor, CtxError,
    DocumentIndex, EmbeddingModel, EncoderConfig, HashedEncoderConfig, Locator, TokenEncoder,
    WordTable,
};
use serde_json::json;

fn no_remote(_url: &str, _dims: usize) -> ctxmatch_core::Result<Box<dyn TokenEncoder>> {
    Err(CtxError::InvalidConfig("offline".to_string()))
}

fn movie_json() -> serde_json::Value {
    json!({
        "Title": "Star Wars: Episode IV - A New Hope",
        "Year": "1977",
        "Runtime": "121 min",
        "Awards": "Won 6 Oscars. 65 wins & 31 nominations total",
        "Ratings": [
            {"Internet Movie Database": "8.6/10"},
            {"Metacritic": "90 / 100"}
        ],
        "imdbVotes": "1,406,566",
        "BoxOffice": "$460,998,007",
        "Response": "True"
    })
}

#[test]
fn every_backend_flattens_the_same_values() {
    let backends = [
        BackendConfig::default(),
        BackendConfig::Stacked {
            encoders: vec![EncoderConfig::Hashed(HashedEncoderConfig {
                dimensions: 128,
                ..Default::default()
            })],
        },
    ];
    for config in &backends {
        let model = build_model_with(config, no_remote).unwrap();
        let found = ContextExtractor::new(model.as_ref()).extract(&movie_json());
        let values: Vec<&str> = found.iter().map(|nc| nc.raw_value.as_str()).collect();
        assert_eq!(
            values,
            vec!["1977", "121", "6", "65", "31", "8.6/10", "90", "100", "1,406,566", "$460,998,007"]
        );
        assert!(found
            .iter()
            .all(|nc| nc.context_vector.len() == model.dimension()));
        assert_eq!(model.vectorize_context(&[]), None);
    }
}

#[test]
fn raw_contexts_follow_key_paths() {
    let model = build_model_with(&BackendConfig::default(), no_remote).unwrap();
    let found = ContextExtractor::new(model.as_ref()).extract(&movie_json());
    let context_of = |value: &str| {
        found
            .iter()
            .find(|nc| nc.raw_value == value)
            .map(|nc| nc.raw_context.clone())
            .unwrap()
    };
    assert_eq!(context_of("121"), "Runtime min");
    assert_eq!(context_of("8.6/10"), "Ratings Internet Movie Database");
    assert_eq!(context_of("90"), "Ratings Metacritic / 100");
    assert_eq!(context_of("1,406,566"), "imdb Votes");
    assert_eq!(context_of("$460,998,007"), "Box Office");
}

#[test]
fn self_similarity_ranks_identical_contexts_first() {
    let model = build_model_with(&BackendConfig::default(), no_remote).unwrap();
    let found = ContextExtractor::new(model.as_ref()).extract(&movie_json());
    let query = &found[0];
    let ranked = k_closest(&query.context_vector, &found, 3);
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].context.raw_value, query.raw_value);
    assert!((ranked[0].similarity - 1.0).abs() < 1e-4);
}

#[test]
fn word_table_locates_release_year() {
    let table = WordTable::from_entries(
        2,
        vec![
            ("Year".to_string(), vec![1.0, 0.0]),
            ("released".to_string(), vec![0.9, 0.1]),
            ("on".to_string(), vec![0.5, 0.5]),
            ("grossed".to_string(), vec![0.0, 1.0]),
            ("million".to_string(), vec![0.1, 0.9]),
        ],
    )
    .unwrap();
    let tokens = tokenize_text("It was released on 1977 and grossed $ 775 million worldwide.");
    let matches = Locator::new(&table)
        .with_radii(vec![1, 2])
        .with_k(3)
        .locate(&json!({"Year": "1977", "Gross": "999"}), &tokens);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].source.raw_value, "1977");
    assert!(!matches[0].candidates.is_empty());
}

#[test]
fn documents_rank_against_each_other() {
    let model = build_model_with(&BackendConfig::default(), no_remote).unwrap();
    let mut index = DocumentIndex::new(model.dimension());
    let texts = [
        ("first.html", "Decision of the tax office regarding VAT refund"),
        ("second.html", "Decision of the tax office regarding VAT refund"),
        ("third.html", "Completely unrelated text about film scores"),
    ];
    for (name, text) in texts {
        let doc = DocumentIndex::embed_document(model.as_ref(), name, text).unwrap();
        index.insert(doc).unwrap();
    }
    let ranked = index.nearest("first.html", 10).unwrap();
    let names: Vec<&str> = ranked.iter().map(|s| s.context.raw_value.as_str()).collect();
    assert_eq!(names, vec!["first.html", "second.html", "third.html"]);
}
