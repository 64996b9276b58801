pub mod cache;
pub mod dbpedia;
pub mod encoder;
pub mod movies;
pub mod omdb;
pub mod wikipedia;

pub use cache::FileCache;
pub use encoder::{build_model, HttpTokenEncoder};
pub use movies::{read_movie_list, MovieRow};
pub use omdb::{preprocess_movie_json, OmdbClient};
pub use wikipedia::{cut_by_citations, cut_from_phrase, html_to_text, WikipediaClient};
