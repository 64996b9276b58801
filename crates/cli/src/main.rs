mod config;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use ctxmatch_core::{
    build_context_map_multi, is_numeric_looking, tokenize_text, ArticleMatch, ContextExtractor,
    DocumentIndex, EmbeddingModel, Locator, NumberContext, ValueMatch,
};
use ctxmatch_sources::{
    build_model, cut_by_citations, cut_from_phrase, dbpedia, html_to_text, preprocess_movie_json,
    read_movie_list, FileCache, OmdbClient, WikipediaClient,
};

use crate::config::{load_config, AppConfig, DEFAULT_CONFIG};

#[derive(Parser, Debug)]
#[command(
    name = "ctxmatch",
    version,
    about = "Locate structured metadata values inside prose via context embeddings"
)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every quantity found in a JSON document with its key-path context.
    Flatten {
        input: PathBuf,
        /// Apply the OMDb reshaping before flattening.
        #[arg(long)]
        omdb: bool,
    },
    /// Print the flat infobox JSON of a DBPedia resource and its quantities.
    Dbpedia {
        resource: String,
        #[arg(long = "split-root")]
        split_root: Option<PathBuf>,
    },
    /// Print the window-context map of an article as JSON.
    Windows {
        input: PathBuf,
        #[arg(long = "radius")]
        radii: Vec<usize>,
    },
    /// Find each metadata value among equal-valued article contexts.
    Locate {
        #[command(flatten)]
        pair: PairArgs,
    },
    /// Nearest article contexts for each metadata value, unfiltered.
    Compare {
        #[command(flatten)]
        pair: PairArgs,
    },
    /// Run `locate` for every movie of a CSV list.
    Movies {
        list: PathBuf,
        #[arg(long)]
        k: Option<usize>,
        #[arg(long = "radius")]
        radii: Vec<usize>,
    },
    /// Compare the articles of a CSV movie list against the first one.
    Articles {
        list: PathBuf,
        #[arg(long = "radius")]
        radii: Vec<usize>,
    },
    /// Rank the documents of a directory by similarity to the first one.
    Similar {
        dir: PathBuf,
        #[arg(long, default_value_t = 1000)]
        k: usize,
        /// Ignore everything before this phrase in each document.
        #[arg(long = "from-phrase")]
        from_phrase: Option<String>,
        #[arg(long = "no-cache")]
        no_cache: bool,
    },
}

#[derive(Args, Debug)]
struct PairArgs {
    /// OMDb-style JSON file.
    #[arg(long, conflicts_with = "omdb_query", required_unless_present = "omdb_query")]
    movie: Option<PathBuf>,
    /// Title to fetch from OMDb (cached).
    #[arg(long = "omdb-query")]
    omdb_query: Option<String>,
    /// Article as a text or HTML file.
    #[arg(
        long,
        conflicts_with = "wiki_resource",
        required_unless_present = "wiki_resource"
    )]
    article: Option<PathBuf>,
    /// Exact Wikipedia resource name to fetch (cached).
    #[arg(long = "wiki-resource")]
    wiki_resource: Option<String>,
    #[arg(long)]
    k: Option<usize>,
    #[arg(long = "radius")]
    radii: Vec<usize>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let file_config = load_config(&config_path)?;

    match cli.command {
        Commands::Flatten { input, omdb } => {
            let mut json = read_json(&input)?;
            if omdb {
                json = preprocess_movie_json(json);
            }
            let model = load_model(&file_config)?;
            print_contexts(&ContextExtractor::new(model.as_ref()).extract(&json));
        }
        Commands::Dbpedia {
            resource,
            split_root,
        } => {
            let root = split_root.unwrap_or_else(|| file_config.dbpedia.split_root.clone());
            let json = dbpedia::load_flat_json(&root, &resource)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            let model = load_model(&file_config)?;
            print_contexts(&ContextExtractor::new(model.as_ref()).extract(&json));
        }
        Commands::Windows { input, radii } => {
            let radii = if radii.is_empty() {
                vec![file_config.matching.window_radius]
            } else {
                radii
            };
            let tokens = tokenize_text(cut_by_citations(&read_article_file(&input)?));
            let map = build_context_map_multi(&tokens, &radii, is_numeric_looking);
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        Commands::Locate { pair } => {
            let model = load_model(&file_config)?;
            let (movie, tokens) = load_pair(&file_config, &pair)?;
            let radii = pick_radii(&pair.radii, &file_config.matching.radii);
            let matches = Locator::new(model.as_ref())
                .with_radii(radii)
                .with_k(pair.k.unwrap_or(file_config.matching.k))
                .locate(&movie, &tokens);
            print_located(&matches);
        }
        Commands::Compare { pair } => {
            let model = load_model(&file_config)?;
            let (movie, tokens) = load_pair(&file_config, &pair)?;
            let radii = pick_radii(&pair.radii, &[file_config.matching.window_radius]);
            let matches = Locator::new(model.as_ref())
                .with_radii(radii)
                .with_k(pair.k.unwrap_or(file_config.matching.k))
                .compare(&movie, &tokens);
            print_compared(&matches);
        }
        Commands::Movies { list, k, radii } => {
            let model = load_model(&file_config)?;
            let rows = read_movie_list(&list)?;
            let omdb = omdb_client(&file_config)?;
            let wiki = WikipediaClient::new(&file_config.wikipedia.api_url);
            let omdb_cache = FileCache::new(file_config.cache.omdb_dir());
            let wiki_cache = FileCache::new(file_config.cache.wiki_dir());
            let locator = Locator::new(model.as_ref())
                .with_radii(pick_radii(&radii, &file_config.matching.radii))
                .with_k(k.unwrap_or(file_config.matching.k));
            for row in rows {
                println!("Processing movie: {}", row.title);
                let movie = match omdb.fetch_cached(&omdb_cache, &row.omdb_query) {
                    Ok(movie) => preprocess_movie_json(movie),
                    Err(err) => {
                        tracing::warn!("skipping {}: {err:#}", row.title);
                        continue;
                    }
                };
                let article = match wiki.fetch_cached(&wiki_cache, &row.wiki_resource) {
                    Ok(article) => article,
                    Err(err) => {
                        tracing::warn!("skipping {}: {err:#}", row.title);
                        continue;
                    }
                };
                let tokens = tokenize_text(cut_by_citations(&article));
                print_located(&locator.locate(&movie, &tokens));
            }
        }
        Commands::Articles { list, radii } => {
            let model = load_model(&file_config)?;
            let rows = read_movie_list(&list)?;
            let wiki = WikipediaClient::new(&file_config.wikipedia.api_url);
            let wiki_cache = FileCache::new(file_config.cache.wiki_dir());
            let mut articles = Vec::with_capacity(rows.len());
            for row in &rows {
                println!("Row id: {}", row.id);
                let article = wiki
                    .fetch_cached(&wiki_cache, &row.wiki_resource)
                    .with_context(|| format!("article for row {}", row.id))?;
                articles.push(tokenize_text(cut_by_citations(&article)));
            }
            let matches = Locator::new(model.as_ref())
                .with_radii(pick_radii(&radii, &[file_config.matching.window_radius]))
                .compare_articles(&articles);
            print_article_matches(&matches);
        }
        Commands::Similar {
            dir,
            k,
            from_phrase,
            no_cache,
        } => {
            let model = load_model(&file_config)?;
            let cache = (!no_cache).then(|| FileCache::new(file_config.cache.embeddings_dir()));
            run_similar(
                model.as_ref(),
                &dir,
                k,
                from_phrase.as_deref(),
                cache.as_ref(),
            )?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_model(config: &AppConfig) -> Result<Box<dyn EmbeddingModel>> {
    build_model(&config.backend).map_err(|e| anyhow!("failed to build embedding backend: {e}"))
}

fn omdb_client(config: &AppConfig) -> Result<OmdbClient> {
    OmdbClient::from_env(&config.omdb.base_url, &config.omdb.api_key_env)
}

fn pick_radii(cli: &[usize], fallback: &[usize]) -> Vec<usize> {
    if cli.is_empty() {
        fallback.to_vec()
    } else {
        cli.to_vec()
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid json in {}", path.display()))
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "html" | "htm"))
        .unwrap_or(false)
}

fn read_article_file(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(if is_html(path) { html_to_text(&raw) } else { raw })
}

/// Metadata JSON (reshaped) and the tokenized article for one comparison.
fn load_pair(config: &AppConfig, pair: &PairArgs) -> Result<(Value, Vec<String>)> {
    let movie = match (&pair.movie, &pair.omdb_query) {
        (Some(path), _) => read_json(path)?,
        (None, Some(query)) => {
            let cache = FileCache::new(config.cache.omdb_dir());
            omdb_client(config)?.fetch_cached(&cache, query)?
        }
        (None, None) => bail!("either --movie or --omdb-query is required"),
    };
    let article = match (&pair.article, &pair.wiki_resource) {
        (Some(path), _) => read_article_file(path)?,
        (None, Some(resource)) => {
            let cache = FileCache::new(config.cache.wiki_dir());
            WikipediaClient::new(&config.wikipedia.api_url).fetch_cached(&cache, resource)?
        }
        (None, None) => bail!("either --article or --wiki-resource is required"),
    };
    let tokens = tokenize_text(cut_by_citations(&article));
    tracing::info!("article has {} tokens", tokens.len());
    Ok((preprocess_movie_json(movie), tokens))
}

fn print_contexts(contexts: &[NumberContext]) {
    for nc in contexts {
        println!("{}\t{}", nc.raw_value, nc.raw_context);
    }
}

fn print_located(matches: &[ValueMatch]) {
    for found in matches {
        println!(
            "number: {} context: {}",
            found.source.raw_value, found.source.raw_context
        );
        println!("Wikipedia context candidates:");
        if found.candidates.is_empty() {
            println!("None found");
        }
        print_candidates(found);
        println!();
    }
}

fn print_compared(matches: &[ValueMatch]) {
    for found in matches {
        println!(
            "number: {} context: {}",
            found.source.raw_value, found.source.raw_context
        );
        print_candidates(found);
        println!();
    }
}

fn print_article_matches(matches: &[ArticleMatch]) {
    for found in matches {
        println!("{} :: {}", found.source.raw_value, found.source.raw_context);
        for nearest in &found.nearest {
            match nearest {
                Some(scored) => println!(
                    "{} :: {} :: {}",
                    scored.similarity, scored.context.raw_value, scored.context.raw_context
                ),
                None => println!("None found"),
            }
        }
        println!();
    }
}

fn print_candidates(found: &ValueMatch) {
    for candidate in &found.candidates {
        println!(
            "({}, {:?}, {:?})",
            candidate.similarity, candidate.context.raw_value, candidate.context.raw_context
        );
    }
}

fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let wanted = is_html(path)
            || path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if wanted {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn embed_document(
    model: &dyn EmbeddingModel,
    name: &str,
    text: &str,
    cache: Option<&FileCache>,
) -> Result<Option<NumberContext>> {
    let key = format!("{name}.json");
    if let Some(cache) = cache {
        if let Some(vector) = cache.get_json::<Vec<f32>>(&key)? {
            if vector.len() == model.dimension() {
                return Ok(Some(NumberContext {
                    raw_value: name.to_string(),
                    context_vector: vector,
                    raw_context: text.to_string(),
                }));
            }
            tracing::debug!("ignoring cached embedding of {name}: wrong dimension");
        }
    }
    let Some(document) = DocumentIndex::embed_document(model, name, text) else {
        return Ok(None);
    };
    if let Some(cache) = cache {
        if let Err(err) = cache.put_json(&key, &document.context_vector) {
            tracing::warn!("could not cache embedding of {name}: {err:#}");
        }
    }
    Ok(Some(document))
}

fn run_similar(
    model: &dyn EmbeddingModel,
    dir: &Path,
    k: usize,
    from_phrase: Option<&str>,
    cache: Option<&FileCache>,
) -> Result<()> {
    let files = list_documents(dir)?;
    let Some(first) = files.first() else {
        bail!("no .txt or .html documents in {}", dir.display());
    };
    let first_name = file_name(first);
    let mut index = DocumentIndex::new(model.dimension());
    for path in &files {
        let name = file_name(path);
        let text = read_article_file(path)?;
        let text = match from_phrase {
            Some(phrase) => cut_from_phrase(&text, phrase).to_string(),
            None => text,
        };
        match embed_document(model, &name, &text, cache)? {
            Some(document) => index.insert(document)?,
            None => tracing::warn!("no embedding for {name}: no usable tokens"),
        }
    }
    tracing::info!("embedded {} of {} documents", index.len(), files.len());
    let ranked = index
        .nearest(&first_name, k)
        .ok_or_else(|| anyhow!("{first_name} could not be embedded"))?;
    println!("{first_name}");
    for scored in ranked {
        println!("{} {}", scored.similarity, scored.context.raw_value);
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
