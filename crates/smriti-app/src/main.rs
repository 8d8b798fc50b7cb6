use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kanal::AsyncReceiver;
use smriti_config::Config;
use smriti_core::WordCache;
use smriti_store::WordStore;
use smriti_types::{Battle, CacheEvent, Word};

#[derive(Parser)]
#[command(name = "smriti", about = "Local-first vocabulary trainer for history battles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a JSON word list
    Import { file: PathBuf },
    /// Show words, for all battles or one, walking up to PAGES pages
    Words {
        #[arg(long)]
        battle: Option<String>,
        #[arg(long, default_value_t = 1)]
        pages: u64,
    },
    /// List known battles with their slugs
    Battles,
    /// Prune duplicate words
    Dedup,
    /// Delete one battle's words, or every word (battles are kept)
    Clear {
        #[arg(long)]
        battle: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::new();

    let store = WordStore::open(&config.storage.path)
        .await
        .context("opening word store")?;
    tracing::debug!(path = %config.storage.path.display(), "word store opened");

    match cli.command {
        Command::Import { file } => import(&store, &file).await?,
        Command::Words { battle, pages } => words(store, &config, battle, pages).await,
        Command::Battles => battles(store, &config).await,
        Command::Dedup => dedup(store, &config).await?,
        Command::Clear { battle } => clear(&store, battle).await?,
    }

    Ok(())
}

async fn import(store: &WordStore, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let words: Vec<Word> = serde_json::from_str(&raw).context("parsing word list")?;

    let count = words.len();
    store.save_words(words).await.context("saving word list")?;
    println!("imported {count} words");
    Ok(())
}

async fn words(store: WordStore, config: &Config, battle: Option<String>, pages: u64) {
    let (cache, _events) = cache_for(store, config);

    let selected = battle.map(|name| Battle { id: None, name });
    cache.select_battle(selected).await;
    for _ in 1..pages {
        cache.load_more().await;
    }

    for word in cache.filtered_words().await {
        println!(
            "{:>5}  {:<24} {}",
            word.id.unwrap_or_default(),
            word.en,
            word.bn
        );
    }
    println!(
        "page {} of {} words{}",
        cache.current_page().await,
        cache.total_words().await,
        if cache.has_more().await { ", more available" } else { "" }
    );
}

async fn battles(store: WordStore, config: &Config) {
    let (cache, _events) = cache_for(store, config);

    cache.load_battles().await;
    for option in cache.battle_options().await {
        println!("{:<24} {}", option.name, option.code);
    }
}

async fn dedup(store: WordStore, config: &Config) -> anyhow::Result<()> {
    let (cache, _events) = cache_for(store, config);

    let deleted = cache
        .delete_duplicates()
        .await
        .context("deleting duplicates")?;
    println!("removed {deleted} duplicate words");
    Ok(())
}

async fn clear(store: &WordStore, battle: Option<String>) -> anyhow::Result<()> {
    match battle {
        Some(name) => {
            let deleted = store
                .delete_words_by_battle(&name)
                .await
                .with_context(|| format!("clearing battle {name}"))?;
            println!("deleted {deleted} words from {name}");
        }
        None => {
            store.delete_all_words().await.context("clearing words")?;
            println!("deleted all words, battles kept");
        }
    }
    Ok(())
}

fn cache_for(store: WordStore, config: &Config) -> (WordCache, AsyncReceiver<CacheEvent>) {
    // unbounded: nothing drains the receiver here, a bounded channel
    // would stall notify once full
    let (tx, rx) = kanal::unbounded_async();
    let cache = WordCache::new(Arc::new(store), config.paging.page_size, tx);
    (cache, rx)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(std::io::stderr)
        .init();
}
