use std::sync::Arc;

use smriti_store::WordStore;
use smriti_types::{Battle, Word};
use tempfile::TempDir;

use crate::cache::WordCache;

fn word(battle: &str, en: &str) -> Word {
    Word {
        id: None,
        battle: battle.to_string(),
        en: en.to_string(),
        bn: format!("{en}-bn"),
        sentence: format!("{en} sentence"),
        bn_sentence: format!("{en}-bn sentence"),
    }
}

async fn cache_over_store(
    page_size: u64,
) -> (TempDir, Arc<WordStore>, WordCache, kanal::AsyncReceiver<smriti_types::CacheEvent>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(
        WordStore::open(dir.path().join("smriti.redb"))
            .await
            .expect("open store"),
    );
    let (tx, rx) = kanal::unbounded_async();
    let cache = WordCache::new(store.clone(), page_size, tx);
    (dir, store, cache, rx)
}

#[tokio::test]
async fn add_word_persists_battle_and_word() {
    let (_dir, store, cache, _rx) = cache_over_store(10).await;

    cache.add_word(word("Waterloo", "cavalry")).await.unwrap();
    cache.load_battles().await;

    assert_eq!(cache.battles().await.len(), 1);
    assert_eq!(store.words_by_battle("Waterloo").await.unwrap().len(), 1);
    assert_eq!(cache.filtered_words().await.len(), 1);
}

#[tokio::test]
async fn paging_over_the_real_store_covers_every_word() {
    let (_dir, store, cache, _rx) = cache_over_store(4).await;

    let words: Vec<Word> = (0..10).map(|i| word("Hastings", &format!("h{i}"))).collect();
    store.save_words(words).await.unwrap();

    cache
        .select_battle(Some(Battle {
            id: None,
            name: "Hastings".to_string(),
        }))
        .await;
    while cache.has_more().await {
        cache.load_more().await;
    }

    assert_eq!(cache.filtered_words().await.len(), 10);
    assert_eq!(cache.current_page().await, 3);
}

#[tokio::test]
async fn delete_duplicates_through_the_cache_hits_storage() {
    let (_dir, store, cache, _rx) = cache_over_store(10).await;

    store
        .save_words(vec![word("Waterloo", "Cavalry"), word("Waterloo", "cavalry")])
        .await
        .unwrap();

    cache.load_words(false).await;
    assert_eq!(cache.filtered_words().await.len(), 2);

    let deleted = cache.delete_duplicates().await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(cache.filtered_words().await.len(), 1);
    assert_eq!(store.words_by_battle("Waterloo").await.unwrap().len(), 1);
}
