use async_trait::async_trait;
use smriti_store::{StoreError, WordStore};
use smriti_types::{Battle, Word, WordPage};

/// Word storage as seen by the cache layer.
///
/// UI-facing code holds the cache, the cache holds a `WordSource`; nothing
/// above this trait touches the store directly.
#[async_trait]
pub trait WordSource: Send + Sync {
    /// 1-indexed page over the whole collection or one battle's subset
    async fn words_page(
        &self,
        page: u64,
        page_size: u64,
        battle: Option<&str>,
    ) -> Result<WordPage, StoreError>;

    /// All battle records
    async fn battles(&self) -> Result<Vec<Battle>, StoreError>;

    /// Insert-if-absent by battle name
    async fn upsert_battle(&self, name: &str) -> Result<u64, StoreError>;

    /// Persist a batch atomically, battles first
    async fn save_words(&self, words: Vec<Word>) -> Result<(), StoreError>;

    /// Prune duplicate (lowercased en, battle) records
    async fn delete_duplicate_words(&self) -> Result<u64, StoreError>;
}

#[async_trait]
impl WordSource for WordStore {
    async fn words_page(
        &self,
        page: u64,
        page_size: u64,
        battle: Option<&str>,
    ) -> Result<WordPage, StoreError> {
        WordStore::words_page(self, page, page_size, battle).await
    }

    async fn battles(&self) -> Result<Vec<Battle>, StoreError> {
        WordStore::battles(self).await
    }

    async fn upsert_battle(&self, name: &str) -> Result<u64, StoreError> {
        WordStore::upsert_battle(self, name).await
    }

    async fn save_words(&self, words: Vec<Word>) -> Result<(), StoreError> {
        WordStore::save_words(self, words).await
    }

    async fn delete_duplicate_words(&self) -> Result<u64, StoreError> {
        WordStore::delete_duplicate_words(self).await
    }
}
