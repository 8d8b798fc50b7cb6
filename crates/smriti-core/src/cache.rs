use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use kanal::AsyncSender;
use smriti_store::StoreError;
use smriti_types::{Battle, BattleOption, CacheEvent, Word};
use tokio::sync::{Mutex, RwLock};

use crate::source::WordSource;

/// Topic key meaning "all battles combined".
pub const GLOBAL_TOPIC: &str = "global";

/// Pagination state for one topic key.
#[derive(Debug, Clone)]
pub struct BattleState {
    pub page: u64,
    pub has_more: bool,
    pub words: Vec<Word>,
}

impl Default for BattleState {
    fn default() -> Self {
        Self {
            page: 1,
            has_more: false,
            words: Vec::new(),
        }
    }
}

#[derive(Default)]
struct CacheState {
    battles: Vec<Battle>,
    selected: Option<Battle>,
    pages: HashMap<String, BattleState>,
    total_words: u64,
    loading: bool,
    loading_more: bool,
}

/// In-memory paginated view per topic, layered over a [`WordSource`].
///
/// State changes are announced on the event channel handed in at
/// construction; the source itself knows nothing about notification.
pub struct WordCache {
    source: Arc<dyn WordSource>,
    page_size: u64,
    state: RwLock<CacheState>,
    /// Topic keys with a fetch in flight. Guards the page counter against
    /// concurrent `load_more` calls fetching the same page twice.
    in_flight: Mutex<HashSet<String>>,
    events: AsyncSender<CacheEvent>,
}

impl WordCache {
    pub fn new(
        source: Arc<dyn WordSource>,
        page_size: u64,
        events: AsyncSender<CacheEvent>,
    ) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            state: RwLock::new(CacheState::default()),
            in_flight: Mutex::new(HashSet::new()),
            events,
        }
    }

    /// Fetch a page for the active topic. `append = false` restarts at
    /// page 1 and replaces the cached list; `append = true` fetches the
    /// next page and concatenates. Fetch failures are logged and degrade
    /// the view, never propagated.
    pub async fn load_words(&self, append: bool) {
        let (topic, page) = {
            let mut state = self.state.write().await;
            if append {
                state.loading_more = true;
            } else {
                state.loading = true;
            }
            let topic = topic_key(&state.selected);
            let page = if append {
                state.pages.get(&topic).map(|s| s.page).unwrap_or(1) + 1
            } else {
                1
            };
            (topic, page)
        };

        let battle = (topic != GLOBAL_TOPIC).then_some(topic.as_str());
        let result = self.source.words_page(page, self.page_size, battle).await;

        {
            let mut state = self.state.write().await;
            match result {
                Ok(fetched) => {
                    let entry = state.pages.entry(topic.clone()).or_default();
                    // the counter only moves once the fetch has completed
                    entry.page = page;
                    entry.has_more = fetched.has_more;
                    if append {
                        entry.words.extend(fetched.words);
                    } else {
                        entry.words = fetched.words;
                    }
                    state.total_words = fetched.total;
                }
                Err(err) => {
                    tracing::error!(topic = %topic, "failed to fetch words: {err}");
                    if !append {
                        state.pages.insert(topic.clone(), BattleState::default());
                    }
                }
            }
            state.loading = false;
            state.loading_more = false;
        }

        self.notify(CacheEvent::WordsChanged { topic }).await;
    }

    /// Replace the battles list from the source; empty on failure.
    pub async fn load_battles(&self) {
        match self.source.battles().await {
            Ok(battles) => self.state.write().await.battles = battles,
            Err(err) => {
                tracing::error!("failed to fetch battles: {err}");
                self.state.write().await.battles = Vec::new();
            }
        }
        self.notify(CacheEvent::BattlesChanged).await;
    }

    /// Fetch the next page for the active topic. No-op when the topic has
    /// no more pages or a fetch for it is already in flight.
    pub async fn load_more(&self) {
        let topic = {
            let state = self.state.read().await;
            let topic = topic_key(&state.selected);
            let has_more = state
                .pages
                .get(&topic)
                .map(|s| s.has_more)
                .unwrap_or(false);
            if !has_more {
                return;
            }
            topic
        };

        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(topic.clone()) {
                tracing::debug!(topic = %topic, "page fetch already in flight");
                return;
            }
        }

        self.load_words(true).await;
        self.in_flight.lock().await.remove(&topic);
    }

    /// Set the active topic (`None` means all battles). A topic that was
    /// already loaded is shown from cache with no storage round-trip.
    pub async fn select_battle(&self, battle: Option<Battle>) {
        let cached = {
            let mut state = self.state.write().await;
            state.selected = battle;
            let topic = topic_key(&state.selected);
            state.pages.contains_key(&topic).then_some(topic)
        };

        match cached {
            Some(topic) => self.notify(CacheEvent::WordsChanged { topic }).await,
            None => self.load_words(false).await,
        }
    }

    /// Prune duplicates in storage, then rebuild the active topic's view
    /// from page 1. Failures are re-raised for the caller to react to.
    pub async fn delete_duplicates(&self) -> Result<u64, StoreError> {
        match self.source.delete_duplicate_words().await {
            Ok(deleted) => {
                tracing::info!(deleted, "removed duplicate words");
                {
                    let mut state = self.state.write().await;
                    let topic = topic_key(&state.selected);
                    state.pages.insert(topic, BattleState::default());
                }
                self.load_words(false).await;
                Ok(deleted)
            }
            Err(err) => {
                tracing::error!("failed to delete duplicates: {err}");
                Err(err)
            }
        }
    }

    /// Drop every per-topic view, the selection and the counts. Persistent
    /// storage is untouched.
    pub async fn reset(&self) {
        {
            let mut state = self.state.write().await;
            state.pages.clear();
            state.selected = None;
            state.total_words = 0;
        }
        self.notify(CacheEvent::CacheReset).await;
    }

    /// Persist one word (upserting its battle first) and reload the active
    /// view. Failures are re-raised, unlike the read paths.
    pub async fn add_word(&self, word: Word) -> Result<(), StoreError> {
        let outcome = async {
            self.source.upsert_battle(&word.battle).await?;
            self.source.save_words(vec![word]).await
        }
        .await;

        match outcome {
            Ok(()) => {
                self.load_words(false).await;
                Ok(())
            }
            Err(err) => {
                tracing::error!("failed to add word: {err}");
                Err(err)
            }
        }
    }

    /// Battles mapped to display name plus a normalized slug.
    pub async fn battle_options(&self) -> Vec<BattleOption> {
        self.state
            .read()
            .await
            .battles
            .iter()
            .map(|battle| BattleOption {
                name: battle.name.clone(),
                code: slug(&battle.name),
            })
            .collect()
    }

    /// The active topic's current word list.
    pub async fn filtered_words(&self) -> Vec<Word> {
        let state = self.state.read().await;
        let topic = topic_key(&state.selected);
        state
            .pages
            .get(&topic)
            .map(|s| s.words.clone())
            .unwrap_or_default()
    }

    pub async fn current_page(&self) -> u64 {
        let state = self.state.read().await;
        let topic = topic_key(&state.selected);
        state.pages.get(&topic).map(|s| s.page).unwrap_or(1)
    }

    pub async fn has_more(&self) -> bool {
        let state = self.state.read().await;
        let topic = topic_key(&state.selected);
        state.pages.get(&topic).map(|s| s.has_more).unwrap_or(false)
    }

    pub async fn selected_battle(&self) -> Option<Battle> {
        self.state.read().await.selected.clone()
    }

    pub async fn battles(&self) -> Vec<Battle> {
        self.state.read().await.battles.clone()
    }

    pub async fn total_words(&self) -> u64 {
        self.state.read().await.total_words
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn is_loading_more(&self) -> bool {
        self.state.read().await.loading_more
    }

    async fn notify(&self, event: CacheEvent) {
        // a missing subscriber is fine, the state is still queryable
        if let Err(err) = self.events.send(event).await {
            tracing::debug!("no cache subscriber: {err}");
        }
    }
}

fn topic_key(selected: &Option<Battle>) -> String {
    selected
        .as_ref()
        .map(|battle| battle.name.clone())
        .unwrap_or_else(|| GLOBAL_TOPIC.to_string())
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
