use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use redb::{Database, ReadableTable, ReadableTableMetadata, Table};
use smriti_types::{Battle, Word, WordPage};
use tokio::task;

use crate::error::StoreError;
use crate::tables::{
    BATTLE_NAMES, BATTLES, META, META_NEXT_BATTLE_ID, META_NEXT_WORD_ID, META_SCHEMA_VERSION,
    SCHEMA_VERSION, WORDS, WORDS_BY_BATTLE,
};

/// Transactional storage for words and battles.
///
/// The handle wraps a single shared redb database, opened once and cloned
/// cheaply. All operations run redb work on the blocking thread pool and
/// suspend the caller until the transaction settles.
#[derive(Clone)]
pub struct WordStore {
    db: Arc<Database>,
}

impl WordStore {
    /// Open (creating if necessary) the versioned database at `path`.
    ///
    /// A schema version mismatch drops and recreates every table: the
    /// migration is destructive, callers must treat a version bump as a
    /// full reset.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_versioned(path, SCHEMA_VERSION).await
    }

    pub(crate) async fn open_versioned(
        path: impl Into<PathBuf>,
        version: u64,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let db = task::spawn_blocking(move || -> Result<Database, StoreError> {
            let db = Database::create(&path)?;
            migrate(&db, version)?;
            Ok(db)
        })
        .await
        .map_err(StoreError::unavailable)??;

        Ok(Self { db: Arc::new(db) })
    }

    /// All words whose `battle` matches, in insertion order.
    pub async fn words_by_battle(&self, battle: &str) -> Result<Vec<Word>, StoreError> {
        let db = self.db.clone();
        let battle = battle.to_string();
        task::spawn_blocking(move || words_by_battle_blocking(&db, &battle))
            .await
            .map_err(StoreError::read)?
    }

    /// A 1-indexed page over the whole collection or one battle's subset.
    ///
    /// `page_size == 0` fetches no words but still reports the true total,
    /// which callers use as a count probe.
    pub async fn words_page(
        &self,
        page: u64,
        page_size: u64,
        battle: Option<&str>,
    ) -> Result<WordPage, StoreError> {
        let db = self.db.clone();
        let battle = battle.map(str::to_string);
        task::spawn_blocking(move || words_page_blocking(&db, page, page_size, battle.as_deref()))
            .await
            .map_err(StoreError::read)?
    }

    /// Insert a battle unless one with the same name exists; returns the
    /// id either way. Calling this twice with one name leaves one record.
    pub async fn upsert_battle(&self, name: &str) -> Result<u64, StoreError> {
        let db = self.db.clone();
        let name = name.to_string();
        task::spawn_blocking(move || upsert_battle_blocking(&db, &name))
            .await
            .map_err(StoreError::write)?
    }

    /// Persist `words` in one transaction spanning every table.
    ///
    /// Battle records for each distinct `battle` value are settled first,
    /// then every word is inserted with a fresh id (caller-supplied ids are
    /// stripped). The batch fully commits or fully fails.
    pub async fn save_words(&self, words: Vec<Word>) -> Result<(), StoreError> {
        let db = self.db.clone();
        task::spawn_blocking(move || save_words_blocking(&db, &words))
            .await
            .map_err(StoreError::write)?
    }

    /// All battle records in store order.
    pub async fn battles(&self) -> Result<Vec<Battle>, StoreError> {
        let db = self.db.clone();
        task::spawn_blocking(move || battles_blocking(&db))
            .await
            .map_err(StoreError::read)?
    }

    /// Remove every word whose (lowercased `en`, battle) pair repeats an
    /// earlier record, keeping the first-seen one. Returns the number
    /// deleted. Running it again is a no-op.
    pub async fn delete_duplicate_words(&self) -> Result<u64, StoreError> {
        let db = self.db.clone();
        task::spawn_blocking(move || delete_duplicate_words_blocking(&db))
            .await
            .map_err(StoreError::write)?
    }

    /// Delete every word belonging to `battle`; no-op when none match.
    pub async fn delete_words_by_battle(&self, battle: &str) -> Result<u64, StoreError> {
        let db = self.db.clone();
        let battle = battle.to_string();
        task::spawn_blocking(move || delete_words_by_battle_blocking(&db, &battle))
            .await
            .map_err(StoreError::write)?
    }

    /// Clear the word collection. Battles and id counters are untouched.
    pub async fn delete_all_words(&self) -> Result<(), StoreError> {
        let db = self.db.clone();
        task::spawn_blocking(move || delete_all_words_blocking(&db))
            .await
            .map_err(StoreError::write)?
    }
}

fn migrate(db: &Database, version: u64) -> Result<(), StoreError> {
    let txn = db.begin_write().map_err(StoreError::unavailable)?;
    {
        let stored = {
            let meta = txn.open_table(META).map_err(StoreError::unavailable)?;
            meta.get(META_SCHEMA_VERSION)
                .map_err(StoreError::unavailable)?
                .map(|guard| guard.value())
        };

        if stored != Some(version) {
            tracing::info!(
                from = ?stored,
                to = version,
                "schema version changed, wiping word store"
            );
            txn.delete_table(WORDS).map_err(StoreError::unavailable)?;
            txn.delete_table(WORDS_BY_BATTLE)
                .map_err(StoreError::unavailable)?;
            txn.delete_table(BATTLES).map_err(StoreError::unavailable)?;
            txn.delete_table(BATTLE_NAMES)
                .map_err(StoreError::unavailable)?;

            let mut meta = txn.open_table(META).map_err(StoreError::unavailable)?;
            meta.insert(META_SCHEMA_VERSION, version)
                .map_err(StoreError::unavailable)?;
            meta.insert(META_NEXT_WORD_ID, 1)
                .map_err(StoreError::unavailable)?;
            meta.insert(META_NEXT_BATTLE_ID, 1)
                .map_err(StoreError::unavailable)?;
        }

        // opening is what creates the tables
        txn.open_table(WORDS).map_err(StoreError::unavailable)?;
        txn.open_table(WORDS_BY_BATTLE)
            .map_err(StoreError::unavailable)?;
        txn.open_table(BATTLES).map_err(StoreError::unavailable)?;
        txn.open_table(BATTLE_NAMES)
            .map_err(StoreError::unavailable)?;
    }
    txn.commit().map_err(StoreError::unavailable)?;
    Ok(())
}

fn words_by_battle_blocking(db: &Database, battle: &str) -> Result<Vec<Word>, StoreError> {
    let txn = db.begin_read().map_err(StoreError::read)?;
    let index = txn.open_table(WORDS_BY_BATTLE).map_err(StoreError::read)?;
    let words_table = txn.open_table(WORDS).map_err(StoreError::read)?;

    let mut words = Vec::new();
    for entry in index
        .range((battle, 0)..=(battle, u64::MAX))
        .map_err(StoreError::read)?
    {
        let (key, _) = entry.map_err(StoreError::read)?;
        let (_, id) = key.value();
        if let Some(raw) = words_table.get(id).map_err(StoreError::read)? {
            let word = serde_json::from_slice(raw.value()).map_err(StoreError::read)?;
            words.push(word);
        }
    }
    Ok(words)
}

fn words_page_blocking(
    db: &Database,
    page: u64,
    page_size: u64,
    battle: Option<&str>,
) -> Result<WordPage, StoreError> {
    let txn = db.begin_read().map_err(StoreError::read)?;
    let words_table = txn.open_table(WORDS).map_err(StoreError::read)?;

    let offset = page.saturating_sub(1).saturating_mul(page_size);
    let mut words = Vec::new();
    let total;

    match battle {
        Some(name) => {
            let index = txn.open_table(WORDS_BY_BATTLE).map_err(StoreError::read)?;
            let mut seen = 0u64;
            for entry in index
                .range((name, 0)..=(name, u64::MAX))
                .map_err(StoreError::read)?
            {
                let (key, _) = entry.map_err(StoreError::read)?;
                if page_size > 0 && seen >= offset && (seen - offset) < page_size {
                    let (_, id) = key.value();
                    if let Some(raw) = words_table.get(id).map_err(StoreError::read)? {
                        words.push(serde_json::from_slice(raw.value()).map_err(StoreError::read)?);
                    }
                }
                seen += 1;
            }
            total = seen;
        }
        None => {
            total = words_table.len().map_err(StoreError::read)?;
            if page_size > 0 {
                for entry in words_table
                    .iter()
                    .map_err(StoreError::read)?
                    .skip(offset as usize)
                    .take(page_size as usize)
                {
                    let (_, raw) = entry.map_err(StoreError::read)?;
                    words.push(serde_json::from_slice(raw.value()).map_err(StoreError::read)?);
                }
            }
        }
    }

    Ok(WordPage {
        words,
        total,
        has_more: page.saturating_mul(page_size) < total,
    })
}

fn upsert_battle_blocking(db: &Database, name: &str) -> Result<u64, StoreError> {
    let txn = db.begin_write().map_err(StoreError::write)?;
    let id;
    {
        let mut battles = txn.open_table(BATTLES).map_err(StoreError::write)?;
        let mut names = txn.open_table(BATTLE_NAMES).map_err(StoreError::write)?;
        let mut meta = txn.open_table(META).map_err(StoreError::write)?;
        id = ensure_battle(&mut battles, &mut names, &mut meta, name)?;
    }
    txn.commit().map_err(StoreError::write)?;
    Ok(id)
}

fn save_words_blocking(db: &Database, words: &[Word]) -> Result<(), StoreError> {
    if words.is_empty() {
        return Ok(());
    }

    let txn = db.begin_write().map_err(StoreError::write)?;
    {
        let mut battles = txn.open_table(BATTLES).map_err(StoreError::write)?;
        let mut names = txn.open_table(BATTLE_NAMES).map_err(StoreError::write)?;
        let mut meta = txn.open_table(META).map_err(StoreError::write)?;
        let mut words_table = txn.open_table(WORDS).map_err(StoreError::write)?;
        let mut index = txn.open_table(WORDS_BY_BATTLE).map_err(StoreError::write)?;

        // referential setup for every distinct battle settles before any
        // word insert
        let mut distinct = HashSet::new();
        for word in words {
            if distinct.insert(word.battle.as_str()) {
                ensure_battle(&mut battles, &mut names, &mut meta, &word.battle)?;
            }
        }

        for word in words {
            let id = bump(&mut meta, META_NEXT_WORD_ID)?;
            let mut stored = word.clone();
            stored.id = Some(id);
            let raw = serde_json::to_vec(&stored).map_err(StoreError::write)?;
            words_table
                .insert(id, raw.as_slice())
                .map_err(StoreError::write)?;
            index
                .insert((stored.battle.as_str(), id), ())
                .map_err(StoreError::write)?;
        }
    }
    txn.commit().map_err(StoreError::write)?;

    tracing::debug!(count = words.len(), "saved word batch");
    Ok(())
}

fn battles_blocking(db: &Database) -> Result<Vec<Battle>, StoreError> {
    let txn = db.begin_read().map_err(StoreError::read)?;
    let table = txn.open_table(BATTLES).map_err(StoreError::read)?;

    let mut battles = Vec::new();
    for entry in table.iter().map_err(StoreError::read)? {
        let (id, name) = entry.map_err(StoreError::read)?;
        battles.push(Battle {
            id: Some(id.value()),
            name: name.value().to_string(),
        });
    }
    Ok(battles)
}

fn delete_duplicate_words_blocking(db: &Database) -> Result<u64, StoreError> {
    let txn = db.begin_write().map_err(StoreError::write)?;
    let mut deleted = 0u64;
    {
        let mut words_table = txn.open_table(WORDS).map_err(StoreError::write)?;
        let mut index = txn.open_table(WORDS_BY_BATTLE).map_err(StoreError::write)?;

        // first-seen record per (lowercased en, battle) wins; id order is
        // iteration order
        let mut seen = HashSet::new();
        let mut doomed = Vec::new();
        for entry in words_table.iter().map_err(StoreError::write)? {
            let (id, raw) = entry.map_err(StoreError::write)?;
            let word: Word = serde_json::from_slice(raw.value()).map_err(StoreError::write)?;
            if !seen.insert((word.en.to_lowercase(), word.battle.clone())) {
                doomed.push((id.value(), word.battle));
            }
        }

        for (id, battle) in doomed {
            words_table.remove(id).map_err(StoreError::write)?;
            index
                .remove((battle.as_str(), id))
                .map_err(StoreError::write)?;
            deleted += 1;
        }
    }
    txn.commit().map_err(StoreError::write)?;

    if deleted > 0 {
        tracing::info!(deleted, "pruned duplicate words");
    }
    Ok(deleted)
}

fn delete_words_by_battle_blocking(db: &Database, battle: &str) -> Result<u64, StoreError> {
    let txn = db.begin_write().map_err(StoreError::write)?;
    let mut deleted = 0u64;
    {
        let mut words_table = txn.open_table(WORDS).map_err(StoreError::write)?;
        let mut index = txn.open_table(WORDS_BY_BATTLE).map_err(StoreError::write)?;

        let mut ids = Vec::new();
        for entry in index
            .range((battle, 0)..=(battle, u64::MAX))
            .map_err(StoreError::write)?
        {
            let (key, _) = entry.map_err(StoreError::write)?;
            ids.push(key.value().1);
        }

        for id in ids {
            words_table.remove(id).map_err(StoreError::write)?;
            index.remove((battle, id)).map_err(StoreError::write)?;
            deleted += 1;
        }
    }
    txn.commit().map_err(StoreError::write)?;
    Ok(deleted)
}

fn delete_all_words_blocking(db: &Database) -> Result<(), StoreError> {
    let txn = db.begin_write().map_err(StoreError::write)?;
    txn.delete_table(WORDS).map_err(StoreError::write)?;
    txn.delete_table(WORDS_BY_BATTLE)
        .map_err(StoreError::write)?;
    {
        txn.open_table(WORDS).map_err(StoreError::write)?;
        txn.open_table(WORDS_BY_BATTLE)
            .map_err(StoreError::write)?;
    }
    txn.commit().map_err(StoreError::write)?;
    Ok(())
}

/// Insert-if-absent on the unique name index. The absent check and the
/// insert share one write transaction, so no duplicate can slip between.
fn ensure_battle(
    battles: &mut Table<'_, u64, &'static str>,
    names: &mut Table<'_, &'static str, u64>,
    meta: &mut Table<'_, &'static str, u64>,
    name: &str,
) -> Result<u64, StoreError> {
    if let Some(existing) = names.get(name).map_err(StoreError::write)? {
        let id = existing.value();
        drop(existing);
        tracing::debug!(battle = name, "battle already present, keeping record");
        return Ok(id);
    }

    let id = bump(meta, META_NEXT_BATTLE_ID)?;
    battles.insert(id, name).map_err(StoreError::write)?;
    names.insert(name, id).map_err(StoreError::write)?;
    Ok(id)
}

fn bump(meta: &mut Table<'_, &'static str, u64>, key: &str) -> Result<u64, StoreError> {
    let next = meta
        .get(key)
        .map_err(StoreError::write)?
        .map(|guard| guard.value())
        .unwrap_or(1);
    meta.insert(key, next + 1).map_err(StoreError::write)?;
    Ok(next)
}
