use redb::TableDefinition;

/// Word records by store-assigned id, serde_json encoded.
pub(crate) const WORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("words");

/// Non-unique secondary index: (battle name, word id).
pub(crate) const WORDS_BY_BATTLE: TableDefinition<(&str, u64), ()> =
    TableDefinition::new("words_by_battle");

/// Battle records by store-assigned id.
pub(crate) const BATTLES: TableDefinition<u64, &str> = TableDefinition::new("battles");

/// Unique secondary index: battle name to id.
pub(crate) const BATTLE_NAMES: TableDefinition<&str, u64> = TableDefinition::new("battle_names");

/// Schema version and id counters.
pub(crate) const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Bumping this wipes and recreates every table on the next open.
pub(crate) const SCHEMA_VERSION: u64 = 3;

pub(crate) const META_SCHEMA_VERSION: &str = "schema_version";
pub(crate) const META_NEXT_WORD_ID: &str = "next_word_id";
pub(crate) const META_NEXT_BATTLE_ID: &str = "next_battle_id";
