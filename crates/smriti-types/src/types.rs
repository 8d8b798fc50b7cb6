use serde::{Deserialize, Serialize};

/// A vocabulary entry tied to one battle (topic group).
///
/// `id` is assigned by the store on insert; imported records carry `None`.
/// Two words are logical duplicates when their lowercased `en` and their
/// `battle` match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub battle: String,
    pub en: String,
    pub bn: String,
    pub sentence: String,
    pub bn_sentence: String,
}

/// A named topic group. `name` is unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
}

/// One page of words plus enough bookkeeping to drive pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct WordPage {
    pub words: Vec<Word>,
    pub total: u64,
    pub has_more: bool,
}

/// Battle as shown in a topic picker: display name plus a stable slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleOption {
    pub name: String,
    pub code: String,
}

/// Change notifications emitted by the word cache for subscribers to
/// re-render on. The storage layer never sends these.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    WordsChanged { topic: String },
    BattlesChanged,
    CacheReset,
}
