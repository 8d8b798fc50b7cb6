use serde::{Deserialize, Serialize};

use self::paging::PagingConfig;
use self::speech::SpeechConfig;
use self::storage::StorageConfig;

pub mod paging;
pub mod speech;
pub mod storage;

#[derive(Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub paging: PagingConfig,
    pub speech: SpeechConfig,
}

impl Config {
    pub fn new() -> Self {
        Config {
            storage: StorageConfig::new(),
            paging: PagingConfig::new(),
            speech: SpeechConfig::new(),
        }
    }
}
