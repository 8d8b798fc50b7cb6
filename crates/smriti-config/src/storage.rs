use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path of the redb database file
    pub path: PathBuf,
}

impl StorageConfig {
    pub fn new() -> Self {
        let path = env::var("SMRITI_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("smriti.redb"));

        Self { path }
    }
}
