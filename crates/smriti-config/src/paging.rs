use std::env;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy)]
pub struct PagingConfig {
    /// Words fetched per page in study/quiz views
    pub page_size: u64,
}

impl PagingConfig {
    pub fn new() -> Self {
        let page_size = env::var("SMRITI_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Self { page_size }
    }
}
