//! Fund source backed by a JSON file holding an array of fund records.

use std::path::PathBuf;

use async_trait::async_trait;
use fundinfo_core::errors::{Error, Result};
use fundinfo_core::funds::{FundSink, FundSource, NewFund};

pub struct JsonFileSource {
    path: PathBuf,
    platform: String,
}

impl JsonFileSource {
    pub fn new(path: PathBuf) -> Self {
        let platform = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "json".to_string());
        Self { path, platform }
    }

    fn source_error(&self, message: String) -> Error {
        Error::FundSource {
            platform: self.platform.clone(),
            message,
        }
    }
}

#[async_trait]
impl FundSource for JsonFileSource {
    fn platform_name(&self) -> &str {
        &self.platform
    }

    async fn fetch_funds(&self, batch_size: usize, max_funds: usize, sink: FundSink) -> Result<usize> {
        if batch_size == 0 || max_funds == 0 {
            return Ok(0);
        }

        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.source_error(format!("{}: {}", self.path.display(), e)))?;
        let funds: Vec<NewFund> = serde_json::from_str(&text)
            .map_err(|e| self.source_error(format!("{}: {}", self.path.display(), e)))?;

        let mut delivered = 0;
        for batch in funds.chunks(batch_size.min(max_funds)) {
            tracing::debug!("Loaded {} funds from {}", batch.len(), self.platform);
            for fund in batch.iter().take(max_funds - delivered) {
                sink(fund.clone());
                delivered += 1;
            }
            if delivered >= max_funds {
                break;
            }
        }
        Ok(delivered)
    }
}
