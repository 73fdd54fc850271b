//! Pages collaborator over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use menu_core::domain::PageTriple;
use menu_core::error::MenuError;
use menu_core::repositories::PagesGateway;
use menu_shared::config::PagesSettings;
use menu_shared::constants::PAGES_SYNC_ENDPOINT;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncFromMenuRequest<'a> {
    site_id: &'a str,
    items: &'a [PageTriple],
}

#[derive(Clone)]
pub struct HttpPagesClient {
    client: Client,
    base_url: String,
}

impl HttpPagesClient {
    pub fn new(settings: &PagesSettings) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(settings.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PagesGateway for HttpPagesClient {
    async fn sync_pages_from_menu(&self, site_id: &str, items: &[PageTriple]) -> Result<(), MenuError> {
        let url = format!("{}{}", self.base_url, PAGES_SYNC_ENDPOINT);
        debug!("Pushing {} page triples for site {} to {}", items.len(), site_id, url);

        let response = self
            .client
            .post(&url)
            .json(&SyncFromMenuRequest { site_id, items })
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach pages service: {}", e);
                MenuError::Network(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Pages sync rejected ({}): {}", status, body);
            return Err(MenuError::Network(format!("Pages API error ({}): {}", status, body)));
        }
        Ok(())
    }
}
