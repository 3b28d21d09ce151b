//! Firestore-backed schedule store (REST v1).
//!
//! Firestore's REST surface has no push channel, so snapshots are
//! re-queried after every mutation and on `refresh`.

mod value;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use tokio::sync::watch;

use super::traits::{ScheduleStore, Subscription};
use crate::domain::{ItemId, NewScheduleItem, ScheduleItem, ScheduleUpdate, UserId};
use crate::error::{StoreError, StoreResult};
use value::{Document, QueryResult};

const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

fn default_collection() -> String {
    "schedules".to_string()
}

fn default_database() -> String {
    "(default)".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// Web API key
    pub api_key: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Override for the emulator
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            collection: default_collection(),
            database: default_database(),
            endpoint: None,
        }
    }

    /// `.../projects/{p}/databases/{db}/documents`
    pub fn documents_url(&self) -> String {
        let endpoint = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        format!(
            "{}/projects/{}/databases/{}/documents",
            endpoint.trim_end_matches('/'),
            self.project_id,
            self.database
        )
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.documents_url(), self.collection)
    }

    fn document_url(&self, id: &ItemId) -> String {
        format!("{}/{}", self.collection_url(), id)
    }
}

pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
    /// Latest snapshot per subscribed user
    channels: RefCell<HashMap<UserId, watch::Sender<Vec<ScheduleItem>>>>,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            channels: RefCell::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    async fn send(&self, request: RequestBuilder, id: Option<&ItemId>) -> StoreResult<Response> {
        let response = request
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "firestore request failed: {}", body);
        Err(status_error(status, body, id))
    }

    async fn query_user(&self, user_id: &UserId) -> StoreResult<Vec<ScheduleItem>> {
        let url = format!("{}:runQuery", self.config.documents_url());
        let body = value::user_query(&self.config.collection, user_id);
        let results: Vec<QueryResult> = self
            .send(self.client.post(url).json(&body), None)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        let mut items = Vec::with_capacity(results.len());
        for doc in results.iter().filter_map(|r| r.document.as_ref()) {
            match value::decode_document(doc) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!("skipping undecodable document {}: {}", doc.name, e),
            }
        }
        Ok(items)
    }

    fn publish(&self, user_id: &UserId, items: Vec<ScheduleItem>) {
        let mut channels = self.channels.borrow_mut();
        match channels.get(user_id) {
            Some(sender) => {
                sender.send_replace(items);
            }
            None => {
                let (sender, _) = watch::channel(items);
                channels.insert(user_id.clone(), sender);
            }
        }
    }

    /// Owner of an item, from the cached snapshots
    fn cached_owner(&self, id: &ItemId) -> Option<UserId> {
        self.channels
            .borrow()
            .iter()
            .find(|(_, sender)| sender.borrow().iter().any(|item| &item.id == id))
            .map(|(user_id, _)| user_id.clone())
    }

    async fn refresh_if_subscribed(&self, user_id: &UserId) -> StoreResult<()> {
        let subscribed = self.channels.borrow().contains_key(user_id);
        if subscribed {
            self.refresh(user_id).await?;
        }
        Ok(())
    }
}

fn status_error(status: StatusCode, body: String, id: Option<&ItemId>) -> StoreError {
    match (status.as_u16(), id) {
        (401 | 403, _) => StoreError::Permission(body),
        (404, Some(id)) => StoreError::NotFound(id.clone()),
        _ => StoreError::InvalidResponse(format!("{}: {}", status, body)),
    }
}

#[async_trait(?Send)]
impl ScheduleStore for FirestoreStore {
    async fn subscribe(&self, user_id: &UserId) -> StoreResult<Subscription> {
        self.refresh(user_id).await?;
        let rx = self
            .channels
            .borrow()
            .get(user_id)
            .map(|sender| sender.subscribe())
            .ok_or_else(|| StoreError::Internal(format!("no channel for {}", user_id)))?;
        tracing::info!(user_id = %user_id, "firestore subscription opened");
        Ok(Subscription::new(rx, user_id.clone()))
    }

    async fn refresh(&self, user_id: &UserId) -> StoreResult<()> {
        let items = self.query_user(user_id).await?;
        tracing::debug!(user_id = %user_id, count = items.len(), "firestore snapshot");
        self.publish(user_id, items);
        Ok(())
    }

    async fn create(&self, item: NewScheduleItem) -> StoreResult<ItemId> {
        let body = json!({ "fields": value::encode_new_item(&item, Utc::now()) });
        let doc: Document = self
            .send(self.client.post(self.config.collection_url()).json(&body), None)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        let id = doc.id();
        tracing::info!(item_id = %id, "firestore created item");
        self.refresh_if_subscribed(&item.user_id).await?;
        Ok(id)
    }

    async fn update(&self, id: &ItemId, update: ScheduleUpdate) -> StoreResult<()> {
        let mut params: Vec<(&str, &str)> = update_mask_params(&update);
        params.push(("currentDocument.exists", "true"));
        let body = json!({ "fields": value::encode_update(&update, Utc::now()) });

        let doc: Document = self
            .send(
                self.client.patch(self.config.document_url(id)).query(&params).json(&body),
                Some(id),
            )
            .await?
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        match value::decode_document(&doc) {
            Ok(item) => self.refresh_if_subscribed(&item.user_id).await,
            Err(e) => {
                tracing::warn!(item_id = %id, "updated document did not decode: {}", e);
                Ok(())
            }
        }
    }

    async fn delete(&self, id: &ItemId) -> StoreResult<()> {
        let owner = self.cached_owner(id);
        self.send(self.client.delete(self.config.document_url(id)), Some(id))
            .await?;
        tracing::info!(item_id = %id, "firestore deleted item");
        match owner {
            Some(owner) => self.refresh_if_subscribed(&owner).await,
            None => Ok(()),
        }
    }
}

fn update_mask_params(update: &ScheduleUpdate) -> Vec<(&'static str, &'static str)> {
    value::update_mask(update)
        .into_iter()
        .map(|path| ("updateMask.fieldPaths", path))
        .collect()
}
