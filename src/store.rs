use serde_json::{Map, Value};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{Result, VisitorError};
use crate::record::{NewVisitor, VisitorRecord};

/// The backend-as-a-service boundary: row CRUD on the visitor table plus
/// binary object storage. Request/response only, no streaming, no retries.
#[allow(async_fn_in_trait)]
pub trait VisitorStore {
    async fn select_all(&self) -> Result<Vec<VisitorRecord>>;
    async fn insert(&self, record: &NewVisitor) -> Result<()>;
    async fn update(&self, row_id: i64, patch: &Map<String, Value>) -> Result<()>;
    async fn delete(&self, row_id: i64) -> Result<()>;
    async fn upload_object(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<()>;
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Supabase implementation: PostgREST for rows, the Storage API for photos.
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    table: String,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> SupabaseStore {
        SupabaseStore {
            client: reqwest::Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            table: config.table.clone(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn row_filter(row_id: i64) -> [(&'static str, String); 1] {
        [("id", format!("eq.{row_id}"))]
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(self.anon_key.as_str())
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = if body.trim().is_empty() {
            status.to_string()
        } else {
            body
        };
        Err(VisitorError::Store(detail))
    }
}

impl VisitorStore for SupabaseStore {
    async fn select_all(&self) -> Result<Vec<VisitorRecord>> {
        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("select", "*")])
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::expect_success(response).await?;
        let rows: Vec<VisitorRecord> = response.json().await.map_err(transport_error)?;
        debug!(table = self.table.as_str(), rows = rows.len(), "selected rows");
        Ok(rows)
    }

    async fn insert(&self, record: &NewVisitor) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(transport_error)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn update(&self, row_id: i64, patch: &Map<String, Value>) -> Result<()> {
        let response = self
            .authorized(self.client.patch(self.table_url()))
            .query(&Self::row_filter(row_id))
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await
            .map_err(transport_error)?;
        Self::expect_success(response).await?;
        debug!(row_id, fields = patch.len(), "updated row");
        Ok(())
    }

    async fn delete(&self, row_id: i64) -> Result<()> {
        let response = self
            .authorized(self.client.delete(self.table_url()))
            .query(&Self::row_filter(row_id))
            .send()
            .await
            .map_err(transport_error)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn upload_object(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<()> {
        let url = format!("{}/storage/v1/object/{bucket}/{path}", self.base_url);
        let response = self
            .authorized(self.client.post(url))
            .header("Content-Type", content_type_for(path))
            .body(bytes)
            .send()
            .await
            .map_err(|err| VisitorError::Upload(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let detail = if body.trim().is_empty() {
            status.to_string()
        } else {
            body
        };
        Err(VisitorError::Upload(detail))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}

fn transport_error(err: reqwest::Error) -> VisitorError {
    VisitorError::Store(err.to_string())
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
