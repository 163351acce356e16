//! HTTP client for the hosted backend: `/auth/v1` for sessions, `/rest/v1`
//! for rows and `/storage/v1` for objects.

use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use serde_json::{Value, json};

use super::{
    AuthUser, Backend, BackendError, BackendResult, Collection, Query, Session,
    error::message_from_body,
};

#[derive(Debug, Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestBackend {
    pub fn new<U: Into<String>, K: Into<String>>(base_url: U, anon_key: K) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, anon_key)
    }

    pub fn with_client<U: Into<String>, K: Into<String>>(
        client: reqwest::Client,
        base_url: U,
        anon_key: K,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    pub fn from_config(config: &crate::Config) -> Self {
        Self::new(config.backend().url(), config.backend().anon_key())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn rows_endpoint(&self, collection: Collection) -> String {
        self.endpoint(&format!("/rest/v1/{}", collection.as_str()))
    }

    /// Request carrying the public key and the caller's token (the public key
    /// doubles as the bearer for anonymous calls).
    fn request(&self, method: Method, url: String, token: &str) -> BackendResult<RequestBuilder> {
        if self.base_url.is_empty() {
            return Err(BackendError::NotConfigured);
        }

        let bearer = if token.is_empty() {
            &self.anon_key
        } else {
            token
        };

        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer))
    }

    fn filters_only(query: &Query) -> Vec<(String, String)> {
        query
            .to_params()
            .into_iter()
            .filter(|(key, _)| key != "select" && key != "order")
            .collect()
    }

    async fn ensure_success(response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unreadable body>"));
        let message = message_from_body(&body).unwrap_or(body);
        Err(BackendError::api(status.as_u16(), message))
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(response: Response) -> BackendResult<T> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Total from a `Content-Range` header such as `0-24/25` or `*/0`.
pub fn parse_content_range(value: &str) -> Option<i64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait::async_trait]
impl Backend for RestBackend {
    #[tracing::instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let response = self
            .request(
                Method::POST,
                self.endpoint("/auth/v1/token?grant_type=password"),
                "",
            )?
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn get_user(&self, token: &str) -> BackendResult<Option<AuthUser>> {
        let response = self
            .request(Method::GET, self.endpoint("/auth/v1/user"), token)?
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        Ok(Some(Self::parse_response(response).await?))
    }

    async fn sign_out(&self, token: &str) -> BackendResult<()> {
        let response = self
            .request(Method::POST, self.endpoint("/auth/v1/logout"), token)?
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, token))]
    async fn select(&self, token: &str, query: &Query) -> BackendResult<Vec<Value>> {
        let response = self
            .request(Method::GET, self.rows_endpoint(query.collection), token)?
            .query(&query.to_params())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn count(&self, token: &str, collection: Collection) -> BackendResult<i64> {
        let response = self
            .request(Method::HEAD, self.rows_endpoint(collection), token)?
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let total = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .unwrap_or(0);

        Ok(total)
    }

    #[tracing::instrument(skip(self, token, row))]
    async fn insert(&self, token: &str, collection: Collection, row: Value) -> BackendResult<Value> {
        let response = self
            .request(Method::POST, self.rows_endpoint(collection), token)?
            .header("Prefer", "return=representation")
            .json(&json!([row]))
            .send()
            .await?;

        let mut rows: Vec<Value> = Self::parse_response(response).await?;
        if rows.is_empty() {
            return Err(BackendError::api(500, "insert returned no row"));
        }
        Ok(rows.swap_remove(0))
    }

    #[tracing::instrument(skip(self, token, patch))]
    async fn update(&self, token: &str, query: &Query, patch: Value) -> BackendResult<()> {
        let response = self
            .request(Method::PATCH, self.rows_endpoint(query.collection), token)?
            .query(&Self::filters_only(query))
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, token))]
    async fn delete(&self, token: &str, query: &Query) -> BackendResult<()> {
        let response = self
            .request(Method::DELETE, self.rows_endpoint(query.collection), token)?
            .query(&Self::filters_only(query))
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, token, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> BackendResult<()> {
        let url = self.endpoint(&format!("/storage/v1/object/{bucket}/{path}"));
        let response = self
            .request(Method::POST, url, token)?
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&format!("/storage/v1/object/public/{bucket}/{path}"))
    }
}
