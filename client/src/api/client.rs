//! Verb-level access to the FretesJá REST API.
//!
//! Thin typed wrappers over the authenticated transport: each method
//! builds the request, runs it through [`AuthHttp::execute`] and decodes
//! the response envelope. Page controllers talk to this surface only and
//! never touch raw responses.

use crate::api::common::{ApiResponse, PaginatedResponse, read_envelope};
use crate::auth::interceptor::AuthHttp;
use crate::errors::ClientResult;
use reqwest::{Method, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Query string builder that drops empty values, so optional filters
/// vanish from the URL instead of arriving as `?q=`.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key=value`, skipping values that render empty.
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.pairs.push((key.into(), value));
        }
        self
    }

    /// Adds `key=value` when the value is present and non-empty.
    pub fn set_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Typed client for the FretesJá API.
#[derive(Clone)]
pub struct ApiClient {
    transport: AuthHttp,
}

impl ApiClient {
    pub fn new(transport: AuthHttp) -> Self {
        ApiClient { transport }
    }

    /// The transport underneath, for callers that need raw responses.
    pub fn transport(&self) -> &AuthHttp {
        &self.transport
    }

    /// GET a single-object endpoint.
    pub async fn get<T>(&self, path: &str, params: QueryParams) -> ClientResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let request = self.build(Method::GET, path, &params, None::<&()>)?;
        self.run(request).await
    }

    /// GET a list endpoint carrying pagination metadata.
    pub async fn get_paginated<T>(
        &self,
        path: &str,
        params: QueryParams,
    ) -> ClientResult<PaginatedResponse<T>>
    where
        T: DeserializeOwned,
    {
        let request = self.build(Method::GET, path, &params, None::<&()>)?;
        let response = self.transport.execute(request).await?;
        read_envelope(response).await
    }

    /// POST a JSON body.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.build(Method::POST, path, &QueryParams::new(), Some(body))?;
        self.run(request).await
    }

    /// POST multipart form data (uploads). Multipart bodies cannot be
    /// replayed by the refresh flow; an expired token surfaces the 401.
    pub async fn post_multipart<T>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ClientResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.transport.endpoint(path)?;
        let request = self
            .transport
            .request(Method::POST, url)
            .multipart(form)
            .build()?;
        self.run(request).await
    }

    /// PUT a JSON body.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> ClientResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.build(Method::PUT, path, &QueryParams::new(), Some(body))?;
        self.run(request).await
    }

    /// PATCH a JSON body.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ClientResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.build(Method::PATCH, path, &QueryParams::new(), Some(body))?;
        self.run(request).await
    }

    /// DELETE an endpoint.
    pub async fn delete<T>(&self, path: &str) -> ClientResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let request = self.build(Method::DELETE, path, &QueryParams::new(), None::<&()>)?;
        self.run(request).await
    }

    async fn run<T>(&self, request: Request) -> ClientResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.transport.execute(request).await?;
        read_envelope(response).await
    }

    fn build<B>(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
        body: Option<&B>,
    ) -> ClientResult<Request>
    where
        B: Serialize + ?Sized,
    {
        let url = self.transport.endpoint(path)?;
        let mut builder = self.transport.request(method, url);
        if !params.is_empty() {
            builder = builder.query(params.pairs());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.build()?)
    }
}
