//! Thin HTTP client over `reqwest`.
//!
//! Responses are read fully into a [`Response`] so callers can inspect the
//! status and decode the body without holding on to the connection.

use std::collections::HashMap;

use crate::BusinessConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Lowercased header names.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("HTTP error: {message}")]
pub struct HttpError {
    pub message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    fn new(client: reqwest::Client, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        self.headers
            .insert("content-type".to_owned(), "application/json".to_owned());
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn send(self) -> HttpResult<Response> {
        let mut request = match self.method {
            Method::Get => self.client.get(&self.url),
            Method::Post => self.client.post(&self.url),
        };

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        if let Some(body) = self.body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_lowercase(), v.to_owned());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?
            .to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Client bound to one server, adding the configured credentials to every request.
#[derive(Debug, Clone)]
pub struct Client {
    inner: reqwest::Client,
    server_url: String,
    authorization: Option<String>,
}

impl Client {
    pub fn new(config: &BusinessConfig) -> Self {
        Self {
            inner: reqwest::Client::new(),
            server_url: config.server_url.trim_end_matches('/').to_owned(),
            authorization: config.authorization.clone(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::Get, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::Post, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.server_url, path.trim_start_matches('/'));
        let builder = RequestBuilder::new(self.inner.clone(), method, url);
        match &self.authorization {
            Some(token) => builder.header("authorization", token.as_str()),
            None => builder,
        }
    }
}
