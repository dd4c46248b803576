// src/exchange/transport.rs
use crate::domain::errors::{ExchangeError, ExchangeResult, TransportError, TransportResult};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verb::Get => write!(f, "GET"),
            Verb::Post => write!(f, "POST"),
            Verb::Delete => write!(f, "DELETE"),
        }
    }
}

/// One outbound request. `resource` is the path relative to the client's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub verb: Verb,
    pub resource: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(verb: Verb, resource: String) -> Self {
        Self {
            verb,
            resource,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The wire. Any status code comes back as a response; only failures to
/// complete the exchange are errors.
pub trait Transport: Send + Sync {
    fn send(&self, base_url: &str, request: &HttpRequest) -> TransportResult<HttpResponse>;
}

/// Blocking HTTP transport; every call is bounded by the configured timeout.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, base_url: &str, request: &HttpRequest) -> TransportResult<HttpResponse> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), request.resource);
        let method = match request.verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Delete => Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let response = builder.send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(error.to_string())
    }
}
