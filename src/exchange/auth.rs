// src/exchange/auth.rs
use crate::exchange::transport::HttpRequest;
use std::fmt;

/// Header the trading venue reads the API key from.
pub const STARFIGHTER_AUTH_HEADER: &str = "X-Starfighter-Authorization";

/// API key. Read-only once a client holds it, and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(api_key: &str) -> Self {
        Self(api_key.to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Credential(***)")
    }
}

/// How a venue expects the credential to travel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Credential verbatim in a named header (trading venue).
    Header { name: String },
    /// ` key=<credential>` appended to the resource path (game master).
    /// The remote side requires exactly this form.
    ResourceSuffix,
}

impl AuthStrategy {
    pub fn starfighter_header() -> Self {
        AuthStrategy::Header {
            name: STARFIGHTER_AUTH_HEADER.to_string(),
        }
    }

    pub fn attach(&self, mut request: HttpRequest, credential: &Credential) -> HttpRequest {
        match self {
            AuthStrategy::Header { name } => {
                request
                    .headers
                    .push((name.clone(), credential.expose().to_string()));
            }
            AuthStrategy::ResourceSuffix => {
                request.resource = format!("{} key={}", request.resource, credential.expose());
            }
        }
        request
    }
}
