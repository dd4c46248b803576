// src/exchange/dispatcher.rs
use crate::domain::errors::{ExchangeResult, TransportError, TransportResult};
use crate::exchange::auth::{AuthStrategy, Credential};
use crate::exchange::command::{CommandRegistry, Operation};
use crate::exchange::transport::{HttpRequest, HttpResponse, Transport, Verb};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Outcome of one command that did not hit a programmer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    Success(T),
    /// `ok: false` from the venue, with its error message verbatim.
    Rejected(String),
    /// Nothing usable came back: timeout, connection failure or unparseable payload.
    Absent,
}

impl<T> Reply<T> {
    /// Convert a successful value; conversions fail on protocol drift.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Reply<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        Ok(match self {
            Reply::Success(value) => Reply::Success(f(value)?),
            Reply::Rejected(message) => Reply::Rejected(message),
            Reply::Absent => Reply::Absent,
        })
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Reply::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success(_))
    }
}

/// Resolves an operation to an endpoint, authenticates it and runs it over the transport.
pub struct CommandDispatcher {
    base_url: String,
    registry: CommandRegistry,
    auth: AuthStrategy,
    credential: Credential,
    transport: Box<dyn Transport>,
}

impl CommandDispatcher {
    pub fn new(
        base_url: &str,
        registry: CommandRegistry,
        auth: AuthStrategy,
        credential: Credential,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            registry,
            auth,
            credential,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        operation: Operation,
        args: &[&str],
    ) -> ExchangeResult<Reply<T>> {
        self.execute::<T, ()>(operation, Verb::Get, None, args)
    }

    pub fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        operation: Operation,
        body: Option<&B>,
        args: &[&str],
    ) -> ExchangeResult<Reply<T>> {
        self.execute(operation, Verb::Post, body, args)
    }

    pub fn delete<T: DeserializeOwned>(
        &self,
        operation: Operation,
        args: &[&str],
    ) -> ExchangeResult<Reply<T>> {
        self.execute::<T, ()>(operation, Verb::Delete, None, args)
    }

    /// Errors are reserved for client-side mistakes (unregistered operation, wrong
    /// argument count, unserializable body). Network trouble comes back as `Reply::Absent`.
    pub fn execute<T: DeserializeOwned, B: Serialize>(
        &self,
        operation: Operation,
        verb: Verb,
        body: Option<&B>,
        args: &[&str],
    ) -> ExchangeResult<Reply<T>> {
        let resource = self.registry.resolve(operation, args)?;
        let mut request = HttpRequest::new(verb, resource);

        match (verb, body) {
            (Verb::Get, Some(_)) => {
                log::debug!("Dropping body on GET for {}", operation);
            }
            (_, Some(body)) => request.body = Some(serde_json::to_string(body)?),
            (_, None) => {}
        }

        let request = self.auth.attach(request, &self.credential);
        log::debug!("{} {} ({})", verb, request.resource, operation);

        let (status, payload) = match self
            .transport
            .send(&self.base_url, &request)
            .and_then(parse_payload)
        {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("{} failed: {}", operation, e);
                return Ok(Reply::Absent);
            }
        };

        if payload.get("ok").and_then(Value::as_bool) == Some(false) {
            let message = payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("no error message")
                .to_string();
            log::info!("{} rejected by venue: {}", operation, message);
            return Ok(Reply::Rejected(message));
        }

        // A failed status never counts as success, whatever the body looks like.
        if !(200..300).contains(&status) {
            log::warn!("{} failed: {}", operation, TransportError::Status(status));
            return Ok(Reply::Absent);
        }

        match serde_json::from_value::<T>(payload) {
            Ok(value) => Ok(Reply::Success(value)),
            Err(e) => {
                log::warn!("{} returned an unexpected shape: {}", operation, e);
                Ok(Reply::Absent)
            }
        }
    }
}

fn parse_payload(response: HttpResponse) -> TransportResult<(u16, Value)> {
    match serde_json::from_str::<Value>(&response.body) {
        Ok(value) => Ok((response.status, value)),
        Err(_) if !response.is_success() => Err(TransportError::Status(response.status)),
        Err(e) => Err(TransportError::Body(e.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::errors::{CommandError, ExchangeError};
    use crate::domain::models::{Heartbeat, Orderbook};
    use crate::exchange::auth::STARFIGHTER_AUTH_HEADER;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted transport: pops one canned result per call and records every request.
    #[derive(Clone, Default)]
    pub(crate) struct FakeTransport {
        pub responses: Arc<Mutex<VecDeque<TransportResult<HttpResponse>>>>,
        pub requests: Arc<Mutex<Vec<(String, HttpRequest)>>>,
    }

    impl FakeTransport {
        pub fn reply(&self, status: u16, body: &str) -> &Self {
            self.responses.lock().unwrap().push_back(Ok(HttpResponse {
                status,
                body: body.to_string(),
            }));
            self
        }

        pub fn fail(&self, error: TransportError) -> &Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn sent(&self) -> Vec<(String, HttpRequest)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        fn send(&self, base_url: &str, request: &HttpRequest) -> TransportResult<HttpResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((base_url.to_string(), request.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::Connection("no scripted response".into())))
        }
    }

    fn dispatcher(transport: &FakeTransport) -> CommandDispatcher {
        CommandDispatcher::new(
            "https://api.example.test/ob/api",
            CommandRegistry::trading(),
            AuthStrategy::starfighter_header(),
            Credential::new("key-1"),
            Box::new(transport.clone()),
        )
    }

    #[test]
    fn test_get_success_is_authenticated() {
        let transport = FakeTransport::default();
        transport.reply(200, r#"{"ok":true,"error":""}"#);

        let reply: Reply<Heartbeat> = dispatcher(&transport)
            .get(Operation::Heartbeat, &[])
            .unwrap();
        assert!(reply.is_success());

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let (base, request) = &sent[0];
        assert_eq!(base, "https://api.example.test/ob/api");
        assert_eq!(request.verb, Verb::Get);
        assert_eq!(request.resource, "/heartbeat");
        assert_eq!(request.header(STARFIGHTER_AUTH_HEADER), Some("key-1"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_rejection_is_surfaced_verbatim() {
        let transport = FakeTransport::default();
        transport.reply(404, r#"{"ok":false,"error":"No venue exists with the symbol NOPE"}"#);

        let reply: Reply<Orderbook> = dispatcher(&transport)
            .get(Operation::GetOrderbook, &["NOPE", "FOO"])
            .unwrap();
        assert_eq!(
            reply,
            Reply::Rejected("No venue exists with the symbol NOPE".to_string())
        );
    }

    #[test]
    fn test_transport_failures_are_absent() {
        let transport = FakeTransport::default();
        transport
            .fail(TransportError::Timeout)
            .fail(TransportError::Connection("refused".into()))
            .reply(200, "<html>not json</html>")
            .reply(502, "Bad Gateway")
            .reply(200, r#"{"ok":true,"unexpected":1}"#);

        let dispatcher = dispatcher(&transport);
        for _ in 0..5 {
            let reply: Reply<Orderbook> = dispatcher
                .get(Operation::GetOrderbook, &["TESTEX", "FOOBAR"])
                .unwrap();
            assert_eq!(reply.ok().map(|b| b.symbol), None);
        }
        assert_eq!(transport.sent().len(), 5);
    }

    #[test]
    fn test_failed_status_with_json_body_is_absent() {
        let transport = FakeTransport::default();
        transport
            .reply(503, r#"{"message":"service unavailable"}"#)
            .reply(500, "{}")
            .reply(500, r#"{"ok":true}"#);
        let dispatcher = dispatcher(&transport);

        for _ in 0..3 {
            let reply: Reply<Heartbeat> = dispatcher.get(Operation::Heartbeat, &[]).unwrap();
            assert!(matches!(reply, Reply::Absent));
        }
    }

    #[test]
    fn test_programmer_errors_are_hard_failures() {
        let transport = FakeTransport::default();
        let dispatcher = dispatcher(&transport);

        let unknown = dispatcher.get::<Heartbeat>(Operation::StartLevel, &["first_steps"]);
        assert!(matches!(
            unknown,
            Err(ExchangeError::Command(CommandError::UnknownOperation(
                Operation::StartLevel
            )))
        ));

        let arity = dispatcher.get::<Heartbeat>(Operation::GetQuote, &["TESTEX"]);
        assert!(matches!(
            arity,
            Err(ExchangeError::Command(CommandError::ArityMismatch { .. }))
        ));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_post_serializes_body_and_get_drops_it() {
        let transport = FakeTransport::default();
        transport
            .reply(200, r#"{"ok":true}"#)
            .reply(200, r#"{"ok":true}"#);
        let dispatcher = dispatcher(&transport);
        let body = serde_json::json!({"qty": 5});

        let _: Reply<Heartbeat> = dispatcher
            .post(Operation::PlaceOrder, Some(&body), &["TESTEX", "FOOBAR"])
            .unwrap();
        let _: Reply<Heartbeat> = dispatcher
            .execute(Operation::Heartbeat, Verb::Get, Some(&body), &[])
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].1.body.as_deref(), Some(r#"{"qty":5}"#));
        assert_eq!(sent[1].1.body, None);
    }

    #[test]
    fn test_reply_try_map_propagates_conversion_error() {
        let reply: Reply<u8> = Reply::Success(3);
        let failed: Result<Reply<u8>, &str> = reply.try_map(|_| Err("drift"));
        assert_eq!(failed, Err("drift"));

        let rejected: Reply<u8> = Reply::Rejected("no".into());
        assert_eq!(
            rejected.try_map::<u16, &str, _>(|v| Ok(v as u16)),
            Ok(Reply::Rejected("no".into()))
        );
    }
}
