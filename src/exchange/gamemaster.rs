// src/exchange/gamemaster.rs
use crate::domain::errors::ExchangeResult;
use crate::domain::models::{InstanceDetails, LevelAck, StartedLevel};
use crate::exchange::auth::{AuthStrategy, Credential};
use crate::exchange::command::{CommandRegistry, Operation};
use crate::exchange::dispatcher::{CommandDispatcher, Reply};
use crate::exchange::transport::Transport;

pub const DEFAULT_GM_URL: &str = "https://www.stockfighter.io/gm";

/// Game-master client: starts and controls level instances.
pub struct GamemasterClient {
    dispatcher: CommandDispatcher,
}

impl GamemasterClient {
    pub fn new(base_url: &str, api_key: &str, transport: Box<dyn Transport>) -> Self {
        let dispatcher = CommandDispatcher::new(
            base_url,
            CommandRegistry::gamemaster(),
            AuthStrategy::ResourceSuffix,
            Credential::new(api_key),
            transport,
        );

        Self { dispatcher }
    }

    pub fn start_level(&self, level: &str) -> ExchangeResult<Reply<StartedLevel>> {
        let reply = self
            .dispatcher
            .post::<StartedLevel, ()>(Operation::StartLevel, None, &[level])?;
        if let Reply::Success(started) = &reply {
            log::info!(
                "Level {} started: instance {} account {}",
                level,
                started.instance_id,
                started.account
            );
        }
        Ok(reply)
    }

    pub fn stop_level(&self, instance_id: u64) -> ExchangeResult<Reply<LevelAck>> {
        self.control(Operation::StopLevel, instance_id)
    }

    pub fn resume_level(&self, instance_id: u64) -> ExchangeResult<Reply<LevelAck>> {
        self.control(Operation::ResumeLevel, instance_id)
    }

    pub fn restart_level(&self, instance_id: u64) -> ExchangeResult<Reply<LevelAck>> {
        self.control(Operation::RestartLevel, instance_id)
    }

    pub fn instance_details(&self, instance_id: u64) -> ExchangeResult<Reply<InstanceDetails>> {
        let id = instance_id.to_string();
        self.dispatcher
            .get(Operation::InstanceDetails, &[id.as_str()])
    }

    fn control(&self, operation: Operation, instance_id: u64) -> ExchangeResult<Reply<LevelAck>> {
        let id = instance_id.to_string();
        self.dispatcher
            .post::<LevelAck, ()>(operation, None, &[id.as_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::dispatcher::tests::FakeTransport;
    use crate::exchange::transport::Verb;

    fn client(transport: &FakeTransport) -> GamemasterClient {
        GamemasterClient::new(DEFAULT_GM_URL, "gm-key", Box::new(transport.clone()))
    }

    #[test]
    fn test_start_level_uses_resource_suffix_auth() {
        let transport = FakeTransport::default();
        transport.reply(
            200,
            r#"{"ok":true,"account":"EXB123456","instanceId":1491,
                "instructions":{"Instructions":"Buy 100 shares"},
                "secondsPerTradingDay":5,"tickers":["FOOBAR"],"venues":["TESTEX"]}"#,
        );

        let started = client(&transport)
            .start_level("first_steps")
            .unwrap()
            .ok()
            .unwrap();
        assert_eq!(started.instance_id, 1491);

        let sent = transport.sent();
        let (base, request) = &sent[0];
        assert_eq!(base, DEFAULT_GM_URL);
        assert_eq!(request.verb, Verb::Post);
        assert_eq!(request.resource, "/levels/first_steps key=gm-key");
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
    }

    #[test]
    fn test_instance_controls() {
        let transport = FakeTransport::default();
        transport
            .reply(200, r#"{"ok":true}"#)
            .reply(200, r#"{"ok":true}"#)
            .reply(200, r#"{"ok":true,"instanceId":1491}"#)
            .reply(
                200,
                r#"{"ok":true,"id":1491,"state":"open","done":false,
                    "details":{"endOfTheWorldDay":500,"tradingDay":12}}"#,
            );
        let client = client(&transport);

        assert!(client.stop_level(1491).unwrap().is_success());
        assert!(client.resume_level(1491).unwrap().is_success());
        let restarted = client.restart_level(1491).unwrap().ok().unwrap();
        assert_eq!(restarted.instance_id, Some(1491));
        let details = client.instance_details(1491).unwrap().ok().unwrap();
        assert_eq!(details.details.map(|d| d.trading_day), Some(12));

        let resources: Vec<String> = transport
            .sent()
            .into_iter()
            .map(|(_, request)| request.resource)
            .collect();
        assert_eq!(
            resources,
            vec![
                "/instances/1491/stop key=gm-key",
                "/instances/1491/resume key=gm-key",
                "/instances/1491/restart key=gm-key",
                "/instances/1491 key=gm-key",
            ]
        );
    }

    #[test]
    fn test_stop_on_server_error_is_not_success() {
        let transport = FakeTransport::default();
        transport.reply(500, "{}");
        let reply = client(&transport).stop_level(1).unwrap();
        assert!(!reply.is_success());
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let transport = FakeTransport::default();
        transport.reply(404, r#"{"ok":false,"error":"Unknown level nope"}"#);
        assert_eq!(
            client(&transport).start_level("nope").unwrap().ok().map(|l| l.account),
            None
        );
    }
}
