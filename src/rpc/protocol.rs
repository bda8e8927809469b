use serde_json::Value;

use super::types::request::{KEEP_ALIVE_REQUEST_ID, LogFilter, Request, SUBSCRIBE_REQUEST_ID};
use super::types::response::{Envelope, NotificationParams, RawLog, RpcError, SubscriptionId};
use crate::Result;
use crate::serde_helpers::from_value_with_path;

const NOTIFICATION_METHOD: &str = "eth_subscription";

/// Kind of request awaiting a response.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Subscribe,
    KeepAlive,
}

impl RequestKind {
    #[must_use]
    pub const fn id(self) -> u64 {
        match self {
            Self::Subscribe => SUBSCRIBE_REQUEST_ID,
            Self::KeepAlive => KEEP_ALIVE_REQUEST_ID,
        }
    }
}

/// Correlation record for an in-flight request.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: u64,
    pub kind: RequestKind,
}

impl PendingRequest {
    const fn new(kind: RequestKind) -> Self {
        Self { id: kind.id(), kind }
    }
}

/// Classification of one inbound frame.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The subscribe request was confirmed with this id
    Subscribed(SubscriptionId),
    /// The node answered the subscribe request with an error
    SubscribeRejected(RpcError),
    /// The outstanding keep-alive probe was answered
    Pong,
    /// A log for the current subscription
    Log(RawLog),
    /// The frame was discarded
    Ignored(Ignored),
}

/// Why a frame was discarded.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ignored {
    /// Not JSON, or JSON of an unexpected shape
    Malformed(String),
    /// A response whose id matches no outstanding request
    UnknownResponse(Value),
    /// A notification for a subscription other than the current one
    StaleNotification(SubscriptionId),
    /// A method call that is not a subscription notification
    UnexpectedMethod(String),
    /// Neither a response nor a notification
    Unrecognized,
}

/// Request encoding and response correlation for a single connection.
///
/// The connection driver calls [`SubscriptionProtocol::reset`] when a transport
/// opens and when it goes away, so ids and the confirmed subscription never
/// leak from one connection into the next.
#[derive(Debug, Clone)]
pub struct SubscriptionProtocol {
    filter: LogFilter,
    subscribe: Option<PendingRequest>,
    keep_alive: Option<PendingRequest>,
    subscription: Option<SubscriptionId>,
}

impl SubscriptionProtocol {
    #[must_use]
    pub fn new(filter: LogFilter) -> Self {
        Self {
            filter,
            subscribe: None,
            keep_alive: None,
            subscription: None,
        }
    }

    /// Encode the `eth_subscribe` request and start waiting for its confirmation.
    pub fn subscribe_request(&mut self) -> Result<String> {
        let json = serde_json::to_string(&Request::subscribe(self.filter.clone()))?;
        self.subscription = None;
        self.subscribe = Some(PendingRequest::new(RequestKind::Subscribe));
        Ok(json)
    }

    /// Encode the keep-alive probe and start waiting for its response.
    pub fn keep_alive_request(&mut self) -> Result<String> {
        let json = serde_json::to_string(&Request::keep_alive())?;
        self.keep_alive = Some(PendingRequest::new(RequestKind::KeepAlive));
        Ok(json)
    }

    /// The confirmed subscription, if any.
    #[must_use]
    pub fn subscription(&self) -> Option<&SubscriptionId> {
        self.subscription.as_ref()
    }

    #[must_use]
    pub fn pending(&self, kind: RequestKind) -> Option<PendingRequest> {
        match kind {
            RequestKind::Subscribe => self.subscribe,
            RequestKind::KeepAlive => self.keep_alive,
        }
    }

    /// Forget every outstanding request and the confirmed subscription.
    pub fn reset(&mut self) {
        self.subscribe = None;
        self.keep_alive = None;
        self.subscription = None;
    }

    /// Classify an inbound text frame, updating correlation state.
    ///
    /// Discarded frames leave the state untouched.
    pub fn handle(&mut self, text: &str) -> Inbound {
        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => return Inbound::Ignored(Ignored::Malformed(e.to_string())),
        };

        if let Some(method) = envelope.method {
            return self.handle_notification(method, envelope.params);
        }

        match envelope.id {
            Some(id) => self.handle_response(id, envelope.result, envelope.error),
            None => Inbound::Ignored(Ignored::Unrecognized),
        }
    }

    fn handle_notification(&self, method: String, params: Option<Value>) -> Inbound {
        if method != NOTIFICATION_METHOD {
            return Inbound::Ignored(Ignored::UnexpectedMethod(method));
        }
        let Some(params) = params else {
            return Inbound::Ignored(Ignored::Malformed(
                "notification without params".to_owned(),
            ));
        };

        let params: NotificationParams = match from_value_with_path(params) {
            Ok(params) => params,
            Err(e) => return Inbound::Ignored(Ignored::Malformed(e.to_string())),
        };

        if self.subscription.as_ref() != Some(&params.subscription) {
            return Inbound::Ignored(Ignored::StaleNotification(params.subscription));
        }

        match from_value_with_path::<RawLog>(params.result) {
            Ok(log) => Inbound::Log(log),
            Err(e) => Inbound::Ignored(Ignored::Malformed(format!("log payload: {e}"))),
        }
    }

    fn handle_response(
        &mut self,
        id: Value,
        result: Option<Value>,
        error: Option<RpcError>,
    ) -> Inbound {
        let kind = [self.subscribe, self.keep_alive]
            .into_iter()
            .flatten()
            .find(|pending| id.as_u64() == Some(pending.id))
            .map(|pending| pending.kind);

        match kind {
            Some(RequestKind::Subscribe) => match (result, error) {
                (_, Some(error)) => {
                    self.subscribe = None;
                    Inbound::SubscribeRejected(error)
                }
                (Some(Value::String(subscription)), None) => {
                    self.subscribe = None;
                    let subscription = SubscriptionId::from(subscription);
                    self.subscription = Some(subscription.clone());
                    Inbound::Subscribed(subscription)
                }
                (other, None) => Inbound::Ignored(Ignored::Malformed(format!(
                    "subscribe confirmation without a string result: {}",
                    other.unwrap_or(Value::Null)
                ))),
            },
            Some(RequestKind::KeepAlive) => {
                self.keep_alive = None;
                Inbound::Pong
            }
            None => Inbound::Ignored(Ignored::UnknownResponse(id)),
        }
    }
}
