use std::error::Error as StdError;
use std::fmt;

use crate::rpc::types::response::SubscriptionId;

/// Lifecycle of a listener's connection.
///
/// ```text
/// Idle -> Connecting -> Open -> Subscribing -> Streaming
///            ^                                    |
///            +------------ Closing <--------------+   (Closed from any open state)
/// ```
///
/// Every non-terminal state can move to `Stopped`, which accepts no transition.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    /// Created, no connection attempted yet
    Idle,
    /// Dialing the endpoint
    Connecting,
    /// Transport established, subscribe request not yet written
    Open,
    /// Subscribe request sent, awaiting confirmation
    Subscribing,
    /// Subscription confirmed; notifications are being routed
    Streaming {
        /// Identifier the node assigned to the subscription
        subscription: SubscriptionId,
    },
    /// Transport gone; waiting out the backoff delay
    Closing,
    /// Terminal. No further connection attempts are made.
    Stopped,
}

/// Named events that drive [`ConnectionState`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Transition {
    Connect,
    Opened,
    SubscribeSent,
    Confirmed(SubscriptionId),
    Closed,
    Stop,
}

impl ConnectionState {
    /// Whether the listener has been stopped for good.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Whether a transport is currently established.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(
            self,
            Self::Open | Self::Subscribing | Self::Streaming { .. }
        )
    }

    /// The confirmed subscription, only while streaming.
    #[must_use]
    pub fn subscription(&self) -> Option<&SubscriptionId> {
        match self {
            Self::Streaming { subscription } => Some(subscription),
            _ => None,
        }
    }

    /// Compute the state reached by applying `transition`, rejecting any
    /// transition that is not defined for the current state.
    pub fn apply(&self, transition: Transition) -> Result<Self, InvalidTransition> {
        match (self, transition) {
            (Self::Stopped, transition) => Err(InvalidTransition {
                from: Self::Stopped,
                transition,
            }),
            (_, Transition::Stop) => Ok(Self::Stopped),
            (Self::Idle | Self::Closing, Transition::Connect) => Ok(Self::Connecting),
            (Self::Connecting, Transition::Opened) => Ok(Self::Open),
            (Self::Open, Transition::SubscribeSent) => Ok(Self::Subscribing),
            (Self::Subscribing, Transition::Confirmed(subscription)) => {
                Ok(Self::Streaming { subscription })
            }
            (
                Self::Connecting | Self::Open | Self::Subscribing | Self::Streaming { .. },
                Transition::Closed,
            ) => Ok(Self::Closing),
            (from, transition) => Err(InvalidTransition {
                from: from.clone(),
                transition,
            }),
        }
    }
}

/// A transition that is not defined for the state it was applied to.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub transition: Transition,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transition {} is not defined in state {}",
            self.transition, self.from
        )
    }
}

impl StdError for InvalidTransition {}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription() -> SubscriptionId {
        SubscriptionId::from("0xabc")
    }

    #[test]
    fn happy_path_reaches_streaming() {
        let state = ConnectionState::Idle
            .apply(Transition::Connect)
            .and_then(|s| s.apply(Transition::Opened))
            .and_then(|s| s.apply(Transition::SubscribeSent))
            .and_then(|s| s.apply(Transition::Confirmed(subscription())))
            .unwrap();

        assert_eq!(state.subscription(), Some(&subscription()));
        assert!(state.is_open(), "streaming implies an open transport");
    }

    #[test]
    fn close_then_reconnect() {
        let streaming = ConnectionState::Streaming {
            subscription: subscription(),
        };

        let closing = streaming.apply(Transition::Closed).unwrap();
        assert_eq!(closing, ConnectionState::Closing);
        assert_eq!(closing.subscription(), None);

        let connecting = closing.apply(Transition::Connect).unwrap();
        assert_eq!(connecting, ConnectionState::Connecting);
    }

    #[test]
    fn failed_connect_closes() {
        let closing = ConnectionState::Connecting
            .apply(Transition::Closed)
            .unwrap();

        assert_eq!(closing, ConnectionState::Closing);
    }

    #[test]
    fn stop_is_reachable_from_every_non_terminal_state() {
        let states = [
            ConnectionState::Idle,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Subscribing,
            ConnectionState::Streaming {
                subscription: subscription(),
            },
            ConnectionState::Closing,
        ];

        for state in states {
            assert_eq!(
                state.apply(Transition::Stop),
                Ok(ConnectionState::Stopped),
                "stop from {state}"
            );
        }
    }

    #[test]
    fn stopped_accepts_nothing() {
        for transition in [
            Transition::Connect,
            Transition::Opened,
            Transition::Closed,
            Transition::Stop,
        ] {
            let err = ConnectionState::Stopped.apply(transition).unwrap_err();
            assert_eq!(err.from, ConnectionState::Stopped);
        }
    }

    #[test]
    fn undefined_transitions_are_rejected() {
        let err = ConnectionState::Idle
            .apply(Transition::Confirmed(subscription()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "transition confirmed is not defined in state idle"
        );

        assert!(
            ConnectionState::Streaming {
                subscription: subscription()
            }
            .apply(Transition::Confirmed(subscription()))
            .is_err(),
            "a duplicate confirmation must not re-enter streaming"
        );
        assert!(
            ConnectionState::Closing.apply(Transition::Closed).is_err(),
            "closing twice is undefined"
        );
    }
}
