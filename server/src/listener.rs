//! Typed request/response listeners.
//!
//! A [`Listener`] binds one client event to its request schema, its response
//! schema, the event the response goes out under and a delivery policy. The
//! handler itself is a plain function over a [`Session`]; the listener takes
//! care of validating both ends and of queuing the response ahead of whatever
//! the handler emitted on the side.

use crate::client_manager::ConnectionId;
use crate::game::GameState;
use crate::outbox::{DomainEvent, Outbox, Target};
use arena_shared::{
    open, validate_value, ErrorCode, ErrorDto, EventName, Frame, Inbound, Schema, ValidationError,
};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ListenerError {
    /// The server produced a payload that breaks its own schema.
    #[error("invariant violation on `{event}`: {source}")]
    InvariantViolation {
        event: EventName,
        #[source]
        source: ValidationError,
    },
    /// A well-formed request the sender is not allowed to make. Answered
    /// with a failure envelope; nothing the handler queued is sent.
    #[error("request refused: {0}")]
    Refused(ValidationError),
}

/// Where the primary response of a listener goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Only the requesting connection.
    Reply,
    /// Every connection, the requester included.
    Broadcast,
    /// Every connection except the requester.
    BroadcastOthers,
}

impl Delivery {
    pub fn target(self, origin: ConnectionId) -> Target {
        match self {
            Delivery::Reply => Target::Unicast(origin),
            Delivery::Broadcast => Target::Broadcast,
            Delivery::BroadcastOthers => Target::BroadcastExcept(origin),
        }
    }
}

/// What a handler gets to work with for a single request.
pub struct Session<'a> {
    pub game: &'a mut GameState,
    pub outbox: &'a mut Outbox,
    pub origin: ConnectionId,
}

impl Session<'_> {
    pub fn unicast<T: Schema + Serialize>(
        &mut self,
        connection: ConnectionId,
        event: EventName,
        dto: &T,
    ) -> Result<(), ListenerError> {
        self.emit(Target::Unicast(connection), event, dto)
    }

    pub fn broadcast<T: Schema + Serialize>(
        &mut self,
        event: EventName,
        dto: &T,
    ) -> Result<(), ListenerError> {
        self.emit(Target::Broadcast, event, dto)
    }

    pub fn broadcast_except<T: Schema + Serialize>(
        &mut self,
        connection: ConnectionId,
        event: EventName,
        dto: &T,
    ) -> Result<(), ListenerError> {
        self.emit(Target::BroadcastExcept(connection), event, dto)
    }

    pub fn publish(&mut self, event: DomainEvent) {
        self.outbox.publish(event);
    }

    fn emit<T: Schema + Serialize>(
        &mut self,
        target: Target,
        event: EventName,
        dto: &T,
    ) -> Result<(), ListenerError> {
        self.outbox
            .emit(target, event, dto)
            .map_err(|source| ListenerError::InvariantViolation { event, source })
    }
}

/// Handler signature: `Ok(None)` means the request was valid but changed
/// nothing worth answering (unknown id, stale request, ...).
pub type Handler<Req, Res> = fn(&mut Session<'_>, Req) -> Result<Option<Res>, ListenerError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Handled<Res> {
    Response(Res),
    NoOp,
    Rejected(ValidationError),
}

/// Type-erased result of one dispatch, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Responded,
    NoOp,
    Rejected(ErrorCode),
}

pub struct Listener<Req, Res> {
    pub event: EventName,
    pub reply: EventName,
    pub delivery: Delivery,
    pub handler: Handler<Req, Res>,
}

impl<Req, Res> Listener<Req, Res>
where
    Req: Schema + DeserializeOwned,
    Res: Schema + Serialize,
{
    /// Validates the request envelope, runs the handler and validates its
    /// response. A rejected request never reaches the handler.
    pub fn handle(
        &self,
        session: &mut Session<'_>,
        payload: Value,
    ) -> Result<Handled<Res>, ListenerError> {
        let request = match open::<Req>(payload) {
            Ok(Inbound::Dto(request)) => request,
            Ok(Inbound::Failure(_)) => {
                return Ok(Handled::Rejected(ValidationError::new(
                    "$.ok",
                    "requests must be success envelopes",
                )))
            }
            Err(err) => return Ok(Handled::Rejected(err)),
        };

        let response = match (self.handler)(session, request) {
            Ok(response) => response,
            Err(ListenerError::Refused(err)) => return Ok(Handled::Rejected(err)),
            Err(err) => return Err(err),
        };

        match response {
            Some(response) => validate_value(response)
                .map(Handled::Response)
                .map_err(|source| ListenerError::InvariantViolation {
                    event: self.reply,
                    source,
                }),
            None => Ok(Handled::NoOp),
        }
    }

    /// Runs [`Listener::handle`] and queues the result on `outbox`: the
    /// response first (per [`Delivery`]), then the handler's side effects.
    /// On an invariant violation nothing from this request is queued.
    pub fn dispatch(
        &self,
        game: &mut GameState,
        origin: ConnectionId,
        payload: Value,
        outbox: &mut Outbox,
    ) -> Result<Outcome, ListenerError> {
        let mut side_effects = Outbox::new();
        let handled = {
            let mut session = Session {
                game,
                outbox: &mut side_effects,
                origin,
            };
            self.handle(&mut session, payload)
        };

        let handled = match handled {
            Ok(handled) => handled,
            Err(err) => {
                error!("Connection {}: {}", origin, err);
                return Err(err);
            }
        };

        match handled {
            Handled::Response(response) => {
                let frame = Frame::success(self.reply, &response).map_err(|source| {
                    let err = ListenerError::InvariantViolation {
                        event: self.reply,
                        source,
                    };
                    error!("Connection {}: {}", origin, err);
                    err
                })?;
                outbox.push(self.delivery.target(origin), frame);
                outbox.extend(side_effects);
                Ok(Outcome::Responded)
            }
            Handled::NoOp => {
                outbox.extend(side_effects);
                Ok(Outcome::NoOp)
            }
            Handled::Rejected(err) => {
                warn!("Rejected {} from connection {}: {}", self.event, origin, err);
                outbox.push(
                    Target::Unicast(origin),
                    Frame::failure(self.event.as_str(), ErrorDto::from(&err)),
                );
                Ok(Outcome::Rejected(ErrorCode::Validation))
            }
        }
    }
}
