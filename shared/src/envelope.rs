//! The `{ ok, dto | error }` wrapper around every event payload.

use crate::schema::{validate, Schema, ValidationError};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// Payload failed its schema.
    Validation,
    /// Event name is not in the registry.
    UnknownEvent,
    /// Event exists but clients may not send it.
    NotAccepted,
    /// Connection has no live player for a player-scoped event.
    NotJoined,
    /// Frame was not JSON or lacked `event`/`payload`.
    MalformedFrame,
}

/// Structured error carried by a failure envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorDto {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }
}

impl From<&ValidationError> for ErrorDto {
    fn from(err: &ValidationError) -> Self {
        Self {
            code: ErrorCode::Validation,
            message: err.reason.clone(),
            path: Some(err.path.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Body<T, E> {
    Dto(T),
    Error(E),
}

/// Immutable message envelope. `ok == true` carries exactly a `dto`,
/// `ok == false` carries exactly an `error`; anything else fails to parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T, E = ErrorDto> {
    body: Body<T, E>,
}

impl<T, E> Envelope<T, E> {
    pub fn success(dto: T) -> Self {
        Self {
            body: Body::Dto(dto),
        }
    }

    pub fn failure(error: E) -> Self {
        Self {
            body: Body::Error(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.body, Body::Dto(_))
    }

    pub fn dto(&self) -> Option<&T> {
        match &self.body {
            Body::Dto(dto) => Some(dto),
            Body::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match &self.body {
            Body::Dto(_) => None,
            Body::Error(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self.body {
            Body::Dto(dto) => Ok(dto),
            Body::Error(error) => Err(error),
        }
    }
}

impl<T: Serialize, E: Serialize> Serialize for Envelope<T, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 2)?;
        match &self.body {
            Body::Dto(dto) => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("dto", dto)?;
            }
            Body::Error(error) => {
                state.serialize_field("ok", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct RawEnvelope<T, E> {
    ok: bool,
    dto: Option<T>,
    error: Option<E>,
}

impl<'de, T, E> Deserialize<'de> for Envelope<T, E>
where
    T: Deserialize<'de>,
    E: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::<T, E>::deserialize(deserializer)?;
        match (raw.ok, raw.dto, raw.error) {
            (true, Some(dto), None) => Ok(Envelope::success(dto)),
            (false, None, Some(error)) => Ok(Envelope::failure(error)),
            (true, None, _) => Err(de::Error::custom("ok envelope without dto")),
            (true, Some(_), Some(_)) => Err(de::Error::custom("ok envelope with error")),
            (false, _, None) => Err(de::Error::custom("failed envelope without error")),
            (false, Some(_), Some(_)) => Err(de::Error::custom("failed envelope with dto")),
        }
    }
}

/// Result of opening an inbound envelope whose shape was valid.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound<T> {
    Dto(T),
    Failure(ErrorDto),
}

/// Opens an envelope and validates its dto against `T`'s schema.
pub fn open<T: Schema + DeserializeOwned>(payload: Value) -> Result<Inbound<T>, ValidationError> {
    let envelope: Envelope<Value> = serde_json::from_value(payload)
        .map_err(|e| ValidationError::new("$", e.to_string()))?;

    match envelope.into_result() {
        Ok(dto) => validate::<T>(dto)
            .map(Inbound::Dto)
            .map_err(|e| e.under("$.dto")),
        Err(error) => Ok(Inbound::Failure(error)),
    }
}
