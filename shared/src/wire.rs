use crate::envelope::{open, Envelope, ErrorDto, Inbound};
use crate::events::{EventName, UnknownEventError};
use crate::schema::{FieldPath, Schema, ValidationError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One WebSocket text message: `{ "event": "domain:action", "payload": <envelope> }`.
///
/// `event` stays a plain string so frames with unknown names can still be
/// parsed and answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    pub payload: Value,
}

impl Frame {
    /// Builds a success frame. The dto is checked against its schema first, so
    /// an invalid value never gets serialized.
    pub fn success<T: Schema + Serialize>(event: EventName, dto: &T) -> Result<Frame, ValidationError> {
        dto.check(&FieldPath::root()).map_err(|e| e.under("$.dto"))?;
        let payload = serde_json::to_value(Envelope::<&T, ErrorDto>::success(dto))
            .map_err(|e| ValidationError::new("$.dto", e.to_string()))?;
        Ok(Frame {
            event: event.as_str().to_string(),
            payload,
        })
    }

    /// Builds a failure frame carrying `error` in a failure envelope.
    pub fn failure(event: &str, error: ErrorDto) -> Frame {
        // ErrorDto is plain strings and an enum; its serialization never fails.
        let payload = serde_json::to_value(Envelope::<(), ErrorDto>::failure(error)).unwrap_or(Value::Null);
        Frame {
            event: event.to_string(),
            payload,
        }
    }

    pub fn event_name(&self) -> Result<EventName, UnknownEventError> {
        self.event.parse()
    }

    pub fn is_ok(&self) -> bool {
        self.payload.get("ok").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Opens the payload envelope and validates the dto as `T`.
    pub fn open<T: Schema + DeserializeOwned>(&self) -> Result<Inbound<T>, ValidationError> {
        open(self.payload.clone())
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_text(text: &str) -> Result<Frame, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{AsteroidCoordinatesDto, DestroyDto};
    use crate::envelope::ErrorCode;

    #[test]
    fn test_success_frame_text() {
        let frame = Frame::success(
            EventName::AsteroidCoordinates,
            &AsteroidCoordinatesDto {
                id: "a1".to_string(),
                x: 100.0,
                y: 200.0,
            },
        )
        .unwrap();

        let text = frame.to_text().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["event"], "asteroid:coordinates");
        assert_eq!(parsed["payload"]["ok"], true);
        assert_eq!(parsed["payload"]["dto"]["id"], "a1");
        assert!(parsed["payload"].get("error").is_none());
    }

    #[test]
    fn test_success_frame_refuses_invalid_dto() {
        let err = Frame::success(
            EventName::AsteroidCoordinates,
            &AsteroidCoordinatesDto {
                id: "a1".to_string(),
                x: f32::NAN,
                y: 0.0,
            },
        )
        .unwrap_err();
        assert_eq!(err.path, "$.dto.x");
    }

    #[test]
    fn test_failure_frame_opens_as_failure() {
        let frame = Frame::failure(
            "player:teleport",
            ErrorDto::new(ErrorCode::UnknownEvent, "unknown event"),
        );
        assert!(!frame.is_ok());
        assert!(frame.event_name().is_err());
        match frame.open::<DestroyDto>().unwrap() {
            Inbound::Failure(error) => assert_eq!(error.code, ErrorCode::UnknownEvent),
            Inbound::Dto(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_failure_payload_is_a_failure_envelope() {
        let error = ErrorDto::new(ErrorCode::NotJoined, "join first");
        let frame = Frame::failure("player:hit", error.clone());

        let envelope: Envelope<Value> = serde_json::from_value(frame.payload.clone()).unwrap();
        assert_eq!(envelope.into_result(), Err(error.clone()));
        assert_eq!(
            frame.payload,
            serde_json::to_value(Envelope::<Value, ErrorDto>::failure(error)).unwrap()
        );
        assert!(frame.payload.get("dto").is_none());
    }

    #[test]
    fn test_text_roundtrip_keeps_event() {
        let frame = Frame::success(EventName::ProjectileDestroy, &DestroyDto { id: "s-1".into() })
            .unwrap();
        let back = Frame::from_text(&frame.to_text().unwrap()).unwrap();
        assert_eq!(back.event_name(), Ok(EventName::ProjectileDestroy));
        assert_eq!(
            back.open::<DestroyDto>().unwrap(),
            Inbound::Dto(DestroyDto { id: "s-1".into() })
        );
    }

    #[test]
    fn test_from_text_rejects_garbage() {
        assert!(Frame::from_text("not json").is_err());
        assert!(Frame::from_text("{\"event\": \"player:hit\"}").is_err());
    }
}
