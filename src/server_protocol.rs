use serde::Serialize;
use serde_json::{json, Value};

use crate::types::{InitPayload, OutboundEvent, Snapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedClientMessage {
    Join { nickname: String },
    SetTargetDirection { x: f32, y: f32 },
    SprintStart,
    SprintStop,
    ReportFoodEaten { food_id: String },
    ReportCollision { collider_worm_id: String },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "join" => {
            let nickname = match object.get("nickname") {
                None | Some(Value::Null) => String::new(),
                Some(value) => value.as_str()?.to_string(),
            };
            Some(ParsedClientMessage::Join { nickname })
        }
        "set-target-direction" => {
            let x = parse_finite(object.get("x")?)?;
            let y = parse_finite(object.get("y")?)?;
            Some(ParsedClientMessage::SetTargetDirection { x, y })
        }
        "sprint-start" => Some(ParsedClientMessage::SprintStart),
        "sprint-stop" => Some(ParsedClientMessage::SprintStop),
        "report-food-eaten" => {
            let food_id = object.get("foodId")?.as_str()?.to_string();
            Some(ParsedClientMessage::ReportFoodEaten { food_id })
        }
        "report-collision" => {
            let collider_worm_id = object.get("colliderWormId")?.as_str()?.to_string();
            Some(ParsedClientMessage::ReportCollision { collider_worm_id })
        }
        _ => None,
    }
}

fn parse_finite(value: &Value) -> Option<f32> {
    let number = value.as_f64()?;
    let narrowed = number as f32;
    narrowed.is_finite().then_some(narrowed)
}

pub fn encode_init(payload: &InitPayload) -> serde_json::Result<String> {
    tagged("init", payload)
}

pub fn encode_snapshot(snapshot: &Snapshot) -> serde_json::Result<String> {
    tagged("state-snapshot", snapshot)
}

pub fn encode_event(event: &OutboundEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn encode_error(message: &str) -> String {
    json!({ "type": "error", "message": message }).to_string()
}

fn tagged<T: Serialize>(message_type: &str, payload: &T) -> serde_json::Result<String> {
    let mut value = serde_json::to_value(payload)?;
    if let Value::Object(object) = &mut value {
        object.insert("type".to_string(), Value::String(message_type.to_string()));
    }
    serde_json::to_string(&value)
}
