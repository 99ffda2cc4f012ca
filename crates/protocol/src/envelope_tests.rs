// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn roundtrips_through_text() {
    let env = Envelope::new("heartbeat", serde_json::json!({"cpu": 1.0}));
    let text = env.to_text();
    let back = Envelope::from_text(&text).unwrap();
    assert_eq!(back.kind, "heartbeat");
    assert_eq!(back.payload, env.payload);
}

#[test]
fn envelope_shape_matches_type_payload_keys() {
    let env = Envelope::new("sync", serde_json::json!({"version": 4}));
    let value: serde_json::Value = serde_json::from_str(&env.to_text()).unwrap();
    assert_eq!(value["type"], "sync");
    assert_eq!(value["payload"]["version"], 4);
}

#[test]
fn malformed_json_is_rejected() {
    assert!(Envelope::from_text("not json").is_err());
}

#[test]
fn decode_payload_deserializes_into_typed_struct() {
    #[derive(serde::Deserialize)]
    struct Ping {
        version: u64,
    }
    let env = Envelope::new("sync", serde_json::json!({"version": 7}));
    let ping: Ping = env.decode_payload().unwrap();
    assert_eq!(ping.version, 7);
}

#[test]
fn wrap_lifts_internal_tag_out_of_the_payload() {
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum Msg {
        Ping { version: u64 },
    }
    let env = Envelope::wrap(&Msg::Ping { version: 3 }).unwrap();
    assert_eq!(env.kind, "ping");
    assert_eq!(env.payload["version"], 3);
    assert!(env.payload.get("type").is_none());
}

#[test]
fn unwrap_roundtrips_through_wrap() {
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum Msg {
        Ping { version: u64 },
    }
    let original = Msg::Ping { version: 9 };
    let env = Envelope::wrap(&original).unwrap();
    let back: Msg = env.unwrap().unwrap();
    assert_eq!(original, back);
}
