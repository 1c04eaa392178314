use super::*;
use serde_json::json;

fn sample_request() -> Request {
    Request::new(
        "echo",
        "ping",
        json!({
            "x": 1.25,
            "n": 7,
            "neg": -3,
            "ok": true,
            "tags": ["a", "b"],
            "nested": {"k": "v"},
            "nil": null
        }),
    )
}

#[test]
fn encode_decode_preserves_request() {
    let request = sample_request();
    let bytes = encode_request(&request).expect("encode");
    let decoded = decode_request(&bytes).expect("decode");
    assert_eq!(decoded, request);
}

#[test]
fn request_is_encoded_as_named_map() {
    let bytes = encode_request(&Request::new("status", "", json!(""))).expect("encode");
    // fixmap with three entries
    assert_eq!(bytes[0], 0x83);
    let as_value = decode_reply(&bytes).expect("decode as value");
    assert_eq!(as_value, json!({"cmd": "status", "subcmd": "", "data": ""}));
}

#[test]
fn decode_request_defaults_missing_subcmd_and_data() {
    let bytes = encode_reply(&json!({"cmd": "version"})).expect("encode");
    let request = decode_request(&bytes).expect("decode");
    assert_eq!(request.cmd, "version");
    assert_eq!(request.subcmd, "");
    assert_eq!(request.data, Value::Null);
}

#[test]
fn decode_request_requires_cmd() {
    let bytes = encode_reply(&json!({"subcmd": "x"})).expect("encode");
    let err = decode_request(&bytes).expect_err("cmd is required");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn decode_reply_accepts_scalars() {
    let bytes = encode_reply(&json!("1.2.3")).expect("encode");
    assert_eq!(decode_reply(&bytes).expect("decode"), json!("1.2.3"));

    let bytes = encode_reply(&Value::Null).expect("encode");
    assert_eq!(decode_reply(&bytes).expect("decode"), Value::Null);
}

#[test]
fn decode_reply_rejects_reserved_marker() {
    // 0xc1 is never used by MessagePack
    let err = decode_reply(&[0xc1]).expect_err("reserved byte should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn decode_reply_rejects_truncated_input() {
    // fixarray(2) followed by a single element
    let err = decode_reply(&[0x92, 0x01]).expect_err("truncated array should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn codec_error_messages_name_the_direction() {
    let err = decode_reply(&[0xc1]).expect_err("decode error");
    assert!(err.to_string().starts_with("failed to decode msgpack payload"));
}
