use talkscriber::stt::{ServerEvent, ServerMessage, SttOptions, Task};

#[test]
fn test_handshake_serialization() {
    let mut options = SttOptions::new("key-123");
    options.language = "de".to_string();
    options.enable_turn_detection = true;

    let handshake = options.handshake("uid-1");
    let json = serde_json::to_value(&handshake).unwrap();

    assert_eq!(json["uid"], "uid-1");
    assert_eq!(json["auth"], "key-123");
    assert_eq!(json["language"], "de");
    assert_eq!(json["task"], "transcribe");
    assert_eq!(json["multilingual"], false);
    assert_eq!(json["enable_turn_detection"], true);
    assert_eq!(json["turn_detection_timeout"], 0.6);
}

#[test]
fn test_task_follows_translate_flag() {
    assert_eq!(Task::from_translate(true), Task::Translate);
    assert_eq!(Task::from_translate(false).as_str(), "transcribe");
    assert_eq!(
        serde_json::to_string(&Task::Translate).unwrap(),
        "\"translate\""
    );
}

#[test]
fn test_ready_frame_adopts_session_id() {
    let msg = ServerMessage::parse(r#"{"uid": "srv-9", "message": "SERVER_READY"}"#).unwrap();
    assert_eq!(
        msg.into_events(),
        vec![ServerEvent::SessionId("srv-9".to_string()), ServerEvent::Ready]
    );
}

#[test]
fn test_session_id_wins_over_uid() {
    let msg = ServerMessage::parse(
        r#"{"uid": "client-1", "session_id": "srv-7", "message": "SERVER_READY"}"#,
    )
    .unwrap();
    assert_eq!(
        msg.into_events(),
        vec![ServerEvent::SessionId("srv-7".to_string()), ServerEvent::Ready]
    );

    let uid_only = ServerMessage::parse(r#"{"uid": "client-1", "session_id": ""}"#).unwrap();
    assert_eq!(
        uid_only.into_events(),
        vec![ServerEvent::SessionId("client-1".to_string())]
    );
}

#[test]
fn test_wait_frame_carries_estimate() {
    let msg = ServerMessage::parse(r#"{"status": "WAIT", "message": 3.5}"#).unwrap();
    assert_eq!(
        msg.into_events(),
        vec![ServerEvent::Busy {
            wait: Some("3.5".to_string())
        }]
    );
}

#[test]
fn test_error_frames() {
    let auth = ServerMessage::parse(r#"{"status": "ERROR", "message": "Invalid API key"}"#).unwrap();
    assert!(matches!(auth.into_events().as_slice(), [ServerEvent::AuthFailed(_)]));

    let unauthorized = ServerMessage::parse(r#"{"status": "UNAUTHORIZED"}"#).unwrap();
    assert!(matches!(unauthorized.into_events().as_slice(), [ServerEvent::AuthFailed(_)]));

    let other = ServerMessage::parse(r#"{"status": "ERROR", "message": "GPU melted"}"#).unwrap();
    assert_eq!(
        other.into_events(),
        vec![ServerEvent::Error("GPU melted".to_string())]
    );
}

#[test]
fn test_segments_deserialization() {
    let json = r#"{
        "uid": "srv-9",
        "segments": [
            {"text": " Hello", "start": "0.000", "end": "1.250",
             "words": [{"word": "Hello", "start": 0.1, "end": 0.9, "probability": 0.97}]},
            {"text": " there.", "start": 1.25, "end": 2.0}
        ]
    }"#;

    let events = ServerMessage::parse(json).unwrap().into_events();
    assert_eq!(events.len(), 2);

    let ServerEvent::Segments(segments) = &events[1] else {
        panic!("expected segments, got {:?}", events[1]);
    };
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].end, 1.25);
    assert_eq!(segments[0].words.as_ref().unwrap()[0].probability, Some(0.97));
    assert!(segments[1].words.is_none());
}

#[test]
fn test_language_and_disconnect() {
    let language =
        ServerMessage::parse(r#"{"language": "fr", "language_confidence": 0.91}"#).unwrap();
    assert_eq!(
        language.into_events(),
        vec![ServerEvent::Language {
            code: "fr".to_string(),
            confidence: Some(0.91)
        }]
    );

    let disconnect = ServerMessage::parse(r#"{"message": "DISCONNECT"}"#).unwrap();
    assert_eq!(disconnect.into_events(), vec![ServerEvent::Disconnect]);
}

#[test]
fn test_empty_segment_list_is_not_an_event() {
    let msg = ServerMessage::parse(r#"{"segments": []}"#).unwrap();
    assert!(msg.into_events().is_empty());
}

#[test]
fn test_malformed_frame_is_rejected() {
    assert!(ServerMessage::parse("not json").is_err());
    assert!(ServerMessage::parse(r#"{"segments": [{"text": "x", "start": "soon"}]}"#).is_err());
}
