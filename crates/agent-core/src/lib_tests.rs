use super::*;
use serde_json::json;

#[test]
fn test_session_creation() {
    let session = Session::new("session-123");
    assert_eq!(session.id, "session-123");
    assert!(session.messages.is_empty());
}

#[test]
fn test_message_creation() {
    let msg = Message::user("Hola");
    assert_eq!(msg.content, "Hola");
    assert_eq!(msg.role, Role::User);
    assert!(!msg.id.is_empty());
    assert!(!msg.has_tool_calls());
}

#[test]
fn test_session_add_message() {
    let mut session = Session::new("test");
    session.add_message(Message::system("You are a language tutor."));
    session.add_message(Message::user("Test message"));

    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.system_prompt(), Some("You are a language tutor."));
    assert!(session.updated_at >= session.created_at);
}

#[test]
fn test_role_aliases_deserialize() {
    let messages: Vec<Message> = serde_json::from_value(json!([
        {"role": "human", "content": "hi"},
        {"role": "ai", "content": "hello"},
        {"role": "system", "content": "be brief"}
    ]))
    .unwrap();

    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[2].role, Role::System);
    assert!(!messages[0].id.is_empty());
}

#[test]
fn test_unknown_role_is_rejected() {
    let result: Result<Message, _> =
        serde_json::from_value(json!({"role": "narrator", "content": "x"}));
    assert!(result.is_err());
}

#[test]
fn test_assistant_message_with_tool_calls() {
    let request = ToolCallRequest::new("translate", ToolArguments::new());
    let msg = Message::assistant("", Some(vec![request.to_tool_call()]));

    assert!(msg.has_tool_calls());
    let encoded = serde_json::to_value(&msg).unwrap();
    assert_eq!(encoded["tool_calls"][0]["type"], "function");
    assert_eq!(encoded["tool_calls"][0]["function"]["arguments"], "{}");
}

#[test]
fn test_tool_result_message() {
    let msg = Message::tool_result("call_1", "{\"translation\":\"hello\"}");
    assert_eq!(msg.role, Role::Tool);
    assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
}
