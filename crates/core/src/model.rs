use serde::{Deserialize, Serialize};

use crate::ids::{ChatroomId, MessageId};

/// Fixed key holding the signed-in [`Session`].
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Key holding the chatroom collection of one identity.
pub fn chatrooms_key(phone_number: &str) -> String {
    format!("chatrooms_{phone_number}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub phone_number: String,
}

impl Session {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub timestamp: String,
}

impl Message {
    pub fn user(text: Option<String>, image_url: Option<String>) -> Self {
        Self {
            id: MessageId::generate(),
            sender: Sender::User,
            text,
            image_url,
            timestamp: local_timestamp(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            sender: Sender::Assistant,
            text: Some(text.into()),
            image_url: None,
            timestamp: local_timestamp(),
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chatroom {
    pub id: ChatroomId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Chatroom {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ChatroomId::generate(),
            title: title.into(),
            messages: Vec::new(),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Local wall-clock time as `HH:MM`.
pub fn local_timestamp() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_use_camel_case_and_omit_missing_fields() {
        let message = Message {
            id: MessageId::from("m1"),
            sender: Sender::Assistant,
            text: Some("hi".to_string()),
            image_url: None,
            timestamp: "09:05".to_string(),
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "m1", "sender": "ai", "text": "hi", "timestamp": "09:05"})
        );

        let session = serde_json::to_string(&Session::new("+19876543210")).unwrap();
        assert_eq!(session, "{\"phoneNumber\":\"+19876543210\"}");
    }

    #[test]
    fn assistant_alias_is_accepted_on_read() {
        let message: Message = serde_json::from_str(
            r#"{"id":"m2","sender":"assistant","imageUrl":"data:image/png;base64,AA==","timestamp":"10:00"}"#,
        )
        .unwrap();

        assert_eq!(message.sender, Sender::Assistant);
        assert_eq!(message.text(), "");
        assert_eq!(message.image_url.as_deref(), Some("data:image/png;base64,AA=="));
    }

    #[test]
    fn chatroom_without_messages_field_loads_empty() {
        let chatroom: Chatroom = serde_json::from_str(r#"{"id":"c1","title":"Test"}"#).unwrap();
        assert!(chatroom.messages.is_empty());
        assert!(chatroom.last_message().is_none());
    }

    #[test]
    fn timestamps_are_hours_and_minutes() {
        let stamp = local_timestamp();
        assert_eq!(stamp.len(), 5);
        assert_eq!(&stamp[2..3], ":");
    }

    #[test]
    fn collection_keys_are_per_identity() {
        assert_eq!(chatrooms_key("+19876543210"), "chatrooms_+19876543210");
        assert_ne!(chatrooms_key("+1"), chatrooms_key("+2"));
    }
}
