use std::sync::Arc;

use murmur_storage::KeyValueStore;

use crate::chatrooms::ChatroomState;
use crate::error::ChatResult;
use crate::ids::ChatroomId;
use crate::model::{Chatroom, Message};
use crate::notice::Notice;
use crate::session::SessionState;

/// Application root: the session and the chatrooms it owns, kept in step.
///
/// Views receive this explicitly and drain [`AppState::take_notices`] after each action.
pub struct AppState {
    session: SessionState,
    chatrooms: ChatroomState,
    notices: Vec<Notice>,
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let session = SessionState::restore(store.clone());
        let mut chatrooms = ChatroomState::new(store);
        chatrooms.sync_session(session.phone_number());
        Self {
            session,
            chatrooms,
            notices: Vec::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn chatrooms(&self) -> &ChatroomState {
        &self.chatrooms
    }

    pub fn login(&mut self, phone_number: impl Into<String>) {
        self.session.login(phone_number);
        self.sync_chatrooms();
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.sync_chatrooms();
    }

    pub fn delete_account_and_data(&mut self) {
        self.session.delete_account_and_data();
        self.sync_chatrooms();
    }

    /// Creates a chatroom and reports precondition failures as notices.
    pub fn create_chatroom(&mut self, title: &str) -> Option<ChatroomId> {
        let created = self.chatrooms.create(title);
        self.report(created)
    }

    pub fn delete_chatroom(&mut self, id: &ChatroomId) {
        self.chatrooms.delete(id);
    }

    pub fn select_chatroom(&mut self, id: Option<&ChatroomId>) {
        self.chatrooms.select(id);
    }

    pub fn selected_chatroom(&self) -> Option<&Chatroom> {
        self.chatrooms.selected()
    }

    pub fn append_message(&mut self, chatroom_id: &ChatroomId, message: Message) -> bool {
        let appended = self.chatrooms.append_message(chatroom_id, message);
        self.report(appended).is_some()
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Pending notices in the order they were raised by each part.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut drained = self.session.take_notices();
        drained.extend(self.chatrooms.take_notices());
        drained.append(&mut self.notices);
        drained
    }

    fn sync_chatrooms(&mut self) {
        self.chatrooms.sync_session(self.session.phone_number());
    }

    fn report<T>(&mut self, result: ChatResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%error, "chat action rejected");
                self.notices.push(Notice::error(error.to_string()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use murmur_storage::MemoryStorage;

    use super::*;
    use crate::notice::NoticeLevel;

    #[test]
    fn login_loads_the_identity_collection() {
        let store = Arc::new(MemoryStorage::with_entries([(
            "chatrooms_+1",
            r#"[{"id":"1","title":"Saved","messages":[]}]"#,
        )]));
        let mut app = AppState::new(store);
        assert!(app.chatrooms().chatrooms().is_empty());

        app.login("+1");

        assert_eq!(app.chatrooms().chatrooms()[0].title, "Saved");
        assert_eq!(app.chatrooms().owner(), Some("+1"));
    }

    #[test]
    fn restart_restores_session_and_chatrooms() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
        let mut app = AppState::new(store.clone());
        app.login("+19876543210");
        app.create_chatroom("Trip Planning");

        let restarted = AppState::new(store);
        assert_eq!(restarted.session().phone_number(), Some("+19876543210"));
        assert_eq!(restarted.chatrooms().chatrooms().len(), 1);
    }

    #[test]
    fn delete_account_does_not_write_the_collection_back() {
        let store = Arc::new(MemoryStorage::new());
        let mut app = AppState::new(store.clone());
        app.login("+1");
        app.create_chatroom("Room");

        app.delete_account_and_data();

        assert_eq!(store.get("chatrooms_+1").unwrap(), None);
        assert_eq!(store.get("currentUser").unwrap(), None);
        assert!(app.chatrooms().chatrooms().is_empty());
        assert!(!app.session().is_signed_in());
    }

    #[test]
    fn startup_read_failures_are_queued_for_the_first_drain() {
        let store = Arc::new(MemoryStorage::with_entries([
            ("currentUser", r#"{"phoneNumber":"+1"}"#),
            ("chatrooms_+1", "{not json"),
        ]));
        let mut app = AppState::new(store);

        assert_eq!(
            app.take_notices(),
            vec![Notice::error("Failed to load your chat history.")]
        );
        assert!(app.take_notices().is_empty());

        let corrupt_session = Arc::new(MemoryStorage::with_entries([("currentUser", "{oops")]));
        let mut app = AppState::new(corrupt_session);
        assert_eq!(
            app.take_notices(),
            vec![Notice::warning("Failed to restore your session.")]
        );
    }

    #[test]
    fn signed_out_actions_become_error_notices() {
        let mut app = AppState::new(Arc::new(MemoryStorage::new()));

        assert_eq!(app.create_chatroom("Room"), None);
        assert!(!app.append_message(&ChatroomId::from("1"), Message::assistant("x")));

        let notices = app.take_notices();
        assert_eq!(
            notices,
            vec![
                Notice::error("Please log in to create a chatroom."),
                Notice::error("Please log in to send messages."),
            ]
        );
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Error));
    }
}
