use std::sync::Arc;

use murmur_storage::KeyValueStore;
use snafu::OptionExt;

use crate::error::{ChatResult, NotSignedInSnafu};
use crate::ids::ChatroomId;
use crate::model::{Chatroom, Message, chatrooms_key};
use crate::notice::{Notice, NoticeQueue};

/// The signed-in identity's chatrooms plus the selection pointer.
///
/// Only the selected id is stored; the chatroom itself is looked up on demand, so the pointer
/// can never hold a stale copy. Every mutation re-resolves the id and drops it when the
/// chatroom is gone.
pub struct ChatroomState {
    store: Arc<dyn KeyValueStore>,
    owner: Option<String>,
    chatrooms: Vec<Chatroom>,
    selected: Option<ChatroomId>,
    loading: bool,
    notices: NoticeQueue,
}

impl ChatroomState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            owner: None,
            chatrooms: Vec::new(),
            selected: None,
            loading: false,
            notices: NoticeQueue::default(),
        }
    }

    /// Reloads for `identity`, or clears everything when signed out. The selection survives
    /// only when the same id exists in the new collection.
    pub fn sync_session(&mut self, identity: Option<&str>) {
        match identity {
            Some(identity) => self.load(identity),
            None => {
                self.owner = None;
                self.chatrooms.clear();
                self.selected = None;
                self.loading = false;
                tracing::debug!("cleared chatrooms for signed-out session");
            }
        }
    }

    pub fn load(&mut self, identity: &str) {
        self.loading = true;
        self.owner = Some(identity.to_string());

        let key = chatrooms_key(identity);
        let loaded = match self.store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Chatroom>>(&raw) {
                Ok(chatrooms) => chatrooms,
                Err(error) => {
                    tracing::warn!(%error, key = %key, "stored chatrooms are unreadable");
                    self.notices
                        .push(Notice::error("Failed to load your chat history."));
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::warn!(%error, key = %key, "failed to read chatrooms");
                self.notices
                    .push(Notice::error("Failed to load your chat history."));
                Vec::new()
            }
        };

        self.chatrooms = loaded;
        self.chatrooms
            .sort_by_cached_key(|chatroom| chatroom.title.to_lowercase());
        self.resolve_selection();
        self.loading = false;
        tracing::info!(
            identity,
            count = self.chatrooms.len(),
            "loaded chatrooms"
        );
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn chatrooms(&self) -> &[Chatroom] {
        &self.chatrooms
    }

    pub fn get(&self, id: &ChatroomId) -> Option<&Chatroom> {
        self.chatrooms.iter().find(|chatroom| &chatroom.id == id)
    }

    pub fn selected_id(&self) -> Option<&ChatroomId> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&Chatroom> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Selects `id` when it names a known chatroom; anything else clears the selection.
    pub fn select(&mut self, id: Option<&ChatroomId>) {
        self.selected = id.filter(|id| self.get(id).is_some()).cloned();
    }

    pub fn create(&mut self, title: &str) -> ChatResult<ChatroomId> {
        self.owner.as_ref().context(NotSignedInSnafu {
            stage: "chatroom-create",
            action: "create a chatroom",
        })?;

        let chatroom = Chatroom::new(title);
        let id = chatroom.id.clone();
        tracing::info!(chatroom = %id, title, "created chatroom");
        self.chatrooms.push(chatroom);
        self.after_mutation();
        self.notices.push(Notice::success("Chatroom created!"));
        Ok(id)
    }

    pub fn delete(&mut self, id: &ChatroomId) {
        let before = self.chatrooms.len();
        self.chatrooms.retain(|chatroom| &chatroom.id != id);
        if self.chatrooms.len() != before {
            tracing::info!(chatroom = %id, "deleted chatroom");
        }
        self.after_mutation();
        self.notices.push(Notice::info("Chatroom deleted!"));
    }

    /// Appends to one chatroom; an unknown id is ignored.
    pub fn append_message(&mut self, chatroom_id: &ChatroomId, message: Message) -> ChatResult<()> {
        self.owner.as_ref().context(NotSignedInSnafu {
            stage: "chatroom-append-message",
            action: "send messages",
        })?;

        match self
            .chatrooms
            .iter_mut()
            .find(|chatroom| &chatroom.id == chatroom_id)
        {
            Some(chatroom) => {
                tracing::debug!(chatroom = %chatroom_id, message = %message.id, "appended message");
                chatroom.messages.push(message);
            }
            None => {
                tracing::debug!(chatroom = %chatroom_id, "append to missing chatroom ignored");
            }
        }
        self.after_mutation();
        Ok(())
    }

    /// Chatrooms whose title contains `query`, ignoring case. An empty query matches all.
    pub fn search(&self, query: &str) -> Vec<&Chatroom> {
        let needle = query.trim().to_lowercase();
        self.chatrooms
            .iter()
            .filter(|chatroom| chatroom.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    fn after_mutation(&mut self) {
        self.resolve_selection();
        self.persist();
    }

    fn resolve_selection(&mut self) {
        if let Some(id) = &self.selected
            && self.get(id).is_none()
        {
            tracing::debug!(chatroom = %id, "selected chatroom is gone");
            self.selected = None;
        }
    }

    fn persist(&self) {
        let Some(owner) = &self.owner else {
            return;
        };

        let key = chatrooms_key(owner);
        match serde_json::to_string(&self.chatrooms) {
            Ok(raw) => {
                if let Err(error) = self.store.set(&key, &raw) {
                    tracing::warn!(%error, key = %key, "failed to persist chatrooms");
                }
            }
            Err(error) => tracing::error!(%error, key = %key, "failed to serialize chatrooms"),
        }
    }
}

#[cfg(test)]
mod tests {
    use murmur_storage::{MemoryStorage, StorageResult};

    use super::*;
    use crate::error::ChatError;
    use crate::model::Sender;

    fn signed_in(identity: &str) -> (Arc<MemoryStorage>, ChatroomState) {
        let store = Arc::new(MemoryStorage::new());
        let mut state = ChatroomState::new(store.clone());
        state.sync_session(Some(identity));
        (store, state)
    }

    fn titles(state: &ChatroomState) -> Vec<&str> {
        state
            .chatrooms()
            .iter()
            .map(|chatroom| chatroom.title.as_str())
            .collect()
    }

    #[test]
    fn create_requires_a_session() {
        let mut state = ChatroomState::new(Arc::new(MemoryStorage::new()));
        let error = state.create("Trip Planning").unwrap_err();

        assert!(matches!(error, ChatError::NotSignedIn { .. }));
        assert_eq!(error.to_string(), "Please log in to create a chatroom.");
        assert!(state.chatrooms().is_empty());
        assert!(state.take_notices().is_empty());
    }

    #[test]
    fn created_ids_stay_unique_through_deletes() {
        let (_, mut state) = signed_in("+1");
        let mut live = Vec::new();
        for round in 0..20 {
            live.push(state.create(&format!("Room {round}")).unwrap());
            if round % 3 == 0 {
                let victim = live.remove(0);
                state.delete(&victim);
            }
        }

        let mut ids: Vec<_> = state.chatrooms().iter().map(|c| c.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), state.chatrooms().len());
        assert_eq!(ids.len(), live.len());
    }

    #[test]
    fn deleting_the_selected_chatroom_clears_selection() {
        let (_, mut state) = signed_in("+1");
        let only = state.create("Test").unwrap();
        state.select(Some(&only));
        assert_eq!(state.selected().map(|c| c.title.as_str()), Some("Test"));

        state.delete(&only);

        assert!(state.selected_id().is_none());
        assert!(state.chatrooms().is_empty());
    }

    #[test]
    fn deleting_an_unknown_id_is_a_no_op_but_still_notifies() {
        let (_, mut state) = signed_in("+1");
        state.create("Keep").unwrap();
        state.take_notices();

        state.delete(&ChatroomId::from("missing"));

        assert_eq!(titles(&state), vec!["Keep"]);
        assert_eq!(state.take_notices(), vec![Notice::info("Chatroom deleted!")]);
    }

    #[test]
    fn selecting_an_unknown_id_resolves_to_none() {
        let (_, mut state) = signed_in("+1");
        let id = state.create("Room").unwrap();
        state.select(Some(&id));
        state.select(Some(&ChatroomId::from("nope")));
        assert!(state.selected_id().is_none());
    }

    #[test]
    fn append_touches_only_the_target_chatroom() {
        let (_, mut state) = signed_in("+1");
        let first = state.create("First").unwrap();
        let second = state.create("Second").unwrap();
        let before = state.get(&second).cloned();

        state
            .append_message(&first, Message::user(Some("Hello".into()), None))
            .unwrap();
        state
            .append_message(&ChatroomId::from("ghost"), Message::assistant("lost"))
            .unwrap();

        assert_eq!(state.get(&first).unwrap().messages.len(), 1);
        assert_eq!(state.get(&first).unwrap().messages[0].sender, Sender::User);
        assert_eq!(state.get(&second).cloned(), before);
    }

    #[test]
    fn append_requires_a_session() {
        let mut state = ChatroomState::new(Arc::new(MemoryStorage::new()));
        let error = state
            .append_message(&ChatroomId::from("x"), Message::assistant("hi"))
            .unwrap_err();
        assert_eq!(error.to_string(), "Please log in to send messages.");
    }

    #[test]
    fn load_sorts_case_insensitively_and_round_trips() {
        let (store, mut state) = signed_in("+1");
        for title in ["banana", "Apple", "cherry", "apple"] {
            state.create(title).unwrap();
        }
        assert_eq!(titles(&state), vec!["banana", "Apple", "cherry", "apple"]);

        let saved = state.chatrooms().to_vec();
        let mut reloaded = ChatroomState::new(store);
        reloaded.sync_session(Some("+1"));

        assert_eq!(titles(&reloaded), vec!["Apple", "apple", "banana", "cherry"]);
        let mut expected = saved;
        expected.sort_by_key(|chatroom| chatroom.title.to_lowercase());
        assert_eq!(reloaded.chatrooms(), expected.as_slice());
    }

    #[test]
    fn switching_identity_never_shows_previous_chatrooms() {
        let store = Arc::new(MemoryStorage::new());
        let mut state = ChatroomState::new(store.clone());
        state.sync_session(Some("+1"));
        let id = state.create("Private").unwrap();
        state.select(Some(&id));

        state.sync_session(Some("+2"));
        assert!(state.chatrooms().is_empty());
        assert!(state.selected_id().is_none());

        state.sync_session(None);
        assert!(state.chatrooms().is_empty());
        assert!(state.owner().is_none());
        assert!(store.get("chatrooms_+1").unwrap().is_some());
    }

    #[test]
    fn reload_for_same_identity_keeps_selection() {
        let (_, mut state) = signed_in("+1");
        let id = state.create("Room").unwrap();
        state.select(Some(&id));

        state.sync_session(Some("+1"));

        assert_eq!(state.selected_id(), Some(&id));
    }

    #[test]
    fn corrupt_collection_loads_empty_with_notice() {
        let store = Arc::new(MemoryStorage::with_entries([("chatrooms_+1", "[{oops")]));
        let mut state = ChatroomState::new(store);
        state.sync_session(Some("+1"));

        assert!(state.chatrooms().is_empty());
        assert!(!state.is_loading());
        assert_eq!(
            state.take_notices(),
            vec![Notice::error("Failed to load your chat history.")]
        );
    }

    #[test]
    fn create_leaves_the_selection_alone() {
        let (_, mut state) = signed_in("+1");
        state.create("First").unwrap();
        assert_eq!(state.selected_id(), None);

        let first = state.chatrooms()[0].id.clone();
        state.select(Some(&first));
        state.create("Second").unwrap();

        assert_eq!(state.selected_id(), Some(&first));
        assert_eq!(state.chatrooms().len(), 2);
    }

    #[test]
    fn search_matches_titles_ignoring_case() {
        let (_, mut state) = signed_in("+1");
        for title in ["Trip Planning", "Groceries", "trip notes"] {
            state.create(title).unwrap();
        }

        let found: Vec<_> = state.search("TRIP").iter().map(|c| c.title.clone()).collect();
        assert_eq!(found, vec!["Trip Planning", "trip notes"]);
        assert_eq!(state.search("").len(), 3);
        assert_eq!(state.search("  trip  ").len(), 2);
        assert_eq!(state.search("   ").len(), 3);
        assert!(state.search("zzz").is_empty());
    }

    struct FailingWrites(MemoryStorage);

    impl KeyValueStore for FailingWrites {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            self.0.set("", "")
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            self.0.remove(key)
        }
    }

    #[test]
    fn write_failures_keep_memory_authoritative() {
        let mut state = ChatroomState::new(Arc::new(FailingWrites(MemoryStorage::new())));
        state.sync_session(Some("+1"));

        let id = state.create("Offline").unwrap();

        assert!(state.get(&id).is_some());
    }
}
