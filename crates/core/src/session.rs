use std::sync::Arc;

use murmur_storage::KeyValueStore;

use crate::model::{CURRENT_USER_KEY, Session, chatrooms_key};
use crate::notice::{Notice, NoticeQueue};

/// Who is signed in, mirrored to the store under [`CURRENT_USER_KEY`].
pub struct SessionState {
    store: Arc<dyn KeyValueStore>,
    current: Option<Session>,
    notices: NoticeQueue,
}

impl SessionState {
    /// Reads the persisted session. A missing record means nobody is signed in; an unreadable
    /// one is treated the same way and reported as a warning.
    pub fn restore(store: Arc<dyn KeyValueStore>) -> Self {
        let mut notices = NoticeQueue::default();
        let current = match store.get(CURRENT_USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => {
                    tracing::info!(phone = %session.phone_number, "restored session");
                    Some(session)
                }
                Err(error) => {
                    tracing::warn!(%error, "stored session is corrupt, starting signed out");
                    notices.push(Notice::warning("Failed to restore your session."));
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(%error, "failed to read stored session");
                notices.push(Notice::warning("Failed to restore your session."));
                None
            }
        };

        Self {
            store,
            current,
            notices,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.current
            .as_ref()
            .map(|session| session.phone_number.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn login(&mut self, phone_number: impl Into<String>) {
        let session = Session::new(phone_number);
        self.notices.push(Notice::success(format!(
            "Logged in as {}!",
            session.phone_number
        )));
        tracing::info!(phone = %session.phone_number, "signed in");
        self.current = Some(session);
        self.persist();
    }

    pub fn logout(&mut self) {
        self.current = None;
        self.persist();
        self.notices.push(Notice::info("Logged out successfully!"));
        tracing::info!("signed out");
    }

    /// Removes the signed-in identity's chatrooms and the session record.
    pub fn delete_account_and_data(&mut self) {
        if let Some(session) = self.current.take() {
            let key = chatrooms_key(&session.phone_number);
            if let Err(error) = self.store.remove(&key) {
                tracing::warn!(%error, key = %key, "failed to remove chatroom data");
            }
            self.notices.push(Notice::error(format!(
                "All data for {} deleted!",
                session.phone_number
            )));
        }

        self.persist();
        self.notices
            .push(Notice::error("Account and all associated chat data deleted!"));
        tracing::info!("account deleted");
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    fn persist(&self) {
        let result = match &self.current {
            Some(session) => match serde_json::to_string(session) {
                Ok(raw) => self.store.set(CURRENT_USER_KEY, &raw),
                Err(error) => {
                    tracing::error!(%error, "failed to serialize session");
                    return;
                }
            },
            None => self.store.remove(CURRENT_USER_KEY),
        };

        if let Err(error) = result {
            tracing::warn!(%error, "failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use murmur_storage::MemoryStorage;

    use super::*;
    use crate::notice::NoticeLevel;

    fn store() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[test]
    fn login_persists_and_restore_reads_it_back() {
        let store = store();
        let mut session = SessionState::restore(store.clone());
        assert!(!session.is_signed_in());

        session.login("+19876543210");
        let notices = session.take_notices();
        assert_eq!(notices, vec![Notice::success("Logged in as +19876543210!")]);

        let restored = SessionState::restore(store);
        assert_eq!(restored.phone_number(), Some("+19876543210"));
    }

    #[test]
    fn logout_clears_record_but_keeps_chatrooms() {
        let store = store();
        store.set("chatrooms_+1", "[]").unwrap();
        let mut session = SessionState::restore(store.clone());
        session.login("+1");
        session.logout();

        assert!(!session.is_signed_in());
        assert_eq!(store.get(CURRENT_USER_KEY).unwrap(), None);
        assert_eq!(store.get("chatrooms_+1").unwrap().as_deref(), Some("[]"));
        assert_eq!(
            session.take_notices().last(),
            Some(&Notice::info("Logged out successfully!"))
        );
    }

    #[test]
    fn delete_account_removes_only_that_identity() {
        let store = Arc::new(MemoryStorage::with_entries([
            ("chatrooms_+1", "[]"),
            ("chatrooms_+2", "[]"),
        ]));
        let mut session = SessionState::restore(store.clone());
        session.login("+1");
        session.take_notices();

        session.delete_account_and_data();

        assert!(!session.is_signed_in());
        assert_eq!(store.get("chatrooms_+1").unwrap(), None);
        assert_eq!(store.get(CURRENT_USER_KEY).unwrap(), None);
        assert_eq!(store.get("chatrooms_+2").unwrap().as_deref(), Some("[]"));

        let notices = session.take_notices();
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|notice| notice.level == NoticeLevel::Error));
    }

    #[test]
    fn corrupt_session_record_restores_signed_out() {
        let store = Arc::new(MemoryStorage::with_entries([(CURRENT_USER_KEY, "{not json")]));
        let mut session = SessionState::restore(store);

        assert!(!session.is_signed_in());
        assert_eq!(session.take_notices()[0].level, NoticeLevel::Warning);
    }
}
