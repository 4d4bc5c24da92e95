use std::path::Path;
use std::sync::Arc;

use gpui::*;
use murmur_core::{AppState, Chatroom, ChatroomId, Composer, Notice, PendingReply};
use murmur_responder::{Responder, ScriptedResponder};
use murmur_storage::{KeyValueStore, MemoryStorage, SqliteStorage};

/// Shared application root handed to every view that reads or mutates chat state.
pub struct AppModel {
    state: AppState,
    responder: Arc<dyn Responder>,
}

impl AppModel {
    pub fn new(store: Arc<dyn KeyValueStore>, responder: Arc<dyn Responder>) -> Self {
        Self {
            state: AppState::new(store),
            responder,
        }
    }

    /// Opens the sqlite store at `database_path`, or an in-memory store when that fails.
    pub fn open(database_path: &Path) -> Self {
        Self::new(open_store(database_path), Arc::new(ScriptedResponder::default()))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.session().is_signed_in()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.state.session().phone_number()
    }

    pub fn selected_chatroom(&self) -> Option<&Chatroom> {
        self.state.selected_chatroom()
    }

    pub fn selected_chatroom_id(&self) -> Option<&ChatroomId> {
        self.state.chatrooms().selected_id()
    }

    pub fn login(&mut self, phone_number: String, cx: &mut Context<Self>) {
        self.state.login(phone_number);
        cx.notify();
    }

    pub fn logout(&mut self, cx: &mut Context<Self>) {
        self.state.logout();
        cx.notify();
    }

    pub fn delete_account(&mut self, cx: &mut Context<Self>) {
        self.state.delete_account_and_data();
        cx.notify();
    }

    pub fn create_chatroom(&mut self, title: &str, cx: &mut Context<Self>) -> Option<ChatroomId> {
        let created = self.state.create_chatroom(title);
        cx.notify();
        created
    }

    pub fn delete_chatroom(&mut self, id: &ChatroomId, cx: &mut Context<Self>) {
        self.state.delete_chatroom(id);
        cx.notify();
    }

    pub fn select_chatroom(&mut self, id: Option<&ChatroomId>, cx: &mut Context<Self>) {
        self.state.select_chatroom(id);
        cx.notify();
    }

    /// Runs the send protocol for `composer` against the selected chatroom.
    pub fn send_draft(
        &mut self,
        composer: &mut Composer,
        cx: &mut Context<Self>,
    ) -> Option<PendingReply> {
        let reply = composer.send(&mut self.state);
        cx.notify();
        reply
    }

    pub fn deliver_reply(&mut self, reply: PendingReply, cx: &mut Context<Self>) {
        reply.deliver(&mut self.state, self.responder.as_ref());
        cx.notify();
    }

    pub fn push_notice(&mut self, notice: Notice, cx: &mut Context<Self>) {
        self.state.push_notice(notice);
        cx.notify();
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.state.take_notices()
    }
}

fn open_store(database_path: &Path) -> Arc<dyn KeyValueStore> {
    let database_location = database_path.to_string_lossy().into_owned();

    // The app constructor is sync, so the pool is opened on a local current-thread runtime.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!("failed to initialize runtime for sqlite storage: {error}");
            return Arc::new(MemoryStorage::new());
        }
    };

    match runtime.block_on(SqliteStorage::open(&database_location)) {
        Ok(storage) => Arc::new(storage),
        Err(error) => {
            tracing::warn!(
                "failed to open sqlite storage at {database_location}: {error}. keeping data in memory"
            );
            Arc::new(MemoryStorage::new())
        }
    }
}
