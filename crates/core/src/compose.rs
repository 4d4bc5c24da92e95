use murmur_responder::Responder;

use crate::app::AppState;
use crate::attachment::Attachment;
use crate::error::ChatError;
use crate::ids::ChatroomId;
use crate::model::Message;
use crate::notice::Notice;

/// A reply owed to a chatroom once the typing delay has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub chatroom_id: ChatroomId,
    pub prompt: String,
}

impl PendingReply {
    /// Appends the canned answer to the chatroom the prompt was sent to, even if the user has
    /// since switched away from it.
    pub fn deliver(self, app: &mut AppState, responder: &dyn Responder) {
        let reply = responder.reply(&self.prompt);
        app.append_message(&self.chatroom_id, Message::assistant(reply));
    }
}

/// Draft state of the message input plus the typing indicator.
#[derive(Debug, Default)]
pub struct Composer {
    text: String,
    attachment: Option<Attachment>,
    pending_replies: usize,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn attach(&mut self, attachment: Attachment) -> Notice {
        self.attachment = Some(attachment);
        Notice::info("Image ready to send!")
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    /// True while at least one reply is still owed.
    pub fn is_typing(&self) -> bool {
        self.pending_replies > 0
    }

    pub fn can_send(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment.is_some()
    }

    /// Sends the draft to the selected chatroom.
    ///
    /// Without a selection the user is told to pick one; an empty draft is ignored. On success
    /// the draft is cleared and the caller schedules the returned reply.
    pub fn send(&mut self, app: &mut AppState) -> Option<PendingReply> {
        let Some(chatroom_id) = app.chatrooms().selected_id().cloned() else {
            app.push_notice(Notice::error(
                ChatError::NoChatroomSelected {
                    stage: "compose-send",
                }
                .to_string(),
            ));
            return None;
        };
        if !self.can_send() {
            return None;
        }

        let prompt = self.text.trim().to_string();
        let text = (!prompt.is_empty()).then(|| prompt.clone());
        let image_url = self.attachment.as_ref().map(|image| image.data_url.clone());
        if !app.append_message(&chatroom_id, Message::user(text, image_url)) {
            return None;
        }

        self.text.clear();
        self.attachment = None;
        self.pending_replies += 1;
        app.push_notice(Notice::success("Message sent!"));
        tracing::debug!(chatroom = %chatroom_id, "message sent, reply scheduled");
        Some(PendingReply {
            chatroom_id,
            prompt,
        })
    }

    pub fn reply_delivered(&mut self) {
        self.pending_replies = self.pending_replies.saturating_sub(1);
    }

    /// Forgets owed replies, e.g. when their timers were dropped.
    pub fn reset_typing(&mut self) {
        self.pending_replies = 0;
    }
}
