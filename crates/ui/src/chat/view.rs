use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex};
use murmur_core::{Composer, PendingReply, Timings};

use crate::chat::events::Submit;
use crate::chat::message_list::ASSISTANT_NAME;
use crate::chat::{MessageInput, MessageList};
use crate::model::AppModel;
use crate::settings::{SettingsChanged, SettingsState};

/// Coordinator for the selected chatroom: message list, composer and scripted replies.
pub struct ChatView {
    app_model: Entity<AppModel>,
    composer: Entity<Composer>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    timings: Timings,
    identity: Option<String>,
    reply_tasks: Vec<Task<()>>,
}

impl ChatView {
    pub fn new(
        app_model: Entity<AppModel>,
        settings_state: &Entity<SettingsState>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let timings = settings_state.read(cx).settings().timings;
        let composer = cx.new(|_| Composer::new());
        let message_list = cx.new(|cx| MessageList::new(app_model.clone(), timings, cx));
        let message_input =
            cx.new(|cx| MessageInput::new(composer.clone(), app_model.clone(), window, cx));
        let identity = app_model.read(cx).phone_number().map(str::to_string);

        cx.subscribe(&message_input, |this, _, _event: &Submit, cx| {
            this.handle_submit(cx);
        })
        .detach();

        cx.subscribe(settings_state, |this, _, event: &SettingsChanged, cx| {
            this.timings = event.settings.timings;
            let timings = this.timings;
            this.message_list
                .update(cx, |list, cx| list.set_timings(timings, cx));
        })
        .detach();

        cx.observe(&app_model, |this, app_model, cx| {
            let identity = app_model.read(cx).phone_number().map(str::to_string);
            if identity != this.identity {
                this.identity = identity;
                this.drop_pending_replies(cx);
            }
            cx.notify();
        })
        .detach();

        Self {
            app_model,
            composer,
            message_list,
            message_input,
            timings,
            identity,
            reply_tasks: Vec::new(),
        }
    }

    fn handle_submit(&mut self, cx: &mut Context<Self>) {
        let app_model = self.app_model.clone();
        let reply = self.composer.update(cx, |composer, cx| {
            let reply = app_model.update(cx, |model, cx| model.send_draft(composer, cx));
            cx.notify();
            reply
        });
        let Some(reply) = reply else {
            return;
        };

        self.message_list
            .update(cx, |list, cx| list.request_scroll_to_bottom(cx));
        self.schedule_reply(reply, cx);
    }

    fn schedule_reply(&mut self, reply: PendingReply, cx: &mut Context<Self>) {
        let delay = self.timings.reply_delay();

        self.reply_tasks.push(cx.spawn(async move |this, cx| {
            cx.background_executor().timer(delay).await;

            let _ = this.update(cx, |this, cx| {
                this.deliver_reply(reply, cx);
            });
        }));
        cx.notify();
    }

    fn deliver_reply(&mut self, reply: PendingReply, cx: &mut Context<Self>) {
        self.app_model
            .update(cx, |model, cx| model.deliver_reply(reply, cx));
        self.composer.update(cx, |composer, _| composer.reply_delivered());

        if !self.composer.read(cx).is_typing() {
            self.reply_tasks.clear();
        }
        cx.notify();
    }

    /// Replies owed to a previous session are dropped with their timers.
    fn drop_pending_replies(&mut self, cx: &mut Context<Self>) {
        self.reply_tasks.clear();
        self.composer.update(cx, |composer, cx| {
            composer.reset_typing();
            composer.set_text("");
            composer.clear_attachment();
            cx.notify();
        });
    }

    fn render_header(&self, title: Option<SharedString>, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .id("chat-view-header")
            .w_full()
            .flex_shrink_0()
            .px_4()
            .py_2()
            .border_b_1()
            .border_color(theme.border)
            .child(
                Label::new(title.unwrap_or_else(|| "No chatroom selected".into()))
                    .text_sm()
                    .text_color(theme.foreground),
            )
    }

    fn render_empty_state(&self, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .id("chat-view-empty")
            .flex_1()
            .min_h_0()
            .items_center()
            .justify_center()
            .px_4()
            .child(
                Label::new("Select a chatroom or create a new one to start chatting!")
                    .text_sm()
                    .text_color(theme.foreground.opacity(0.55)),
            )
            .into_any_element()
    }

    fn render_typing_indicator(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .id("chat-view-typing")
            .w_full()
            .px_4()
            .py_1()
            .gap_2()
            .items_center()
            .child(div().size(px(8.)).rounded_full().bg(theme.primary))
            .child(
                Label::new(format!("{ASSISTANT_NAME} is typing..."))
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.65)),
            )
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let title = self
            .app_model
            .read(cx)
            .selected_chatroom()
            .map(|chatroom| SharedString::from(chatroom.title.clone()));
        let has_selection = title.is_some();
        let is_typing = self.composer.read(cx).is_typing();

        v_flex()
            .id("chat-view")
            .relative()
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(self.render_header(title, cx))
            .map(|view| {
                if has_selection {
                    view.child(
                        div()
                            .id("chat-view-message-list")
                            .flex_1()
                            .min_h_0()
                            .child(self.message_list.clone()),
                    )
                } else {
                    view.child(self.render_empty_state(cx))
                }
            })
            .when(is_typing, |view| view.child(self.render_typing_indicator(cx)))
            .child(
                div()
                    .id("chat-view-message-input")
                    .flex_shrink_0()
                    .w_full()
                    .border_t_1()
                    .border_color(theme.border)
                    .child(self.message_input.clone()),
            )
    }
}
