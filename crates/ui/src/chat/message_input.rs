use std::path::Path;
use std::sync::Arc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    label::Label,
    v_flex,
};
use murmur_core::attachment::IMAGE_EXTENSIONS;
use murmur_core::{Attachment, Composer, Notice};

use crate::chat::events::Submit;
use crate::chat::image::image_from_data_url;
use crate::model::AppModel;

const PREVIEW_SIZE: Pixels = px(64.);

/// Draft editor writing into the composer it shares with the chat view.
pub struct MessageInput {
    input_state: Entity<InputState>,
    composer: Entity<Composer>,
    app_model: Entity<AppModel>,
    preview: Option<Arc<Image>>,
    pending_newline: bool,
    pick_task: Option<Task<()>>,
}

impl EventEmitter<Submit> for MessageInput {}

impl MessageInput {
    pub fn new(
        composer: Entity<Composer>,
        app_model: Entity<AppModel>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let input_state = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("Type your message...")
                .clean_on_escape()
                .auto_grow(1, 8)
        });

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, event: &InputEvent, window, cx| {
                if let InputEvent::PressEnter { secondary } = event {
                    if *secondary {
                        this.pending_newline = false;
                        return;
                    }

                    if this.pending_newline {
                        // Shift+Enter inserted the newline already; this enter is its echo.
                        this.pending_newline = false;
                    } else {
                        this.trim_trailing_newline(window, cx);
                        this.handle_submit(cx);
                    }
                    return;
                }

                this.sync_draft(cx);
            },
        )
        .detach();

        // The chat view clears the composer after a successful send.
        cx.observe_in(&composer, window, |this, composer, window, cx| {
            let (draft_cleared, attachment_cleared) = {
                let composer = composer.read(cx);
                (composer.text().is_empty(), composer.attachment().is_none())
            };

            if draft_cleared && !this.input_state.read(cx).value().is_empty() {
                this.clear(window, cx);
            }
            if attachment_cleared {
                this.preview = None;
            }
            cx.notify();
        })
        .detach();

        Self {
            input_state,
            composer,
            app_model,
            preview: None,
            pending_newline: false,
            pick_task: None,
        }
    }

    pub fn clear(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        self.pending_newline = false;
    }

    fn sync_draft(&mut self, cx: &mut Context<Self>) {
        let content = self.input_state.read(cx).value().to_string();
        self.composer.update(cx, |composer, _| composer.set_text(content));
        cx.notify();
    }

    fn handle_shift_enter(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.pending_newline = true;
        self.input_state.update(cx, |state, cx| {
            state.insert("\n", window, cx);
        });
        cx.notify();
    }

    fn trim_trailing_newline(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            let value = state.value().to_string();
            if let Some(trimmed) = value.strip_suffix('\n') {
                state.set_value(trimmed.to_string(), window, cx);
            }
        });
    }

    fn handle_submit(&mut self, cx: &mut Context<Self>) {
        self.sync_draft(cx);
        cx.emit(Submit);
    }

    fn pick_image(&mut self, cx: &mut Context<Self>) {
        let paths = cx.prompt_for_paths(PathPromptOptions {
            files: true,
            directories: false,
            multiple: false,
            prompt: None,
        });

        self.pick_task = Some(cx.spawn(async move |this, cx| {
            let path = match paths.await {
                Ok(Ok(Some(mut paths))) => paths.pop(),
                Ok(Ok(None)) => None,
                Ok(Err(error)) => {
                    tracing::warn!("image picker failed: {error}");
                    None
                }
                Err(_) => None,
            };

            let _ = this.update(cx, |this, cx| {
                this.pick_task = None;
                if let Some(path) = path {
                    this.attach_path(&path, cx);
                }
            });
        }));
    }

    fn attach_path(&mut self, path: &Path, cx: &mut Context<Self>) {
        let notice = match Attachment::read(path) {
            Ok(attachment) => {
                self.preview = image_from_data_url(&attachment.data_url);
                self.composer
                    .update(cx, |composer, _| composer.attach(attachment))
            }
            Err(error) => {
                tracing::warn!("failed to attach image: {error}");
                Notice::error(unsupported_image_message())
            }
        };

        self.app_model
            .update(cx, |model, cx| model.push_notice(notice, cx));
        cx.notify();
    }

    fn remove_attachment(&mut self, cx: &mut Context<Self>) {
        self.preview = None;
        self.composer
            .update(cx, |composer, _| composer.clear_attachment());
        cx.notify();
    }

    fn render_attachment(&self, cx: &Context<Self>) -> Option<AnyElement> {
        let theme = cx.theme();
        let file_name = self.composer.read(cx).attachment()?.file_name.clone();

        Some(
            h_flex()
                .id("message-input-attachment")
                .gap_2()
                .items_center()
                .when_some(self.preview.clone(), |row, image| {
                    row.child(
                        img(image)
                            .size(PREVIEW_SIZE)
                            .object_fit(ObjectFit::Cover)
                            .rounded_md(),
                    )
                })
                .child(
                    Label::new(file_name)
                        .text_xs()
                        .text_color(theme.muted_foreground),
                )
                .child(
                    Button::new("remove-attachment")
                        .ghost()
                        .xsmall()
                        .icon(IconName::Close)
                        .on_click(cx.listener(|this, _, _window, cx| {
                            this.remove_attachment(cx);
                        })),
                )
                .into_any_element(),
        )
    }
}

fn unsupported_image_message() -> String {
    format!(
        "Please choose an image file ({}).",
        IMAGE_EXTENSIONS.join(", ")
    )
}

impl Render for MessageInput {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let can_send = self.composer.read(cx).can_send();

        v_flex()
            .bg(theme.background)
            .gap_2()
            .p_3()
            .children(self.render_attachment(cx))
            .child(
                div()
                    .w_full()
                    .px_3()
                    .py_2()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.background)
                    .on_key_down(cx.listener(|this, event: &KeyDownEvent, window, cx| {
                        if event.keystroke.key == "enter" && event.keystroke.modifiers.shift {
                            this.handle_shift_enter(window, cx);
                        }
                    }))
                    .child(Input::new(&self.input_state).w_full()),
            )
            .child(
                h_flex()
                    .w_full()
                    .justify_between()
                    .child(
                        Button::new("attach-image")
                            .ghost()
                            .small()
                            .icon(IconName::Plus)
                            .child("Image")
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.pick_image(cx);
                            })),
                    )
                    .child(
                        Button::new("send")
                            .small()
                            .primary()
                            .icon(IconName::ArrowUp)
                            .child("Send")
                            .disabled(!can_send)
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.handle_submit(cx);
                            })),
                    ),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::core::prelude::v1::test]
    fn unsupported_image_notice_lists_accepted_extensions() {
        let message = unsupported_image_message();
        for extension in IMAGE_EXTENSIONS {
            assert!(message.contains(extension), "{extension}");
        }
    }
}
