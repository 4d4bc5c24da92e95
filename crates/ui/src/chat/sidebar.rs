use std::rc::Rc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, Icon, IconName, Sizable, VirtualListScrollHandle,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    label::Label,
    list::ListItem,
    v_flex, v_virtual_list,
};
use murmur_core::ChatroomId;
use murmur_core::validation::validate_title;

use crate::chat::events::SidebarToggleClicked;
use crate::model::AppModel;
use crate::settings::SettingsState;

const CHATROOM_ROW_HEIGHT: f32 = 52.0;
const PREVIEW_MAX_CHARS: usize = 40;

#[derive(Debug, Clone)]
struct SidebarRow {
    id: ChatroomId,
    title: SharedString,
    preview: SharedString,
}

pub struct ChatSidebar {
    app_model: Entity<AppModel>,
    settings_state: Entity<SettingsState>,
    search_input: Entity<InputState>,
    search_query: String,
    search_task: Option<Task<()>>,
    title_input: Entity<InputState>,
    create_form_open: bool,
    title_error: Option<SharedString>,
    confirm_delete_account: bool,
    rows: Vec<SidebarRow>,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll_handle: VirtualListScrollHandle,
}

impl EventEmitter<SidebarToggleClicked> for ChatSidebar {}

impl ChatSidebar {
    pub fn new(
        app_model: Entity<AppModel>,
        settings_state: Entity<SettingsState>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let search_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("Search chatrooms..."));
        let title_input = cx.new(|cx| InputState::new(window, cx).placeholder("Chatroom title"));

        cx.subscribe_in(
            &search_input,
            window,
            |this, _, _event: &InputEvent, _window, cx| {
                this.schedule_search(cx);
            },
        )
        .detach();

        cx.subscribe_in(
            &title_input,
            window,
            |this, _, event: &InputEvent, window, cx| {
                if let InputEvent::PressEnter { .. } = event {
                    this.submit_create_form(window, cx);
                }
            },
        )
        .detach();

        cx.observe(&app_model, |this, _, cx| {
            this.rebuild_rows(cx);
        })
        .detach();

        let mut sidebar = Self {
            app_model,
            settings_state,
            search_input,
            search_query: String::new(),
            search_task: None,
            title_input,
            create_form_open: false,
            title_error: None,
            confirm_delete_account: false,
            rows: Vec::new(),
            item_sizes: Rc::new(Vec::new()),
            scroll_handle: VirtualListScrollHandle::new(),
        };
        sidebar.rebuild_rows(cx);
        sidebar
    }

    pub fn open_create_form(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.create_form_open = true;
        self.title_error = None;
        let focus_handle = self.title_input.read(cx).focus_handle(cx);
        window.focus(&focus_handle);
        cx.notify();
    }

    fn close_create_form(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.create_form_open = false;
        self.title_error = None;
        self.title_input.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        cx.notify();
    }

    fn submit_create_form(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let raw_title = self.title_input.read(cx).value().to_string();
        let title = match validate_title(&raw_title) {
            Ok(title) => title.to_string(),
            Err(error) => {
                self.title_error = Some(error.to_string().into());
                cx.notify();
                return;
            }
        };

        let created = self
            .app_model
            .update(cx, |model, cx| model.create_chatroom(&title, cx));

        if created.is_some() {
            self.close_create_form(window, cx);
        }
    }

    fn schedule_search(&mut self, cx: &mut Context<Self>) {
        let debounce = self.settings_state.read(cx).settings().timings.search_debounce();

        self.search_task = Some(cx.spawn(async move |this, cx| {
            cx.background_executor().timer(debounce).await;

            let _ = this.update(cx, |this, cx| {
                this.search_query = this.search_input.read(cx).value().to_string();
                this.search_task = None;
                this.rebuild_rows(cx);
            });
        }));
    }

    fn select_chatroom(&mut self, id: ChatroomId, cx: &mut Context<Self>) {
        self.app_model
            .update(cx, |model, cx| model.select_chatroom(Some(&id), cx));
    }

    fn delete_chatroom(&mut self, id: ChatroomId, cx: &mut Context<Self>) {
        self.app_model
            .update(cx, |model, cx| model.delete_chatroom(&id, cx));
    }

    fn logout(&mut self, cx: &mut Context<Self>) {
        self.confirm_delete_account = false;
        self.app_model.update(cx, |model, cx| model.logout(cx));
    }

    fn set_confirm_delete_account(&mut self, confirm: bool, cx: &mut Context<Self>) {
        self.confirm_delete_account = confirm;
        cx.notify();
    }

    fn delete_account(&mut self, cx: &mut Context<Self>) {
        self.confirm_delete_account = false;
        self.app_model.update(cx, |model, cx| model.delete_account(cx));
    }

    fn rebuild_rows(&mut self, cx: &mut Context<Self>) {
        let rows: Vec<SidebarRow> = self
            .app_model
            .read(cx)
            .state()
            .chatrooms()
            .search(&self.search_query)
            .into_iter()
            .map(|chatroom| SidebarRow {
                id: chatroom.id.clone(),
                title: chatroom.title.clone().into(),
                preview: chatroom
                    .last_message()
                    .map(|message| preview_text(message.text(), message.image_url.is_some()))
                    .unwrap_or_else(|| "No messages yet".to_string())
                    .into(),
            })
            .collect();

        self.item_sizes = Rc::new(
            rows.iter()
                .map(|_| size(px(0.), px(CHATROOM_ROW_HEIGHT)))
                .collect(),
        );
        self.rows = rows;
        cx.notify();
    }

    fn render_toolbar(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        h_flex()
            .w_full()
            .min_w_0()
            .gap_2()
            .px_3()
            .pt(px(8.))
            .pb_2()
            .child(Input::new(&self.search_input).w_full().small())
            .child(
                Button::new("new")
                    .small()
                    .primary()
                    .icon(IconName::Plus)
                    .child("New")
                    .on_click(cx.listener(|this, _, window, cx| {
                        this.open_create_form(window, cx);
                    })),
            )
    }

    fn render_create_form(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("create-chatroom-form")
            .w_full()
            .gap_2()
            .mx_3()
            .mb_2()
            .p_3()
            .rounded_lg()
            .border_1()
            .border_color(theme.border)
            .bg(theme.muted)
            .child(Label::new("Create New Chatroom").text_sm())
            .child(Input::new(&self.title_input).w_full().small())
            .when_some(self.title_error.clone(), |form, error| {
                form.child(Label::new(error).text_xs().text_color(theme.danger))
            })
            .child(
                h_flex()
                    .gap_2()
                    .justify_end()
                    .child(
                        Button::new("create-chatroom-cancel")
                            .ghost()
                            .small()
                            .child("Cancel")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.close_create_form(window, cx);
                            })),
                    )
                    .child(
                        Button::new("create-chatroom-submit")
                            .primary()
                            .small()
                            .child("Create")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.submit_create_form(window, cx);
                            })),
                    ),
            )
    }

    fn render_placeholder(&mut self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .flex_1()
            .items_center()
            .justify_center()
            .px_4()
            .child(
                Label::new("No chatrooms found. Create one to start!")
                    .text_sm()
                    .text_color(theme.foreground.opacity(0.55)),
            )
            .into_any_element()
    }

    fn render_chatroom_list(&mut self, cx: &mut Context<Self>) -> AnyElement {
        if self.rows.is_empty() {
            return self.render_placeholder(cx);
        }

        let selected = self.app_model.read(cx).selected_chatroom_id().cloned();
        let item_sizes = self.item_sizes.clone();
        let rows = self.rows.clone();

        v_flex()
            .flex_1()
            .min_h_0()
            .child(
                v_virtual_list(
                    cx.entity().clone(),
                    "chatroom-list",
                    item_sizes,
                    move |_this, visible_range, _window, cx| {
                        let theme = cx.theme();

                        visible_range
                            .map(|index| {
                                let row = &rows[index];
                                let is_selected = selected.as_ref() == Some(&row.id);
                                let select_id = row.id.clone();
                                let delete_id = row.id.clone();

                                h_flex()
                                    .w_full()
                                    .h(px(CHATROOM_ROW_HEIGHT))
                                    .px_2()
                                    .gap_1()
                                    .items_center()
                                    .child(
                                        ListItem::new(("chatroom", index))
                                            .flex_1()
                                            .min_w_0()
                                            .h_full()
                                            .px_3()
                                            .py_1()
                                            .rounded_md()
                                            .selected(is_selected)
                                            .on_click(cx.listener(
                                                move |this, _event: &ClickEvent, _window, cx| {
                                                    this.select_chatroom(select_id.clone(), cx);
                                                },
                                            ))
                                            .child(
                                                v_flex()
                                                    .w_full()
                                                    .min_w_0()
                                                    .child(
                                                        div().truncate().child(
                                                            Label::new(row.title.clone())
                                                                .text_sm(),
                                                        ),
                                                    )
                                                    .child(
                                                        div().truncate().child(
                                                            Label::new(row.preview.clone())
                                                                .text_xs()
                                                                .text_color(
                                                                    theme
                                                                        .foreground
                                                                        .opacity(0.5),
                                                                ),
                                                        ),
                                                    ),
                                            ),
                                    )
                                    .child(
                                        Button::new(("delete-chatroom", index))
                                            .ghost()
                                            .xsmall()
                                            .icon(IconName::Delete)
                                            .on_click(cx.listener(move |this, _, _window, cx| {
                                                this.delete_chatroom(delete_id.clone(), cx);
                                            })),
                                    )
                                    .into_any_element()
                            })
                            .collect()
                    },
                )
                .w_full()
                .flex_1()
                .track_scroll(&self.scroll_handle),
            )
            .into_any_element()
    }

    fn render_footer(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let phone_number = self
            .app_model
            .read(cx)
            .phone_number()
            .unwrap_or_default()
            .to_string();

        v_flex()
            .w_full()
            .min_w_0()
            .gap_2()
            .px_3()
            .py_2()
            .border_t_1()
            .border_color(theme.border)
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(
                        div()
                            .id("sidebar-user-center")
                            .size(px(32.))
                            .flex_shrink_0()
                            .rounded_full()
                            .border_1()
                            .border_color(theme.border)
                            .bg(theme.muted)
                            .flex()
                            .items_center()
                            .justify_center()
                            .child(
                                Icon::new(IconName::CircleUser)
                                    .size(px(18.))
                                    .text_color(theme.foreground),
                            ),
                    )
                    .child(
                        v_flex()
                            .min_w_0()
                            .child(
                                Label::new("Logged in as:")
                                    .text_xs()
                                    .text_color(theme.foreground.opacity(0.5)),
                            )
                            .child(div().truncate().child(Label::new(phone_number).text_sm())),
                    ),
            )
            .map(|footer| {
                if self.confirm_delete_account {
                    footer.child(self.render_delete_account_confirmation(cx))
                } else {
                    footer.child(
                        h_flex()
                            .items_center()
                            .justify_between()
                            .child(
                                h_flex()
                                    .gap_1()
                                    .child(
                                        Button::new("sidebar-logout")
                                            .ghost()
                                            .small()
                                            .child("Logout")
                                            .on_click(cx.listener(|this, _, _window, cx| {
                                                this.logout(cx);
                                            })),
                                    )
                                    .child(
                                        Button::new("sidebar-delete-account")
                                            .small()
                                            .danger()
                                            .child("Delete Account")
                                            .on_click(cx.listener(|this, _, _window, cx| {
                                                this.set_confirm_delete_account(true, cx);
                                            })),
                                    ),
                            )
                            .child(
                                Button::new("sidebar-toggle")
                                    .ghost()
                                    .small()
                                    .icon(IconName::PanelLeftClose)
                                    .on_click(cx.listener(|_, _, _, cx| {
                                        cx.emit(SidebarToggleClicked);
                                    })),
                            ),
                    )
                }
            })
    }

    fn render_delete_account_confirmation(&self, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .id("delete-account-confirmation")
            .gap_2()
            .p_2()
            .rounded_md()
            .border_1()
            .border_color(theme.danger)
            .child(
                Label::new(
                    "Delete your account and all chat data? This action cannot be undone.",
                )
                .text_xs(),
            )
            .child(
                h_flex()
                    .gap_2()
                    .justify_end()
                    .child(
                        Button::new("delete-account-cancel")
                            .ghost()
                            .small()
                            .child("Cancel")
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.set_confirm_delete_account(false, cx);
                            })),
                    )
                    .child(
                        Button::new("delete-account-confirm")
                            .danger()
                            .small()
                            .child("Delete")
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.delete_account(cx);
                            })),
                    ),
            )
            .into_any_element()
    }
}

impl Render for ChatSidebar {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .size_full()
            .min_w_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(self.render_toolbar(cx))
            .when(self.create_form_open, |sidebar| {
                sidebar.child(self.render_create_form(cx))
            })
            .child(self.render_chatroom_list(cx))
            .child(self.render_footer(cx))
    }
}

/// One-line summary of a chatroom's last message.
fn preview_text(text: &str, has_image: bool) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        return if has_image {
            "Image".to_string()
        } else {
            String::new()
        };
    }

    if line.chars().count() > PREVIEW_MAX_CHARS {
        let truncated: String = line.chars().take(PREVIEW_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::core::prelude::v1::test]
    fn previews_use_the_first_line_and_truncate() {
        assert_eq!(preview_text("hello\nworld", false), "hello");
        assert_eq!(preview_text("", true), "Image");
        assert_eq!(preview_text("  ", false), "");

        let long = "a".repeat(60);
        let preview = preview_text(&long, false);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 3);
        assert!(preview.ends_with("..."));
    }
}
