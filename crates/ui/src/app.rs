use std::path::PathBuf;

use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::notification::{Notification, NotificationList};
use gpui_component::{
    ActiveTheme, Icon, IconName, Sizable, ThemeMode,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    v_flex,
};
use murmur_core::{Notice, NoticeLevel};

use crate::auth::AuthView;
use crate::chat::{ChatSidebar, ChatView, SidebarToggleClicked};
use crate::model::AppModel;
use crate::settings::SettingsState;

/// Returns the default themes directory path.
/// This is a pure function to allow deterministic testing of path resolution.
pub fn default_themes_path() -> PathBuf {
    PathBuf::from("./themes")
}

/// Default sidebar width when expanded.
pub const SIDEBAR_DEFAULT_WIDTH: f32 = 280.0;
/// Minimum allowed sidebar width.
pub const SIDEBAR_MIN_WIDTH: f32 = 220.0;
/// Maximum allowed sidebar width.
pub const SIDEBAR_MAX_WIDTH: f32 = 420.0;
pub const SIDEBAR_COLLAPSED_WIDTH: f32 = 56.0;
#[cfg(target_os = "macos")]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 78.0;
#[cfg(not(target_os = "macos"))]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 16.0;
#[cfg(target_os = "windows")]
const WINDOW_TOOLBAR_RIGHT_SAFE_PADDING: f32 = 120.0;
#[cfg(not(target_os = "windows"))]
const WINDOW_TOOLBAR_RIGHT_SAFE_PADDING: f32 = 16.0;
const _: () = {
    assert!(SIDEBAR_COLLAPSED_WIDTH > 0.0);
    assert!(SIDEBAR_MIN_WIDTH < SIDEBAR_DEFAULT_WIDTH);
    assert!(SIDEBAR_DEFAULT_WIDTH < SIDEBAR_MAX_WIDTH);
    assert!(SIDEBAR_MIN_WIDTH > 0.0);
};

/// Top toolbar height, scaled with the rem size so user font scaling is respected.
fn window_toolbar_height(window: &Window) -> Pixels {
    (1.75 * window.rem_size()).max(px(34.0))
}

/// Clamps a drag position to the allowed sidebar width range.
pub fn compute_sidebar_width(drag_x: f32) -> f32 {
    drag_x.clamp(SIDEBAR_MIN_WIDTH, SIDEBAR_MAX_WIDTH)
}

/// Toast for a queued notice, styled by its level.
fn notification_for(notice: Notice) -> Notification {
    let message = SharedString::from(notice.message);
    match notice.level {
        NoticeLevel::Info => Notification::info(message),
        NoticeLevel::Success => Notification::success(message),
        NoticeLevel::Warning => Notification::warning(message),
        NoticeLevel::Error => Notification::error(message),
    }
}

fn toggled_theme_mode(mode: ThemeMode) -> ThemeMode {
    if mode.is_dark() {
        ThemeMode::Light
    } else {
        ThemeMode::Dark
    }
}

gpui::actions!(shell, [NewChat, ToggleSidebar, Quit,]);

#[derive(Clone)]
struct SidebarResizeDrag;

/// Invisible drag preview; only the cursor changes while resizing.
struct EmptyDragView;

impl Render for EmptyDragView {
    fn render(&mut self, _: &mut Window, _: &mut Context<Self>) -> impl IntoElement {
        div()
    }
}

/// Root layout of the main window.
///
/// Shows the sign-in screen while no session exists, and the chatroom sidebar next to
/// the chat view once signed in. Notices queued on the app model are drained here into
/// the notification layer.
pub struct MurmurShell {
    notification_list: Entity<NotificationList>,
    app_model: Entity<AppModel>,
    settings_state: Entity<SettingsState>,
    auth_view: Entity<AuthView>,
    chat_view: Entity<ChatView>,
    sidebar: Entity<ChatSidebar>,
    sidebar_collapsed: bool,
    sidebar_width: f32,
    title_bar_should_move: bool,
}

impl MurmurShell {
    pub fn new(
        app_model: Entity<AppModel>,
        settings_state: Entity<SettingsState>,
        notification_list: Entity<NotificationList>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let auth_view = cx.new(|cx| {
            AuthView::new(app_model.clone(), settings_state.clone(), window, cx)
        });
        let chat_view = cx.new(|cx| ChatView::new(app_model.clone(), &settings_state, window, cx));
        let sidebar = cx.new(|cx| {
            ChatSidebar::new(app_model.clone(), settings_state.clone(), window, cx)
        });

        cx.subscribe(&sidebar, |this, _, _event: &SidebarToggleClicked, cx| {
            this.toggle_sidebar(cx);
        })
        .detach();

        cx.observe_in(&app_model, window, |this, _, window, cx| {
            this.drain_notices(window, cx);
            cx.notify();
        })
        .detach();

        cx.observe(&settings_state, |_, _, cx| cx.notify()).detach();

        // Restoring the session may already have queued read-failure warnings.
        cx.defer_in(window, |this, window, cx| {
            this.drain_notices(window, cx);
        });

        Self {
            notification_list,
            app_model,
            settings_state,
            auth_view,
            chat_view,
            sidebar,
            sidebar_collapsed: false,
            sidebar_width: SIDEBAR_DEFAULT_WIDTH,
            title_bar_should_move: false,
        }
    }

    fn drain_notices(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let notices = self.app_model.update(cx, |model, _| model.take_notices());
        for notice in notices {
            let notification = notification_for(notice);
            self.notification_list.update(cx, |list, cx| {
                list.push(notification, window, cx);
            });
        }
    }

    fn toggle_sidebar(&mut self, cx: &mut Context<Self>) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
        cx.notify();
    }

    fn resize_sidebar(&mut self, new_width: f32, cx: &mut Context<Self>) {
        self.sidebar_width = compute_sidebar_width(new_width);
        cx.notify();
    }

    fn new_chat(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if !self.app_model.read(cx).is_signed_in() {
            return;
        }

        self.sidebar_collapsed = false;
        self.sidebar
            .update(cx, |sidebar, cx| sidebar.open_create_form(window, cx));
        cx.notify();
    }

    fn toggle_theme(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let settings = self.settings_state.read(cx).settings();
        let next = settings.with_theme_mode(toggled_theme_mode(settings.theme_mode));

        next.apply_theme(Some(window), cx);
        let result = self
            .settings_state
            .update(cx, |state, cx| state.update_settings(next, cx));
        if let Err(error) = result {
            tracing::warn!("failed to persist theme mode: {error}");
        }
        cx.notify();
    }
}

impl Render for MurmurShell {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let toolbar_height = window_toolbar_height(window);
        let signed_in = self.app_model.read(cx).is_signed_in();
        let collapsed = self.sidebar_collapsed;

        div()
            .id("murmur-shell")
            .size_full()
            .relative()
            .bg(theme.background)
            .on_action(cx.listener(|this, _: &NewChat, window, cx| {
                this.new_chat(window, cx);
            }))
            .on_action(cx.listener(|this, _: &ToggleSidebar, _window, cx| {
                this.toggle_sidebar(cx);
            }))
            .child(
                v_flex().size_full().child(
                    h_flex()
                        .id("app-shell-body")
                        .flex_1()
                        .min_w_0()
                        .min_h_0()
                        .pt(toolbar_height)
                        .overflow_hidden()
                        .map(|body| {
                            if signed_in {
                                body.child(self.render_sidebar(cx))
                                    .when(!collapsed, |el| {
                                        el.child(self.render_resize_handle(cx))
                                    })
                                    .child(
                                        v_flex()
                                            .id("main-content")
                                            .flex_1()
                                            .h_full()
                                            .min_w_0()
                                            .min_h_0()
                                            .overflow_hidden()
                                            .child(self.chat_view.clone()),
                                    )
                            } else {
                                body.child(
                                    div()
                                        .id("auth-content")
                                        .flex_1()
                                        .h_full()
                                        .min_w_0()
                                        .overflow_hidden()
                                        .child(self.auth_view.clone()),
                                )
                            }
                        }),
                ),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .left_0()
                    .right_0()
                    .child(self.render_top_bar(window, toolbar_height, cx)),
            )
            .child(self.notification_list.clone())
    }
}

impl MurmurShell {
    fn render_collapsed_sidebar(&self, cx: &Context<Self>) -> AnyElement {
        v_flex()
            .id("collapsed-sidebar")
            .size_full()
            .items_center()
            .justify_between()
            .py_3()
            .px_2()
            .child(
                Button::new("new-chat-collapsed")
                    .ghost()
                    .small()
                    .icon(IconName::Plus)
                    .on_click(cx.listener(|this, _, window, cx| {
                        this.new_chat(window, cx);
                    })),
            )
            .child(
                Button::new("sidebar-expand")
                    .ghost()
                    .small()
                    .icon(IconName::PanelLeftOpen)
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.toggle_sidebar(cx);
                    })),
            )
            .into_any_element()
    }

    fn render_top_bar(
        &self,
        window: &Window,
        toolbar_height: Pixels,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();
        let theme_icon = if theme.mode.is_dark() {
            IconName::Sun
        } else {
            IconName::Moon
        };

        h_flex()
            .id("app-top-bar")
            .window_control_area(WindowControlArea::Drag)
            .on_mouse_down_out(cx.listener(|this, _, _window, _cx| {
                this.title_bar_should_move = false;
            }))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = false;
                }),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = true;
                }),
            )
            .on_mouse_move(cx.listener(|this, _, window, _cx| {
                if this.title_bar_should_move {
                    this.title_bar_should_move = false;
                    window.start_window_move();
                }
            }))
            .w_full()
            .h(toolbar_height)
            .flex_shrink_0()
            .pl(px(WINDOW_TOOLBAR_LEFT_SAFE_PADDING))
            .pr(px(WINDOW_TOOLBAR_RIGHT_SAFE_PADDING))
            .items_center()
            .justify_between()
            .bg(theme.background)
            .border_b_1()
            .border_color(theme.border)
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(
                        Icon::new(IconName::CircleUser)
                            .size(px(16.))
                            .text_color(theme.muted_foreground),
                    )
                    .child(
                        Label::new("Murmur")
                            .text_sm()
                            .text_color(theme.foreground),
                    ),
            )
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(
                        div()
                            .id("theme-toggle-area")
                            // Keep the click from starting a window drag.
                            .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
                            .child(
                                Button::new("theme-toggle")
                                    .ghost()
                                    .small()
                                    .icon(theme_icon)
                                    .on_click(cx.listener(|this, _, window, cx| {
                                        this.toggle_theme(window, cx);
                                    })),
                            ),
                    )
                    .child(self.render_linux_window_controls(window, cx)),
            )
            .when(
                cfg!(target_os = "linux") && window.window_controls().window_menu,
                |title_bar| {
                    title_bar.on_mouse_down(MouseButton::Right, |event, window, _| {
                        window.show_window_menu(event.position);
                    })
                },
            )
    }

    fn render_linux_window_controls(&self, window: &Window, cx: &Context<Self>) -> AnyElement {
        #[cfg(target_os = "linux")]
        {
            let maximize_icon = if window.is_maximized() {
                IconName::WindowRestore
            } else {
                IconName::WindowMaximize
            };

            h_flex()
                .id("linux-window-controls")
                .items_center()
                // Clicks on the controls must not reach the title bar's drag and maximize gestures.
                .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
                .on_mouse_down(MouseButton::Right, |_, _, cx| cx.stop_propagation())
                .gap_2()
                .ml_2()
                .child(
                    Button::new("linux-window-minimize")
                        .ghost()
                        .small()
                        .icon(IconName::WindowMinimize)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.minimize_window();
                        })),
                )
                .child(
                    Button::new("linux-window-maximize")
                        .ghost()
                        .small()
                        .icon(maximize_icon)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.zoom_window();
                        })),
                )
                .child(
                    Button::new("linux-window-close")
                        .ghost()
                        .small()
                        .icon(IconName::WindowClose)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.remove_window();
                        })),
                )
                .into_any_element()
        }

        #[cfg(not(target_os = "linux"))]
        {
            let _ = (window, cx);
            div().into_any_element()
        }
    }

    fn render_sidebar(&self, cx: &Context<Self>) -> impl IntoElement {
        let collapsed = self.sidebar_collapsed;
        let sidebar_width = if collapsed {
            SIDEBAR_COLLAPSED_WIDTH
        } else {
            self.sidebar_width
        };
        let sidebar_content = if collapsed {
            self.render_collapsed_sidebar(cx)
        } else {
            self.sidebar.clone().into_any_element()
        };
        let theme = cx.theme();

        div()
            .id("sidebar-container")
            .h_full()
            .min_w_0()
            .flex_shrink_0()
            .w(px(sidebar_width))
            .overflow_hidden()
            .bg(theme.background)
            .border_r_1()
            .border_color(theme.border)
            .child(sidebar_content)
    }

    fn render_resize_handle(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        div()
            .id("sidebar-resize-handle")
            .w(px(1.0))
            .h_full()
            .flex_shrink_0()
            .cursor(CursorStyle::ResizeLeftRight)
            .bg(theme.border)
            .hover(|el| el.bg(theme.primary))
            .on_drag(SidebarResizeDrag, |_, _, _, cx| cx.new(|_| EmptyDragView))
            .on_drag_move::<SidebarResizeDrag>(cx.listener(
                |this, event: &DragMoveEvent<SidebarResizeDrag>, _window, cx| {
                    let new_width: f32 = event.event.position.x.into();
                    this.resize_sidebar(new_width, cx);
                },
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::core::prelude::v1::test]
    fn sidebar_width_is_clamped_to_bounds() {
        assert_eq!(compute_sidebar_width(10.0), SIDEBAR_MIN_WIDTH);
        assert_eq!(compute_sidebar_width(300.0), 300.0);
        assert_eq!(compute_sidebar_width(9_000.0), SIDEBAR_MAX_WIDTH);
    }

    #[::core::prelude::v1::test]
    fn theme_toggle_flips_between_light_and_dark() {
        assert_eq!(toggled_theme_mode(ThemeMode::Light), ThemeMode::Dark);
        assert_eq!(toggled_theme_mode(ThemeMode::Dark), ThemeMode::Light);
    }

    #[::core::prelude::v1::test]
    fn themes_path_is_relative_to_working_directory() {
        assert_eq!(default_themes_path(), PathBuf::from("./themes"));
    }
}
