use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::Hasher;
use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    skeleton::Skeleton,
    text::TextView,
    v_flex, v_virtual_list,
};
use murmur_core::{ChatroomId, Message, MessageId, MessageWindow, Notice, Timings};

use crate::chat::image::image_from_data_url;
use crate::chat::scroll_manager::ScrollManager;
use crate::model::AppModel;

pub const ASSISTANT_NAME: &str = "Gemini";

const DEFAULT_CONTENT_WIDTH: Pixels = px(680.);
const LIST_HORIZONTAL_PADDING: Pixels = px(16.);
const CONTENT_WIDTH_CHANGE_EPSILON: f32 = 1.0;
const BUBBLE_MAX_WIDTH: Pixels = px(540.);
const BUBBLE_PADDING_X: Pixels = px(14.);
const BUBBLE_PADDING_Y: Pixels = px(10.);
const SENDER_LABEL_HEIGHT: Pixels = px(16.);
const ROW_GAP: Pixels = px(8.);
const FOOTER_HEIGHT: Pixels = px(22.);
const IMAGE_PREVIEW_SIZE: Pixels = px(220.);
const OLDER_ROW_HEIGHT: Pixels = px(40.);
const ESTIMATED_TEXT_LINE_HEIGHT: Pixels = px(18.);
const ESTIMATED_CHAR_WIDTH: f32 = 7.0;
const MARKDOWN_SAFE_FALLBACK_THRESHOLD_BYTES: usize = 128 * 1024;

struct SizeCacheEntry {
    layout_hash: u64,
    height: Pixels,
    measured: bool,
}

#[derive(Clone)]
enum ListRow {
    /// Top row offering (or loading) the previous page.
    Older { loading: bool },
    Message(Message),
}

/// Paged, virtualized view of the selected chatroom's messages.
pub struct MessageList {
    app_model: Entity<AppModel>,
    window: MessageWindow,
    page_load_delay: Duration,
    chatroom_id: Option<ChatroomId>,
    total: usize,
    rows: Vec<ListRow>,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll_manager: ScrollManager,
    size_cache: HashMap<MessageId, SizeCacheEntry>,
    images: HashMap<MessageId, Arc<Image>>,
    content_width: Option<Pixels>,
    load_task: Option<Task<()>>,
    _model_subscription: Subscription,
}

impl MessageList {
    pub fn new(app_model: Entity<AppModel>, timings: Timings, cx: &mut Context<Self>) -> Self {
        let model_subscription = cx.observe(&app_model, |this, _, cx| {
            this.sync_from_model(cx);
        });

        let mut list = Self {
            app_model,
            window: MessageWindow::new(timings.page_size),
            page_load_delay: timings.page_load_delay(),
            chatroom_id: None,
            total: 0,
            rows: Vec::new(),
            item_sizes: Rc::new(Vec::new()),
            scroll_manager: ScrollManager::new(),
            size_cache: HashMap::new(),
            images: HashMap::new(),
            content_width: None,
            load_task: None,
            _model_subscription: model_subscription,
        };
        list.sync_from_model(cx);
        list
    }

    pub fn set_timings(&mut self, timings: Timings, cx: &mut Context<Self>) {
        self.page_load_delay = timings.page_load_delay();
        if self.window.page_size() != timings.page_size.max(1) {
            self.window = MessageWindow::new(timings.page_size);
            self.load_task = None;
            self.sync_from_model(cx);
        }
    }

    /// Scrolls to the newest message, e.g. after the user sent one.
    pub fn request_scroll_to_bottom(&mut self, cx: &mut Context<Self>) {
        self.scroll_manager.request_scroll_to_bottom();
        cx.notify();
    }

    fn sync_from_model(&mut self, cx: &mut Context<Self>) {
        let (chatroom_id, total) = {
            let model = self.app_model.read(cx);
            match model.selected_chatroom() {
                Some(chatroom) => (Some(chatroom.id.clone()), chatroom.messages.len()),
                None => (None, 0),
            }
        };

        let switched = chatroom_id != self.chatroom_id;
        self.window.track(chatroom_id.as_ref());
        if switched {
            self.load_task = None;
            self.images.clear();
            self.scroll_manager.reset();
        }
        let grew = !switched && total > self.total;
        self.chatroom_id = chatroom_id;
        self.total = total;

        let visible = self.window.visible(total);
        let messages: Vec<Message> = self
            .app_model
            .read(cx)
            .selected_chatroom()
            .map(|chatroom| chatroom.messages[visible].to_vec())
            .unwrap_or_default();

        let mut rows = Vec::with_capacity(messages.len() + 1);
        if self.window.is_loading_more() || self.window.has_older(total) {
            rows.push(ListRow::Older {
                loading: self.window.is_loading_more(),
            });
        }
        for message in messages {
            self.cache_image(&message);
            rows.push(ListRow::Message(message));
        }
        self.rows = rows;
        self.rebuild_item_sizes();

        if grew {
            self.scroll_manager.request_scroll_to_bottom_if_following();
        }
        cx.notify();
    }

    fn load_older(&mut self, cx: &mut Context<Self>) {
        if !self.window.begin_load_more(self.total) {
            return;
        }
        self.sync_from_model(cx);

        let delay = self.page_load_delay;
        self.load_task = Some(cx.spawn(async move |this, cx| {
            cx.background_executor().timer(delay).await;

            let _ = this.update(cx, |this, cx| {
                this.window.finish_load_more();
                this.load_task = None;
                this.sync_from_model(cx);
            });
        }));
    }

    fn cache_image(&mut self, message: &Message) {
        if self.images.contains_key(&message.id) {
            return;
        }
        let Some(data_url) = message.image_url.as_deref() else {
            return;
        };

        match image_from_data_url(data_url) {
            Some(image) => {
                self.images.insert(message.id.clone(), image);
            }
            None => {
                tracing::warn!(message = %message.id, "skipping undecodable image attachment");
            }
        }
    }

    fn copy_message(&mut self, text: String, cx: &mut Context<Self>) {
        cx.write_to_clipboard(ClipboardItem::new_string(text));
        self.app_model.update(cx, |model, cx| {
            model.push_notice(Notice::success("Message copied to clipboard!"), cx);
        });
    }

    fn update_content_width(&mut self, cx: &mut Context<Self>) {
        let list_width = self.scroll_manager.bounds().size.width;
        if list_width <= Pixels::ZERO {
            return;
        }

        let next_content_width = max_pixels(px(1.), list_width - LIST_HORIZONTAL_PADDING * 2);
        let width_changed = self.content_width.is_none_or(|current| {
            (f32::from(current) - f32::from(next_content_width)).abs()
                > CONTENT_WIDTH_CHANGE_EPSILON
        });

        if width_changed {
            self.content_width = Some(next_content_width);

            for entry in self.size_cache.values_mut() {
                entry.measured = false;
            }

            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn rebuild_item_sizes(&mut self) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let mut active_ids = HashSet::with_capacity(self.rows.len());
        let mut sizes = Vec::with_capacity(self.rows.len());

        for row in &self.rows {
            let ListRow::Message(message) = row else {
                sizes.push(size(px(0.), OLDER_ROW_HEIGHT));
                continue;
            };

            let next_hash = layout_hash(message);
            let estimated_height = estimate_message_height(message, content_width);

            let entry = self
                .size_cache
                .entry(message.id.clone())
                .or_insert(SizeCacheEntry {
                    layout_hash: next_hash,
                    height: estimated_height,
                    measured: false,
                });

            if entry.layout_hash != next_hash {
                entry.layout_hash = next_hash;
                entry.height = estimated_height;
                entry.measured = false;
            } else if !entry.measured {
                entry.height = estimated_height;
            }

            sizes.push(size(px(0.), entry.height));
            active_ids.insert(message.id.clone());
        }

        self.size_cache.retain(|id, _| active_ids.contains(id));
        self.images.retain(|id, _| active_ids.contains(id));
        self.item_sizes = Rc::new(sizes);
    }

    fn measure_visible_items(
        &mut self,
        visible_range: Range<usize>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let available_space = size(
            AvailableSpace::Definite(content_width),
            AvailableSpace::MinContent,
        );
        let mut updated = false;

        for index in visible_range {
            let Some(ListRow::Message(message)) = self.rows.get(index).cloned() else {
                continue;
            };

            let mut row = self.render_message_row(&message, index, cx);
            let measured_height = row.layout_as_root(available_space, window, cx).height;
            let Some(entry) = self.size_cache.get_mut(&message.id) else {
                continue;
            };
            if !entry.measured || pixels_changed(entry.height, measured_height) {
                entry.height = measured_height;
                updated = true;
            }
            entry.measured = true;
        }

        if updated {
            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn render_row(&self, row: &ListRow, index: usize, cx: &mut Context<Self>) -> AnyElement {
        match row {
            ListRow::Older { loading: true } => v_flex()
                .w_full()
                .h(OLDER_ROW_HEIGHT)
                .gap_1()
                .justify_center()
                .child(Skeleton::new().w(px(220.)).h(px(12.)).rounded_md())
                .child(Skeleton::new().w(px(160.)).h(px(12.)).rounded_md())
                .into_any_element(),
            ListRow::Older { loading: false } => h_flex()
                .w_full()
                .h(OLDER_ROW_HEIGHT)
                .justify_center()
                .child(
                    Button::new("load-older-messages")
                        .ghost()
                        .small()
                        .child("Load older messages")
                        .on_click(cx.listener(|this, _, _window, cx| {
                            this.load_older(cx);
                        })),
                )
                .into_any_element(),
            ListRow::Message(message) => self.render_message_row(message, index, cx),
        }
    }

    fn render_message_row(
        &self,
        message: &Message,
        index: usize,
        cx: &mut Context<Self>,
    ) -> AnyElement {
        let theme = cx.theme();
        let is_user = message.is_from_user();
        let image = self.images.get(&message.id).cloned();
        let text = message.text().to_string();

        let body = v_flex()
            .gap_2()
            .when_some(image, |column, image| {
                column.child(
                    img(image)
                        .size(IMAGE_PREVIEW_SIZE)
                        .object_fit(ObjectFit::Contain)
                        .rounded_md(),
                )
            })
            .when(!text.is_empty(), |column| {
                column.child(render_text(message, &text, index, is_user))
            });

        let footer = h_flex()
            .h(FOOTER_HEIGHT)
            .gap_2()
            .items_center()
            .when(is_user, |row| row.flex_row_reverse())
            .child(
                Label::new(message.timestamp.clone())
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .when(!text.is_empty(), |row| {
                let copied = text.clone();
                row.child(
                    Button::new(("copy-message", index))
                        .ghost()
                        .xsmall()
                        .icon(IconName::Copy)
                        .on_click(cx.listener(move |this, _, _window, cx| {
                            this.copy_message(copied.clone(), cx);
                        })),
                )
            });

        if is_user {
            return v_flex()
                .w_full()
                .items_end()
                .gap_1()
                .child(
                    div()
                        .max_w(BUBBLE_MAX_WIDTH)
                        .px(BUBBLE_PADDING_X)
                        .py(BUBBLE_PADDING_Y)
                        .rounded_lg()
                        .bg(theme.accent)
                        .text_color(theme.accent_foreground)
                        .child(body),
                )
                .child(footer)
                .into_any_element();
        }

        v_flex()
            .w_full()
            .gap_1()
            .child(
                Label::new(ASSISTANT_NAME)
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .child(
                div()
                    .max_w(BUBBLE_MAX_WIDTH)
                    .px(BUBBLE_PADDING_X)
                    .py(BUBBLE_PADDING_Y)
                    .rounded_lg()
                    .bg(theme.muted)
                    .child(body),
            )
            .child(footer)
            .into_any_element()
    }
}

fn render_text(message: &Message, text: &str, index: usize, is_user: bool) -> AnyElement {
    if is_user || text.len() > MARKDOWN_SAFE_FALLBACK_THRESHOLD_BYTES {
        return Label::new(text.to_string()).text_sm().into_any_element();
    }

    let markdown_id = ElementId::Name(SharedString::from(format!(
        "assistant-markdown-{}-{index}",
        message.id
    )));

    TextView::markdown(markdown_id, text.to_string())
        .selectable(true)
        .into_any_element()
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.update_content_width(cx);
        self.scroll_manager.update_follow_state();
        self.scroll_manager.apply_pending_scroll();
        if self.scroll_manager.take_reached_top() {
            self.load_older(cx);
        }

        v_flex().size_full().min_h_0().child(
            v_virtual_list(
                cx.entity().clone(),
                "message-list",
                self.item_sizes.clone(),
                |this, visible_range, window, cx| {
                    this.update_content_width(cx);
                    this.measure_visible_items(visible_range.clone(), window, cx);
                    visible_range
                        .filter_map(|index| {
                            this.rows
                                .get(index)
                                .cloned()
                                .map(|row| this.render_row(&row, index, cx))
                        })
                        .collect::<Vec<_>>()
                },
            )
            .size_full()
            .px_4()
            .py_3()
            .gap_4()
            .track_scroll(self.scroll_manager.handle()),
        )
    }
}

fn layout_hash(message: &Message) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write(message.id.as_str().as_bytes());
    hasher.write_u8(u8::from(message.is_from_user()));
    hasher.write_u8(u8::from(message.image_url.is_some()));
    hasher.write(message.text().as_bytes());
    hasher.finish()
}

fn estimate_message_height(message: &Message, content_width: Pixels) -> Pixels {
    let bubble_width = min_pixels(content_width, BUBBLE_MAX_WIDTH);
    let text_width = max_pixels(px(1.), bubble_width - BUBBLE_PADDING_X * 2);

    let mut body_height = Pixels::ZERO;
    if message.image_url.is_some() {
        body_height += IMAGE_PREVIEW_SIZE;
    }
    if !message.text().is_empty() {
        if message.image_url.is_some() {
            body_height += ROW_GAP;
        }
        body_height += estimate_text_height(message.text(), text_width);
    }

    let mut total_height = body_height + BUBBLE_PADDING_Y * 2 + ROW_GAP + FOOTER_HEIGHT;
    if !message.is_from_user() {
        total_height += SENDER_LABEL_HEIGHT + ROW_GAP;
    }
    total_height
}

fn estimate_text_height(content: &str, width: Pixels) -> Pixels {
    if content.is_empty() {
        return ESTIMATED_TEXT_LINE_HEIGHT;
    }

    let chars_per_line = (f32::from(width) / ESTIMATED_CHAR_WIDTH).floor().max(1.0) as usize;

    let mut line_count = 0usize;
    for line in content.lines() {
        let char_count = line.chars().count().max(1);
        line_count += char_count.div_ceil(chars_per_line);
    }

    if content.ends_with('\n') {
        line_count += 1;
    }

    ESTIMATED_TEXT_LINE_HEIGHT * line_count.max(1)
}

fn max_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) >= f32::from(b) { a } else { b }
}

fn min_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) <= f32::from(b) { a } else { b }
}

fn pixels_changed(a: Pixels, b: Pixels) -> bool {
    (f32::from(a) - f32::from(b)).abs() > 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(count: usize) -> Vec<Message> {
        (0..count)
            .map(|index| {
                if index % 2 == 0 {
                    Message::user(Some(format!("question {index}")), None)
                } else {
                    Message::assistant(format!("answer {index}: virtualization fixture payload"))
                }
            })
            .collect()
    }

    #[::core::prelude::v1::test]
    fn long_history_keeps_row_metrics_deterministic() {
        let mut messages = history(2_000);
        let content_width = px(680.);

        let heights_before = messages
            .iter()
            .map(|message| estimate_message_height(message, content_width))
            .collect::<Vec<_>>();
        let hashes_before = messages.iter().map(layout_hash).collect::<Vec<_>>();
        assert!(heights_before.iter().all(|height| *height > Pixels::ZERO));

        if let Some(last_message) = messages.last_mut() {
            last_message.text = Some("edited tail".to_string());
        }
        let hashes_after = messages.iter().map(layout_hash).collect::<Vec<_>>();

        assert_eq!(hashes_before[..1_999], hashes_after[..1_999]);
        assert_ne!(hashes_before[1_999], hashes_after[1_999]);
    }

    #[::core::prelude::v1::test]
    fn images_and_assistant_labels_add_height() {
        let width = px(680.);
        let text_only = Message::user(Some("hello".to_string()), None);
        let with_image = Message::user(
            Some("hello".to_string()),
            Some("data:image/png;base64,AAAA".to_string()),
        );
        let reply = Message::assistant("hello");

        let text_height = estimate_message_height(&text_only, width);
        assert!(estimate_message_height(&with_image, width) > text_height + IMAGE_PREVIEW_SIZE);
        assert!(estimate_message_height(&reply, width) > text_height);
    }
}
