use std::ops::Range;

use crate::ids::ChatroomId;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Tail-anchored window over a chatroom's messages, grown one page at a time from the top.
#[derive(Debug, Clone)]
pub struct MessageWindow {
    page_size: usize,
    pages: usize,
    chatroom: Option<ChatroomId>,
    loading_more: bool,
}

impl Default for MessageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl MessageWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            pages: 1,
            chatroom: None,
            loading_more: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    /// Resets to a single page when the viewed chatroom changes.
    pub fn track(&mut self, chatroom: Option<&ChatroomId>) {
        if self.chatroom.as_ref() != chatroom {
            self.chatroom = chatroom.cloned();
            self.pages = 1;
            self.loading_more = false;
        }
    }

    /// Indices of the messages to show out of `total`.
    pub fn visible(&self, total: usize) -> Range<usize> {
        let shown = self.page_size.saturating_mul(self.pages).min(total);
        total - shown..total
    }

    pub fn has_older(&self, total: usize) -> bool {
        self.visible(total).start > 0
    }

    /// Starts loading an older page. Returns false when nothing is left or a load is running.
    pub fn begin_load_more(&mut self, total: usize) -> bool {
        if self.loading_more || !self.has_older(total) {
            return false;
        }
        self.loading_more = true;
        true
    }

    pub fn finish_load_more(&mut self) {
        if self.loading_more {
            self.loading_more = false;
            self.pages += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_shows_the_newest_page_first() {
        let window = MessageWindow::default();
        assert_eq!(window.visible(0), 0..0);
        assert_eq!(window.visible(5), 0..5);
        assert_eq!(window.visible(45), 25..45);
        assert!(window.has_older(45));
        assert!(!window.has_older(20));
    }

    #[test]
    fn loading_more_widens_by_one_page() {
        let mut window = MessageWindow::default();
        assert!(window.begin_load_more(45));
        assert!(!window.begin_load_more(45));
        window.finish_load_more();
        assert_eq!(window.visible(45), 5..45);

        assert!(window.begin_load_more(45));
        window.finish_load_more();
        assert_eq!(window.visible(45), 0..45);
        assert!(!window.begin_load_more(45));
    }

    #[test]
    fn switching_chatrooms_resets_the_window() {
        let mut window = MessageWindow::new(10);
        let first = ChatroomId::from("a");
        window.track(Some(&first));
        window.begin_load_more(30);
        window.finish_load_more();
        assert_eq!(window.visible(30), 10..30);

        window.track(Some(&first));
        assert_eq!(window.visible(30), 10..30);

        window.track(Some(&ChatroomId::from("b")));
        assert_eq!(window.visible(30), 20..30);
    }

    #[test]
    fn finish_without_begin_is_ignored() {
        let mut window = MessageWindow::new(10);
        window.finish_load_more();
        assert_eq!(window.visible(30), 20..30);
    }
}
