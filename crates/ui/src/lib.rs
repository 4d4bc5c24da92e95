#![deny(unsafe_code)]

/// Desktop chat client built with GPUI and gpui-component.
///
/// `app` holds the window shell, `auth` the phone sign-in screen and `chat` the
/// chatroom sidebar and conversation views.
pub mod app;
pub mod auth;
/// Chatroom list, message history and composer views.
pub mod chat;
pub mod model;
/// Settings persistence.
pub mod settings;
