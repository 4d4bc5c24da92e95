pub mod app;
pub mod attachment;
pub mod auth;
pub mod chatrooms;
pub mod compose;
pub mod directory;
pub mod error;
pub mod ids;
pub mod model;
pub mod notice;
pub mod pagination;
pub mod session;
pub mod timings;
pub mod validation;

pub use app::AppState;
pub use attachment::Attachment;
pub use auth::{AuthFlow, AuthStep, PhoneField, VerifyOutcome};
pub use chatrooms::ChatroomState;
pub use compose::{Composer, PendingReply};
pub use directory::Country;
pub use error::{ChatError, ChatResult, ValidationError};
pub use ids::{ChatroomId, MessageId};
pub use model::{Chatroom, Message, Sender, Session};
pub use notice::{Notice, NoticeLevel};
pub use pagination::MessageWindow;
pub use session::SessionState;
pub use timings::Timings;
