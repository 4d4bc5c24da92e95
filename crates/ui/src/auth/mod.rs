pub mod view;

pub use view::AuthView;
