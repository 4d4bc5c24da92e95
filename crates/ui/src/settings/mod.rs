pub mod state;

pub use state::{MurmurSettings, SettingsChanged, SettingsError, SettingsState, SettingsStore};
