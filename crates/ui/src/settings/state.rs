use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use gpui::*;
use gpui_component::{Theme, ThemeMode, ThemeRegistry};
use murmur_core::Timings;
use murmur_core::directory::DEFAULT_DIRECTORY_URL;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ResultExt, Snafu};

pub const SETTINGS_DIRECTORY_NAME: &str = "murmur";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const DATABASE_FILE_NAME: &str = "murmur.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MurmurSettings {
    #[serde(
        default = "default_theme_mode",
        serialize_with = "serialize_theme_mode",
        deserialize_with = "deserialize_theme_mode"
    )]
    pub theme_mode: ThemeMode,
    #[serde(default)]
    pub theme_name: String,
    /// Overrides the sqlite file location; empty means the platform data directory.
    #[serde(default)]
    pub storage_path: String,
    #[serde(default = "default_country_directory_url")]
    pub country_directory_url: String,
    #[serde(default)]
    pub timings: Timings,
}

impl Default for MurmurSettings {
    fn default() -> Self {
        Self {
            theme_mode: default_theme_mode(),
            theme_name: String::new(),
            storage_path: String::new(),
            country_directory_url: default_country_directory_url(),
            timings: Timings::default(),
        }
    }
}

impl MurmurSettings {
    pub fn normalized(mut self) -> Self {
        self.theme_name = self.theme_name.trim().to_string();
        self.storage_path = self.storage_path.trim().to_string();
        self.country_directory_url = if self.country_directory_url.trim().is_empty() {
            default_country_directory_url()
        } else {
            self.country_directory_url.trim().to_string()
        };
        self.timings.page_size = self.timings.page_size.max(1);
        self
    }

    pub fn database_path(&self) -> PathBuf {
        if self.storage_path.is_empty() {
            SettingsStore::default_data_dir().join(DATABASE_FILE_NAME)
        } else {
            PathBuf::from(&self.storage_path)
        }
    }

    pub fn with_theme_mode(&self, theme_mode: ThemeMode) -> Self {
        Self {
            theme_mode,
            ..self.clone()
        }
    }

    pub fn apply_theme(&self, window: Option<&mut Window>, cx: &mut App) {
        if let Some(theme_config) = ThemeRegistry::global(cx)
            .themes()
            .get(&SharedString::from(self.theme_name.clone()))
            .cloned()
        {
            let mode = theme_config.mode;
            if mode == self.theme_mode {
                let theme = Theme::global_mut(cx);
                if mode.is_dark() {
                    theme.dark_theme = theme_config;
                } else {
                    theme.light_theme = theme_config;
                }
            }
        }

        Theme::change(self.theme_mode, window, cx);
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<MurmurSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".murmur"))
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".murmur"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn settings(&self) -> Arc<MurmurSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: MurmurSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_disk(path: &Path) -> MurmurSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
            return MurmurSettings::default();
        }

        let figment = Figment::from(Serialized::defaults(MurmurSettings::default()))
            .merge(Json::file(path));

        match figment.extract::<MurmurSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                MurmurSettings::default()
            }
        }
    }

    fn persist(&self, settings: &MurmurSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

pub struct SettingsState {
    store: SettingsStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChanged {
    pub settings: MurmurSettings,
}

impl EventEmitter<SettingsChanged> for SettingsState {}

impl SettingsState {
    pub fn new(store: SettingsStore, cx: &mut App) -> Entity<Self> {
        cx.new(|_| Self { store })
    }

    pub fn settings(&self) -> Arc<MurmurSettings> {
        self.store.settings()
    }

    pub fn update_settings(
        &mut self,
        settings: MurmurSettings,
        cx: &mut Context<Self>,
    ) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.store.update(normalized_settings.clone())?;
        cx.emit(SettingsChanged {
            settings: normalized_settings,
        });
        cx.notify();
        Ok(())
    }
}

fn default_theme_mode() -> ThemeMode {
    ThemeMode::Light
}

fn default_country_directory_url() -> String {
    DEFAULT_DIRECTORY_URL.to_string()
}

fn serialize_theme_mode<S>(value: &ThemeMode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.name())
}

fn deserialize_theme_mode<'de, D>(deserializer: D) -> Result<ThemeMode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(parse_theme_mode(&value))
}

fn parse_theme_mode(value: &str) -> ThemeMode {
    if value.trim().eq_ignore_ascii_case("dark") {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::core::prelude::v1::test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = store.settings();

        assert_eq!(settings.theme_mode, ThemeMode::Light);
        assert_eq!(settings.country_directory_url, DEFAULT_DIRECTORY_URL);
        assert_eq!(settings.timings, Timings::default());
    }

    #[::core::prelude::v1::test]
    fn saved_settings_are_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");
        let store = SettingsStore::new(path.clone());

        let mut settings = MurmurSettings::default().with_theme_mode(ThemeMode::Dark);
        settings.timings.reply_delay_ms = 10;
        settings.storage_path = "  /tmp/murmur-test.db ".to_string();
        store.update(settings).unwrap();

        let reloaded = SettingsStore::new(path).settings();
        assert_eq!(reloaded.theme_mode, ThemeMode::Dark);
        assert_eq!(reloaded.timings.reply_delay_ms, 10);
        assert_eq!(reloaded.database_path(), PathBuf::from("/tmp/murmur-test.db"));
    }

    #[::core::prelude::v1::test]
    fn partial_file_is_merged_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"theme_mode": "DARK", "timings": {"page_size": 0}}"#,
        )
        .unwrap();

        let settings = SettingsStore::new(path).settings();
        assert_eq!(settings.theme_mode, ThemeMode::Dark);
        assert_eq!(settings.timings.page_size, 1);
        assert_eq!(settings.timings.otp_send_delay_ms, 2_000);
    }

    #[::core::prelude::v1::test]
    fn unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(*SettingsStore::new(path).settings(), MurmurSettings::default());
    }
}
