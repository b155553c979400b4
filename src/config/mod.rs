//! Configuration module for Medley.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    ApiSettings, ChatSettings, DownloaderSettings, GeneralSettings, ServerSettings, Settings,
    SpeechSettings, StoreProvider, StoreSettings,
};
