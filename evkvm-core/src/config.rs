//! Loads and resolves the publisher's YAML configuration file into the
//! routing and hotkey tables the rest of the crate operates on.
//!
//! Grounded on `server.py` in the kybonet prototype, which reads a
//! `config.yml` with `subscribers` and a `switch_hotkey` and builds one
//! `State`/hotkey registration per entry; restructured here into a single
//! fallible `load` rather than a watcher-driven reload, per the switch's
//! explicit-construction redesign guidance.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crypto::{self, CryptoError};
use crate::hotkeys::{HotkeyAction, HotkeyTable};
use crate::platform::linux::key_name_to_code;
use crate::routing::{Destination, Subscriber};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("invalid YAML in config file {0}: {1}")]
    Yaml(PathBuf, #[source] serde_yaml::Error),
    #[error("no subscribers configured")]
    NoSubscribers,
    #[error("unknown hotkey name '{0}'")]
    UnknownHotkey(String),
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    subscribers: Vec<RawSubscriber>,
    #[serde(default)]
    devices: Vec<String>,
    #[serde(default)]
    hotkeys: RawHotkeys,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSubscriber {
    name: String,
    /// Path to a PEM-encoded RSA public key. Its absence is what marks this
    /// subscriber local — nothing else in the record names it.
    #[serde(default)]
    key: Option<PathBuf>,
    #[serde(default)]
    hotkey: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawHotkeys {
    switch: Option<String>,
    exit: Option<String>,
}

/// Everything the publisher needs to start: the devices to capture from,
/// the resolved subscriber list, and the hotkey dispatch table.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub devices: Vec<String>,
    pub subscribers: Vec<Subscriber>,
    pub hotkeys: HotkeyTable,
}

pub fn load(path: &Path) -> Result<PublisherConfig, ConfigError> {
    let raw_text = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    let raw: RawConfig =
        serde_yaml::from_str(&raw_text).map_err(|e| ConfigError::Yaml(path.to_path_buf(), e))?;

    if raw.subscribers.is_empty() {
        return Err(ConfigError::NoSubscribers);
    }

    let mut subscribers = Vec::with_capacity(raw.subscribers.len());
    let mut hotkeys = HotkeyTable::new();

    for raw_sub in raw.subscribers {
        let destination = match raw_sub.key.as_ref() {
            None => Destination::Local,
            Some(key_path) => match import_public_key(key_path) {
                Ok(public_key) => Destination::Remote { public_key },
                Err(e) => {
                    log::error!(
                        "skipping subscriber '{}': failed to import key {}: {e}",
                        raw_sub.name,
                        key_path.display()
                    );
                    continue;
                }
            },
        };

        let hotkey = match raw_sub.hotkey.as_deref() {
            Some(name) => Some(key_name_to_code(name).ok_or_else(|| ConfigError::UnknownHotkey(name.to_string()))?),
            None => None,
        };

        if let Some(scancode) = hotkey {
            hotkeys.bind(scancode, HotkeyAction::SwitchTo(subscribers.len()));
        }

        subscribers.push(Subscriber {
            name: raw_sub.name,
            hotkey,
            destination,
        });
    }

    if subscribers.is_empty() {
        return Err(ConfigError::NoSubscribers);
    }

    if let Some(name) = raw.hotkeys.switch.as_deref() {
        let scancode = key_name_to_code(name).ok_or_else(|| ConfigError::UnknownHotkey(name.to_string()))?;
        hotkeys.bind(scancode, HotkeyAction::Next);
    }

    if let Some(name) = raw.hotkeys.exit.as_deref() {
        let scancode = key_name_to_code(name).ok_or_else(|| ConfigError::UnknownHotkey(name.to_string()))?;
        hotkeys.bind(scancode, HotkeyAction::Exit);
    }

    Ok(PublisherConfig {
        devices: raw.devices,
        subscribers,
        hotkeys,
    })
}

fn import_public_key(path: &Path) -> Result<rsa::RsaPublicKey, CryptoError> {
    let pem = fs::read_to_string(path)
        .map_err(|e| CryptoError::InvalidPem(format!("reading {}: {e}", path.display())))?;
    crypto::public_key_from_pem(&pem)
}
