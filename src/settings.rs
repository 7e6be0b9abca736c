// THEORY:
// Settings are written by a UI thread and read by the scan loop, so each
// value sits behind its own lock rather than one coarse lock over the whole
// struct — the scan loop must never stall because the user is dragging a
// slider. The settings service is plain data constructed once at process
// start and passed by reference wherever it is needed; there is deliberately
// no process-wide singleton.
//
// Persistence is JSON through serde. The on-disk shape is just the current
// values; locks and defaults are reconstructed on load.

use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::keybinds::KeyBind;

/// One independently lockable setting.
#[derive(Debug)]
pub struct Setting<T> {
    value: Mutex<T>,
    default: T,
}

impl<T: Clone> Setting<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial.clone()),
            default: initial,
        }
    }

    pub fn get(&self) -> T {
        self.value.lock().unwrap().clone()
    }

    pub fn set(&self, value: T) {
        *self.value.lock().unwrap() = value;
    }

    pub fn reset_to_default(&self) {
        *self.value.lock().unwrap() = self.default.clone();
    }
}

impl<T: Serialize> Serialize for Setting<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value.lock().unwrap().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Clone> Deserialize<'de> for Setting<T> {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        Ok(Setting::new(T::deserialize(deserializer)?))
    }
}

/// All tunables the scan loop and the calibration UI share.
#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsData {
    /// Target hue of the bobber feathers, degrees.
    pub target_hue: Setting<i32>,
    /// Tolerance around the target hue, degrees.
    pub hue_tolerance: Setting<i32>,
    /// Minimum connected pixels for a region to qualify as a bobber.
    pub min_connected: Setting<u32>,
    /// Splash sensitivity: bright-pixel count that triggers the catch.
    pub sensitivity: Setting<u32>,
    /// Channel threshold for the splash brightness counter.
    pub splash_threshold: Setting<u8>,
    /// Side length of the splash detection square, pixels.
    pub splash_area: Setting<i32>,
    pub use_lure: Setting<bool>,
    pub fishing_key: Setting<KeyBind>,
    pub lure_key: Setting<KeyBind>,
}

impl Default for SettingsData {
    fn default() -> Self {
        Self {
            target_hue: Setting::new(100),
            hue_tolerance: Setting::new(15),
            min_connected: Setting::new(30),
            sensitivity: Setting::new(100),
            splash_threshold: Setting::new(200),
            splash_area: Setting::new(80),
            use_lure: Setting::new(false),
            fishing_key: Setting::new(KeyBind::unset()),
            lure_key: Setting::new(KeyBind::unset()),
        }
    }
}

impl SettingsData {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybinds::KeyboardModifiers;

    #[test]
    fn settings_are_independently_mutable() {
        let settings = SettingsData::default();
        settings.target_hue.set(210);
        settings.sensitivity.set(40);
        assert_eq!(settings.target_hue.get(), 210);
        assert_eq!(settings.sensitivity.get(), 40);
        assert_eq!(settings.hue_tolerance.get(), 15);

        settings.target_hue.reset_to_default();
        assert_eq!(settings.target_hue.get(), 100);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = SettingsData::default();
        settings.target_hue.set(42);
        settings.use_lure.set(true);
        settings
            .fishing_key
            .set(KeyBind::new(0x46, KeyboardModifiers::SHIFT));
        settings.save(&path).unwrap();

        let loaded = SettingsData::load(&path).unwrap();
        assert_eq!(loaded.target_hue.get(), 42);
        assert!(loaded.use_lure.get());
        assert_eq!(
            loaded.fishing_key.get(),
            KeyBind::new(0x46, KeyboardModifiers::SHIFT)
        );
        assert_eq!(loaded.min_connected.get(), 30);
    }
}
