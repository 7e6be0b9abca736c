// THEORY:
// This file is the main entry point for the `angler_vision` library crate.
// It exposes the high-level surface a bot frontend needs: the screen buffer
// and scene reader for pixel-derived game state, the region scanner stack for
// bobber detection, and the session driver that ties them to input and
// settings.
//
// The layering is strict and one-directional. `core_modules` knows only about
// pixels and never about fishing; `session` knows about fishing and drives
// the core through its public operations. Capture and input backends are
// feature-gated (`live-capture`, `input`) so the analysis core builds and
// tests headless.

pub mod capture;
pub mod core_modules;
pub mod error;
pub mod input;
pub mod keybinds;
pub mod session;
pub mod settings;

pub use capture::{CaptureSource, DisplayMode, StillCaptureSource};
pub use core_modules::hue_classifier::HueClassifier;
pub use core_modules::pixel_color::PixelColor;
pub use core_modules::region_enumerator::RegionEnumerator;
pub use core_modules::region_scanner::{RegionScanner, ScanResult};
pub use core_modules::scene_reader::{DataColors, SceneReader};
pub use core_modules::screen_buffer::ScreenBuffer;
pub use core_modules::surface::{PixelSurface, Rect, StillSurface};
pub use error::{Result, VisionError};
pub use input::{ActionSink, RecordingActionSink};
pub use keybinds::{KeyBind, KeyboardModifiers};
pub use session::{FishingSession, SessionEvent};
pub use settings::{Setting, SettingsData};
