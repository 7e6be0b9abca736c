// THEORY:
// The engine decides *when* to act from pixel-derived state; *how* input
// reaches the OS is behind the `ActionSink` trait. The contract is small on
// purpose: press-then-release a virtual key sequence (modifiers pressed in
// order, released in reverse, with an optional hold between), move the cursor
// to an absolute position, and click. The engine never reads back the result
// of an action — success means "the commands were dispatched", nothing more.
//
// The live sink drives `enigo` and is feature-gated (`input`), the same
// opt-in stance the capture side takes. Tests use recording fakes.

use std::time::Duration;

use crate::error::Result;

pub trait ActionSink: Send {
    /// Press every key in order, hold, then release in reverse order.
    fn send_key_sequence(&mut self, virtual_keys: &[u8], hold: Duration) -> Result<()>;

    /// Move the cursor to an absolute screen position.
    fn move_mouse(&mut self, x: i32, y: i32) -> Result<()>;

    /// Press and release a mouse button, holding for `release_delay`.
    fn click(&mut self, right_button: bool, release_delay: Duration) -> Result<()>;
}

#[cfg(feature = "input")]
pub use live::EnigoActionSink;

#[cfg(feature = "input")]
mod live {
    use std::time::Duration;

    use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

    use crate::error::{Result, VisionError};

    use super::ActionSink;

    pub struct EnigoActionSink {
        enigo: Enigo,
    }

    impl EnigoActionSink {
        pub fn new() -> Result<Self> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| VisionError::InputFailed(e.to_string()))?;
            Ok(Self { enigo })
        }
    }

    impl ActionSink for EnigoActionSink {
        fn send_key_sequence(&mut self, virtual_keys: &[u8], hold: Duration) -> Result<()> {
            for &vk in virtual_keys {
                self.enigo
                    .key(Key::Other(vk as u32), Direction::Press)
                    .map_err(|e| VisionError::InputFailed(e.to_string()))?;
            }
            if !hold.is_zero() {
                std::thread::sleep(hold);
            }
            for &vk in virtual_keys.iter().rev() {
                self.enigo
                    .key(Key::Other(vk as u32), Direction::Release)
                    .map_err(|e| VisionError::InputFailed(e.to_string()))?;
            }
            Ok(())
        }

        fn move_mouse(&mut self, x: i32, y: i32) -> Result<()> {
            self.enigo
                .move_mouse(x, y, Coordinate::Abs)
                .map_err(|e| VisionError::InputFailed(e.to_string()))
        }

        fn click(&mut self, right_button: bool, release_delay: Duration) -> Result<()> {
            let button = if right_button {
                Button::Right
            } else {
                Button::Left
            };
            self.enigo
                .button(button, Direction::Press)
                .map_err(|e| VisionError::InputFailed(e.to_string()))?;
            if !release_delay.is_zero() {
                std::thread::sleep(release_delay);
            }
            self.enigo
                .button(button, Direction::Release)
                .map_err(|e| VisionError::InputFailed(e.to_string()))
        }
    }
}

/// Records dispatched actions instead of injecting them. For tests and
/// dry runs.
#[derive(Debug, Default)]
pub struct RecordingActionSink {
    pub key_sequences: Vec<Vec<u8>>,
    pub mouse_moves: Vec<(i32, i32)>,
    pub clicks: Vec<bool>,
}

impl RecordingActionSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActionSink for RecordingActionSink {
    fn send_key_sequence(&mut self, virtual_keys: &[u8], _hold: Duration) -> Result<()> {
        self.key_sequences.push(virtual_keys.to_vec());
        Ok(())
    }

    fn move_mouse(&mut self, x: i32, y: i32) -> Result<()> {
        self.mouse_moves.push((x, y));
        Ok(())
    }

    fn click(&mut self, right_button: bool, _release_delay: Duration) -> Result<()> {
        self.clicks.push(right_button);
        Ok(())
    }
}
