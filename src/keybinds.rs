// A key binding is one primary virtual-key code plus modifier flags. The
// action sink receives it expanded into press order: modifiers first, primary
// key last (releases happen in reverse).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

const VK_LSHIFT: u8 = 160;
const VK_LCTRL: u8 = 162;
const VK_LALT: u8 = 164;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyboardModifiers: u32 {
        const SHIFT = 0x0001_0000;
        const CTRL = 0x0002_0000;
        const ALT = 0x0004_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBind {
    virtual_key: u8,
    modifiers: KeyboardModifiers,
}

impl KeyBind {
    /// An unset binding: expands to an empty key sequence.
    pub const fn unset() -> Self {
        Self {
            virtual_key: 0,
            modifiers: KeyboardModifiers::empty(),
        }
    }

    pub fn new(virtual_key: u8, modifiers: KeyboardModifiers) -> Self {
        // A cleared key never keeps dangling modifiers.
        let modifiers = if virtual_key == 0 {
            KeyboardModifiers::empty()
        } else {
            modifiers
        };
        Self {
            virtual_key,
            modifiers,
        }
    }

    pub const fn key(&self) -> u8 {
        self.virtual_key
    }

    pub const fn modifiers(&self) -> KeyboardModifiers {
        self.modifiers
    }

    pub const fn is_set(&self) -> bool {
        self.virtual_key != 0
    }

    /// Pack key and modifier mask into one u32.
    pub fn pack(&self) -> u32 {
        self.virtual_key as u32 + self.modifiers.bits()
    }

    pub fn from_packed(packed: u32) -> Self {
        Self::new(
            (packed & 0xFF) as u8,
            KeyboardModifiers::from_bits_truncate(packed & 0xFFFF_0000),
        )
    }

    /// The virtual key codes making up this binding, in press order:
    /// `[...modifiers, key]`. Empty if no binding is set.
    pub fn vkey_sequence(&self) -> Vec<u8> {
        if self.virtual_key == 0 {
            return Vec::new();
        }

        let mut keys = Vec::with_capacity(4);
        if self.modifiers.contains(KeyboardModifiers::SHIFT) {
            keys.push(VK_LSHIFT);
        }
        if self.modifiers.contains(KeyboardModifiers::CTRL) {
            keys.push(VK_LCTRL);
        }
        if self.modifiers.contains(KeyboardModifiers::ALT) {
            keys.push(VK_LALT);
        }
        keys.push(self.virtual_key);
        keys
    }
}

impl Default for KeyBind {
    fn default() -> Self {
        Self::unset()
    }
}

// Bindings persist as their packed integer form.
impl Serialize for KeyBind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.pack())
    }
}

impl<'de> Deserialize<'de> for KeyBind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(KeyBind::from_packed(u32::deserialize(deserializer)?))
    }
}
