//! The fixed key table.
//!
//! Only keys listed here can take part in a shortcut. Each key has exactly one
//! canonical token used in shortcut text ("A", "F7", "PageDown", "/") and one
//! or more DOM key codes that map to it. Codes outside the table never produce
//! a shortcut.

use std::fmt;

macro_rules! key_table {
    (@first $first:literal $(, $rest:literal)*) => { $first };
    ($($variant:ident => $name:literal, [$($code:literal),+];)*) => {
        /// A key that can appear in a shortcut.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Key {
            $(
                #[doc = concat!("The `", $name, "` key.")]
                $variant,
            )*
        }

        impl Key {
            /// Every key in the table, in table order.
            pub const ALL: &'static [Key] = &[$(Key::$variant,)*];

            /// The canonical token for this key in shortcut text.
            pub fn name(self) -> &'static str {
                match self {
                    $(Key::$variant => $name,)*
                }
            }

            /// Look up a key by its canonical token. Tokens are case-sensitive.
            pub fn from_name(name: &str) -> Option<Key> {
                match name {
                    $($name => Some(Key::$variant),)*
                    _ => None,
                }
            }

            /// Look up a key by DOM key code.
            pub fn from_code(code: u16) -> Option<Key> {
                match code {
                    $($($code)|+ => Some(Key::$variant),)*
                    _ => None,
                }
            }

            /// The primary DOM key code for this key.
            pub fn code(self) -> u16 {
                match self {
                    $(Key::$variant => key_table!(@first $($code),+),)*
                }
            }
        }
    };
}

key_table! {
    Backspace => "Backspace", [8];
    Tab => "Tab", [9];
    Enter => "Enter", [13];
    Escape => "Escape", [27];
    Space => "Space", [32];
    PageUp => "PageUp", [33];
    PageDown => "PageDown", [34];
    End => "End", [35];
    Home => "Home", [36];
    ArrowLeft => "Left", [37];
    ArrowUp => "Up", [38];
    ArrowRight => "Right", [39];
    ArrowDown => "Down", [40];
    Insert => "Insert", [45];
    Delete => "Delete", [46];

    Digit0 => "0", [48];
    Digit1 => "1", [49];
    Digit2 => "2", [50];
    Digit3 => "3", [51];
    Digit4 => "4", [52];
    Digit5 => "5", [53];
    Digit6 => "6", [54];
    Digit7 => "7", [55];
    Digit8 => "8", [56];
    Digit9 => "9", [57];

    A => "A", [65];
    B => "B", [66];
    C => "C", [67];
    D => "D", [68];
    E => "E", [69];
    F => "F", [70];
    G => "G", [71];
    H => "H", [72];
    I => "I", [73];
    J => "J", [74];
    K => "K", [75];
    L => "L", [76];
    M => "M", [77];
    N => "N", [78];
    O => "O", [79];
    P => "P", [80];
    Q => "Q", [81];
    R => "R", [82];
    S => "S", [83];
    T => "T", [84];
    U => "U", [85];
    V => "V", [86];
    W => "W", [87];
    X => "X", [88];
    Y => "Y", [89];
    Z => "Z", [90];

    Numpad0 => "Numpad0", [96];
    Numpad1 => "Numpad1", [97];
    Numpad2 => "Numpad2", [98];
    Numpad3 => "Numpad3", [99];
    Numpad4 => "Numpad4", [100];
    Numpad5 => "Numpad5", [101];
    Numpad6 => "Numpad6", [102];
    Numpad7 => "Numpad7", [103];
    Numpad8 => "Numpad8", [104];
    Numpad9 => "Numpad9", [105];
    NumpadMultiply => "NumpadMultiply", [106];
    NumpadAdd => "NumpadAdd", [107];
    NumpadSubtract => "NumpadSubtract", [109];
    NumpadDecimal => "NumpadDecimal", [110];
    NumpadDivide => "NumpadDivide", [111];

    F1 => "F1", [112];
    F2 => "F2", [113];
    F3 => "F3", [114];
    F4 => "F4", [115];
    F5 => "F5", [116];
    F6 => "F6", [117];
    F7 => "F7", [118];
    F8 => "F8", [119];
    F9 => "F9", [120];
    F10 => "F10", [121];
    F11 => "F11", [122];
    F12 => "F12", [123];

    // Firefox reports 59, 61 and 173 for these three.
    Semicolon => ";", [186, 59];
    Equal => "=", [187, 61];
    Comma => "Comma", [188];
    Minus => "-", [189, 173];
    Period => ".", [190];
    Slash => "/", [191];
    Backquote => "`", [192];
    BracketLeft => "[", [219];
    Backslash => "\\", [220];
    BracketRight => "]", [221];
    Quote => "'", [222];
}

/// DOM key codes of the modifier keys themselves (Shift, Ctrl, Alt, and the
/// Meta/Command variants reported by different browsers).
const MODIFIER_KEY_CODES: [u16; 7] = [16, 17, 18, 91, 92, 93, 224];

/// Check whether a key code belongs to a bare modifier key.
pub fn is_modifier_code(code: u16) -> bool {
    MODIFIER_KEY_CODES.contains(&code)
}

impl Key {
    /// Check if this is a letter key (A-Z).
    pub fn is_letter(self) -> bool {
        (65..=90).contains(&self.code())
    }

    /// Check if this is a digit on the main keyboard.
    pub fn is_digit(self) -> bool {
        (48..=57).contains(&self.code())
    }

    /// Check if this is a function key (F1-F12).
    pub fn is_function_key(self) -> bool {
        (112..=123).contains(&self.code())
    }

    /// Check if this is a numeric keypad key.
    pub fn is_numpad(self) -> bool {
        (96..=111).contains(&self.code())
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            Key::ArrowUp
                | Key::ArrowDown
                | Key::ArrowLeft
                | Key::ArrowRight
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
        )
    }

    /// Check if this is a named editing or control key.
    pub fn is_editing(self) -> bool {
        matches!(
            self,
            Key::Backspace | Key::Delete | Key::Insert | Key::Enter | Key::Tab | Key::Escape
        )
    }

    /// Check if pressing this key can type a character.
    ///
    /// Function keys, named navigation/editing keys, and codes below the
    /// printable ASCII range are not printable. Space is.
    pub fn is_printable(self) -> bool {
        !self.is_function_key() && !self.is_navigation() && !self.is_editing() && self.code() >= 32
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
