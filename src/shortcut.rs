//! Global shortcut accelerators
//!
//! Accelerators use the Electron spelling the dashboard records
//! (`CommandOrControl+Shift+F`, `Alt+T`, `F9`) and are converted into
//! global-hotkey key codes here.

use global_hotkey::hotkey::{Code, HotKey, Modifiers};

use crate::error::ShellError;

/// A parsed accelerator, ready to hand to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    accelerator: String,
    hotkey: HotKey,
}

impl Shortcut {
    pub fn parse(accelerator: &str) -> Result<Self, ShellError> {
        let invalid = |reason: &str| ShellError::InvalidShortcut {
            accelerator: accelerator.to_string(),
            reason: reason.to_string(),
        };

        let mut modifiers = Modifiers::empty();
        let mut key = None;

        for token in accelerator.split('+').map(str::trim) {
            if token.is_empty() {
                return Err(invalid("empty key in accelerator"));
            }
            if let Some(modifier) = string_to_modifier(token) {
                modifiers |= modifier;
                continue;
            }
            if key.is_some() {
                return Err(invalid("more than one non-modifier key"));
            }
            key = Some(string_to_code(token).ok_or_else(|| invalid("unknown key"))?);
        }

        let code = key.ok_or_else(|| invalid("no key after modifiers"))?;
        let modifiers = (!modifiers.is_empty()).then_some(modifiers);

        Ok(Shortcut {
            accelerator: accelerator.to_string(),
            hotkey: HotKey::new(modifiers, code),
        })
    }

    pub fn accelerator(&self) -> &str {
        &self.accelerator
    }

    pub fn hotkey(&self) -> HotKey {
        self.hotkey
    }

    /// Id the hotkey manager reports back in its events
    pub fn id(&self) -> u32 {
        self.hotkey.id()
    }
}

fn string_to_modifier(token: &str) -> Option<Modifiers> {
    match token.to_ascii_lowercase().as_str() {
        "commandorcontrol" | "cmdorctrl" => Some(command_or_control()),
        "control" | "ctrl" => Some(Modifiers::CONTROL),
        "command" | "cmd" | "super" | "meta" => Some(Modifiers::SUPER),
        "alt" | "option" => Some(Modifiers::ALT),
        "shift" => Some(Modifiers::SHIFT),
        _ => None,
    }
}

#[cfg(target_os = "macos")]
fn command_or_control() -> Modifiers {
    Modifiers::SUPER
}

#[cfg(not(target_os = "macos"))]
fn command_or_control() -> Modifiers {
    Modifiers::CONTROL
}

/// Convert key string to global-hotkey Code
fn string_to_code(key: &str) -> Option<Code> {
    let upper = key.to_ascii_uppercase();
    let code = match upper.as_str() {
        // Letters
        "A" => Code::KeyA,
        "B" => Code::KeyB,
        "C" => Code::KeyC,
        "D" => Code::KeyD,
        "E" => Code::KeyE,
        "F" => Code::KeyF,
        "G" => Code::KeyG,
        "H" => Code::KeyH,
        "I" => Code::KeyI,
        "J" => Code::KeyJ,
        "K" => Code::KeyK,
        "L" => Code::KeyL,
        "M" => Code::KeyM,
        "N" => Code::KeyN,
        "O" => Code::KeyO,
        "P" => Code::KeyP,
        "Q" => Code::KeyQ,
        "R" => Code::KeyR,
        "S" => Code::KeyS,
        "T" => Code::KeyT,
        "U" => Code::KeyU,
        "V" => Code::KeyV,
        "W" => Code::KeyW,
        "X" => Code::KeyX,
        "Y" => Code::KeyY,
        "Z" => Code::KeyZ,
        // Numbers
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        // Function keys
        "F1" => Code::F1,
        "F2" => Code::F2,
        "F3" => Code::F3,
        "F4" => Code::F4,
        "F5" => Code::F5,
        "F6" => Code::F6,
        "F7" => Code::F7,
        "F8" => Code::F8,
        "F9" => Code::F9,
        "F10" => Code::F10,
        "F11" => Code::F11,
        "F12" => Code::F12,
        // Named keys
        "SPACE" => Code::Space,
        "ENTER" | "RETURN" => Code::Enter,
        "TAB" => Code::Tab,
        "ESC" | "ESCAPE" => Code::Escape,
        "BACKSPACE" => Code::Backspace,
        "DELETE" => Code::Delete,
        "INSERT" => Code::Insert,
        "HOME" => Code::Home,
        "END" => Code::End,
        "PAGEUP" => Code::PageUp,
        "PAGEDOWN" => Code::PageDown,
        "UP" | "ARROWUP" => Code::ArrowUp,
        "DOWN" | "ARROWDOWN" => Code::ArrowDown,
        "LEFT" | "ARROWLEFT" => Code::ArrowLeft,
        "RIGHT" | "ARROWRIGHT" => Code::ArrowRight,
        _ => return None,
    };
    Some(code)
}

/// Build an accelerator from a key press the way the dashboard's recorder does.
/// Bare modifier presses return None.
pub fn accelerator_from_keys(key: &str, ctrl: bool, meta: bool, shift: bool, alt: bool) -> Option<String> {
    if matches!(key, "Control" | "Shift" | "Alt" | "Meta" | "Super") {
        return None;
    }

    let mut parts = Vec::new();
    if ctrl || meta {
        parts.push("CommandOrControl".to_string());
    }
    if shift {
        parts.push("Shift".to_string());
    }
    if alt {
        parts.push("Alt".to_string());
    }

    let key = if key == " " {
        "Space".to_string()
    } else {
        key.to_uppercase()
    };
    if key.is_empty() {
        return None;
    }
    parts.push(key);

    Some(parts.join("+"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifiers_and_key() {
        let shortcut = Shortcut::parse("Alt+T").unwrap();
        assert_eq!(shortcut.accelerator(), "Alt+T");
        assert_eq!(
            shortcut.hotkey(),
            HotKey::new(Some(Modifiers::ALT), Code::KeyT)
        );
    }

    #[test]
    fn command_or_control_maps_per_platform() {
        let shortcut = Shortcut::parse("CommandOrControl+Shift+F").unwrap();
        assert_eq!(
            shortcut.hotkey(),
            HotKey::new(Some(command_or_control() | Modifiers::SHIFT), Code::KeyF)
        );
    }

    #[test]
    fn bare_function_key_is_allowed() {
        let shortcut = Shortcut::parse("F9").unwrap();
        assert_eq!(shortcut.hotkey(), HotKey::new(None, Code::F9));
    }

    #[test]
    fn rejects_malformed_accelerators() {
        assert!(Shortcut::parse("").is_err());
        assert!(Shortcut::parse("Alt+").is_err());
        assert!(Shortcut::parse("Shift+Alt").is_err());
        assert!(Shortcut::parse("A+B").is_err());
        assert!(Shortcut::parse("Ctrl+Banana").is_err());
    }

    #[test]
    fn recorder_builds_electron_style_strings() {
        assert_eq!(
            accelerator_from_keys("f", true, false, true, false),
            Some("CommandOrControl+Shift+F".to_string())
        );
        assert_eq!(
            accelerator_from_keys(" ", false, false, false, true),
            Some("Alt+Space".to_string())
        );
        assert_eq!(
            accelerator_from_keys("x", true, true, false, false),
            Some("CommandOrControl+X".to_string())
        );
    }

    #[test]
    fn recorder_ignores_bare_modifiers() {
        assert_eq!(accelerator_from_keys("Shift", false, false, true, false), None);
        assert_eq!(accelerator_from_keys("Control", true, false, false, false), None);
    }

    #[test]
    fn recorded_accelerators_parse() {
        let recorded = accelerator_from_keys("k", true, false, false, true).unwrap();
        assert!(Shortcut::parse(&recorded).is_ok());
    }
}
