//! Services the registry consumes from its host.
//!
//! An [`Environment`] bundles the platform family, the translation lookup used
//! to resolve label keys, the navigator used by link actions, and the shared
//! shortcut-support mode. The [`ContextManager`](crate::ContextManager) clones
//! one environment into every context it creates, so changing the support mode
//! affects them all at once.

use std::fmt;
use std::sync::Arc;

use horizon_actions_core::Property;
use horizon_actions_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::event::KeyboardModifiers;

/// The host platform family.
///
/// Affects how modifiers are displayed and which modifier is the platform's
/// "command" key for standard editing shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// macOS and iOS style keyboards.
    Mac,
    /// Everything else.
    #[default]
    Standard,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") || cfg!(target_os = "ios") {
            Platform::Mac
        } else {
            Platform::Standard
        }
    }

    /// Check if this is the Mac family.
    pub fn is_mac(self) -> bool {
        self == Platform::Mac
    }

    /// Check whether the platform's command modifier is held (Meta on Mac,
    /// Ctrl elsewhere).
    pub fn command_held(self, modifiers: KeyboardModifiers) -> bool {
        match self {
            Platform::Mac => modifiers.meta,
            Platform::Standard => modifiers.control,
        }
    }

    /// The display label for a canonical modifier token.
    pub fn modifier_label(self, token: &'static str) -> &'static str {
        match (self, token) {
            (Platform::Mac, "Alt") => "Option",
            (Platform::Mac, "Meta") => "\u{2318}",
            _ => token,
        }
    }
}

/// Which kinds of keyboard shortcuts are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortcutSupport {
    /// No shortcuts at all.
    Off,
    /// Single key combinations only; sequences are disabled.
    Single,
    /// Single combinations and multi-key sequences.
    #[default]
    Sequence,
}

/// Resolves translation keys into display text.
pub trait Translator: Send + Sync {
    /// Look up the text for `key`.
    fn translate(&self, key: &str) -> String;
}

impl<F> Translator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn translate(&self, key: &str) -> String {
        self(key)
    }
}

/// A translator that returns keys unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Follows the `href` of link actions.
pub trait Navigator: Send + Sync {
    /// Navigate to `href`.
    fn navigate(&self, href: &str);
}

/// A navigator that only logs the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, href: &str) {
        tracing::debug!(target: targets::DISPATCH, href, "navigation requested");
    }
}

/// Host services shared by every context.
#[derive(Clone)]
pub struct Environment {
    platform: Platform,
    translator: Arc<dyn Translator>,
    navigator: Arc<dyn Navigator>,
    shortcut_support: Arc<Property<ShortcutSupport>>,
}

impl Environment {
    /// Create an environment for the given platform with identity translation
    /// and logging navigation.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            translator: Arc::new(IdentityTranslator),
            navigator: Arc::new(LogNavigator),
            shortcut_support: Arc::new(Property::new(ShortcutSupport::default())),
        }
    }

    /// Create an environment for the current platform.
    pub fn detect() -> Self {
        Self::new(Platform::current())
    }

    /// Set the translator.
    pub fn with_translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    /// Set the navigator.
    pub fn with_navigator(mut self, navigator: impl Navigator + 'static) -> Self {
        self.navigator = Arc::new(navigator);
        self
    }

    /// Set the initial shortcut support mode.
    pub fn with_shortcut_support(self, support: ShortcutSupport) -> Self {
        self.shortcut_support.set(support);
        self
    }

    /// The platform family.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve a translation key.
    pub fn translate(&self, key: &str) -> String {
        self.translator.translate(key)
    }

    /// Follow a link.
    pub fn navigate(&self, href: &str) {
        self.navigator.navigate(href);
    }

    /// The current shortcut support mode.
    pub fn shortcut_support(&self) -> ShortcutSupport {
        self.shortcut_support.get()
    }

    /// Change the shortcut support mode for every context sharing this
    /// environment. Returns `true` if the mode changed.
    pub fn set_shortcut_support(&self, support: ShortcutSupport) -> bool {
        self.shortcut_support.set(support)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("platform", &self.platform)
            .field("shortcut_support", &self.shortcut_support())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_command_modifier() {
        assert!(Platform::Mac.command_held(KeyboardModifiers::META));
        assert!(!Platform::Mac.command_held(KeyboardModifiers::CTRL));
        assert!(Platform::Standard.command_held(KeyboardModifiers::CTRL));
        assert!(!Platform::Standard.command_held(KeyboardModifiers::META));
    }

    #[test]
    fn test_modifier_labels() {
        assert_eq!(Platform::Mac.modifier_label("Alt"), "Option");
        assert_eq!(Platform::Mac.modifier_label("Meta"), "⌘");
        assert_eq!(Platform::Mac.modifier_label("Ctrl"), "Ctrl");
        assert_eq!(Platform::Standard.modifier_label("Meta"), "Meta");
    }

    #[test]
    fn test_translator_closure() {
        let env = Environment::new(Platform::Standard)
            .with_translator(|key: &str| format!("[{key}]"));
        assert_eq!(env.translate("UNDO"), "[UNDO]");
        assert_eq!(Environment::new(Platform::Standard).translate("UNDO"), "UNDO");
    }

    #[test]
    fn test_navigator() {
        struct Recorder(Arc<Mutex<Vec<String>>>);
        impl Navigator for Recorder {
            fn navigate(&self, href: &str) {
                self.0.lock().push(href.to_string());
            }
        }

        let visited = Arc::new(Mutex::new(Vec::new()));
        let env = Environment::new(Platform::Standard).with_navigator(Recorder(visited.clone()));
        env.navigate("help.html");
        assert_eq!(*visited.lock(), vec!["help.html".to_string()]);
    }

    #[test]
    fn test_shortcut_support_is_shared_between_clones() {
        let env = Environment::new(Platform::Standard);
        let clone = env.clone();
        assert_eq!(clone.shortcut_support(), ShortcutSupport::Sequence);
        assert!(env.set_shortcut_support(ShortcutSupport::Single));
        assert!(!env.set_shortcut_support(ShortcutSupport::Single));
        assert_eq!(clone.shortcut_support(), ShortcutSupport::Single);
    }
}
