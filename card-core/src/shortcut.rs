//! Keyboard shortcut dispatch for undo/redo.
//!
//! The platform decides the modifier: ⌘ on macOS, Ctrl elsewhere. Chords
//! are ignored entirely while focus is in an editable field so the field's
//! native undo keeps working.

use crate::store::ElementStore;

/// Actions keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Restore the previous element collection.
    Undo,
    /// Re-apply an undone change.
    Redo,
}

/// Host platform, which selects the primary modifier key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Platform {
    /// macOS: ⌘ is the modifier.
    Mac,
    /// Everything else: Ctrl is the modifier.
    #[default]
    Other,
}

impl Platform {
    /// Detect the platform from a navigator-style platform string.
    #[must_use]
    pub fn from_platform_string(platform: &str) -> Self {
        if platform.to_uppercase().contains("MAC") {
            Self::Mac
        } else {
            Self::Other
        }
    }

    /// Platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::Mac
        } else {
            Self::Other
        }
    }
}

/// Kind of node holding keyboard focus when a key was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusTarget {
    /// Nothing in particular (the page).
    #[default]
    None,
    /// Single-line text input.
    TextInput,
    /// Multi-line text area.
    TextArea,
    /// Content-editable node.
    ContentEditable,
    /// Any other focusable element.
    Other,
}

impl FocusTarget {
    /// Whether the target handles its own undo.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::TextInput | Self::TextArea | Self::ContentEditable)
    }
}

/// A key press.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// `KeyboardEvent.key` value.
    pub key: String,
    /// Ctrl held.
    pub ctrl: bool,
    /// Meta (⌘) held.
    pub meta: bool,
    /// Shift held.
    pub shift: bool,
    /// Alt held.
    pub alt: bool,
    /// Focused node.
    pub focus: FocusTarget,
}

impl KeyEvent {
    /// A key press with no modifiers.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Hold Ctrl.
    #[must_use]
    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Hold ⌘.
    #[must_use]
    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Hold Shift.
    #[must_use]
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Set the focused node.
    #[must_use]
    pub fn focused(mut self, focus: FocusTarget) -> Self {
        self.focus = focus;
        self
    }
}

/// Maps key presses to undo/redo on an [`ElementStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortcutDispatcher {
    platform: Platform,
}

impl ShortcutDispatcher {
    /// Dispatcher for `platform`.
    #[must_use]
    pub const fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Resolve a key press to an action without performing it.
    #[must_use]
    pub fn resolve(&self, event: &KeyEvent) -> Option<ShortcutAction> {
        if event.focus.is_editable() {
            return None;
        }
        let modifier = match self.platform {
            Platform::Mac => event.meta,
            Platform::Other => event.ctrl,
        };
        if !modifier {
            return None;
        }

        match event.key.to_lowercase().as_str() {
            "z" if event.shift => Some(ShortcutAction::Redo),
            "z" => Some(ShortcutAction::Undo),
            "y" => Some(ShortcutAction::Redo),
            _ => None,
        }
    }

    /// Resolve and perform a key press.
    ///
    /// Returns the action when the chord was claimed (the host should then
    /// suppress its default handling), even if there was nothing to undo or
    /// redo.
    pub fn dispatch(&self, store: &mut ElementStore, event: &KeyEvent) -> Option<ShortcutAction> {
        let action = self.resolve(event)?;
        let changed = match action {
            ShortcutAction::Undo => store.undo(),
            ShortcutAction::Redo => store.redo(),
        };
        tracing::debug!("Shortcut {:?} (changed: {})", action, changed);
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::element::ElementType;
    use crate::notify::RecordingNotifier;

    #[test]
    fn test_resolve_other_platform() {
        let dispatcher = ShortcutDispatcher::new(Platform::Other);
        assert_eq!(
            dispatcher.resolve(&KeyEvent::new("z").ctrl()),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(
            dispatcher.resolve(&KeyEvent::new("Z").ctrl().shift()),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(
            dispatcher.resolve(&KeyEvent::new("y").ctrl()),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(dispatcher.resolve(&KeyEvent::new("z").meta()), None);
        assert_eq!(dispatcher.resolve(&KeyEvent::new("z")), None);
    }

    #[test]
    fn test_resolve_mac_uses_meta() {
        let dispatcher = ShortcutDispatcher::new(Platform::from_platform_string("MacIntel"));
        assert_eq!(
            dispatcher.resolve(&KeyEvent::new("z").meta()),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(dispatcher.resolve(&KeyEvent::new("z").ctrl()), None);
    }

    #[test]
    fn test_editable_focus_suppresses() {
        let dispatcher = ShortcutDispatcher::new(Platform::Other);
        for focus in [
            FocusTarget::TextInput,
            FocusTarget::TextArea,
            FocusTarget::ContentEditable,
        ] {
            assert_eq!(
                dispatcher.resolve(&KeyEvent::new("z").ctrl().focused(focus)),
                None
            );
        }
        assert!(dispatcher
            .resolve(&KeyEvent::new("z").ctrl().focused(FocusTarget::Other))
            .is_some());
    }

    #[test]
    fn test_dispatch_drives_store() {
        let mut store = ElementStore::new(Arc::new(RecordingNotifier::new()));
        let dispatcher = ShortcutDispatcher::new(Platform::Other);

        // nothing to undo yet: still claimed, nothing changes
        assert_eq!(
            dispatcher.dispatch(&mut store, &KeyEvent::new("z").ctrl()),
            Some(ShortcutAction::Undo)
        );

        store.add_element(ElementType::Text);
        dispatcher.dispatch(&mut store, &KeyEvent::new("z").ctrl());
        assert!(store.elements().is_empty());
        dispatcher.dispatch(&mut store, &KeyEvent::new("y").ctrl());
        assert_eq!(store.elements().len(), 1);
    }
}
