//! Scoped keyboard shortcuts for match navigation.
//!
//! Arrow-key navigation between matches should only steal keys while
//! there is something to navigate. A [`ShortcutRegistry`] hands out
//! [`ShortcutGuard`]s; while at least one guard is alive the registry
//! translates navigation keys into [`NavCommand`]s, and dropping the
//! guard unregisters it on every exit path.

use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

/// A navigation action produced by a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    NextLocal,
    PrevLocal,
    NextGlobal,
    PrevGlobal,
}

/// Map a key to a navigation command, ignoring subscription state.
///
/// `Shift+→`/`Shift+←` move across pages, `→`/`n` and `←`/`p` within the
/// page. Anything else is not a navigation key.
pub fn nav_command_for(key: &KeyEvent) -> Option<NavCommand> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let other_mods = key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    if other_mods {
        return None;
    }
    match key.code {
        KeyCode::Right if shift => Some(NavCommand::NextGlobal),
        KeyCode::Left if shift => Some(NavCommand::PrevGlobal),
        KeyCode::Right => Some(NavCommand::NextLocal),
        KeyCode::Left => Some(NavCommand::PrevLocal),
        KeyCode::Char('n') if !shift => Some(NavCommand::NextLocal),
        KeyCode::Char('p') if !shift => Some(NavCommand::PrevLocal),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Subscriptions {
    next_id: u64,
    active: Vec<(u64, &'static str)>,
}

/// Tracks live shortcut subscriptions.
///
/// Cloning the registry yields another handle to the same set.
#[derive(Debug, Clone, Default)]
pub struct ShortcutRegistry {
    inner: Rc<RefCell<Subscriptions>>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription owned by `owner`; it lasts until the guard
    /// is dropped.
    pub fn subscribe(&self, owner: &'static str) -> ShortcutGuard {
        let mut subs = self.inner.borrow_mut();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.active.push((id, owner));
        debug!(owner, id, "keyboard shortcuts subscribed");
        ShortcutGuard {
            registry: Rc::clone(&self.inner),
            id,
        }
    }

    /// Number of live subscriptions.
    pub fn active_count(&self) -> usize {
        self.inner.borrow().active.len()
    }

    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Translate `key` if any subscription is live; `None` means the key
    /// passes through to the rest of the application.
    pub fn dispatch(&self, key: &KeyEvent) -> Option<NavCommand> {
        if !self.is_active() {
            return None;
        }
        nav_command_for(key)
    }
}

/// A live subscription. Unregisters itself on drop.
#[derive(Debug)]
pub struct ShortcutGuard {
    registry: Rc<RefCell<Subscriptions>>,
    id: u64,
}

impl Drop for ShortcutGuard {
    fn drop(&mut self) {
        let mut subs = self.registry.borrow_mut();
        subs.active.retain(|(id, _)| *id != self.id);
        debug!(id = self.id, "keyboard shortcuts released");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
