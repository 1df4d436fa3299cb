//! Layering and focus for dialogs that may be open on top of each other
//! (a delete confirmation above the edit dialog, for instance).

use std::collections::HashMap;

use tracing::debug;

/// Layer of the first dialog is `BASE_Z + Z_STEP`.
pub const BASE_Z: i32 = 1040;
pub const Z_STEP: i32 = 10;
/// A backdrop sits just under its dialog.
pub const BACKDROP_OFFSET: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layering {
    pub dialog_z: i32,
    pub backdrop_z: i32,
}

impl Layering {
    fn for_count(open_count: u32) -> Self {
        let dialog_z = BASE_Z + Z_STEP * open_count as i32;
        Self {
            dialog_z,
            backdrop_z: dialog_z - BACKDROP_OFFSET,
        }
    }
}

/// Where focus is about to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Page,
    DialogRoot(DialogId),
    /// Any element nested inside the dialog.
    DialogChild(DialogId),
}

impl FocusTarget {
    fn owner(&self) -> Option<DialogId> {
        match self {
            FocusTarget::Page => None,
            FocusTarget::DialogRoot(id) | FocusTarget::DialogChild(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDecision {
    Allow,
    /// Put focus back on this dialog's root.
    Redirect(DialogId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    pub was_stacked: bool,
    /// No dialog is left open; the page may scroll again.
    pub scroll_restored: bool,
    /// Dialog now holding the focus trap, if any.
    pub focus: Option<DialogId>,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    layering: Layering,
    seq: u64,
}

/// Tracks how many dialogs are open and which one owns keyboard focus.
///
/// The open-count is never reset; it only moves through `on_shown` and
/// `on_hidden` and never drops below zero.
#[derive(Debug, Default)]
pub struct ModalStack {
    open_count: u32,
    stacked: HashMap<DialogId, Entry>,
    next_seq: u64,
    trap: Option<DialogId>,
    scroll_locked: bool,
}

impl ModalStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open transition. Returns the assigned layers, or `None` when the
    /// dialog is already stacked.
    pub fn on_shown(&mut self, dialog: DialogId) -> Option<Layering> {
        if self.stacked.contains_key(&dialog) {
            return None;
        }
        self.open_count += 1;
        let layering = Layering::for_count(self.open_count);
        self.next_seq += 1;
        self.stacked.insert(
            dialog,
            Entry {
                layering,
                seq: self.next_seq,
            },
        );
        self.scroll_locked = true;
        self.enforce_focus(dialog);
        debug!(
            dialog = dialog.0,
            open = self.open_count,
            z = layering.dialog_z,
            "dialog stacked"
        );
        Some(layering)
    }

    /// Close transition.
    pub fn on_hidden(&mut self, dialog: DialogId) -> CloseOutcome {
        let was_stacked = self.stacked.remove(&dialog).is_some();
        if was_stacked {
            self.open_count = self.open_count.saturating_sub(1);
        }
        if self.trap == Some(dialog) {
            self.trap = self.topmost();
        }
        let scroll_restored = self.stacked.is_empty() && self.scroll_locked;
        if self.stacked.is_empty() {
            self.scroll_locked = false;
        }
        debug!(dialog = dialog.0, open = self.open_count, "dialog unstacked");
        CloseOutcome {
            was_stacked,
            scroll_restored,
            focus: self.trap,
        }
    }

    /// Trap focus in `dialog`, replacing any trap already installed.
    pub fn enforce_focus(&mut self, dialog: DialogId) {
        self.trap = Some(dialog);
    }

    pub fn route_focus(&self, target: FocusTarget) -> FocusDecision {
        match self.trap {
            None => FocusDecision::Allow,
            Some(trapped) if target.owner() == Some(trapped) => FocusDecision::Allow,
            Some(trapped) => FocusDecision::Redirect(trapped),
        }
    }

    pub fn open_count(&self) -> u32 {
        self.open_count
    }

    pub fn is_stacked(&self, dialog: DialogId) -> bool {
        self.stacked.contains_key(&dialog)
    }

    pub fn layering(&self, dialog: DialogId) -> Option<Layering> {
        self.stacked.get(&dialog).map(|e| e.layering)
    }

    pub fn focused(&self) -> Option<DialogId> {
        self.trap
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// The highest-layered open dialog; later opens win ties.
    pub fn topmost(&self) -> Option<DialogId> {
        self.stacked
            .iter()
            .max_by_key(|(_, e)| (e.layering.dialog_z, e.seq))
            .map(|(id, _)| *id)
    }

    /// Open dialogs bottom to top.
    pub fn ordered(&self) -> Vec<(DialogId, Layering)> {
        let mut entries: Vec<_> = self.stacked.iter().map(|(id, e)| (*id, *e)).collect();
        entries.sort_by_key(|(_, e)| (e.layering.dialog_z, e.seq));
        entries.into_iter().map(|(id, e)| (id, e.layering)).collect()
    }
}
