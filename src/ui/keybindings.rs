//! Keyboard shortcuts registry.
//!
//! Single source of truth for the merge editor's keys; the help dialog and
//! the footer hints both read from here.

use crossterm::event::KeyCode;

/// A keyboard shortcut definition
#[derive(Debug, Clone)]
pub struct Shortcut {
    /// Primary key for this shortcut
    pub key: KeyCode,
    /// Alternative key (e.g., vim-style variant or arrow key)
    pub alt_key: Option<KeyCode>,
    pub description: &'static str,
    pub category: ShortcutCategory,
    pub context: ShortcutContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutCategory {
    General,
    Navigation,
    Gestures,
    Draft,
}

/// Where a shortcut is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutContext {
    /// Browsing stages, nothing picked up
    Editing,
    /// An item is picked up and follows the cursor
    Dragging,
    /// Description conflict dialog
    ConflictDialog,
    /// Commit confirmation dialog
    CommitDialog,
}

impl ShortcutCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ShortcutCategory::General => "General",
            ShortcutCategory::Navigation => "Navigation",
            ShortcutCategory::Gestures => "Drag & Drop",
            ShortcutCategory::Draft => "New Stage",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [ShortcutCategory] {
        &[
            ShortcutCategory::General,
            ShortcutCategory::Navigation,
            ShortcutCategory::Gestures,
            ShortcutCategory::Draft,
        ]
    }
}

impl ShortcutContext {
    pub fn display_name(&self) -> &'static str {
        match self {
            ShortcutContext::Editing => "Editing",
            ShortcutContext::Dragging => "While Dragging",
            ShortcutContext::ConflictDialog => "Description Conflict",
            ShortcutContext::CommitDialog => "Save Changes",
        }
    }

    /// All contexts in display order
    pub fn all() -> &'static [ShortcutContext] {
        &[
            ShortcutContext::Editing,
            ShortcutContext::Dragging,
            ShortcutContext::ConflictDialog,
            ShortcutContext::CommitDialog,
        ]
    }
}

impl Shortcut {
    /// Format key for display (e.g., "q", "Tab", "j/↓")
    pub fn key_display(&self) -> String {
        let primary = format_keycode(&self.key);
        match &self.alt_key {
            Some(alt) => format!("{}/{}", primary, format_keycode(alt)),
            None => primary,
        }
    }

    /// Format key for help dialog (left-padded to 9 chars)
    pub fn key_display_padded(&self) -> String {
        format!("{:<9}", self.key_display())
    }
}

fn format_keycode(key: &KeyCode) -> String {
    match key {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        _ => format!("{:?}", key),
    }
}

const fn shortcut(
    key: KeyCode,
    alt_key: Option<KeyCode>,
    description: &'static str,
    category: ShortcutCategory,
    context: ShortcutContext,
) -> Shortcut {
    Shortcut {
        key,
        alt_key,
        description,
        category,
        context,
    }
}

use ShortcutCategory as Cat;
use ShortcutContext as Ctx;

pub static SHORTCUTS: &[Shortcut] = &[
    // Editing
    shortcut(KeyCode::Char('q'), None, "Exit without saving", Cat::General, Ctx::Editing),
    shortcut(KeyCode::Char('s'), None, "Save changes", Cat::General, Ctx::Editing),
    shortcut(KeyCode::Char('?'), None, "Toggle help", Cat::General, Ctx::Editing),
    shortcut(KeyCode::Char('j'), Some(KeyCode::Down), "Move down", Cat::Navigation, Ctx::Editing),
    shortcut(KeyCode::Char('k'), Some(KeyCode::Up), "Move up", Cat::Navigation, Ctx::Editing),
    shortcut(KeyCode::Tab, Some(KeyCode::Right), "Next stage", Cat::Navigation, Ctx::Editing),
    shortcut(KeyCode::BackTab, Some(KeyCode::Left), "Previous stage", Cat::Navigation, Ctx::Editing),
    shortcut(KeyCode::Char(' '), Some(KeyCode::Enter), "Pick up item", Cat::Gestures, Ctx::Editing),
    shortcut(KeyCode::Char('n'), None, "Create new stage", Cat::Draft, Ctx::Editing),
    shortcut(KeyCode::Char('r'), None, "Rename new stage", Cat::Draft, Ctx::Editing),
    shortcut(KeyCode::Char('x'), None, "Delete new stage", Cat::Draft, Ctx::Editing),
    // Dragging
    shortcut(KeyCode::Char('j'), Some(KeyCode::Down), "Move drop point down", Cat::Navigation, Ctx::Dragging),
    shortcut(KeyCode::Char('k'), Some(KeyCode::Up), "Move drop point up", Cat::Navigation, Ctx::Dragging),
    shortcut(KeyCode::Tab, Some(KeyCode::Right), "Next stage", Cat::Navigation, Ctx::Dragging),
    shortcut(KeyCode::BackTab, Some(KeyCode::Left), "Previous stage", Cat::Navigation, Ctx::Dragging),
    shortcut(KeyCode::Char(' '), Some(KeyCode::Enter), "Drop here", Cat::Gestures, Ctx::Dragging),
    shortcut(KeyCode::Esc, None, "Put back", Cat::Gestures, Ctx::Dragging),
    shortcut(KeyCode::Char('q'), None, "Exit without saving", Cat::General, Ctx::Dragging),
    // Conflict dialog
    shortcut(KeyCode::Char('r'), None, "Replace description", Cat::General, Ctx::ConflictDialog),
    shortcut(KeyCode::Char('a'), None, "Append description", Cat::General, Ctx::ConflictDialog),
    shortcut(KeyCode::Esc, None, "Cancel drop", Cat::General, Ctx::ConflictDialog),
    // Commit dialog
    shortcut(KeyCode::Char('y'), Some(KeyCode::Enter), "Save changes", Cat::General, Ctx::CommitDialog),
    shortcut(KeyCode::Char('n'), Some(KeyCode::Esc), "Back to editing", Cat::General, Ctx::CommitDialog),
];

/// Get all shortcuts for a given context
pub fn shortcuts_for_context(context: ShortcutContext) -> impl Iterator<Item = &'static Shortcut> {
    SHORTCUTS.iter().filter(move |s| s.context == context)
}

/// Get shortcuts grouped by category for a given context
pub fn shortcuts_by_category_for_context(
    context: ShortcutContext,
) -> Vec<(ShortcutCategory, Vec<&'static Shortcut>)> {
    let mut result = Vec::new();
    for category in ShortcutCategory::all() {
        let shortcuts: Vec<&Shortcut> = SHORTCUTS
            .iter()
            .filter(|s| s.context == context && s.category == *category)
            .collect();
        if !shortcuts.is_empty() {
            result.push((*category, shortcuts));
        }
    }
    result
}
