pub mod dialogs;
pub mod keybindings;
pub mod merge_view;
pub mod terminal_guard;

pub use merge_view::MergeView;
