/*!
 * Admin console
 * Headless model of the tabbed editor: which tab is active, the list/editor state of each
 * collection tab, chip inputs and the message inbox. The HTTP admin routes load the same
 * tab views.
 */
pub mod chips;
pub mod editor;
pub mod inbox;
pub mod shell;

pub use chips::ChipInput;
pub use editor::{Draft, DraftKey, EditorState, ListEditor};
pub use inbox::Inbox;
pub use shell::{load_tab, AdminShell, AdminTab, ProfileView, TabView};
