mod editor;
mod error;
mod options;
mod status;
mod table;

pub use editor::{Dispatched, FormEditor, RenameReport};
pub use error::EditorError;
pub use options::{DEFAULT_PAGE_SIZE, EditorOptions};
pub use status::{Notice, NoticeLevel, Notices};
pub use table::{EntryTable, SortOrder};
