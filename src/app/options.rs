use crate::domain::Wrapper;

pub const DEFAULT_PAGE_SIZE: usize = 3;

#[derive(Debug, Clone)]
pub struct EditorOptions {
    /// Wrapper given to forms that carry no preference of their own.
    pub default_wrapper: Wrapper,
    pub page_size: usize,
    /// Delete entries that hold nothing but an id when entries are loaded.
    pub purge_empty_entries: bool,
    /// Re-read a form from the gateway right after saving it.
    pub reload_after_save: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            default_wrapper: Wrapper::default(),
            page_size: DEFAULT_PAGE_SIZE,
            purge_empty_entries: true,
            reload_after_save: true,
        }
    }
}

impl EditorOptions {
    pub fn with_default_wrapper(mut self, wrapper: Wrapper) -> Self {
        self.default_wrapper = wrapper;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_purge_empty_entries(mut self, enabled: bool) -> Self {
        self.purge_empty_entries = enabled;
        self
    }

    pub fn with_reload_after_save(mut self, enabled: bool) -> Self {
        self.reload_after_save = enabled;
        self
    }
}
