use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Short user-facing message about the outcome of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Queue of notices waiting to be shown, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into());
    }

    pub fn form_created(&mut self) {
        self.info("Form created successfully!");
    }

    pub fn form_saved(&mut self) {
        self.info("Form saved successfully!");
    }

    pub fn save_failed(&mut self) {
        self.error("Failed to save form!");
    }

    pub fn form_updated(&mut self) {
        self.info("Successfully updated form info!");
    }

    pub fn form_update_failed(&mut self) {
        self.error("Error updating form info!");
    }

    pub fn form_deleted(&mut self) {
        self.info("Form deleted successfully!");
    }

    pub fn entry_submitted(&mut self) {
        self.info("Successfully submitted!");
    }

    pub fn entry_updated(&mut self) {
        self.info("Successfully updated info!");
    }

    pub fn entry_deleted(&mut self) {
        self.info("Successfully deleted info!");
    }

    pub fn unsaved_changes(&mut self) {
        self.error("Please save the form before submitting data!");
    }

    pub fn issues_remaining(&mut self, count: usize) {
        self.error(format!("{count} issue(s) remaining"));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn last(&self) -> Option<&Notice> {
        self.queue.back()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    fn push(&mut self, level: NoticeLevel, message: String) {
        self.queue.push_back(Notice { level, message });
    }
}
