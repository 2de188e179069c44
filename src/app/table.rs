use std::cmp::Ordering;

use serde_json::Value;

use crate::domain::DataEntry;

use super::options::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Searchable, sortable and paged view over the entries of a form.
#[derive(Debug, Clone)]
pub struct EntryTable {
    entries: Vec<DataEntry>,
    visible: Vec<DataEntry>,
    search: String,
    sort: Option<(String, SortOrder)>,
    page: usize,
    page_size: usize,
}

impl Default for EntryTable {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_PAGE_SIZE)
    }
}

impl EntryTable {
    /// Builds a table sorted by id, ascending, on its first page.
    pub fn new(entries: Vec<DataEntry>, page_size: usize) -> Self {
        let mut table = Self {
            entries,
            visible: Vec::new(),
            search: String::new(),
            sort: Some(("id".to_string(), SortOrder::Ascending)),
            page: 1,
            page_size: page_size.max(1),
        };
        table.refresh();
        table
    }

    /// Swaps the underlying entries, keeping search, sort and page.
    pub fn set_entries(&mut self, entries: Vec<DataEntry>) {
        self.entries = entries;
        self.refresh();
    }

    pub fn search(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
        self.page = 1;
        self.refresh();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.page = 1;
        self.refresh();
    }

    pub fn sort_by(&mut self, column: impl Into<String>, order: SortOrder) {
        self.sort = Some((column.into(), order));
        self.refresh();
    }

    /// Back to insertion order.
    pub fn unsort(&mut self) {
        self.sort = None;
        self.refresh();
    }

    /// Jumps to `page` (1-based), clamped to the available pages.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        self.visible.len().div_ceil(self.page_size).max(1)
    }

    /// Entries matching the search, in sort order.
    pub fn filtered(&self) -> &[DataEntry] {
        &self.visible
    }

    pub fn rows(&self) -> &[DataEntry] {
        let start = (self.page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.visible.len());
        self.visible.get(start..end).unwrap_or_default()
    }

    pub fn showing_range(&self) -> String {
        let total = self.visible.len();
        match total {
            0 => "0 entries".to_string(),
            1 => "1 entries".to_string(),
            _ => {
                let start = (self.page - 1) * self.page_size + 1;
                let end = (start + self.page_size - 1).min(total);
                format!("{start} to {end} of {total} entries")
            }
        }
    }

    fn refresh(&mut self) {
        let term = self.search.as_str();
        self.visible = self
            .entries
            .iter()
            .filter(|entry| term.is_empty() || matches_term(entry, term))
            .cloned()
            .collect();
        if let Some((column, order)) = &self.sort {
            self.visible
                .sort_by(|a, b| compare_column(a, b, column, *order));
        }
        self.page = self.page.clamp(1, self.total_pages());
    }
}

fn matches_term(entry: &DataEntry, term: &str) -> bool {
    entry.id.to_string().contains(term)
        || entry
            .data
            .values()
            .filter_map(display_text)
            .any(|text| text.to_lowercase().contains(term))
}

fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(f64::from(u8::from(*flag))),
        _ => None,
    }
}

fn compare_column(a: &DataEntry, b: &DataEntry, column: &str, order: SortOrder) -> Ordering {
    let left = a.column_value(column).filter(|value| !value.is_null());
    let right = b.column_value(column).filter(|value| !value.is_null());
    let ordering = match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => match (numeric(&left), numeric(&right)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => display_text(&left)
                .unwrap_or_default()
                .cmp(&display_text(&right).unwrap_or_default()),
        },
    };
    match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}
