use crate::model::SearchItem;

/// Something that can be scanned into search items.
///
/// Scanning never fails as a whole; problems with individual files are
/// logged and those files contribute nothing.
pub trait Source {
    fn scan(&self) -> Vec<SearchItem>;
}

pub mod entry;
