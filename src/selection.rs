#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::id::ImageId;

/// Marker changes produced by a selection update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChange {
    /// Image whose marker must be removed.
    pub cleared: Option<ImageId>,
    /// Image whose marker must be applied.
    pub marked: Option<ImageId>,
}

/// At most one selected image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<ImageId>,
}

impl Selection {
    #[must_use]
    pub fn selected(&self) -> Option<&ImageId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn is_selected(&self, id: &ImageId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    /// Click on `id`: deselect it if it is selected, otherwise select it instead of the current one.
    pub fn toggle(&mut self, id: &ImageId) -> SelectionChange {
        let cleared = self.selected.take();
        if cleared.as_ref() == Some(id) {
            return SelectionChange { cleared, marked: None };
        }
        self.selected = Some(id.clone());
        SelectionChange { cleared, marked: Some(id.clone()) }
    }

    /// Clear the selection, returning what was selected.
    pub fn clear(&mut self) -> Option<ImageId> {
        self.selected.take()
    }

    /// Clear the selection unless `target` is the selected image.
    pub fn clear_unless(&mut self, target: Option<&ImageId>) -> Option<ImageId> {
        if target.is_some() && self.selected.as_ref() == target {
            return None;
        }
        self.selected.take()
    }
}
