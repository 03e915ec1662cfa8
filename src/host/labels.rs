//! Text label items.

use super::input::CellSize;
use crate::geometry::Size;
use crate::items::{ItemView, ItemsAdapter, ItemsNotifier, MeasureSpec, Subscription, SubscriptionId};
use unicode_width::UnicodeWidthStr;

/// A one-line label, one terminal row tall with one cell of padding on each
/// side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    label: String,
    cell: CellSize,
}

impl TextItem {
    /// Creates an item.
    pub fn new(label: impl Into<String>, cell: CellSize) -> Self {
        Self {
            label: label.into(),
            cell,
        }
    }

    /// The label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replaces the label, keeping the allocation.
    pub fn set_label(&mut self, label: &str) {
        self.label.clear();
        self.label.push_str(label);
    }
}

impl ItemView for TextItem {
    fn measure(&self, spec: MeasureSpec) -> Size {
        let columns = self.label.width() as i32 + 2;
        Size::new(
            spec.width.resolve(columns * self.cell.width),
            spec.height.resolve(self.cell.height),
        )
    }
}

/// Adapter over a list of labels. Edits are announced to the view.
#[derive(Debug)]
pub struct LabelAdapter {
    labels: Vec<String>,
    cell: CellSize,
    empty_label: String,
    notifier: ItemsNotifier,
}

impl LabelAdapter {
    /// Adapter over `labels`.
    pub fn new(labels: Vec<String>, cell: CellSize) -> Self {
        Self {
            labels,
            cell,
            empty_label: "No items".to_string(),
            notifier: ItemsNotifier::new(),
        }
    }

    /// Adapter over `"Item 0"` to `"Item {count - 1}"`.
    pub fn numbered(count: usize, cell: CellSize) -> Self {
        Self::new((0..count).map(|n| format!("Item {n}")).collect(), cell)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True without labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at `index`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Appends a label.
    pub fn push(&mut self, label: impl Into<String>) {
        self.insert(self.labels.len(), label);
    }

    /// Inserts a label at `at`, clamped to the end.
    pub fn insert(&mut self, at: usize, label: impl Into<String>) {
        let at = at.min(self.labels.len());
        self.labels.insert(at, label.into());
        self.notifier.added(at, 1);
    }

    /// Removes the label at `at`.
    pub fn remove(&mut self, at: usize) -> Option<String> {
        if at >= self.labels.len() {
            return None;
        }
        let label = self.labels.remove(at);
        self.notifier.removed(at, 1);
        Some(label)
    }

    /// Replaces the label at `at`. Returns false when out of range.
    pub fn set_label(&mut self, at: usize, label: impl Into<String>) -> bool {
        let Some(slot) = self.labels.get_mut(at) else {
            return false;
        };
        *slot = label.into();
        self.notifier.modified(at, 1);
        true
    }

    /// Replaces every label.
    pub fn replace_all(&mut self, labels: Vec<String>) {
        self.labels = labels;
        self.notifier.changed(self.labels.len());
    }
}

impl ItemsAdapter for LabelAdapter {
    type View = TextItem;

    fn item_count(&self) -> usize {
        self.labels.len()
    }

    fn item_view(&mut self, index: usize, reuse: Option<TextItem>) -> TextItem {
        let label = self.labels.get(index).map_or("", String::as_str);
        match reuse {
            Some(mut item) => {
                item.set_label(label);
                item
            }
            None => TextItem::new(label, self.cell),
        }
    }

    fn empty_view(&mut self, reuse: Option<TextItem>) -> Option<TextItem> {
        let mut item = reuse.unwrap_or_else(|| TextItem::new("", self.cell));
        item.set_label(&self.empty_label);
        Some(item)
    }

    fn subscribe(&mut self) -> Option<Subscription> {
        Some(self.notifier.subscribe())
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.notifier.unsubscribe(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Constraint, ItemsChange};

    #[test]
    fn measures_display_width_plus_padding() {
        let cell = CellSize::default();
        let item = TextItem::new("Item 12", cell);
        assert_eq!(item.measure(MeasureSpec::UNSPECIFIED), Size::new(72, 16));

        let wide = TextItem::new("日本", cell);
        assert_eq!(wide.measure(MeasureSpec::UNSPECIFIED), Size::new(48, 16));

        let exact = MeasureSpec::new(Constraint::Exactly(100), Constraint::Unspecified);
        assert_eq!(item.measure(exact), Size::new(100, 16));
    }

    #[test]
    fn edits_are_announced() {
        let mut labels = LabelAdapter::numbered(3, CellSize::default());
        let subscription = labels.subscribe().expect("labels notify");

        labels.push("tail");
        labels.insert(0, "head");
        assert_eq!(labels.remove(1).as_deref(), Some("Item 0"));
        assert!(labels.set_label(0, "first"));
        assert!(!labels.set_label(99, "missing"));

        assert_eq!(
            subscription.drain(),
            vec![
                ItemsChange::Added { at: 3, count: 1 },
                ItemsChange::Added { at: 0, count: 1 },
                ItemsChange::Removed { at: 1, count: 1 },
                ItemsChange::Modified { at: 0, count: 1 },
            ]
        );
        assert_eq!(labels.label(0), Some("first"));
        assert_eq!(labels.len(), 4);
    }

    #[test]
    fn reused_views_take_the_new_label() {
        let mut labels = LabelAdapter::numbered(2, CellSize::default());
        let first = labels.item_view(0, None);
        let second = labels.item_view(1, Some(first));
        assert_eq!(second.label(), "Item 1");
        assert_eq!(
            labels.empty_view(Some(second)).map(|item| item.label().to_string()),
            Some("No items".to_string())
        );
    }
}
