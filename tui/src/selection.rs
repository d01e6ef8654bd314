use crossterm::event::KeyEvent;

use crate::keys::{is_char, is_delete, is_enter, is_next, is_previous};

/// What a key meant to a selection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    /// The key was not for the list.
    Ignored,
    Moved,
    /// Enter on an existing item.
    Select(usize),
    /// Enter on the trailing "add new" slot.
    Add,
    DeletePending(usize),
    DeleteConfirmed(usize),
    DeleteCancelled,
}

/// Selection over `count` items plus an optional trailing "add new" slot,
/// with a two-step delete confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionList {
    selected: usize,
    deleting: Option<usize>,
    busy: bool,
    addable: bool,
}

impl SelectionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list whose last slot, at index `count`, is an "add new" action.
    pub fn with_add_slot() -> Self {
        Self {
            addable: true,
            ..Self::default()
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn deleting(&self) -> Option<usize> {
        self.deleting
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_add_slot(&self, count: usize) -> bool {
        self.addable && self.selected == count
    }

    fn last(&self, count: usize) -> usize {
        if self.addable {
            count
        } else {
            count.saturating_sub(1)
        }
    }

    pub fn select(&mut self, index: usize, count: usize) {
        self.selected = index.min(self.last(count));
    }

    pub fn next(&mut self, count: usize) {
        self.selected = (self.selected + 1).min(self.last(count));
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keep the selection valid after the collection changed.
    pub fn clamp(&mut self, count: usize) {
        self.selected = self.selected.min(self.last(count));
        if self.deleting.is_some_and(|index| index >= count) {
            self.deleting = None;
        }
    }

    /// Mark a mutating request in flight.
    pub fn start(&mut self) {
        self.busy = true;
        self.deleting = None;
    }

    pub fn finish(&mut self) {
        self.busy = false;
    }

    /// Drop transient state, keeping the selection.
    pub fn reset(&mut self) {
        self.deleting = None;
        self.busy = false;
    }

    pub fn handle_key(&mut self, key: &KeyEvent, count: usize) -> ListAction {
        if let Some(index) = self.deleting {
            return if is_char(key, 'y') {
                self.deleting = None;
                ListAction::DeleteConfirmed(index)
            } else {
                self.deleting = None;
                ListAction::DeleteCancelled
            };
        }
        if self.busy {
            return ListAction::Ignored;
        }
        if is_next(key) {
            self.next(count);
            ListAction::Moved
        } else if is_previous(key) {
            self.previous();
            ListAction::Moved
        } else if is_enter(key) {
            if self.is_add_slot(count) {
                ListAction::Add
            } else if self.selected < count {
                ListAction::Select(self.selected)
            } else {
                ListAction::Ignored
            }
        } else if is_delete(key) && self.selected < count {
            self.deleting = Some(self.selected);
            ListAction::DeletePending(self.selected)
        } else {
            ListAction::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{ch, key};
    use crossterm::event::KeyCode;

    #[test]
    fn selection_stays_within_add_slot() {
        let mut list = SelectionList::with_add_slot();
        for _ in 0..10 {
            list.handle_key(&key(KeyCode::Down), 3);
        }
        assert_eq!(list.selected(), 3);
        assert!(list.is_add_slot(3));
        for _ in 0..10 {
            list.handle_key(&key(KeyCode::Up), 3);
        }
        assert_eq!(list.selected(), 0);
    }

    #[test]
    fn empty_collections_stay_at_zero() {
        let mut list = SelectionList::new();
        list.handle_key(&key(KeyCode::Down), 0);
        list.handle_key(&key(KeyCode::Tab), 0);
        assert_eq!(list.selected(), 0);
        assert_eq!(list.handle_key(&key(KeyCode::Enter), 0), ListAction::Ignored);
        assert_eq!(list.handle_key(&ch('x'), 0), ListAction::Ignored);

        let mut list = SelectionList::with_add_slot();
        list.handle_key(&key(KeyCode::Down), 0);
        assert_eq!(list.selected(), 0);
        assert_eq!(list.handle_key(&key(KeyCode::Enter), 0), ListAction::Add);
    }

    #[test]
    fn deletion_needs_confirmation() {
        let mut list = SelectionList::with_add_slot();
        list.next(2);
        assert_eq!(list.handle_key(&ch('d'), 2), ListAction::DeletePending(1));
        assert_eq!(list.deleting(), Some(1));
        assert_eq!(list.handle_key(&ch('y'), 2), ListAction::DeleteConfirmed(1));
        assert_eq!(list.deleting(), None);
    }

    #[test]
    fn any_other_key_cancels_deletion() {
        let mut list = SelectionList::new();
        list.handle_key(&key(KeyCode::Delete), 2);
        assert_eq!(list.handle_key(&key(KeyCode::Down), 2), ListAction::DeleteCancelled);
        assert_eq!(list.selected(), 0);
        assert_eq!(list.deleting(), None);
    }

    #[test]
    fn add_slot_cannot_be_deleted() {
        let mut list = SelectionList::with_add_slot();
        list.select(5, 2);
        assert_eq!(list.selected(), 2);
        assert_eq!(list.handle_key(&ch('x'), 2), ListAction::Ignored);
    }

    #[test]
    fn busy_list_ignores_input() {
        let mut list = SelectionList::new();
        list.start();
        assert_eq!(list.handle_key(&key(KeyCode::Down), 3), ListAction::Ignored);
        list.finish();
        assert_eq!(list.handle_key(&key(KeyCode::Down), 3), ListAction::Moved);
    }
}
