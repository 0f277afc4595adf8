use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::value::Value;

/// Slot-indexed storage of one frame.
///
/// Cloning a `Storage` aliases it: closures hold clones of the storage of
/// every frame they capture, so assignments on either side are shared.
/// Slots that were never written read as `None`.
#[derive(Clone, Default)]
pub struct Storage(Rc<RefCell<Vec<Option<Value>>>>);

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(slots: u32) -> Self {
        Storage(Rc::new(RefCell::new(Vec::with_capacity(slots as usize))))
    }

    pub fn get(&self, slot: u32) -> Option<Value> {
        self.0.borrow().get(slot as usize).cloned().flatten()
    }

    /// Write a slot, growing the storage as needed.
    pub fn set(&self, slot: u32, value: Value) {
        let mut slots = self.0.borrow_mut();
        let index = slot as usize;
        if slots.len() <= index {
            slots.resize(index + 1, None);
        }
        slots[index] = Some(value);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn aliases(&self, other: &Storage) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn snapshot(&self) -> Vec<Option<Value>> {
        self.0.borrow().clone()
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}
