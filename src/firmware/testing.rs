//! Host-side doubles shared by unit tests.

use std::{cell::RefCell, rc::Rc, vec, vec::Vec};

use embedded_storage::{ReadStorage, Storage};

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RamFlashError;

/// Erased-to-0xFF flash image. Clones share the same bytes, so a fresh
/// driver built on a clone sees what an earlier boot wrote.
#[derive(Clone)]
pub(crate) struct RamFlash {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl RamFlash {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            bytes: Rc::new(RefCell::new(vec![0xFF; capacity])),
        }
    }

    pub(crate) fn poke(&self, offset: usize, data: &[u8]) {
        self.bytes.borrow_mut()[offset..offset + data.len()].copy_from_slice(data);
    }
}

impl ReadStorage for RamFlash {
    type Error = RamFlashError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let image = self.bytes.borrow();
        let source = image
            .get(start..start + bytes.len())
            .ok_or(RamFlashError)?;
        bytes.copy_from_slice(source);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.borrow().len()
    }
}

impl Storage for RamFlash {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let mut image = self.bytes.borrow_mut();
        let target = image
            .get_mut(start..start + bytes.len())
            .ok_or(RamFlashError)?;
        target.copy_from_slice(bytes);
        Ok(())
    }
}
