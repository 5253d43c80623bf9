/// Opaque monotonically allocated handle.
///
/// Handles are never reused within one allocator, so a stale handle can be
/// detected by looking it up again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

impl Handle {
    pub fn new(raw: u64) -> Self {
        Handle(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default, Clone)]
pub struct HandleAllocator {
    next: u64,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> Handle {
        let h = Handle(self.next);
        self.next += 1;
        h
    }
}

#[cfg(test)]
mod tests {
    use super::HandleAllocator;

    #[test]
    fn handles_are_unique_and_increasing() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(b.raw(), 1);
    }
}
