use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("position {position} exceeds the buffer limit of {limit}")]
pub struct BufferFull {
    pub position: usize,
    pub limit: usize,
}

/// A position-indexed buffer for per-row state of the current block.
///
/// Capacity grows by doubling (never beyond `limit`) when a position past the
/// end is written. [`reset`](Self::reset) restores defaults only up to the
/// highest position written, so a large early block does not make every later
/// reset pay for its capacity.
#[derive(Debug, Clone)]
pub struct PositionBuffer<T> {
    slots: Vec<T>,
    used: usize,
    limit: usize,
}

impl<T: Default + Clone> PositionBuffer<T> {
    pub fn new(initial: usize, limit: usize) -> Self {
        let initial = initial.min(limit);
        Self {
            slots: vec![T::default(); initial],
            used: 0,
            limit,
        }
    }

    pub fn set(&mut self, position: usize, value: T) -> Result<(), BufferFull> {
        if position >= self.slots.len() {
            self.grow(position + 1)?;
        }
        self.slots[position] = value;
        self.used = self.used.max(position + 1);
        Ok(())
    }

    /// The value at `position`, or `None` past the current capacity.
    pub fn get(&self, position: usize) -> Option<&T> {
        self.slots.get(position)
    }

    /// Highest written position plus one.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn reset(&mut self) {
        for slot in &mut self.slots[..self.used] {
            *slot = T::default();
        }
        self.used = 0;
    }

    /// Drops all slots and their allocation.
    pub fn release(&mut self) {
        self.slots = Vec::new();
        self.used = 0;
    }

    fn grow(&mut self, needed: usize) -> Result<(), BufferFull> {
        if needed > self.limit {
            return Err(BufferFull {
                position: needed - 1,
                limit: self.limit,
            });
        }
        let mut capacity = self.slots.len().max(1);
        while capacity < needed {
            capacity = capacity.saturating_mul(2);
        }
        self.slots.resize(capacity.min(self.limit), T::default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_by_doubling() {
        let mut buffer: PositionBuffer<i32> = PositionBuffer::new(2, 64);
        buffer.set(2, 7).unwrap();
        assert_eq!(buffer.capacity(), 4);

        buffer.set(9, 1).unwrap();
        assert_eq!(buffer.capacity(), 16);
        assert_eq!(buffer.used(), 10);
    }

    #[test]
    fn doubling_is_capped_at_limit() {
        let mut buffer: PositionBuffer<i32> = PositionBuffer::new(4, 6);
        buffer.set(5, 1).unwrap();
        assert_eq!(buffer.capacity(), 6);

        assert_eq!(
            buffer.set(6, 1),
            Err(BufferFull {
                position: 6,
                limit: 6
            })
        );
    }

    #[test]
    fn reset_is_bounded_by_used_length() {
        let mut buffer: PositionBuffer<i32> = PositionBuffer::new(8, 8);
        buffer.set(0, 1).unwrap();
        buffer.set(2, 3).unwrap();

        buffer.reset();

        assert_eq!(buffer.used(), 0);
        assert_eq!(buffer.capacity(), 8);
        assert!((0..8).all(|p| buffer.get(p) == Some(&0)));
    }

    #[test]
    fn starts_empty_with_zero_initial_capacity() {
        let mut buffer: PositionBuffer<i32> = PositionBuffer::new(0, 8);
        assert_eq!(buffer.get(0), None);
        buffer.set(0, 5).unwrap();
        assert_eq!(buffer.capacity(), 1);
    }
}
