//! Bounded stack of open loop positions.

/// Returned by [`LoopStack::push`] when the stack is already at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFull;

/// Positions of `[` instructions whose bodies are currently executing.
///
/// Capacity is fixed at construction; storage is reserved up front so that
/// pushing never allocates.
#[derive(Debug, Clone)]
pub struct LoopStack {
    positions: Vec<usize>,
    capacity: usize,
}

impl LoopStack {
    pub fn try_with_capacity(capacity: usize) -> Option<Self> {
        let mut positions = Vec::new();
        positions.try_reserve_exact(capacity).ok()?;
        Some(Self { positions, capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn push(&mut self, pc: usize) -> Result<(), StackFull> {
        if self.positions.len() >= self.capacity {
            return Err(StackFull);
        }
        self.positions.push(pc);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.positions.pop()
    }

    pub fn top(&self) -> Option<usize> {
        self.positions.last().copied()
    }
}
