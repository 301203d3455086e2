//! The memory tape and its data pointer.

/// Returned by [`Tape::move_right`] / [`Tape::move_left`] when the pointer
/// would leave the tape under the bounds policy. The engine attaches the
/// instruction position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeReached;

/// Fixed-length byte tape with a single cursor.
///
/// The tape never grows or shrinks after construction. With `wrap` enabled
/// the pointer moves cyclically; otherwise stepping past either edge fails
/// and leaves the pointer where it was.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u8>,
    pointer: usize,
    wrap: bool,
}

impl Tape {
    /// Allocate `size` zeroed cells. `None` if the allocation cannot be made.
    ///
    /// The reservation only checks that the size can be allocated; the tape comes from
    /// `vec![0; size]`, which asks the allocator for zeroed memory so pages
    /// are not touched until a cell is used.
    pub fn try_new(size: usize, wrap: bool) -> Option<Self> {
        let size = size.max(1);
        Vec::<u8>::new().try_reserve_exact(size).ok()?;
        let cells = vec![0; size];
        Some(Self { cells, pointer: 0, wrap })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn get(&self) -> u8 {
        self.cells[self.pointer]
    }

    pub fn set(&mut self, value: u8) {
        self.cells[self.pointer] = value;
    }

    pub fn increment(&mut self) {
        self.cells[self.pointer] = self.cells[self.pointer].wrapping_add(1);
    }

    pub fn decrement(&mut self) {
        self.cells[self.pointer] = self.cells[self.pointer].wrapping_sub(1);
    }

    pub fn move_right(&mut self) -> Result<(), EdgeReached> {
        let last = self.cells.len() - 1;
        if self.pointer < last {
            self.pointer += 1;
        } else if self.wrap {
            self.pointer = 0;
        } else {
            return Err(EdgeReached);
        }
        Ok(())
    }

    pub fn move_left(&mut self) -> Result<(), EdgeReached> {
        if self.pointer > 0 {
            self.pointer -= 1;
        } else if self.wrap {
            self.pointer = self.cells.len() - 1;
        } else {
            return Err(EdgeReached);
        }
        Ok(())
    }
}
