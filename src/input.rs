//! Buffered input for the `,` instruction.
//!
//! Input is pulled from the source one bounded chunk at a time: everything up
//! to and including the next newline, or [`INPUT_BUFFER_SIZE`] bytes, whichever
//! comes first. Each `,` consumes one byte from the current chunk and a new
//! chunk is only requested once the previous one is used up.

use std::io::{self, BufRead};

use crate::config::INPUT_BUFFER_SIZE;

/// Owned, bounds-checked input buffer over any [`BufRead`] source.
pub struct InputBuffer<R> {
    source: R,
    buf: Vec<u8>,
    size: usize,
    pos: usize,
    prompt: Option<Box<dyn FnMut()>>,
}

impl<R: BufRead> InputBuffer<R> {
    pub fn new(source: R) -> Self {
        Self::with_capacity(source, INPUT_BUFFER_SIZE)
    }

    /// Same as [`InputBuffer::new`] with a custom chunk bound (at least 1).
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        Self {
            source,
            buf: vec![0; capacity.max(1)],
            size: 0,
            pos: 0,
            prompt: None,
        }
    }

    /// Called right before each refill, e.g. to print `Input: ` on a terminal.
    pub fn set_prompt<F>(&mut self, prompt: F)
    where
        F: FnMut() + 'static,
    {
        self.prompt = Some(Box::new(prompt));
    }

    /// Bytes still buffered from the last refill.
    pub fn buffered(&self) -> &[u8] {
        &self.buf[self.pos..self.size]
    }

    /// Next input byte, refilling from the source when the buffer is used up.
    ///
    /// `Ok(None)` means end of input. Blocks for as long as the source does.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if self.pos >= self.size {
            self.refill()?;
        }
        if self.pos < self.size {
            let b = self.buf[self.pos];
            self.pos += 1;
            Ok(Some(b))
        } else {
            Ok(None)
        }
    }

    fn refill(&mut self) -> io::Result<()> {
        self.size = 0;
        self.pos = 0;

        if let Some(prompt) = self.prompt.as_mut() {
            prompt();
        }

        while self.size < self.buf.len() {
            let available = match self.source.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }

            let room = self.buf.len() - self.size;
            let window = &available[..available.len().min(room)];
            let (take, line_done) = match window.iter().position(|&b| b == b'\n') {
                Some(nl) => (nl + 1, true),
                None => (window.len(), false),
            };

            self.buf[self.size..self.size + take].copy_from_slice(&window[..take]);
            self.source.consume(take);
            self.size += take;

            if line_done {
                break;
            }
        }

        Ok(())
    }
}
