//! Read-only view of engine state, taken before each instruction in debug mode.

use std::fmt;
use std::io::{self, IsTerminal, Write};

use nu_ansi_term::Style;

use crate::theme::catppuccin::Mocha as P;

/// Cells shown on each side of the pointer.
pub const DEBUG_RADIUS: usize = 10;

/// Engine state just before an instruction executes.
#[derive(Debug, Clone, Copy)]
pub struct DebugSnapshot<'a> {
    /// Program counter of the instruction about to run.
    pub pc: usize,
    pub instruction: char,
    /// Absolute data pointer.
    pub pointer: usize,
    /// Tape index of `window[0]`.
    pub window_start: usize,
    /// Cells `[pointer - DEBUG_RADIUS, pointer + DEBUG_RADIUS]`, clamped to the tape.
    pub window: &'a [u8],
}

impl<'a> DebugSnapshot<'a> {
    /// Build a snapshot with the window clamped to `cells`.
    pub fn capture(pc: usize, instruction: char, cells: &'a [u8], pointer: usize) -> Self {
        let start = pointer.saturating_sub(DEBUG_RADIUS);
        let end = (pointer + DEBUG_RADIUS).min(cells.len() - 1);
        Self {
            pc,
            instruction,
            pointer,
            window_start: start,
            window: &cells[start..=end],
        }
    }

    /// Tape index of the last cell in the window.
    pub fn window_end(&self) -> usize {
        self.window_start + self.window.len() - 1
    }

    /// Value under the pointer.
    pub fn current(&self) -> u8 {
        self.window[self.pointer - self.window_start]
    }

    fn write_to(&self, f: &mut impl fmt::Write, highlight: Option<Style>) -> fmt::Result {
        writeln!(f, "[DEBUG] PC: {}, Instruction: {}", self.pc, self.instruction)?;
        write!(f, "Memory[{}-{}]:", self.window_start, self.window_end())?;
        for (offset, cell) in self.window.iter().enumerate() {
            if self.window_start + offset == self.pointer {
                let marked = format!("[{cell}]");
                match highlight {
                    Some(style) => write!(f, " {}", style.paint(marked))?,
                    None => write!(f, " {marked}")?,
                }
            } else {
                write!(f, " {cell}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for DebugSnapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, None)
    }
}

/// Default observer: render each snapshot to stderr, highlighting the pointer
/// cell when stderr is a terminal.
pub fn print_snapshot(snapshot: &DebugSnapshot<'_>) {
    let mut rendered = String::new();
    let highlight = io::stderr()
        .is_terminal()
        .then(|| Style::new().fg(P::YELLOW).bold());
    if snapshot.write_to(&mut rendered, highlight).is_ok() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "\n{rendered}");
        let _ = err.flush();
    }
}
