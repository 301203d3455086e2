//! The execution engine.
//!
//! Features and behaviors:
//! - Tape of `memory_size` cells initialized to 0, pointer starts at cell 0.
//! - Pointer edges either wrap or fail with [`EngineError::OutOfBounds`],
//!   depending on [`EngineConfig::wrap_memory`].
//! - `+`/`-` wrap modulo 256.
//! - `.` writes the current cell to the output and flushes it.
//! - `,` reads through an [`InputBuffer`]; on end of input the cell is zeroed
//!   or left unchanged depending on [`EngineConfig::eof_sets_zero`].
//! - Loops are matched while running: `[` on a zero cell scans forward for its
//!   partner, otherwise pushes onto a bounded loop stack; `]` jumps back to the
//!   position on top of that stack. Bracket errors surface only when execution
//!   reaches them.
//! - Bytes outside `><+-.,[]` are skipped.

use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};

use crate::config::{EngineConfig, MAX_NESTED_LOOPS};
use crate::debug::{self, DebugSnapshot};
use crate::input::InputBuffer;
use crate::loops::LoopStack;
use crate::tape::Tape;

/// Errors that halt a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The data pointer attempted to move past a tape edge with wrapping disabled.
    #[error("Data pointer out of bounds at position {ip} (ptr={ptr}, op='{op}')")]
    OutOfBounds { ip: usize, ptr: usize, op: char },

    /// A `[` on a zero cell had no matching `]` before the end of the program.
    #[error("Unmatched '[' at position {ip}")]
    UnmatchedOpen { ip: usize },

    /// A `]` was reached with no open loop.
    #[error("Unmatched ']' at position {ip}")]
    UnmatchedClose { ip: usize },

    /// Entering the loop at `ip` would exceed the nesting bound.
    #[error("Too many nested loops at position {ip} (max {max})")]
    LoopStackOverflow { ip: usize, max: usize },

    /// Tape or loop stack storage could not be reserved.
    #[error("Memory allocation failed for {what}")]
    AllocationFailure { what: &'static str },

    /// Reading input or writing output failed.
    #[error("I/O error at position {ip}: {source}")]
    Io { ip: usize, #[source] source: io::Error },
}

impl EngineError {
    /// Instruction position the error is attributed to, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            EngineError::OutOfBounds { ip, .. }
            | EngineError::UnmatchedOpen { ip }
            | EngineError::UnmatchedClose { ip }
            | EngineError::LoopStackOverflow { ip, .. }
            | EngineError::Io { ip, .. } => Some(*ip),
            EngineError::AllocationFailure { .. } => None,
        }
    }
}

/// Non-fatal conditions reported after a run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineWarning {
    /// The program ended with loops still open.
    UnclosedLoops(usize),
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineWarning::UnclosedLoops(1) => write!(f, "1 unclosed loop"),
            EngineWarning::UnclosedLoops(n) => write!(f, "{n} unclosed loops"),
        }
    }
}

/// Result of a run that reached the end of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Instructions dispatched, counting jumps and skipped bytes.
    pub steps: u64,
    /// Loops still on the stack when the program counter reached the end.
    pub unclosed_loops: usize,
}

impl RunSummary {
    pub fn warning(&self) -> Option<EngineWarning> {
        (self.unclosed_loops > 0).then_some(EngineWarning::UnclosedLoops(self.unclosed_loops))
    }
}

/// A single-use Brainfuck engine.
///
/// The engine owns:
/// - the instruction sequence (already filtered, see [`crate::bf_only`]),
/// - the tape and data pointer,
/// - the loop stack and program counter.
///
/// Each engine runs one program once; build a new one for a fresh tape.
pub struct Engine {
    code: Vec<u8>,
    config: EngineConfig,
    tape: Tape,
    loops: LoopStack,
    pc: usize,
    debug_observer: Option<Box<dyn FnMut(&DebugSnapshot<'_>)>>,
}

impl Engine {
    /// Create an engine for `code` with nesting bounded by [`MAX_NESTED_LOOPS`].
    pub fn new(code: String, config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_loop_capacity(code, config, MAX_NESTED_LOOPS)
    }

    /// Create an engine with a custom loop nesting bound.
    pub fn with_loop_capacity(
        code: String,
        config: EngineConfig,
        loop_capacity: usize,
    ) -> Result<Self, EngineError> {
        let config = config.normalized();
        let tape = Tape::try_new(config.memory_size, config.wrap_memory)
            .ok_or(EngineError::AllocationFailure { what: "memory tape" })?;
        let loops = LoopStack::try_with_capacity(loop_capacity)
            .ok_or(EngineError::AllocationFailure { what: "loop stack" })?;

        Ok(Self {
            code: code.into_bytes(),
            config,
            tape,
            loops,
            pc: 0,
            debug_observer: None,
        })
    }

    /// Replace the default stderr renderer used in debug mode.
    pub fn set_debug_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&DebugSnapshot<'_>) + 'static,
    {
        self.debug_observer = Some(Box::new(observer));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tape(&self) -> &[u8] {
        self.tape.cells()
    }

    pub fn pointer(&self) -> usize {
        self.tape.pointer()
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Number of loops currently open.
    pub fn open_loops(&self) -> usize {
        self.loops.len()
    }

    /// Run against the process's stdin and stdout.
    ///
    /// When stdin is a terminal, `Input: ` is printed to stderr before each
    /// input refill.
    pub fn run(&mut self) -> Result<RunSummary, EngineError> {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        let mut input = InputBuffer::new(stdin.lock());
        if interactive {
            input.set_prompt(|| {
                let mut err = io::stderr();
                let _ = write!(err, "\nInput: ");
                let _ = err.flush();
            });
        }
        let mut stdout = io::stdout().lock();
        self.run_with(&mut input, &mut stdout)
    }

    /// Execute the program until the program counter reaches the end or an
    /// error halts it.
    pub fn run_with<R, W>(
        &mut self,
        input: &mut InputBuffer<R>,
        output: &mut W,
    ) -> Result<RunSummary, EngineError>
    where
        R: BufRead,
        W: Write,
    {
        let code_len = self.code.len();
        let mut steps: u64 = 0;

        while self.pc < code_len {
            let instr = self.code[self.pc];

            if self.config.debug_mode {
                let snapshot = DebugSnapshot::capture(
                    self.pc,
                    instr as char,
                    self.tape.cells(),
                    self.tape.pointer(),
                );
                match self.debug_observer.as_mut() {
                    Some(observer) => observer(&snapshot),
                    None => debug::print_snapshot(&snapshot),
                }
            }

            match instr {
                b'>' => {
                    let ptr = self.tape.pointer();
                    self.tape.move_right().map_err(|_| EngineError::OutOfBounds {
                        ip: self.pc,
                        ptr,
                        op: '>',
                    })?;
                }
                b'<' => {
                    let ptr = self.tape.pointer();
                    self.tape.move_left().map_err(|_| EngineError::OutOfBounds {
                        ip: self.pc,
                        ptr,
                        op: '<',
                    })?;
                }
                b'+' => self.tape.increment(),
                b'-' => self.tape.decrement(),
                b'.' => {
                    let ip = self.pc;
                    output
                        .write_all(&[self.tape.get()])
                        .and_then(|_| output.flush())
                        .map_err(|source| EngineError::Io { ip, source })?;
                }
                b',' => {
                    let ip = self.pc;
                    match input.next_byte().map_err(|source| EngineError::Io { ip, source })? {
                        Some(b) => self.tape.set(b),
                        None if self.config.eof_sets_zero => self.tape.set(0),
                        None => {}
                    }
                }
                b'[' => {
                    if self.tape.get() == 0 {
                        self.pc = self.skip_forward()?;
                    } else {
                        self.loops.push(self.pc).map_err(|_| EngineError::LoopStackOverflow {
                            ip: self.pc,
                            max: self.loops.capacity(),
                        })?;
                    }
                }
                b']' => {
                    let Some(open) = self.loops.top() else {
                        return Err(EngineError::UnmatchedClose { ip: self.pc });
                    };
                    if self.tape.get() != 0 {
                        // Land on the '[' itself; the advance below re-enters the body.
                        self.pc = open;
                    } else {
                        self.loops.pop();
                    }
                }
                _ => {}
            }

            steps += 1;
            self.pc += 1;
        }

        Ok(RunSummary {
            steps,
            unclosed_loops: self.loops.len(),
        })
    }

    /// Position of the `]` matching the `[` at the current program counter.
    fn skip_forward(&self) -> Result<usize, EngineError> {
        let mut nest_level: usize = 1;
        let mut pos = self.pc;
        while nest_level > 0 {
            pos += 1;
            match self.code.get(pos) {
                None => return Err(EngineError::UnmatchedOpen { ip: self.pc }),
                Some(b'[') => nest_level += 1,
                Some(b']') => nest_level -= 1,
                Some(_) => {}
            }
        }
        Ok(pos)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("pc", &self.pc)
            .field("pointer", &self.tape.pointer())
            .field("open_loops", &self.loops.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config(memory_size: usize) -> EngineConfig {
        EngineConfig { memory_size, ..EngineConfig::default() }
    }

    /// Run `code` with `stdin` as input; returns the engine, the result and the output.
    fn run(
        code: &str,
        cfg: EngineConfig,
        stdin: &[u8],
    ) -> (Engine, Result<RunSummary, EngineError>, Vec<u8>) {
        let mut bf = Engine::new(code.to_string(), cfg).unwrap();
        let mut input = InputBuffer::new(stdin);
        let mut out = Vec::new();
        let res = bf.run_with(&mut input, &mut out);
        (bf, res, out)
    }

    #[test]
    fn unmatched_open_bracket_returns_error() {
        // The starting cell is zero, so '[' scans forward and runs off the end.
        let (_, res, _) = run("[+", config(10), b"");
        assert!(matches!(res, Err(EngineError::UnmatchedOpen { ip: 0 })));
    }

    #[test]
    fn unmatched_open_reports_the_failing_bracket() {
        let (_, res, _) = run("+[>[+", config(10), b"");
        assert!(matches!(res, Err(EngineError::UnmatchedOpen { ip: 3 })));
    }

    #[test]
    fn unmatched_close_bracket_returns_error() {
        let (bf, res, _) = run("+]", config(10), b"");
        assert!(matches!(res, Err(EngineError::UnmatchedClose { ip: 1 })));
        assert_eq!(bf.tape()[0], 1, "work before the error stays applied");
    }

    #[test]
    fn left_pointer_out_of_bounds_errors() {
        let (_, res, _) = run("<", config(10), b"");
        assert!(matches!(res, Err(EngineError::OutOfBounds { ip: 0, ptr: 0, op: '<' })));
    }

    #[test]
    fn right_pointer_out_of_bounds_errors() {
        // With 3 cells (0..=2), the 3rd '>' attempts to move beyond index 2.
        let (bf, res, _) = run(">>>+", config(3), b"");
        assert!(matches!(res, Err(EngineError::OutOfBounds { ip: 2, ptr: 2, op: '>' })));
        assert_eq!(bf.pointer(), 2);
        assert_eq!(bf.tape(), &[0, 0, 0], "nothing after the error runs");
    }

    #[test]
    fn out_of_bounds_halts_after_partial_output() {
        let (_, res, out) = run("+.<.", config(4), b"");
        assert!(matches!(res, Err(EngineError::OutOfBounds { ip: 2, .. })));
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn wrap_policy_cycles_both_ways() {
        let cfg = EngineConfig { wrap_memory: true, ..config(3) };
        let (bf, res, _) = run("<+", cfg, b"");
        assert!(res.is_ok());
        assert_eq!(bf.pointer(), 2);
        assert_eq!(bf.tape(), &[0, 0, 1]);

        let (bf, res, _) = run(">>>+", cfg, b"");
        assert!(res.is_ok());
        assert_eq!(bf.pointer(), 0);
        assert_eq!(bf.tape()[0], 1);
    }

    #[test]
    fn empty_loop_on_zero_cell_is_ok() {
        let (_, res, _) = run("[]", config(10), b"");
        assert!(res.is_ok());
    }

    #[test]
    fn nested_skip_executes_nothing_inside() {
        let (bf, res, out) = run("[[-]+.]", config(10), b"");
        assert_eq!(res.unwrap().steps, 1, "the skip lands on the final ']'");
        assert_eq!(bf.tape()[0], 0);
        assert!(out.is_empty());
    }

    #[test]
    fn clear_loop_terminates() {
        let (bf, res, _) = run("+++[-]", config(10), b"");
        let summary = res.unwrap();
        assert_eq!(bf.tape()[0], 0);
        assert_eq!(summary.unclosed_loops, 0);
        assert_eq!(bf.open_loops(), 0);
    }

    #[test]
    fn close_re_enters_at_the_open_bracket() {
        // A taken ']' sets pc to the '[' and the advance moves into the body,
        // so '[' dispatches only once: 3 incs, '[', then 3 x ('-', ']').
        let (_, res, _) = run("+++[-]", config(10), b"");
        assert_eq!(res.unwrap().steps, 3 + 1 + 3 * 2);
    }

    #[test]
    fn multiplication_prints_64() {
        let (_, res, out) = run("++++++++[>++++++++<-]>.", EngineConfig::default(), b"");
        assert!(res.is_ok());
        assert_eq!(out, vec![64]);
    }

    #[test]
    fn hello_world() {
        let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
        let (_, res, out) = run(code, EngineConfig::default(), b"");
        assert!(res.is_ok());
        assert_eq!(out, b"Hello World!\n");
    }

    #[test]
    fn wrapping_subtraction() {
        let (bf, res, _) = run("-", config(1), b"");
        assert!(res.is_ok());
        assert_eq!(bf.tape()[0], 255);
    }

    #[test]
    fn wrapping_addition() {
        let (bf, _, _) = run(&"+".repeat(255), config(1), b"");
        assert_eq!(bf.tape()[0], 255);
        let (bf, _, _) = run(&"+".repeat(256), config(1), b"");
        assert_eq!(bf.tape()[0], 0);
    }

    #[test]
    fn eof_leaves_cell_unchanged_by_default() {
        let (_, res, out) = run(",.,.", EngineConfig::default(), &[65]);
        assert!(res.is_ok());
        assert_eq!(out, b"AA");
    }

    #[test]
    fn eof_sets_zero_when_configured() {
        let cfg = EngineConfig { eof_sets_zero: true, ..EngineConfig::default() };
        let (_, res, out) = run(",.,.", cfg, &[65]);
        assert!(res.is_ok());
        assert_eq!(out, vec![65, 0]);
    }

    #[test]
    fn echo_until_eof_with_zero_policy() {
        let cfg = EngineConfig { eof_sets_zero: true, ..EngineConfig::default() };
        let (_, res, out) = run(",[.,]", cfg, b"hi\nyo");
        assert!(res.is_ok());
        assert_eq!(out, b"hi\nyo");
    }

    #[test]
    fn input_is_shared_across_reads_of_one_line() {
        let (bf, _, _) = run(",>,>,", config(3), b"xyz\n");
        assert_eq!(bf.tape(), b"xyz");
    }

    #[test]
    fn empty_program_produces_nothing() {
        let (_, res, out) = run(&crate::bf_only("hello, world? no!"), config(10), b"");
        // The only survivor is the ',' which hits EOF and leaves the cell alone.
        assert_eq!(res.unwrap().unclosed_loops, 0);
        assert!(out.is_empty());

        let (_, res, out) = run(&crate::bf_only("just words"), config(10), b"");
        assert_eq!(res.unwrap(), RunSummary::default());
        assert!(out.is_empty());
    }

    #[test]
    fn foreign_bytes_are_skipped() {
        let (bf, res, _) = run("+a+", config(10), b"");
        assert!(res.is_ok());
        assert_eq!(bf.tape()[0], 2);
    }

    #[test]
    fn unclosed_loop_is_a_warning_not_an_error() {
        // '[' on a non-zero cell pushes and the program simply ends.
        let (_, res, _) = run("+[", config(10), b"");
        let summary = res.unwrap();
        assert_eq!(summary.unclosed_loops, 1);
        assert_eq!(summary.warning(), Some(EngineWarning::UnclosedLoops(1)));
        assert_eq!(summary.warning().unwrap().to_string(), "1 unclosed loop");
    }

    #[test]
    fn loop_stack_overflow_is_reported() {
        let mut bf = Engine::with_loop_capacity("+[[[".to_string(), config(10), 2).unwrap();
        let mut input = InputBuffer::new(&b""[..]);
        let res = bf.run_with(&mut input, &mut Vec::new());
        assert!(matches!(res, Err(EngineError::LoopStackOverflow { ip: 3, max: 2 })));
    }

    #[test]
    fn default_nesting_bound_is_enforced() {
        let code = format!("+{}", "[".repeat(MAX_NESTED_LOOPS + 1));
        let (_, res, _) = run(&code, config(1), b"");
        assert!(matches!(
            res,
            Err(EngineError::LoopStackOverflow { ip, max: MAX_NESTED_LOOPS }) if ip == MAX_NESTED_LOOPS + 1
        ));
    }

    #[test]
    fn zero_memory_size_uses_default() {
        let bf = Engine::new(String::new(), config(0)).unwrap();
        assert_eq!(bf.tape().len(), crate::DEFAULT_MEMORY_SIZE);
        assert_eq!(bf.config().memory_size, crate::DEFAULT_MEMORY_SIZE);
    }

    #[test]
    fn unallocatable_tape_is_reported() {
        let res = Engine::new(String::new(), config(usize::MAX));
        let err = res.unwrap_err();
        assert!(matches!(err, EngineError::AllocationFailure { what: "memory tape" }));
        assert_eq!(err.position(), None);
    }

    #[test]
    fn unallocatable_loop_stack_is_reported() {
        let res = Engine::with_loop_capacity(String::new(), config(1), usize::MAX);
        assert!(matches!(res, Err(EngineError::AllocationFailure { what: "loop stack" })));
    }

    #[test]
    fn pc_rests_at_end_after_a_run() {
        let (bf, res, _) = run("++[-]>", config(4), b"");
        assert!(res.is_ok());
        assert_eq!(bf.pc(), 6);
        assert_eq!(bf.config().memory_size, 4);
    }

    #[test]
    fn pc_stays_on_the_failing_instruction() {
        let (bf, res, _) = run("+>>", config(2), b"");
        assert!(res.is_err());
        assert_eq!(bf.pc(), 2);
    }

    #[test]
    fn output_errors_carry_position() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut bf = Engine::new("+.".to_string(), config(1)).unwrap();
        let mut input = InputBuffer::new(&b""[..]);
        let res = bf.run_with(&mut input, &mut Broken);
        let err = res.unwrap_err();
        assert_eq!(err.position(), Some(1));
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[test]
    fn debug_observer_sees_every_instruction() {
        let seen: Rc<RefCell<Vec<(usize, char, usize, u8)>>> = Rc::default();
        let sink = seen.clone();

        let cfg = EngineConfig { debug_mode: true, ..config(5) };
        let mut bf = Engine::new("+>+<".to_string(), cfg).unwrap();
        bf.set_debug_observer(move |s| {
            sink.borrow_mut().push((s.pc, s.instruction, s.pointer, s.current()));
        });
        let mut input = InputBuffer::new(&b""[..]);
        bf.run_with(&mut input, &mut Vec::new()).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![(0, '+', 0, 0), (1, '>', 0, 1), (2, '+', 1, 0), (3, '<', 1, 1)]
        );
    }

    #[test]
    fn observer_is_silent_without_debug_mode() {
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let mut bf = Engine::new("+++".to_string(), config(5)).unwrap();
        bf.set_debug_observer(move |_| *counter.borrow_mut() += 1);
        let mut input = InputBuffer::new(&b""[..]);
        bf.run_with(&mut input, &mut Vec::new()).unwrap();
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn error_messages_name_the_position() {
        let (_, res, _) = run("]", config(1), b"");
        assert_eq!(res.unwrap_err().to_string(), "Unmatched ']' at position 0");
    }
}
