//! A configurable Brainfuck execution engine.
//!
//! The engine runs an already-filtered instruction sequence over a fixed-size
//! byte tape. Pointer edges either wrap or fail, end of input either zeroes the
//! current cell or leaves it alone, and an optional debug hook sees a window of
//! the tape before every instruction. See [`Engine`] for the full behavior.
//!
//! Quick start:
//!
//! ```no_run
//! use bf_tape::{bf_only, Engine, EngineConfig};
//!
//! // Classic "Hello World!" in Brainfuck
//! let source = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let mut bf = Engine::new(bf_only(source), EngineConfig::default()).expect("allocation");
//! let summary = bf.run().expect("program should run");
//! assert!(summary.warning().is_none());
//! ```
//!
//! Capturing I/O instead of using stdin/stdout:
//!
//! ```
//! use bf_tape::{Engine, EngineConfig, InputBuffer};
//!
//! let mut bf = Engine::new(",+.".to_string(), EngineConfig::default()).unwrap();
//! let mut input = InputBuffer::new(&b"A"[..]);
//! let mut output = Vec::new();
//! bf.run_with(&mut input, &mut output).unwrap();
//! assert_eq!(output, b"B");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod debug;
pub mod engine;
pub mod input;
pub mod loops;
pub mod repl;
pub mod tape;
pub mod theme;

pub use config::{EngineConfig, DEFAULT_MEMORY_SIZE, INPUT_BUFFER_SIZE, MAX_NESTED_LOOPS};
pub use debug::DebugSnapshot;
pub use engine::{Engine, EngineError, EngineWarning, RunSummary};
pub use input::InputBuffer;

/// Keep only Brainfuck instruction characters
pub fn bf_only(s: &str) -> String {
    s.chars()
        .filter(|c| matches!(c, '>' | '<' | '+' | '-' | '.' | ',' | '[' | ']'))
        .collect()
}
