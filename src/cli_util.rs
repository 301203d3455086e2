use std::io::{self, IsTerminal, Write};
use crate::{EngineConfig, EngineError, EngineWarning};
use crate::theme::alert_style;

/// Pretty-print an [`EngineError`] with caret positioning.
/// If `program` is `Some("bf")`, prefix messages with "bf: ..." for CLI read mode
pub fn print_engine_error(program: Option<&str>, code: &str, err: &EngineError) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    let msg = match err {
        EngineError::OutOfBounds { ptr, op, .. } => {
            format!("Runtime error: data pointer out of bounds (ptr={ptr}, op={op})")
        }
        EngineError::UnmatchedOpen { .. } => "Runtime error: unmatched '['".to_string(),
        EngineError::UnmatchedClose { .. } => "Runtime error: unmatched ']'".to_string(),
        EngineError::LoopStackOverflow { max, .. } => {
            format!("Runtime error: too many nested loops (max {max})")
        }
        EngineError::AllocationFailure { what } => format!("Error: memory allocation failed for {what}"),
        EngineError::Io { source, .. } => format!("I/O error: {source}"),
    };

    let msg = prefix_program(&msg);
    match err.position() {
        Some(ip) => print_error_with_context(&msg, code, ip),
        None => {
            eprintln!("{msg}");
            let _ = io::stderr().flush();
        }
    }
}

/// Report a non-fatal condition left over after a run.
pub fn print_warning(program: Option<&str>, warning: &EngineWarning) {
    match program {
        Some(p) => eprintln!("{p}: warning: {warning}"),
        None => eprintln!("warning: {warning}"),
    }
    let _ = io::stderr().flush();
}

/// Describe where the program came from and how the engine is configured.
pub fn print_banner(source: &str, config: &EngineConfig) {
    eprintln!("Running Brainfuck program from: {source}");
    eprintln!(
        "Configuration: Memory Size={}, Wrapping={}, Debug={}, EOF=Set to {}",
        config.memory_size,
        if config.wrap_memory { "Enabled" } else { "Disabled" },
        if config.debug_mode { "Enabled" } else { "Disabled" },
        if config.eof_sets_zero { "0" } else { "Unchanged" },
    );
    eprintln!();
    let _ = io::stderr().flush();
}

/// Print a concise error with instruction index and a caret context window.
/// `code` is the filtered instruction sequence, so every char is one byte.
pub fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{prefix} at instruction {pos}");
    for line in context_lines(code, pos, io::stderr().is_terminal()) {
        eprintln!("  {line}");
    }
    let _ = io::stderr().flush();
}

/// The two lines shown under an error: a window of `code` around `pos` and a
/// caret under `pos`, painted bold red when `color` is set.
fn context_lines(code: &str, pos: usize, color: bool) -> [String; 2] {
    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);
    let slice: String = code.chars().skip(start_char).take(end_char.saturating_sub(start_char)).collect();

    let caret_offset = pos.saturating_sub(start_char);
    let caret = if color {
        alert_style().paint("^").to_string()
    } else {
        "^".to_string()
    };
    [slice, format!("{}{caret}", " ".repeat(caret_offset))]
}

/// Block until the user presses Enter. Keeps a freshly opened console window
/// from closing before the output can be read.
pub fn wait_for_enter() {
    eprint!("Press Enter to exit...");
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_window_places_caret_under_position() {
        let [slice, caret] = context_lines("++[->+<]", 2, false);
        assert_eq!(slice, "++[->+<]");
        assert_eq!(caret, "  ^");
    }

    #[test]
    fn context_window_is_trimmed_on_long_programs() {
        let code = "+".repeat(100);
        let [slice, caret] = context_lines(&code, 50, false);
        assert_eq!(slice.len(), 65);
        assert_eq!(caret.trim_start().len(), 1);
        assert_eq!(caret.len() - 1, 32);
    }
}
