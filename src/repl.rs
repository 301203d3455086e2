use std::env;
use std::io::{self, IsTerminal, Write};
use reedline::{Signal, DefaultPrompt, DefaultPromptSegment, HistoryItem, Highlighter, StyledText};
use crate::theme::instruction_style;
use crate::{bf_only, cli_util, Engine, EngineConfig};

pub fn repl_loop(config: EngineConfig) -> io::Result<()> {
    // Initialize interactive line editor
    let mut editor = init_line_editor()?;

    loop {
        // Prompt and read a multi-line submission via editor
        let Some(submission) = read_submission_interactive(&mut editor)? else {
            // EOF or editor closed. End the session cleanly to avoid hanging when stdin is closed
            println!();
            io::stdout().flush()?;
            return Ok(());
        };

        let filtered = bf_only(&submission);
        if filtered.is_empty() {
            continue;
        }

        execute_bf_buffer(filtered, config);

        // Test hook: if BF_REPL_ONCE=1, exit after one execution
        if env::var("BF_REPL_ONCE").ok().as_deref() == Some("1") {
            return Ok(());
        }
    }
}

fn init_line_editor() -> io::Result<reedline::Reedline> {
    use reedline::{
        default_emacs_keybindings, EditCommand, Emacs, KeyCode, KeyModifiers, Reedline, ReedlineEvent,
    };

    // Enter inserts a newline; Ctrl+D (or Ctrl+Z on Windows) submits the buffer.
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Edit(vec![EditCommand::InsertNewline]));
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('z'), ReedlineEvent::Submit);

    // Up/down move within the current multiline buffer; Alt/Ctrl+Up/Down browse history.
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = reedline::FileBackedHistory::new(1_000)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(InstructionHighlighter))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

/// Collect all input until EOF. `None` on a read error or when nothing was read.
///
/// Invalid UTF-8 is replaced rather than rejected; only the ASCII instruction
/// bytes matter once the submission is filtered.
pub fn read_submission<R: io::BufRead>(stdin: &mut R) -> Option<String> {
    let mut buffer = Vec::new();
    match stdin.read_to_end(&mut buffer) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(String::from_utf8_lossy(&buffer).into_owned()),
    }
}

fn read_submission_interactive(editor: &mut reedline::Reedline) -> io::Result<Option<String>> {
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("bf".to_string()), DefaultPromptSegment::Empty);

    match editor.read_line(&prompt) {
        Ok(Signal::Success(buffer)) => {
            // One history item per submitted program
            if !buffer.trim().is_empty() {
                let _ = editor.history_mut().save(HistoryItem::from_command_line(buffer.clone()));
            }
            Ok(Some(buffer))
        }
        Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => Ok(None),
        Err(e) => {
            eprintln!("repl: editor error: {e}");
            let _ = io::stderr().flush();
            Ok(None)
        }
    }
}

/// Executes a single filtered program on a fresh engine.
/// - Program output goes to stdout.
/// - Errors and warnings are printed concisely to stderr.
/// - A newline is always written to stdout after execution (success or error)
///   so that the prompt begins at column 0 on the next iteration.
///
/// Returns `false` if the engine stopped with an error.
fn execute_bf_buffer(code: String, config: EngineConfig) -> bool {
    let ok = match Engine::new(code.clone(), config).and_then(|mut bf| bf.run()) {
        Ok(summary) => {
            if let Some(warning) = summary.warning() {
                cli_util::print_warning(None, &warning);
            }
            true
        }
        Err(err) => {
            cli_util::print_engine_error(None, &code, &err);
            false
        }
    };
    println!();
    let _ = io::stdout().flush();
    ok
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

/// Resolve the REPL mode: flags, then `BF_REPL_MODE`, then TTY auto-detection.
pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    resolve_mode(flag, env::var("BF_REPL_MODE").ok().as_deref(), io::stdin().is_terminal())
}

fn resolve_mode(flag: ModeFlagOverride, env_mode: Option<&str>, stdin_tty: bool) -> Result<ReplMode, String> {
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor if !stdin_tty => {
            return Err("cannot start editor: stdin is not a TTY (use --bare or BF_REPL_MODE=bare)".to_string());
        }
        ModeFlagOverride::Editor => return Ok(ReplMode::Editor),
        ModeFlagOverride::None => {}
    }

    if let Some(val) = env_mode {
        return match val.trim().to_ascii_lowercase().as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" if !stdin_tty => {
                Err("cannot start editor: stdin is not a TTY (use BF_REPL_MODE=bare)".to_string())
            }
            "editor" => Ok(ReplMode::Editor),
            _ => Err(format!("invalid BF_REPL_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    Ok(if stdin_tty { ReplMode::Editor } else { ReplMode::Bare })
}

/// Read stdin to EOF and run it once.
///
/// `Ok(false)` means the program ran and stopped with an engine error. An
/// empty submission counts as success.
pub fn execute_bare_once(config: EngineConfig) -> io::Result<bool> {
    // The engine locks stdin for ',' so the lock must be released first.
    let submission = read_submission(&mut io::stdin().lock());
    let Some(s) = submission else {
        return Ok(true);
    };
    let filtered = bf_only(&s);
    if filtered.is_empty() {
        return Ok(true);
    }
    Ok(execute_bf_buffer(filtered, config))
}

/// Colors each instruction by kind; everything else is dimmed.
struct InstructionHighlighter;

impl Highlighter for InstructionHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out = StyledText::new();
        let mut chars = line.chars().peekable();

        // Group runs of characters that share a style into one segment.
        while let Some(ch) = chars.next() {
            let style = instruction_style(ch);
            let mut segment = String::from(ch);
            while let Some(&next) = chars.peek() {
                if instruction_style(next) != style {
                    break;
                }
                segment.push(next);
                chars.next();
            }
            out.push((style, segment));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_submission_reads_until_eof_multiple_lines() {
        let input = b"+++\n>+.\n";
        let mut cursor = Cursor::new(&input[..]);
        let got = read_submission(&mut cursor);
        assert_eq!(got.as_deref(), Some("+++\n>+.\n"));
    }

    #[test]
    fn read_submission_empty_returns_none() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let got = read_submission(&mut cursor);
        assert!(got.is_none());
    }

    #[test]
    fn read_submission_keeps_instructions_around_invalid_utf8() {
        let mut cursor = Cursor::new(&b"+\xff+.\n"[..]);
        let got = read_submission(&mut cursor).unwrap();
        assert_eq!(bf_only(&got), "++.");
    }

    #[test]
    fn flags_beat_env_and_tty() {
        assert_eq!(resolve_mode(ModeFlagOverride::Bare, Some("editor"), true), Ok(ReplMode::Bare));
        assert!(resolve_mode(ModeFlagOverride::Editor, None, false).is_err());
        assert_eq!(resolve_mode(ModeFlagOverride::Editor, Some("bare"), true), Ok(ReplMode::Editor));
    }

    #[test]
    fn env_then_auto_detect() {
        assert_eq!(resolve_mode(ModeFlagOverride::None, Some(" BARE "), true), Ok(ReplMode::Bare));
        assert!(resolve_mode(ModeFlagOverride::None, Some("fancy"), true).is_err());
        assert_eq!(resolve_mode(ModeFlagOverride::None, None, true), Ok(ReplMode::Editor));
        assert_eq!(resolve_mode(ModeFlagOverride::None, None, false), Ok(ReplMode::Bare));
    }

    #[test]
    fn highlighter_groups_runs() {
        let styled = InstructionHighlighter.highlight("++[-]x", 0);
        let segments: Vec<&str> = styled.buffer.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(segments, vec!["++", "[", "-", "]", "x"]);
    }
}
