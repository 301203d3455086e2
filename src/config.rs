use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use cross_xdg::BaseDirs;

/// Number of tape cells used when nothing else is configured.
pub const DEFAULT_MEMORY_SIZE: usize = 30_000;

/// Maximum depth of simultaneously open loops.
pub const MAX_NESTED_LOOPS: usize = 1_000;

/// Upper bound on the bytes pulled from the input source per refill.
pub const INPUT_BUFFER_SIZE: usize = 4_096;

/// Engine configuration. Fixed for the lifetime of an [`crate::Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Wrap the pointer around the tape edges instead of failing.
    pub wrap_memory: bool,
    /// Expose a [`crate::DebugSnapshot`] before every instruction.
    pub debug_mode: bool,
    /// Number of cells on the tape. Zero is treated as [`DEFAULT_MEMORY_SIZE`].
    pub memory_size: usize,
    /// On end of input, write 0 to the current cell instead of leaving it alone.
    pub eof_sets_zero: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wrap_memory: false,
            debug_mode: false,
            memory_size: DEFAULT_MEMORY_SIZE,
            eof_sets_zero: false,
        }
    }
}

impl EngineConfig {
    /// Returns a copy with `memory_size` guaranteed to be at least 1.
    pub fn normalized(mut self) -> Self {
        if self.memory_size == 0 {
            self.memory_size = DEFAULT_MEMORY_SIZE;
        }
        self
    }

    /// Load the user's `bf.toml` on top of the defaults.
    ///
    /// Falls back to [`EngineConfig::default`] when no config home can be
    /// resolved or the file does not exist.
    pub fn load() -> Self {
        config_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load the `[engine]` section of the file at `path`, if it can be read.
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        Some(Self::default().merge_toml(&content))
    }

    /// Apply recognized `[engine]` keys from `content` on top of `self`.
    /// Unknown keys and unparsable values are ignored.
    pub fn merge_toml(mut self, content: &str) -> Self {
        let map = engine_section(content);

        if let Some(v) = map.get("wrap_memory").and_then(|s| parse_bool(s)) {
            self.wrap_memory = v;
        }
        if let Some(v) = map.get("debug_mode").and_then(|s| parse_bool(s)) {
            self.debug_mode = v;
        }
        if let Some(v) = map.get("eof_sets_zero").and_then(|s| parse_bool(s)) {
            self.eof_sets_zero = v;
        }
        if let Some(v) = map.get("memory_size") {
            self.memory_size = parse_memory_size(v);
        }
        self
    }
}

/// Parse a user-supplied memory size.
///
/// Anything that does not parse to a positive integer falls back to
/// [`DEFAULT_MEMORY_SIZE`].
pub fn parse_memory_size(value: &str) -> usize {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_MEMORY_SIZE)
}

/// `$XDG_CONFIG_HOME/bf.toml` (or the platform equivalent).
pub fn config_path() -> Option<PathBuf> {
    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

// Very small hand-rolled parser: collect key = value pairs under [engine].
fn engine_section(content: &str) -> HashMap<String, String> {
    let mut in_engine = false;
    let mut map = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            in_engine = &line[1..line.len() - 1] == "engine";
            continue;
        }
        if !in_engine { continue; }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq + 1..].trim();
            // Accept quoted or unquoted
            let val = if val_raw.len() >= 2 && val_raw.starts_with('"') && val_raw.ends_with('"') {
                val_raw[1..val_raw.len() - 1].to_string()
            } else {
                val_raw.to_string()
            };
            map.insert(key, val);
        }
    }

    map
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
