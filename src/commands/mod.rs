pub mod read;
pub mod repl;

use clap::Args;
use crate::config::parse_memory_size;
use crate::EngineConfig;

/// Engine flags shared by `read` and `repl`. Each one overrides `bf.toml`.
#[derive(Args, Debug, Default)]
pub struct EngineArgs {
    /// Wrap the data pointer around the tape edges instead of failing
    #[arg(short = 'w', long = "wrap")]
    pub wrap: bool,

    /// Print a tape snapshot to stderr before every instruction
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Number of tape cells (0 or an invalid value means the default, 30000)
    #[arg(short = 'm', long = "memory", value_name = "SIZE")]
    pub memory: Option<String>,

    /// Set the current cell to 0 on end of input (default: leave it unchanged)
    #[arg(short = 'z', long = "eof-zero")]
    pub eof_zero: bool,

    /// Ignore the bf.toml config file
    #[arg(long = "no-config")]
    pub no_config: bool,
}

impl EngineArgs {
    /// Defaults, then `bf.toml` (unless `--no-config`), then flags.
    pub fn resolve(&self) -> EngineConfig {
        let base = if self.no_config { EngineConfig::default() } else { EngineConfig::load() };
        self.apply(base)
    }

    fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        config.wrap_memory |= self.wrap;
        config.debug_mode |= self.debug;
        config.eof_sets_zero |= self.eof_zero;
        if let Some(size) = self.memory.as_deref() {
            config.memory_size = parse_memory_size(size);
        }
        config
    }
}
