use clap::Args;
use std::fs;
use std::io::{self, IsTerminal, Write};
use crate::cli_util::{print_banner, print_engine_error, print_warning, wait_for_enter};
use crate::commands::EngineArgs;
use crate::{bf_only, Engine};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct ReadArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated Brainfuck code parts. May start with '-'; options go before the code
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Skip the run banner and completion message
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Do not wait for Enter after the run when attached to a terminal
    #[arg(long = "no-pause")]
    pub no_pause: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: ReadArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let ReadArgs {
        engine,
        file,
        code,
        quiet,
        no_pause,
        ..
    } = args;

    if file.is_none() && code.is_empty() {
        usage_and_exit(program, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let (source, origin) = if let Some(path) = file {
        match fs::read(&path) {
            // Instructions are ASCII, so lossy decoding never changes the filtered program.
            Ok(bytes) => (String::from_utf8_lossy(&bytes).into_owned(), path),
            Err(e) => {
                eprintln!("{program}: Could not open file {path}: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        }
    } else {
        (code.join(""), "<command line>".to_string())
    };

    let config = engine.resolve();
    let instructions = bf_only(&source);

    if !quiet {
        print_banner(&origin, &config);
    }

    let exit_code = match Engine::new(instructions.clone(), config).and_then(|mut bf| bf.run()) {
        Ok(summary) => {
            if let Some(warning) = summary.warning() {
                print_warning(Some(program), &warning);
            }
            0
        }
        Err(err) => {
            print_engine_error(Some(program), &instructions, &err);
            1
        }
    };

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();

    if !quiet {
        eprintln!("\nProgram execution complete.");
        let _ = io::stderr().flush();
    }

    if !no_pause && io::stdin().is_terminal() {
        wait_for_enter();
    }

    exit_code
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} read [options] "<code>"
  {0} read [options] --file <PATH>

Options:
  --file,  -f <PATH>    Read Brainfuck code from PATH instead of positional "<code>"
  --wrap,  -w           Wrap the data pointer around the tape edges (default: bounds checking)
  --debug, -d           Print a tape snapshot to stderr before every instruction
  --memory, -m <SIZE>   Number of tape cells (default: 30000)
  --eof-zero, -z        Set the cell to 0 on end of input (default: leave unchanged)
  --no-config           Ignore bf.toml
  --quiet, -q           Skip the run banner and completion message
  --no-pause            Do not wait for Enter after the run on a terminal
  --help,  -h           Show this help

Notes:
- Characters outside of Brainfuck's ><+-.,[] are ignored.
- Options must come before the code; everything after the first code argument is code.
  Use `--` when the code itself looks like an option (e.g. {0} read -- -w).
- Input (`,`) reads stdin one line at a time; on a terminal, "Input: " is shown before each read.
- Defaults can be set in the [engine] section of bf.toml in your config directory.

Examples:
- Load Brainfuck code from a file with a wrapping 100000-cell tape:
    {0} read -w -m 100000 --file ./program.bf
- Read bytes from a file as stdin (`,` will consume file input):
    {0} read -z ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
