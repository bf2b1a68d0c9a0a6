use std::path::PathBuf;

use clap::{ArgGroup, Parser};

/// Recover and replay the commands a jtreg-style test run executed.
#[derive(Parser, Debug)]
#[command(
    name = "jtr_replay",
    version,
    group(ArgGroup::new("mode").args(["bash", "execute", "execute_all", "run", "print_debug_cfg"])),
    after_help = "Examples:
  jtr_replay out.txt                         list the parsed commands
  jtr_replay out.txt --bash                  print them as a bash script
  jtr_replay out.txt --run ark aot           run 'ark' then 'aot'
  jtr_replay out.txt --run \"*compile*\"       run everything matching a glob
  jtr_replay out.txt --run \"ark --verbose\"   run 'ark' with an extra argument
  jtr_replay out.txt --run \"ark [-b=A,B]\" --run-arg-cycle
  jtr_replay out.txt --print-debug-cfg \"ark --my-arg\""
)]
pub struct Cli {
    /// Test runner output to parse. Reads stdin when omitted.
    #[arg(value_name = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Print the commands as a bash script.
    #[arg(long)]
    pub bash: bool,

    /// Step through the commands, asking before each one.
    #[arg(long)]
    pub execute: bool,

    /// Run every command in order.
    #[arg(long = "execute-all")]
    pub execute_all: bool,

    /// Run commands by name pattern, each spec as one quoted "<pattern> [args]" string.
    #[arg(long, value_name = "SPEC", num_args = 1..)]
    pub run: Option<Vec<String>>,

    /// Print an lldb launch configuration for the first command matching "<pattern> [args]".
    #[arg(long = "print-debug-cfg", value_name = "SPEC")]
    pub print_debug_cfg: Option<String>,

    /// Suppress every informational line and let commands write to the terminal.
    #[arg(long = "raw-output")]
    pub raw_output: bool,

    /// With --run, try each comma-separated value in a "[a,b]" group in turn.
    #[arg(long = "run-arg-cycle")]
    pub run_arg_cycle: bool,

    /// With --run, accumulate the values of a "[a,b]" group one at a time.
    #[arg(long = "run-arg-seq")]
    pub run_arg_seq: bool,

    /// Per-command timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Settings file to use instead of ~/.jtr_replayrc.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Info,
    Bash,
    Execute,
    ExecuteAll,
    Run(Vec<String>),
    DebugConfig(String),
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.bash {
            Mode::Bash
        } else if self.execute {
            Mode::Execute
        } else if self.execute_all {
            Mode::ExecuteAll
        } else if let Some(specs) = &self.run {
            Mode::Run(specs.clone())
        } else if let Some(spec) = &self.print_debug_cfg {
            Mode::DebugConfig(spec.clone())
        } else {
            Mode::Info
        }
    }
}
