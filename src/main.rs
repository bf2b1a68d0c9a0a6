use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use clap::Parser;
use jtr_replay::{CommandSet, ErrorKind, ReplayError, ReplayResult};
use log::debug;

mod args;
mod colors;
mod config;
mod debug_config;
mod execution;
mod interactive;
mod report;
mod run_spec;

use args::{Cli, Mode};
use colors::colors_enabled;
use config::{apply_env_overrides, default_config_path, load_config, ReplayConfig};
use debug_config::launch_config;
use execution::ExecOptions;
use interactive::{execute_interactively, open_prompt};
use report::Reporter;
use run_spec::{expand_variants, RunSpec, VariantMode};

fn main() {
    init_logging();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    };
    std::process::exit(code);
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or("JTR_REPLAY_LOG", "warn");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

fn run(cli: Cli) -> ReplayResult<i32> {
    let config = resolve_config(&cli)?;
    let raw = config.raw_output;

    let (text, source) = read_input(cli.input.as_deref())?;
    let set = CommandSet::parse(&text);
    if !raw {
        eprintln!("# Parsed from {source}");
    }
    if set.is_empty() {
        if !raw {
            eprintln!("No commands found in the output");
        }
        return Ok(1);
    }
    if !raw {
        eprintln!("# Found {} command(s)", set.len());
    }

    let options = ExecOptions {
        timeout_secs: config.timeout_secs,
        capture: !raw,
        inherit_stdin: cli.input.is_some() && unsafe { libc::isatty(libc::STDIN_FILENO) } != 1,
        shell: config.shell.clone(),
        extra_env: config.extra_env.clone(),
    };
    let mut reporter = Reporter::new(io::stdout(), raw, config.colors.clone(), options);

    match cli.mode() {
        Mode::Bash => println!("{}", set.to_bash_script()),
        Mode::Info => reporter.print_info(&set)?,
        Mode::Execute => {
            let mut prompts = open_prompt();
            execute_interactively(&mut reporter, &set, prompts.as_mut())?;
        }
        Mode::ExecuteAll => {
            reporter.execute_all(&set)?;
        }
        Mode::Run(specs) => {
            let variant_mode = VariantMode::from_flags(cli.run_arg_cycle, cli.run_arg_seq)?;
            run_specs(&mut reporter, &set, &specs, variant_mode)?;
        }
        Mode::DebugConfig(spec) => {
            let spec = RunSpec::parse(&spec)?;
            let cwd = env::current_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|_| ".".to_string());
            let target = launch_config(&set, &spec, &cwd)?;
            if target.matches > 1 {
                eprintln!(
                    "Warning: Found {} commands matching pattern '{}'. Using the first one.",
                    target.matches, spec.pattern
                );
            }
            println!("{}", target.config.to_json()?);
        }
    }
    Ok(0)
}

/// Defaults, then the rc file, then the environment, then flags.
fn resolve_config(cli: &Cli) -> ReplayResult<ReplayConfig> {
    let mut config = ReplayConfig::default();
    match (&cli.config, default_config_path()) {
        (Some(path), _) => load_config(path, true, &mut config)?,
        (None, Some(path)) => load_config(&path, false, &mut config)?,
        (None, None) => debug!("config event=no-home"),
    }
    for err in apply_env_overrides(&mut config, |name| env::var(name).ok()) {
        eprintln!("{err}");
    }
    if cli.raw_output {
        config.raw_output = true;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    config.colors.enabled = colors_enabled(env::var("NO_COLOR").ok());
    Ok(config)
}

fn read_input(path: Option<&Path>) -> ReplayResult<(String, String)> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|err| {
                let message = if err.kind() == io::ErrorKind::NotFound {
                    format!("File '{}' not found", path.display())
                } else {
                    format!("cannot read '{}': {err}", path.display())
                };
                ReplayError::new(ErrorKind::Input, message)
            })?;
            Ok((text, format!("file: {}", path.display())))
        }
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).map_err(|err| {
                ReplayError::new(ErrorKind::Input, format!("cannot read stdin: {err}"))
            })?;
            Ok((String::from_utf8_lossy(&buf).into_owned(), "stdin".to_string()))
        }
    }
}

fn run_specs<W: io::Write>(
    reporter: &mut Reporter<W>,
    set: &CommandSet,
    specs: &[String],
    variant_mode: Option<VariantMode>,
) -> ReplayResult<()> {
    if let Some(mode) = variant_mode {
        match expand_variants(specs, mode)? {
            Some(variants) => {
                let total = variants.len();
                reporter.line(format!(
                    "\n{} through {total} argument variants...",
                    mode.label()
                ))?;
                for (idx, variant) in variants.iter().enumerate() {
                    reporter.line(format!("\n--- Variant {}/{total} ---", idx + 1))?;
                    reporter.run_by_names(set, &RunSpec::parse_all(variant)?)?;
                }
                return Ok(());
            }
            None => {
                if !reporter.is_raw() {
                    eprintln!(
                        "Warning: {} was specified, but no [...] syntax was found in any --run argument. Proceeding with normal execution.",
                        mode.flag()
                    );
                }
            }
        }
    }
    reporter.run_by_names(set, &RunSpec::parse_all(specs)?)?;
    Ok(())
}
