use std::fmt;
use std::io::Write;

use jtr_replay::{CommandSet, CommandSpec, ErrorKind, ReplayError, ReplayResult};
use log::debug;

use crate::colors::ColorConfig;
use crate::execution::{execute, ExecOptions, ExecResult};
use crate::run_spec::RunSpec;

/// Writes every informational line unless `raw` is set; in raw mode executed
/// commands inherit the terminal instead of being captured.
pub struct Reporter<W: Write> {
    out: W,
    raw: bool,
    colors: ColorConfig,
    options: ExecOptions,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, raw: bool, colors: ColorConfig, options: ExecOptions) -> Self {
        Self {
            out,
            raw,
            colors,
            options,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn colors(&self) -> &ColorConfig {
        &self.colors
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub(crate) fn line(&mut self, text: impl fmt::Display) -> ReplayResult<()> {
        if self.raw {
            return Ok(());
        }
        writeln!(self.out, "{text}").map_err(|err| {
            ReplayError::new(ErrorKind::Execution, format!("cannot write report: {err}"))
        })
    }

    pub(crate) fn heading(&mut self, title: &str) -> ReplayResult<()> {
        let text = self.colors.heading(&format!("=== {title} ==="));
        self.line(format!("\n{text}"))
    }

    /// Run one command: captured normally, straight to the terminal in raw mode.
    pub(crate) fn run(&self, cmd: &CommandSpec, capture: bool) -> ExecResult {
        let options = ExecOptions {
            capture,
            ..self.options.clone()
        };
        execute(cmd, &options)
    }

    fn outcome(&mut self, result: &ExecResult) -> ReplayResult<()> {
        if result.success() {
            let text = self.colors.success("✓ Success");
            self.line(format!("   {text}"))
        } else {
            let text = self
                .colors
                .failure(&format!("✗ Failed (return code: {})", result.status));
            self.line(format!("   {text}"))?;
            if !result.stderr.is_empty() {
                self.line(format!("   Error: {}", result.stderr))?;
            }
            Ok(())
        }
    }

    pub fn print_info(&mut self, set: &CommandSet) -> ReplayResult<()> {
        self.heading("Parsed Commands")?;
        for (idx, cmd) in set.iter().enumerate() {
            self.line(format!("\n{}. {cmd}", idx + 1))?;
            self.line(format!("   Bash: {}", cmd.to_bash_string()))?;
        }

        self.heading("Summary")?;
        self.line(format!("Total commands: {}", set.len()))?;
        self.line(format!("Sections: {}", list(set.sections())))?;
        self.line(format!("Command names: {}", list(set.command_names())))?;

        self.heading("Usage")?;
        self.line("  --bash                      print the commands as a bash script")?;
        self.line("  --execute                   step through the commands interactively")?;
        self.line("  --execute-all               run every command in order")?;
        self.line("  --run \"<pattern> [args]\"    run commands whose name matches a glob")?;
        self.line("  --print-debug-cfg <pattern> print an lldb launch configuration")
    }

    pub fn execute_all(&mut self, set: &CommandSet) -> ReplayResult<Vec<ExecResult>> {
        self.heading("Executing All Commands")?;
        let mut results = Vec::with_capacity(set.len());
        for (idx, cmd) in set.iter().enumerate() {
            self.line(format!("\n{}. Executing section: {}", idx + 1, cmd.section))?;
            self.line(format!("   Command: {}", cmd.to_bash_string()))?;
            let result = self.run(cmd, !self.raw);
            self.outcome(&result)?;
            results.push(result);
        }

        let pairs: Vec<_> = set.iter().zip(results.iter()).collect();
        self.heading("Execution Summary")?;
        self.summary("Total commands", &pairs)?;
        let failed: Vec<_> = pairs.iter().filter(|(_, r)| !r.success()).collect();
        if !failed.is_empty() {
            self.line("\nFailed commands:")?;
            for (cmd, result) in failed {
                let preview: String = cmd.command.chars().take(50).collect();
                self.line(format!(
                    "- {}: {preview}... (code: {})",
                    cmd.section, result.status
                ))?;
            }
        }
        Ok(results)
    }

    /// Resolve each run spec against `set`, then run the matches in spec order.
    pub fn run_by_names(
        &mut self,
        set: &CommandSet,
        specs: &[RunSpec],
    ) -> ReplayResult<Vec<ExecResult>> {
        if specs.is_empty() {
            return Err(ReplayError::new(
                ErrorKind::Selection,
                "No command names specified for --run option",
            ));
        }

        self.heading("Executing Commands by Names")?;
        let requested: Vec<String> = specs.iter().map(ToString::to_string).collect();
        self.line(format!("Requested commands: {}", requested.join(", ")))?;

        let mut selected = Vec::new();
        for spec in specs {
            let matches = set.by_name(&spec.pattern);
            debug!(
                "select event=run-spec pattern={} matches={}",
                spec.pattern,
                matches.len()
            );
            if matches.is_empty() {
                self.line(format!(
                    "Warning: No commands found matching pattern '{}'",
                    spec.pattern
                ))?;
                continue;
            }
            self.line(format!(
                "Pattern '{}' matched {} command(s):",
                spec.pattern,
                matches.len()
            ))?;
            if !spec.extra_args.is_empty() {
                self.line(format!("   ... with extra args: '{}'", spec.extra_args))?;
            }
            for cmd in matches {
                self.line(format!("   - {} ({})", cmd.command_name(), cmd.section))?;
                selected.push(cmd.with_extra_args(&spec.extra_args)?);
            }
        }

        if selected.is_empty() {
            return Err(ReplayError::new(
                ErrorKind::Selection,
                "No commands to execute",
            ));
        }

        self.line(format!(
            "\nExecuting {} command(s) in order...",
            selected.len()
        ))?;
        let mut results = Vec::with_capacity(selected.len());
        for (idx, cmd) in selected.iter().enumerate() {
            self.line(format!(
                "\n{}. Executing: {} (section: {})",
                idx + 1,
                cmd.command_name(),
                cmd.section
            ))?;
            self.line(format!("   Command: {}", cmd.to_bash_string()))?;
            let result = self.run(cmd, !self.raw);
            self.outcome(&result)?;
            results.push(result);
        }

        let pairs: Vec<_> = selected.iter().zip(results.iter()).collect();
        self.heading("Execution Summary")?;
        self.summary("Total executed", &pairs)?;
        let failed: Vec<_> = pairs.iter().filter(|(_, r)| !r.success()).collect();
        if !failed.is_empty() {
            self.line("\nFailed commands:")?;
            for (cmd, result) in failed {
                self.line(format!(
                    "- {} ({}): code {}",
                    cmd.command_name(),
                    cmd.section,
                    result.status
                ))?;
            }
        }
        Ok(results)
    }

    fn summary(&mut self, label: &str, pairs: &[(&CommandSpec, &ExecResult)]) -> ReplayResult<()> {
        let successful = pairs.iter().filter(|(_, r)| r.success()).count();
        self.line(format!("{label}: {}", pairs.len()))?;
        self.line(format!("Successful: {successful}"))?;
        self.line(format!("Failed: {}", pairs.len() - successful))
    }
}

fn list<S: AsRef<str>>(items: Vec<S>) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("'{}'", item.as_ref()))
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter(raw: bool) -> Reporter<Vec<u8>> {
        Reporter::new(Vec::new(), raw, ColorConfig::default(), ExecOptions::default())
    }

    fn text(reporter: Reporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    fn sample() -> CommandSet {
        CommandSet::new(vec![
            CommandSpec::new("build", "true"),
            CommandSpec::new("check", "false"),
            CommandSpec::new("check", "exit 4"),
        ])
    }

    #[test]
    fn info_lists_commands_and_summary() {
        let mut rep = reporter(false);
        let set = CommandSet::new(vec![CommandSpec::new("s", "/bin/tool -x").with_directory("/w")]);
        rep.print_info(&set).unwrap();
        let out = text(rep);
        assert!(out.contains("=== Parsed Commands ==="));
        assert!(out.contains(
            "1. Command(name='tool', section='s', cmd='/bin/tool -x...', env_vars=0, dir='/w')"
        ));
        assert!(out.contains("   Bash: cd /w && /bin/tool -x"));
        assert!(out.contains("Total commands: 1"));
        assert!(out.contains("Sections: ['s']"));
        assert!(out.contains("Command names: ['tool']"));
    }

    #[test]
    fn execute_all_reports_each_outcome() {
        let mut rep = reporter(false);
        let results = rep.execute_all(&sample()).unwrap();
        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![0, 1, 4]);
        let out = text(rep);
        assert!(out.contains("1. Executing section: build"));
        assert!(out.contains("   ✓ Success"));
        assert!(out.contains("   ✗ Failed (return code: 4)"));
        assert!(out.contains("Successful: 1"));
        assert!(out.contains("Failed: 2"));
        assert!(out.contains("- check: exit 4... (code: 4)"));
    }

    #[test]
    fn raw_mode_is_silent() {
        let mut rep = reporter(true);
        let set = CommandSet::new(vec![CommandSpec::new("build", "true")]);
        rep.print_info(&set).unwrap();
        let results = rep.execute_all(&set).unwrap();
        assert_eq!(results[0].status, 0);
        assert!(text(rep).is_empty());
    }

    #[test]
    fn run_by_names_injects_args_in_spec_order() {
        let set = CommandSet::new(vec![
            CommandSpec::new("a", "sh -c \"true\""),
            CommandSpec::new("b", "test"),
        ]);
        let specs = vec![
            RunSpec::parse("test 1 -eq 2").unwrap(),
            RunSpec::parse("tru?").unwrap(),
        ];
        let mut rep = reporter(false);
        let results = rep.run_by_names(&set, &specs).unwrap();
        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![1, 0]);
        let out = text(rep);
        assert!(out.contains("Requested commands: \"test 1 -eq 2\", tru?"));
        assert!(out.contains("   ... with extra args: '1 -eq 2'"));
        assert!(out.contains("1. Executing: test (section: b)"));
        assert!(out.contains("   Command: test 1 -eq 2"));
        assert!(out.contains("- test (b): code 1"));
    }

    #[test]
    fn run_by_names_errors() {
        let mut rep = reporter(false);
        let err = rep.run_by_names(&sample(), &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Selection);

        let specs = vec![RunSpec::parse("nothing*").unwrap()];
        let err = rep.run_by_names(&sample(), &specs).unwrap_err();
        assert_eq!(err.message, "No commands to execute");
        assert!(text(rep).contains("Warning: No commands found matching pattern 'nothing*'"));
    }

    #[test]
    fn list_format() {
        assert_eq!(list(vec!["a", "b"]), "['a', 'b']");
        assert_eq!(list(Vec::<String>::new()), "[]");
    }
}
