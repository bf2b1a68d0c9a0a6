use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use jtr_replay::CommandSpec;
use log::debug;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;

use crate::config::{DEFAULT_SHELL, DEFAULT_TIMEOUT_SECS};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone, Debug)]
pub struct ExecOptions {
    pub timeout_secs: u64,
    pub capture: bool,
    /// Let captured commands read our stdin. Off for a terminal: a command in its own
    /// process group would stop on the first read.
    pub inherit_stdin: bool,
    pub shell: String,
    pub extra_env: BTreeMap<String, String>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            capture: true,
            inherit_stdin: false,
            shell: DEFAULT_SHELL.to_string(),
            extra_env: BTreeMap::new(),
        }
    }
}

/// Outcome of one command. `status` is `-1` when the command never finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecResult {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    fn failed(message: String) -> Self {
        Self {
            status: -1,
            stdout: String::new(),
            stderr: message,
        }
    }
}

enum Finished {
    Exited(ExitStatus),
    TimedOut,
}

/// Run `<shell> -c <command>` with the command's env and directory.
pub fn execute(spec: &CommandSpec, options: &ExecOptions) -> ExecResult {
    match run(spec, options) {
        Ok(result) => result,
        Err(err) => {
            debug!("exec event=failed section={} err={err}", spec.section);
            ExecResult::failed(format!("Command execution failed: {err}"))
        }
    }
}

fn run(spec: &CommandSpec, options: &ExecOptions) -> io::Result<ExecResult> {
    let mut command = Command::new(&options.shell);
    command
        .arg("-c")
        .arg(&spec.command)
        .envs(&spec.env)
        .envs(&options.extra_env);
    if let Some(dir) = spec.directory.as_deref() {
        if !Path::new(dir).is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{dir}: no such directory"),
            ));
        }
        command.current_dir(dir);
    }
    if options.capture {
        // Own group so a timeout can take down the whole pipeline the shell started.
        let stdin = if options.inherit_stdin {
            Stdio::inherit()
        } else {
            Stdio::null()
        };
        command
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);
    }

    let mut child = command
        .spawn()
        .map_err(|err| wrap_spawn_error(&options.shell, err))?;
    debug!(
        "exec event=spawn section={} pid={} capture={}",
        spec.section,
        child.id(),
        options.capture
    );

    let stdout = child.stdout.take().map(collect);
    let stderr = child.stderr.take().map(collect);

    let finished = wait_with_deadline(&mut child, options)?;
    let stdout = join(stdout);
    let stderr = join(stderr);

    match finished {
        Finished::Exited(status) => {
            let status = exit_status_code(status);
            debug!("exec event=exit section={} status={status}", spec.section);
            Ok(ExecResult {
                status,
                stdout,
                stderr,
            })
        }
        Finished::TimedOut => {
            debug!(
                "exec event=timeout section={} secs={}",
                spec.section, options.timeout_secs
            );
            Ok(ExecResult::failed(format!(
                "Command timed out after {} seconds",
                options.timeout_secs
            )))
        }
    }
}

fn wait_with_deadline(child: &mut Child, options: &ExecOptions) -> io::Result<Finished> {
    let deadline = Instant::now() + Duration::from_secs(options.timeout_secs);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Finished::Exited(status));
        }
        if Instant::now() >= deadline {
            let pid = Pid::from_raw(child.id() as i32);
            let sent = if options.capture {
                killpg(pid, Signal::SIGKILL)
            } else {
                kill(pid, Signal::SIGKILL)
            };
            if let Err(err) = sent {
                debug!("exec event=kill-failed pid={pid} err={err}");
            }
            child.wait()?;
            return Ok(Finished::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn collect<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stream.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

pub fn wrap_spawn_error(cmd: &str, err: io::Error) -> io::Error {
    let (message, kind) = spawn_error_message(cmd, &err);
    io::Error::new(kind, message)
}

pub fn exit_status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        code
    } else if let Some(sig) = status.signal() {
        128 + sig
    } else {
        1
    }
}

fn spawn_error_message(cmd: &str, err: &io::Error) -> (String, io::ErrorKind) {
    match err.kind() {
        io::ErrorKind::NotFound => (format!("{cmd}: command not found"), io::ErrorKind::NotFound),
        io::ErrorKind::PermissionDenied => (
            format!("{cmd}: permission denied"),
            io::ErrorKind::PermissionDenied,
        ),
        _ => {
            if cmd.contains('/') {
                if let Ok(meta) = fs::metadata(cmd) {
                    if meta.is_dir() {
                        return (
                            format!("{cmd}: is a directory"),
                            io::ErrorKind::PermissionDenied,
                        );
                    }
                }
            }
            (format!("{cmd}: {err}"), err.kind())
        }
    }
}
