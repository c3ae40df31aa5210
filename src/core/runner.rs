use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use super::InstallError;
use crate::config::{Config, InstallConfig};

/// How an install invocation ended, short of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Completed,
    /// The confirmation gate said no; nothing was spawned
    Declined,
    /// Empty target path (the "no device selected" sentinel); nothing ran
    SkippedEmptyTarget,
    Cancelled,
}

/// Events pushed from a running install back to the shell
#[derive(Debug)]
pub enum InstallEvent {
    Line(String),
    Progress(u64),
    Finished(Result<InstallOutcome, InstallError>),
}

/// Argument list for the install command: the optional extra token first,
/// then the target device path
pub fn build_install_args(install: &InstallConfig, target: &str) -> Vec<String> {
    if install.extra_arg.is_empty() {
        vec![target.to_string()]
    } else {
        vec![install.extra_arg.clone(), target.to_string()]
    }
}

/// Run the configured install command against `target`, relaying its merged
/// stdout/stderr line-by-line into `output` and advancing `progress` by the
/// configured increment per line (saturating at the configured maximum, and
/// forced to exactly that maximum when the stream ends cleanly).
///
/// `confirm` is the shell's synchronous yes/no gate; declining emits a single
/// cancellation line and spawns nothing. Setting `cancel` kills the child and
/// stops the relay. Spawn and stream failures are returned to the caller and
/// mirrored into `output` with an `[error]` prefix so they land in the same
/// pane as script output.
///
/// Blocking; the shell runs this on a background task.
pub fn run_install<C, O, P>(
    cfg: &Config,
    target: &str,
    confirm: C,
    output: O,
    progress: P,
    cancel: &AtomicBool,
) -> Result<InstallOutcome, InstallError>
where
    C: FnOnce(&str, &str) -> bool,
    O: Fn(&str) + Send + Sync,
    P: Fn(u64) + Send + Sync,
{
    if target.is_empty() {
        log::debug!("install requested without a target device, ignoring");
        return Ok(InstallOutcome::SkippedEmptyTarget);
    }

    if !confirm(&cfg.install.confirm_message, target) {
        output("Installation cancelled.");
        return Ok(InstallOutcome::Declined);
    }

    let args = build_install_args(&cfg.install, target);
    log::info!(
        "running {} {:?} in {}",
        cfg.install.command,
        args,
        cfg.install.working_dir
    );

    let mut child = Command::new(&cfg.install.command)
        .args(&args)
        .current_dir(&cfg.install.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            let err = InstallError::Spawn {
                command: cfg.install.command.clone(),
                source,
            };
            output(&format!("[error] {err}"));
            err
        })?;

    progress(0);
    let max = cfg.progress.max;
    let increment = cfg.progress.increment;
    let value = AtomicU64::new(0);
    let advance = || {
        if let Ok(prev) = value.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
            Some(v.saturating_add(increment).min(max))
        }) {
            progress(prev.saturating_add(increment).min(max));
        }
    };

    let stdout = child.stdout.take().expect("child stdout is piped");
    let stderr = child.stderr.take().expect("child stderr is piped");
    let read_error: Mutex<Option<std::io::Error>> = Mutex::new(None);
    let mut cancelled = false;

    // std cannot hand both streams one pipe, so the merged relay is two
    // reader threads feeding the same sinks.
    let out_ref = &output;
    let advance_ref = &advance;
    let err_ref = &read_error;
    std::thread::scope(|s| {
        s.spawn(move || relay_lines(stdout, out_ref, advance_ref, err_ref));
        s.spawn(move || relay_lines(stderr, out_ref, advance_ref, err_ref));

        // Watchdog: waits for exit, kills the child on cancellation.
        loop {
            if cancel.load(Ordering::SeqCst) {
                let _ = child.kill();
                cancelled = true;
                break;
            }
            match child.try_wait() {
                Ok(Some(_)) | Err(_) => break,
                Ok(None) => std::thread::sleep(Duration::from_millis(50)),
            }
        }
    });

    let status = child.wait()?;

    if cancelled {
        log::info!("install of {target} cancelled, child killed");
        output("[cancelled] installation aborted");
        return Ok(InstallOutcome::Cancelled);
    }

    let read_error = read_error
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(source) = read_error {
        let err = InstallError::Stream(source);
        output(&format!("[error] {err}"));
        return Err(err);
    }

    // Exit status is reaped but never interpreted; success is the end of the
    // output stream.
    log::debug!("install script exited with {status}");
    progress(max);
    Ok(InstallOutcome::Completed)
}

fn relay_lines<R, O, A>(stream: R, output: O, advance: A, read_error: &Mutex<Option<std::io::Error>>)
where
    R: Read,
    O: Fn(&str),
    A: Fn(),
{
    for line in BufReader::new(stream).lines() {
        match line {
            Ok(line) => {
                output(&line);
                advance();
            }
            Err(e) => {
                let mut slot = read_error.lock().unwrap_or_else(PoisonError::into_inner);
                slot.get_or_insert(e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `sh -c <target>` lets a test pass its script as the target argument
    fn sh_config() -> Config {
        let mut cfg = Config::default();
        cfg.install.command = "sh".to_string();
        cfg.install.extra_arg = "-c".to_string();
        cfg
    }

    struct Recorded {
        lines: Mutex<Vec<String>>,
        ticks: Mutex<Vec<u64>>,
    }

    impl Recorded {
        fn new() -> Self {
            Self {
                lines: Mutex::new(Vec::new()),
                ticks: Mutex::new(Vec::new()),
            }
        }

        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }

        fn ticks(&self) -> Vec<u64> {
            self.ticks.lock().unwrap().clone()
        }
    }

    fn run(
        cfg: &Config,
        target: &str,
        confirmed: bool,
        rec: &Recorded,
    ) -> Result<InstallOutcome, InstallError> {
        let cancel = AtomicBool::new(false);
        run_install(
            cfg,
            target,
            |_, _| confirmed,
            |l| rec.lines.lock().unwrap().push(l.to_string()),
            |v| rec.ticks.lock().unwrap().push(v),
            &cancel,
        )
    }

    #[test]
    fn args_include_extra_token_first() {
        let mut install = InstallConfig::default();
        install.extra_arg = "--foo".to_string();
        assert_eq!(build_install_args(&install, "/dev/sdb"), ["--foo", "/dev/sdb"]);
    }

    #[test]
    fn args_without_extra_token() {
        let install = InstallConfig::default();
        assert_eq!(build_install_args(&install, "/dev/sdb"), ["/dev/sdb"]);
    }

    #[test]
    fn empty_target_is_a_no_op() {
        let rec = Recorded::new();
        let outcome = run(&sh_config(), "", true, &rec).unwrap();

        assert_eq!(outcome, InstallOutcome::SkippedEmptyTarget);
        assert!(rec.lines().is_empty());
        assert!(rec.ticks().is_empty());
    }

    #[test]
    fn declining_emits_one_line_and_spawns_nothing() {
        let mut cfg = Config::default();
        // a spawn attempt would turn the outcome into an error
        cfg.install.command = "/definitely/not/a/real/command".to_string();

        let rec = Recorded::new();
        let outcome = run(&cfg, "/dev/sdb", false, &rec).unwrap();

        assert_eq!(outcome, InstallOutcome::Declined);
        assert_eq!(rec.lines(), ["Installation cancelled."]);
        assert!(rec.ticks().is_empty());
    }

    #[test]
    fn relays_both_streams_and_snaps_progress_to_max() {
        let rec = Recorded::new();
        let outcome = run(&sh_config(), "echo one; echo two >&2", true, &rec).unwrap();

        assert_eq!(outcome, InstallOutcome::Completed);
        let mut lines = rec.lines();
        lines.sort();
        assert_eq!(lines, ["one", "two"]);

        let ticks = rec.ticks();
        assert_eq!(ticks.first(), Some(&0));
        assert_eq!(ticks.last(), Some(&100));
    }

    #[test]
    fn progress_reaches_max_even_without_output() {
        let rec = Recorded::new();
        let outcome = run(&sh_config(), "true", true, &rec).unwrap();

        assert_eq!(outcome, InstallOutcome::Completed);
        assert!(rec.lines().is_empty());
        assert_eq!(rec.ticks(), [0, 100]);
    }

    #[test]
    fn progress_saturates_at_max_during_relay() {
        let mut cfg = sh_config();
        cfg.progress.max = 3;
        cfg.progress.increment = 2;

        let rec = Recorded::new();
        run(&cfg, "echo a; echo b; echo c", true, &rec).unwrap();

        assert!(rec.ticks().iter().all(|&v| v <= 3));
        assert_eq!(rec.ticks().last(), Some(&3));
    }

    #[test]
    fn runs_in_the_configured_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = sh_config();
        cfg.install.working_dir = dir.path().to_string_lossy().into_owned();

        let rec = Recorded::new();
        run(&cfg, "pwd", true, &rec).unwrap();

        let lines = rec.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            std::fs::canonicalize(&lines[0]).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn spawn_failure_is_reported_and_mirrored_to_the_sink() {
        let mut cfg = Config::default();
        cfg.install.command = "/definitely/not/a/real/command".to_string();

        let rec = Recorded::new();
        let result = run(&cfg, "/dev/sdb", true, &rec);

        assert!(matches!(result, Err(InstallError::Spawn { .. })));
        let lines = rec.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[error]"));
    }

    #[test]
    fn cancellation_kills_the_child() {
        let cfg = sh_config();
        let rec = Recorded::new();
        let cancel = AtomicBool::new(true);

        let outcome = run_install(
            &cfg,
            "sleep 30",
            |_, _| true,
            |l| rec.lines.lock().unwrap().push(l.to_string()),
            |v| rec.ticks.lock().unwrap().push(v),
            &cancel,
        )
        .unwrap();

        assert_eq!(outcome, InstallOutcome::Cancelled);
        assert!(rec.lines().iter().any(|l| l.starts_with("[cancelled]")));
    }
}
