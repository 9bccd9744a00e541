use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::process::Command;

const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

pub fn run<I, S>(program: &str, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().collect();
    let args_str: Vec<_> = args.iter().map(|s| s.as_ref().to_string_lossy()).collect();

    println!("{}> {} {}{}", CYAN, program, args_str.join(" "), RESET);

    let status = Command::new(program)
        .args(&args)
        .status()
        .with_context(|| format!("Failed to run {}", program))?;

    if !status.success() {
        anyhow::bail!("{} failed with exit code {:?}", program, status.code());
    }

    Ok(())
}

/// External-command port for the install steps.
///
/// The orchestrator only ever sees "succeeds or reports failure"; how a
/// privileged call acquires its privilege is this trait's concern. Tests
/// substitute a recording fake.
pub trait CommandRunner {
    /// Run a command that needs elevated rights
    fn run_privileged(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Run a command with the invoking user's rights
    fn run_unprivileged(&self, program: &str, args: &[&str]) -> Result<()>;
}

/// Runs commands on the host, escalating through sudo per call.
///
/// When the tool is already running as root the sudo wrapper is skipped and
/// privileged calls run directly.
pub struct HostRunner {
    use_sudo: bool,
}

impl HostRunner {
    pub fn new() -> Self {
        Self {
            use_sudo: !nix::unistd::Uid::effective().is_root(),
        }
    }
}

impl Default for HostRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for HostRunner {
    fn run_privileged(&self, program: &str, args: &[&str]) -> Result<()> {
        if self.use_sudo {
            let mut sudo_args = vec![program];
            sudo_args.extend_from_slice(args);
            run("sudo", sudo_args)
        } else {
            run(program, args)
        }
    }

    fn run_unprivileged(&self, program: &str, args: &[&str]) -> Result<()> {
        run(program, args)
    }
}
