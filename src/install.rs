use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cmd::CommandRunner;
use crate::paths;

/// One step of the install sequence, in execution order.
///
/// The sequence is linear with no retries and no rollback:
/// `Stage -> Install -> Reload -> Enable -> Start`. A failure at any step
/// aborts the run and the effects of earlier steps are left as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Write the unit text to the staging path (unprivileged)
    Stage,
    /// Move the staged file into the unit directory (privileged)
    Install,
    /// `systemctl daemon-reload`
    Reload,
    /// `systemctl enable <service>`
    Enable,
    /// `systemctl start <service>`
    Start,
}

impl Step {
    pub fn describe(&self) -> &'static str {
        match self {
            Step::Stage => "staging the unit file",
            Step::Install => "installing the unit file",
            Step::Reload => "reloading the systemd daemon",
            Step::Enable => "enabling the service",
            Step::Start => "starting the service",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A failed install, carrying the step that failed and why.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed while staging the unit file at {}: {source}", .path.display())]
    Staging { path: PathBuf, source: io::Error },

    #[error("failed while {step}: {reason}")]
    Command { step: Step, reason: anyhow::Error },
}

impl InstallError {
    /// The step that failed.
    pub fn step(&self) -> Step {
        match self {
            InstallError::Staging { .. } => Step::Stage,
            InstallError::Command { step, .. } => *step,
        }
    }
}

/// Sequences the install side effects against a command runner.
pub struct Installer<'a> {
    runner: &'a dyn CommandRunner,
    staging_dir: PathBuf,
    unit_dir: PathBuf,
}

impl<'a> Installer<'a> {
    /// Installer targeting the host's real staging and unit directories.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self::with_dirs(runner, paths::STAGING_DIR, paths::UNIT_DIR)
    }

    /// Installer with substituted directories, for tests.
    pub fn with_dirs(
        runner: &'a dyn CommandRunner,
        staging_dir: impl Into<PathBuf>,
        unit_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            staging_dir: staging_dir.into(),
            unit_dir: unit_dir.into(),
        }
    }

    /// Install, enable, and start the service.
    ///
    /// Stops at the first failing step. Earlier effects are not undone: a
    /// failed enable leaves the unit file installed and the daemon reloaded.
    pub fn run(&self, service_name: &str, unit_text: &str) -> Result<(), InstallError> {
        let staged = self.stage(service_name, unit_text)?;
        self.install_unit(service_name, &staged)?;
        self.reload()?;
        self.enable(service_name)?;
        self.start(service_name)?;
        Ok(())
    }

    fn stage(&self, service_name: &str, unit_text: &str) -> Result<PathBuf, InstallError> {
        let path = self.staging_dir.join(paths::unit_file_name(service_name));

        println!("[1/5] Staging unit file at {}...", path.display());
        tracing::debug!("unit text:\n{}", unit_text);

        fs::write(&path, unit_text).map_err(|source| InstallError::Staging {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    fn install_unit(&self, service_name: &str, staged: &Path) -> Result<(), InstallError> {
        let dest = self.unit_dir.join(paths::unit_file_name(service_name));

        println!("[2/5] Installing unit file to {}...", dest.display());

        let staged = staged.to_string_lossy();
        let dest = dest.to_string_lossy();

        self.runner
            .run_privileged("mv", &[staged.as_ref(), dest.as_ref()])
            .map_err(|reason| InstallError::Command {
                step: Step::Install,
                reason,
            })
    }

    fn reload(&self) -> Result<(), InstallError> {
        println!("[3/5] Reloading systemd daemon...");

        self.runner
            .run_privileged("systemctl", &["daemon-reload"])
            .map_err(|reason| InstallError::Command {
                step: Step::Reload,
                reason,
            })
    }

    fn enable(&self, service_name: &str) -> Result<(), InstallError> {
        println!("[4/5] Enabling {} service...", service_name);

        self.runner
            .run_privileged("systemctl", &["enable", service_name])
            .map_err(|reason| InstallError::Command {
                step: Step::Enable,
                reason,
            })
    }

    fn start(&self, service_name: &str) -> Result<(), InstallError> {
        println!("[5/5] Starting {} service...", service_name);

        self.runner
            .run_privileged("systemctl", &["start", service_name])
            .map_err(|reason| InstallError::Command {
                step: Step::Start,
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::cell::RefCell;

    /// Records every call; fails calls whose rendered form matches `fail_on`,
    /// and performs `mv` against the real filesystem so tests can observe the
    /// installed unit content.
    struct FakeRunner {
        calls: RefCell<Vec<String>>,
        fail_on: Option<String>,
        perform_mv: bool,
    }

    impl FakeRunner {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_on: None,
                perform_mv: false,
            }
        }

        fn failing_on(fail_on: &str) -> Self {
            Self {
                fail_on: Some(fail_on.to_string()),
                ..Self::new()
            }
        }

        fn with_real_mv() -> Self {
            Self {
                perform_mv: true,
                ..Self::new()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run_privileged(&self, program: &str, args: &[&str]) -> Result<()> {
            let rendered = format!("{} {}", program, args.join(" "));
            self.calls.borrow_mut().push(rendered.clone());

            if let Some(fail_on) = &self.fail_on {
                if rendered.starts_with(fail_on.as_str()) {
                    anyhow::bail!("{} failed with exit code Some(1)", program);
                }
            }

            if self.perform_mv && program == "mv" {
                std::fs::rename(args[0], args[1])?;
            }

            Ok(())
        }

        fn run_unprivileged(&self, program: &str, args: &[&str]) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("{} {}", program, args.join(" ")));
            Ok(())
        }
    }

    fn unit_text() -> String {
        crate::unit::build_unit("/home/ctf-pi/server", "ctf-pi", "/home/ctf-pi")
    }

    #[test]
    fn full_run_invokes_steps_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join("staging");
        let units = tmp.path().join("units");
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::create_dir_all(&units).unwrap();

        let runner = FakeRunner::new();
        let installer = Installer::with_dirs(&runner, &staging, &units);
        installer.run("myserver", &unit_text()).unwrap();

        let staged = staging.join("myserver.service").display().to_string();
        let dest = units.join("myserver.service").display().to_string();
        assert_eq!(
            runner.calls(),
            vec![
                format!("mv {} {}", staged, dest),
                "systemctl daemon-reload".to_string(),
                "systemctl enable myserver".to_string(),
                "systemctl start myserver".to_string(),
            ]
        );
    }

    #[test]
    fn staging_failure_attempts_no_commands() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");
        let units = tmp.path().join("units");
        std::fs::create_dir_all(&units).unwrap();

        let runner = FakeRunner::new();
        let installer = Installer::with_dirs(&runner, &missing, &units);
        let err = installer.run("myserver", &unit_text()).unwrap_err();

        assert_eq!(err.step(), Step::Stage);
        assert!(runner.calls().is_empty());
        assert!(err.to_string().contains("staging the unit file"));
    }

    #[test]
    fn enable_failure_stops_before_start() {
        let tmp = tempfile::tempdir().unwrap();

        let runner = FakeRunner::failing_on("systemctl enable");
        let installer = Installer::with_dirs(&runner, tmp.path(), tmp.path().join("units"));
        std::fs::create_dir_all(tmp.path().join("units")).unwrap();

        let err = installer.run("myserver", &unit_text()).unwrap_err();

        assert_eq!(err.step(), Step::Enable);
        assert!(err.to_string().contains("enabling the service"));
        let calls = runner.calls();
        assert_eq!(calls.last().unwrap(), "systemctl enable myserver");
        assert!(!calls.iter().any(|c| c.starts_with("systemctl start")));
    }

    #[test]
    fn move_failure_stops_before_reload() {
        let tmp = tempfile::tempdir().unwrap();

        let runner = FakeRunner::failing_on("mv");
        let installer = Installer::with_dirs(&runner, tmp.path(), tmp.path().join("units"));

        let err = installer.run("myserver", &unit_text()).unwrap_err();

        assert_eq!(err.step(), Step::Install);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn reinstall_leaves_identical_unit_content() {
        let tmp = tempfile::tempdir().unwrap();
        let units = tmp.path().join("units");
        std::fs::create_dir_all(&units).unwrap();

        let runner = FakeRunner::with_real_mv();
        let installer = Installer::with_dirs(&runner, tmp.path(), &units);

        installer.run("myserver", &unit_text()).unwrap();
        let first = std::fs::read_to_string(units.join("myserver.service")).unwrap();

        installer.run("myserver", &unit_text()).unwrap();
        let second = std::fs::read_to_string(units.join("myserver.service")).unwrap();

        assert_eq!(first, second);
        assert!(first.contains("ExecStart=/home/ctf-pi/server\n"));
    }

    #[test]
    fn failed_run_leaves_staged_file_behind() {
        let tmp = tempfile::tempdir().unwrap();

        let runner = FakeRunner::failing_on("mv");
        let installer = Installer::with_dirs(&runner, tmp.path(), tmp.path().join("units"));
        installer.run("myserver", &unit_text()).unwrap_err();

        // No cleanup on failure: the staged copy is still there.
        assert!(tmp.path().join("myserver.service").exists());
    }
}
