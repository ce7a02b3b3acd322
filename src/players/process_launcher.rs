use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use log::{debug, warn};

/// Starts external programs on behalf of a player
pub trait ProcessLauncher: Send + Sync {
    /// Start `program` with `args` without waiting for it to finish
    fn launch(&self, program: &Path, args: &[String]) -> io::Result<()>;
}

/// Launcher that spawns real operating system processes.
///
/// The child is not waited for by the caller; a detached reaper thread collects its exit
/// status so no zombie processes are left behind.
#[derive(Debug, Default, Clone)]
pub struct SystemLauncher;

impl SystemLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> io::Result<()> {
        debug!("Launching {} {:?}", program.display(), args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let description = format!("{} {}", program.display(), args.join(" "));
        thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                warn!("'{}' exited with {}", description, status);
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to wait for '{}': {}", description, e),
        });

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_launch_missing_program_fails() {
        let launcher = SystemLauncher::new();
        let result = launcher.launch(Path::new("/nonexistent/rmc-test-player"), &["--play".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_launch_existing_program() {
        let launcher = SystemLauncher::new();
        assert!(launcher.launch(Path::new("/bin/sh"), &["-c".to_string(), "exit 0".to_string()]).is_ok());
    }
}
