//! Command building for supervised programs.

use std::process::Stdio;

use seerd_core::{ProcessSpec, SupervisorError};
use tokio::process::{Child, Command};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Line terminator appended by `send_command`.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Build the command for a spec with all three standard streams piped.
///
/// On Unix the child leads its own process group so that the whole tree
/// can be signalled at once. `kill_on_drop` guarantees a child whose handle
/// is lost does not outlive the supervisor.
pub fn build_command(spec: &ProcessSpec) -> Result<Command, SupervisorError> {
    let argv = spec.argv()?;

    let mut cmd = Command::new(&spec.executable_path);
    cmd.args(argv)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &spec.working_directory {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    Ok(cmd)
}

/// Spawn a spec, mapping OS refusals to a launch error.
pub fn spawn(spec: &ProcessSpec) -> Result<Child, SupervisorError> {
    build_command(spec)?
        .spawn()
        .map_err(|e| SupervisorError::launch(&spec.name, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_executable_is_launch_error() {
        let spec = ProcessSpec::new("ghost", "/definitely/not/a/real/binary");
        let err = spawn(&spec).unwrap_err();
        assert!(matches!(err, SupervisorError::Launch { ref name, .. } if name == "ghost"));
    }

    #[test]
    fn test_bad_argument_string_is_rejected_before_spawn() {
        let spec = ProcessSpec::new("svc", "/bin/echo").with_arguments("'unterminated");
        assert!(matches!(
            build_command(&spec),
            Err(SupervisorError::InvalidSpec(_))
        ));
    }
}
