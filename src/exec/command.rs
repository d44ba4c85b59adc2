// src/exec/command.rs

//! Production build executor: runs the manifest's command template for each
//! package through the platform shell.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::RunContext;
use crate::dag::ScheduledPackage;
use crate::exec::backend::{BuildArtifact, BuildError, BuildExecutor, BuildFuture};

/// How long stdout is still read after the build shell has exited.
const STDOUT_GRACE: Duration = Duration::from_millis(250);

/// Runs `[build]` command templates with `sh -c` (`cmd /C` on Windows).
///
/// - `{name}`, `{type}` and `{path}` are substituted in the template.
/// - `BUILDDAG_PACKAGE`, `BUILDDAG_PACKAGE_TYPE` and `BUILDDAG_PACKAGE_PATH`
///   are exported to the child.
/// - The last non-empty stdout line becomes the artifact descriptor.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl BuildExecutor for CommandExecutor {
    fn build<'a>(
        &'a self,
        package: &'a ScheduledPackage,
        context: &'a RunContext,
    ) -> BuildFuture<'a> {
        Box::pin(async move {
            run_build(package, context).await.map_err(|err| {
                let err = BuildError::from(err);
                error!(package = %package.name, error = %err, "build execution error");
                err
            })
        })
    }
}

/// Substitute package placeholders in a command template.
pub fn render_command(template: &str, package: &ScheduledPackage) -> String {
    template
        .replace("{name}", &package.name)
        .replace("{type}", package.kind.as_str())
        .replace("{path}", &package.path)
}

async fn run_build(package: &ScheduledPackage, context: &RunContext) -> Result<BuildArtifact> {
    let template = context.build.command_for(package.kind).ok_or_else(|| {
        anyhow!(
            "no build command configured for {} package '{}' (set [build].cmd or [build].{})",
            package.kind,
            package.name,
            package.kind
        )
    })?;
    let cmdline = render_command(template, package);

    info!(
        package = %package.name,
        cmd = %cmdline,
        "starting build process"
    );

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&cmdline);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&cmdline);
        c
    };

    cmd.current_dir(&context.project_root)
        .env("BUILDDAG_PACKAGE", &package.name)
        .env("BUILDDAG_PACKAGE_TYPE", package.kind.as_str())
        .env("BUILDDAG_PACKAGE_PATH", context.package_dir(&package.path))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so a timeout can take down everything the shell
    // started.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning build process for package '{}'", package.name))?;

    // Always consume stderr so buffers don't fill; log at debug.
    if let Some(stderr) = child.stderr.take() {
        let name = package.name.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(package = %name, "stderr: {}", line);
            }
        });
    }

    let (last_line_tx, last_line) = watch::channel(None::<String>);
    let stdout_task = child.stdout.take().map(|stdout| {
        let name = package.name.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(package = %name, "stdout: {}", line);
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    last_line_tx.send_replace(Some(trimmed.to_string()));
                }
            }
        })
    });

    let finished = wait_for_exit(&mut child, stdout_task, &package.name);
    let status = match context.build.timeout_secs {
        Some(secs) => {
            let waited = tokio::time::timeout(Duration::from_secs(secs), finished).await;
            match waited {
                Ok(status) => status,
                Err(_) => {
                    kill_build(&mut child, &package.name).await;
                    bail!("build of package '{}' timed out after {}s", package.name, secs);
                }
            }
        }
        None => finished.await,
    }
    .with_context(|| format!("waiting for build process of package '{}'", package.name))?;

    let descriptor = last_line.borrow().clone();

    let code = status.code().unwrap_or(-1);
    info!(
        package = %package.name,
        exit_code = code,
        success = status.success(),
        "build process exited"
    );

    if !status.success() {
        bail!(
            "build command for package '{}' exited with code {}",
            package.name,
            code
        );
    }

    Ok(BuildArtifact { descriptor })
}

/// Wait for the shell to exit, then give its stdout a short grace period.
///
/// Background processes may inherit stdout and keep it open long after the
/// shell is gone; reading stops once the grace period runs out.
async fn wait_for_exit(
    child: &mut Child,
    stdout_task: Option<JoinHandle<()>>,
    package: &str,
) -> std::io::Result<ExitStatus> {
    let status = child.wait().await?;

    if let Some(mut handle) = stdout_task {
        if tokio::time::timeout(STDOUT_GRACE, &mut handle).await.is_err() {
            debug!(package, "stdout still open after build exited; no longer reading");
            handle.abort();
        }
    }

    Ok(status)
}

/// Kill a timed-out build, including whatever it spawned.
async fn kill_build(child: &mut Child, package: &str) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        let group = format!("-{pid}");
        match Command::new("kill")
            .args(["-KILL", "--", &group])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(package, ?status, "failed to kill build process group"),
            Err(e) => warn!(package, error = %e, "failed to kill build process group"),
        }
    }

    if let Err(e) = child.kill().await {
        warn!(package, error = %e, "failed to kill timed-out build");
    }
}
