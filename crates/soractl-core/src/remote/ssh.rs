//! SSH driver for the device update sequence.
//!
//! Runs a remote `sh` over ssh and feeds it the update commands line by
//! line. Completion is detected with explicit marker lines echoed after
//! each step rather than by watching for shell prompts, since the session
//! runs over pipes without a pty. The update script reboots the device on
//! success, so a dropped connection during the update step is classified
//! as a likely reboot, not a failure.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::remote::expect::{ExpectEvent, LineSession};
use crate::remote::{RemoteCommandDriver, ScriptOutcome};
use crate::session::ConnectionInfo;

const PREP_MARKER: &str = "__SORACTL_PREP_OK__";
const UPDATE_MARKER: &str = "__SORACTL_UPDATE_OK__";

/// Output lines consistent with the device rebooting mid-update.
const REBOOT_PATTERNS: [&str; 6] = [
    "connection closed",
    "broken pipe",
    "reset by peer",
    "reboot",
    "shutdown",
    "system is rebooting",
];

/// The command sequence an update run executes on the device.
#[derive(Debug, Clone)]
pub struct UpdateScript {
    /// Commands run before the updater, each awaited individually.
    pub prepare_commands: Vec<String>,
    /// The updater itself. Expected to either print completion output or
    /// reboot the device.
    pub update_command: String,
    /// Deadline per preparation command.
    pub prepare_timeout: Duration,
    /// Deadline for the update command.
    pub update_timeout: Duration,
}

impl Default for UpdateScript {
    fn default() -> Self {
        Self {
            prepare_commands: vec![
                "rm -rf full_panel_upgrade".to_owned(),
                "git clone https://github.com/Vapor-Systems/full_panel_upgrade".to_owned(),
            ],
            update_command: "cd full_panel_upgrade && python3 updater.py".to_owned(),
            prepare_timeout: Duration::from_secs(300),
            update_timeout: Duration::from_secs(300),
        }
    }
}

/// [`RemoteCommandDriver`] that runs the update script over SSH.
pub struct SshUpdateDriver {
    username: String,
    password: Option<SecretString>,
    script: UpdateScript,
}

impl SshUpdateDriver {
    pub fn new(username: impl Into<String>, password: Option<SecretString>) -> Self {
        Self {
            username: username.into(),
            password,
            script: UpdateScript::default(),
        }
    }

    #[must_use]
    pub fn with_script(mut self, script: UpdateScript) -> Self {
        self.script = script;
        self
    }

    /// Shell command that opens a remote `sh` reading from stdin.
    fn ssh_command(&self, conn: &ConnectionInfo) -> String {
        let ssh = format!(
            "ssh -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null \
             -o ConnectTimeout=15 -p {} {}@{} sh",
            conn.port, self.username, conn.hostname
        );
        match &self.password {
            Some(password) => format!(
                "sshpass -p {} {ssh}",
                shell_quote(password.expose_secret())
            ),
            None => ssh,
        }
    }

    /// Drive the script over an already-spawned session.
    ///
    /// Separated from the ssh spawn so the protocol can be exercised
    /// against a local shell in tests.
    pub async fn run_script(&self, session: &mut LineSession) -> ScriptOutcome {
        // Preparation: each step is awaited via its own marker. `fatal:`
        // catches git clone failures before the updater ever starts.
        for command in &self.script.prepare_commands {
            debug!(command, "running preparation step");
            if let Err(e) = send_step(session, command, PREP_MARKER).await {
                return ScriptOutcome::Failed(format!("failed to send command: {e}"));
            }
            match session
                .expect_any(&[PREP_MARKER, "fatal:"], self.script.prepare_timeout)
                .await
            {
                Ok(ExpectEvent::Matched { pattern, line }) => {
                    if pattern != PREP_MARKER {
                        return ScriptOutcome::Failed(format!(
                            "preparation step '{command}' failed: {line}"
                        ));
                    }
                }
                Ok(ExpectEvent::Eof) => {
                    return ScriptOutcome::Failed(format!(
                        "connection closed during preparation step '{command}'"
                    ));
                }
                Ok(ExpectEvent::TimedOut) => return ScriptOutcome::TimedOut,
                Err(e) => return ScriptOutcome::Failed(e.to_string()),
            }
        }

        // The update itself. A clean marker means the updater returned
        // without rebooting; EOF or a reboot-shaped line means the device
        // went down mid-run, which is the expected success path.
        debug!(command = self.script.update_command, "running updater");
        if let Err(e) = send_step(session, &self.script.update_command, UPDATE_MARKER).await {
            return ScriptOutcome::Failed(format!("failed to send command: {e}"));
        }

        let mut patterns: Vec<&str> = vec![UPDATE_MARKER];
        patterns.extend(REBOOT_PATTERNS);

        match session
            .expect_any(&patterns, self.script.update_timeout)
            .await
        {
            Ok(ExpectEvent::Matched { pattern, line }) => {
                if pattern == UPDATE_MARKER {
                    info!("updater reported completion");
                    ScriptOutcome::Completed
                } else {
                    info!(line, "connection dropped in a reboot-consistent way");
                    ScriptOutcome::RebootDetected
                }
            }
            Ok(ExpectEvent::Eof) => {
                info!("output closed during update; treating as device reboot");
                ScriptOutcome::RebootDetected
            }
            Ok(ExpectEvent::TimedOut) => {
                warn!("no completion signal before the deadline");
                ScriptOutcome::TimedOut
            }
            Err(e) => ScriptOutcome::Failed(e.to_string()),
        }
    }

}

async fn send_step(
    session: &mut LineSession,
    command: &str,
    marker: &str,
) -> Result<(), crate::error::CoreError> {
    session.send_line(command).await?;
    session.send_line(&format!("echo {marker}")).await?;
    Ok(())
}

impl RemoteCommandDriver for SshUpdateDriver {
    async fn run_update(&mut self, conn: &ConnectionInfo) -> ScriptOutcome {
        let command = self.ssh_command(conn);
        info!(
            endpoint = format!("{}:{}", conn.hostname, conn.port),
            user = self.username,
            "opening ssh session"
        );

        let mut session = match LineSession::spawn(&command) {
            Ok(s) => s,
            Err(e) => return ScriptOutcome::Failed(format!("failed to spawn ssh: {e}")),
        };

        let outcome = self.run_script(&mut session).await;
        if let Err(e) = session.finish(Duration::from_secs(10)).await {
            warn!(error = %e, "ssh session did not shut down cleanly");
        }
        outcome
    }
}

/// Single-quote a string for `sh -c`, escaping embedded quotes.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
