use async_trait::async_trait;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{find_rejection, DeviceTransport, TransportError};
use crate::models::{ConfigBatch, Device};

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Connection settings shared by every device in a run
#[derive(Debug, Clone)]
pub struct SshSettings {
    pub default_user: String,
    pub default_pass: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub snapshot_command: String,
    pub config_enter: String,
    pub config_exit: String,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            default_user: String::new(),
            default_pass: String::new(),
            port: 22,
            timeout_secs: 30,
            snapshot_command: "show running-config".to_string(),
            config_enter: "configure terminal".to_string(),
            config_exit: "end".to_string(),
        }
    }
}

/// Resolved connection target for one device
#[derive(Debug, Clone)]
struct Target {
    host: String,
    port: u16,
    user: String,
    pass: String,
    timeout_secs: u64,
}

/// SshTransport pushes configuration over SSH using libssh2
#[derive(Debug, Clone)]
pub struct SshTransport {
    settings: SshSettings,
}

impl SshTransport {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }

    /// Per-device credentials win over run defaults when non-empty
    fn target(&self, device: &Device) -> Result<Target, TransportError> {
        let user = device
            .username
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.settings.default_user.clone());
        let pass = device
            .password
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.settings.default_pass.clone());

        if user.is_empty() || pass.is_empty() {
            return Err(TransportError::MissingCredentials(device.name.clone()));
        }

        Ok(Target {
            host: device.address.clone(),
            port: device.port.unwrap_or(self.settings.port),
            user,
            pass,
            timeout_secs: self.settings.timeout_secs,
        })
    }
}

#[async_trait]
impl DeviceTransport for SshTransport {
    async fn fetch_config(&self, device: &Device) -> Result<String, TransportError> {
        let target = self.target(device)?;
        let command = self.settings.snapshot_command.clone();

        tokio::task::spawn_blocking(move || {
            let session = ssh_connect(&target)?;
            ssh_exec(&session, &command)
        })
        .await
        .map_err(|e| TransportError::Join(e.to_string()))?
    }

    async fn apply_config(&self, device: &Device, batch: &ConfigBatch) -> Result<String, TransportError> {
        let target = self.target(device)?;

        let mut script = Vec::with_capacity(batch.len() + 3);
        script.push(self.settings.config_enter.clone());
        script.extend(batch.lines().iter().cloned());
        script.push(self.settings.config_exit.clone());
        script.push("exit".to_string());

        let output = tokio::task::spawn_blocking(move || {
            let session = ssh_connect(&target)?;
            ssh_shell(&session, &script)
        })
        .await
        .map_err(|e| TransportError::Join(e.to_string()))??;

        match find_rejection(&output) {
            Some(message) => Err(TransportError::Rejected { message, output }),
            None => Ok(output),
        }
    }
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// This is blocking, so call from a spawn_blocking context.
fn ssh_connect(target: &Target) -> Result<ssh2::Session, TransportError> {
    let addr = (target.host.as_str(), target.port)
        .to_socket_addrs()
        .map_err(|e| TransportError::Connect(format!("Invalid address {}:{}: {}", target.host, target.port, e)))?
        .next()
        .ok_or_else(|| TransportError::Connect(format!("No address found for {}", target.host)))?;

    let timeout = Duration::from_secs(target.timeout_secs);
    let tcp = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| TransportError::Connect(format!("TCP connection to {} failed: {}", addr, e)))?;

    tcp.set_read_timeout(Some(timeout)).ok();
    tcp.set_write_timeout(Some(timeout)).ok();

    let mut session = ssh2::Session::new()
        .map_err(|e| TransportError::Connect(format!("Failed to create SSH session: {}", e)))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(u32::try_from(target.timeout_secs * 1000).unwrap_or(u32::MAX));
    session
        .handshake()
        .map_err(|e| TransportError::Connect(format!("SSH handshake failed: {}", e)))?;

    // Try password auth first
    match session.userauth_password(&target.user, &target.pass) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    // Keyboard-interactive fallback (Arista EOS and similar)
    let mut prompter = PasswordPrompt {
        password: target.pass.clone(),
    };
    let _ = session.userauth_keyboard_interactive(&target.user, &mut prompter);

    if session.authenticated() {
        Ok(session)
    } else {
        Err(TransportError::Auth(format!("all methods exhausted for {}", target.user)))
    }
}

/// Run a single command on an exec channel, returning its full output
fn ssh_exec(session: &ssh2::Session, command: &str) -> Result<String, TransportError> {
    let mut channel = session
        .channel_session()
        .map_err(|e| TransportError::Channel(format!("Failed to open channel: {}", e)))?;

    channel
        .exec(command)
        .map_err(|e| TransportError::Channel(format!("Failed to execute {:?}: {}", command, e)))?;

    let mut output = String::new();
    channel
        .read_to_string(&mut output)
        .map_err(|e| TransportError::Channel(format!("Failed to read output: {}", e)))?;

    channel
        .wait_close()
        .map_err(|e| TransportError::Channel(format!("Failed to close channel: {}", e)))?;

    let status = channel
        .exit_status()
        .map_err(|e| TransportError::Channel(format!("Failed to read exit status: {}", e)))?;
    if status != 0 {
        return Err(TransportError::Channel(format!("{:?} exited with status {}", command, status)));
    }

    Ok(output)
}

/// Feed lines to an interactive PTY shell and collect everything it prints.
/// Network devices only accept config-mode input on a PTY.
fn ssh_shell(session: &ssh2::Session, lines: &[String]) -> Result<String, TransportError> {
    let mut channel = session
        .channel_session()
        .map_err(|e| TransportError::Channel(format!("Failed to open channel: {}", e)))?;
    channel
        .request_pty("vt100", None, None)
        .map_err(|e| TransportError::Channel(format!("Failed to request PTY: {}", e)))?;
    channel
        .shell()
        .map_err(|e| TransportError::Channel(format!("Failed to start shell: {}", e)))?;

    for line in lines {
        channel
            .write_all(format!("{}\n", line).as_bytes())
            .map_err(|e| TransportError::Channel(format!("Failed to send {:?}: {}", line, e)))?;
    }
    channel
        .flush()
        .map_err(|e| TransportError::Channel(format!("Failed to flush channel: {}", e)))?;
    let _ = channel.send_eof();

    let mut raw = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        match channel.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            // Some platforms never close the shell; keep what was read
            Err(e) if !raw.is_empty() && matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
            Err(e) => return Err(TransportError::Channel(format!("Failed to read output: {}", e))),
        }
    }
    let _ = channel.wait_close();

    Ok(String::from_utf8_lossy(&raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SshSettings {
        SshSettings {
            default_user: "admin".to_string(),
            default_pass: "admin".to_string(),
            ..SshSettings::default()
        }
    }

    #[test]
    fn test_target_prefers_device_credentials() {
        let transport = SshTransport::new(settings());
        let mut device = Device::new("r1", "10.0.0.1");
        device.username = Some("netops".to_string());
        device.password = Some(String::new());
        device.port = Some(2222);

        let target = transport.target(&device).unwrap();
        assert_eq!(target.user, "netops");
        assert_eq!(target.pass, "admin");
        assert_eq!(target.port, 2222);
        assert_eq!(target.host, "10.0.0.1");
    }

    #[test]
    fn test_target_without_credentials() {
        let transport = SshTransport::new(SshSettings::default());
        let err = transport.target(&Device::new("r1", "10.0.0.1")).unwrap_err();
        assert_eq!(err, TransportError::MissingCredentials("r1".to_string()));
    }

    #[tokio::test]
    async fn test_missing_credentials_never_connects() {
        let transport = SshTransport::new(SshSettings::default());
        let device = Device::new("r1", "192.0.2.1");
        let batch = ConfigBatch::parse("no shutdown");

        assert!(matches!(
            transport.fetch_config(&device).await,
            Err(TransportError::MissingCredentials(_))
        ));
        assert!(matches!(
            transport.apply_config(&device, &batch).await,
            Err(TransportError::MissingCredentials(_))
        ));
    }
}
