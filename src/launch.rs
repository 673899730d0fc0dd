//! Hand-offs to the host environment: the telephone dialer and external links.

use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

/// Something that can place a telephone call.
pub trait Dialer {
    /// Ask the host to dial `tel_uri`. Fire-and-forget.
    fn dial(&mut self, tel_uri: &str);
}

/// The emergency-call action: one request to dial a fixed number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyCall {
    number: String,
}

impl EmergencyCall {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
        }
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn tel_uri(&self) -> String {
        format!("tel:{}", self.number)
    }

    /// Issue a single dial request. No confirmation, no retry.
    pub fn trigger(&self, dialer: &mut dyn Dialer) {
        tracing::info!(number = %self.number, "call: dialing");
        dialer.dial(&self.tel_uri());
    }
}

/// Dialer backed by the platform URI opener.
pub struct SystemDialer;

impl Dialer for SystemDialer {
    fn dial(&mut self, tel_uri: &str) {
        open_uri(tel_uri);
    }
}

/// Check if a URI is something the platform opener should handle.
pub fn is_external_uri(uri: &str) -> bool {
    uri.starts_with("https://") || uri.starts_with("http://") || uri.starts_with("tel:")
}

fn opener_program() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Open `uri` with the system handler (browser, dialer app).
///
/// Spawn failures are logged and otherwise ignored: call establishment and
/// page loading belong to the host.
pub fn open_uri(uri: &str) {
    if !is_external_uri(uri) {
        tracing::warn!(uri, "open: refusing unsupported scheme");
        return;
    }
    let program = opener_program();
    let spawned = Command::new(program)
        .arg(uri)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(child) => {
            tracing::info!(uri, program, "open: handed off");
            reap(child);
        }
        Err(e) => tracing::warn!(uri, program, error = %e, "open: spawn failed"),
    }
}

/// Wait for `child` on a detached thread so it never lingers as a zombie.
fn reap(mut child: Child) -> JoinHandle<Option<ExitStatus>> {
    thread::spawn(move || match child.wait() {
        Ok(status) => {
            tracing::debug!(%status, "open: opener exited");
            Some(status)
        }
        Err(e) => {
            tracing::warn!(error = %e, "open: wait failed");
            None
        }
    })
}
