//! Per-session glue between a remote transport and the policy engine.
//!
//! The transport supplies two strings once per session: the remote user's
//! home directory and the raw policy text. [`FileGate`] parses the text
//! and thereafter answers every access request from the compiled policy.
//! If the policy fails to parse, the gate stays disabled and every path is
//! denied; there is no fallback to partial rules.

use anyhow::{anyhow, Context, Result};
use fsgate_policy::{parse, ConfigError, Permissions, PolicySet};
use tracing::{debug, info, warn};

/// Transport operations the gate consumes. Session establishment,
/// authentication, and raw file I/O live behind this seam.
pub trait Transport {
    /// Home directory of the remote login user, as reported by the host.
    /// May carry trailing output (the host echoes it over a command
    /// channel); only the first line is meaningful.
    fn remote_home(&mut self) -> Result<String>;

    /// Raw policy text for the given access scheme.
    fn policy_text(&mut self, scheme: &str) -> Result<String>;
}

/// Per-session owner of the compiled policy.
///
/// Deny-by-default: a gate that was revoked, or whose policy text failed
/// to parse, refuses every path.
#[derive(Debug, Default)]
pub struct FileGate {
    policy: Option<PolicySet>,
    diagnostic: Option<ConfigError>,
}

impl FileGate {
    /// Fetches the home directory and policy text from the transport and
    /// compiles the policy. Transport failures are errors; a malformed
    /// policy is not, and instead yields a disabled gate carrying the
    /// diagnostic.
    pub fn start(transport: &mut dyn Transport, scheme: &str) -> Result<Self> {
        let raw_home = transport
            .remote_home()
            .context("failed to fetch remote home directory")?;
        let home = first_line(&raw_home);
        if !home.starts_with('/') {
            return Err(anyhow!("remote home directory is not absolute: {home:?}"));
        }

        let text = transport
            .policy_text(scheme)
            .with_context(|| format!("failed to fetch policy text for scheme '{scheme}'"))?;

        let mut gate = Self::default();
        match parse(&text, home) {
            Ok(policy) => {
                info!(
                    "file access enabled for scheme '{}' ({} rules)",
                    scheme,
                    policy.rules().len()
                );
                gate.policy = Some(policy);
            }
            Err(err) => {
                warn!("file access disabled for scheme '{}': {}", scheme, err);
                gate.diagnostic = Some(err);
            }
        }
        Ok(gate)
    }

    pub fn is_enabled(&self) -> bool {
        self.policy.is_some()
    }

    /// The parse failure that disabled the gate, if any.
    pub fn diagnostic(&self) -> Option<&ConfigError> {
        self.diagnostic.as_ref()
    }

    /// Disables the gate and drops the policy.
    pub fn revoke(&mut self) {
        if self.policy.take().is_some() {
            info!("file access revoked");
        }
    }

    pub fn permissions(&self, path: &str) -> Permissions {
        self.policy
            .as_ref()
            .map(|policy| policy.permissions(path))
            .unwrap_or_default()
    }

    pub fn is_readable(&self, path: &str) -> bool {
        self.permissions(path).read
    }

    pub fn is_writable(&self, path: &str) -> bool {
        self.permissions(path).write
    }

    /// Checks a path before a read; the file-access layer calls this ahead
    /// of every fetch.
    pub fn authorize_read(&self, path: &str) -> Result<()> {
        self.authorize(path, |perms| perms.read)
    }

    /// Checks a path before a write.
    pub fn authorize_write(&self, path: &str) -> Result<()> {
        self.authorize(path, |perms| perms.write)
    }

    fn authorize(&self, path: &str, allowed: impl Fn(Permissions) -> bool) -> Result<()> {
        let Some(policy) = &self.policy else {
            warn!("access refused for {}: service is disabled", path);
            return Err(anyhow!("service is disabled"));
        };
        if !allowed(policy.permissions(path)) {
            warn!("access refused for {}: permission denied", path);
            return Err(anyhow!("permission denied: {path}"));
        }
        debug!("access authorized for {}", path);
        Ok(())
    }
}

fn first_line(raw: &str) -> &str {
    raw.lines().next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsgate_policy::ErrorKind;

    struct FakeTransport {
        home: &'static str,
        config: &'static str,
    }

    impl Transport for FakeTransport {
        fn remote_home(&mut self) -> Result<String> {
            Ok(self.home.to_string())
        }

        fn policy_text(&mut self, _scheme: &str) -> Result<String> {
            Ok(self.config.to_string())
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn remote_home(&mut self) -> Result<String> {
            Err(anyhow!("connection reset"))
        }

        fn policy_text(&mut self, _scheme: &str) -> Result<String> {
            Err(anyhow!("connection reset"))
        }
    }

    fn gate(home: &'static str, config: &'static str) -> FileGate {
        FileGate::start(&mut FakeTransport { home, config }, "sftp").unwrap()
    }

    #[test]
    fn valid_policy_enables_the_gate() {
        let gate = gate("/home/pat", "[readonly]\n+ ~/src");
        assert!(gate.is_enabled());
        assert!(gate.is_readable("/home/pat/src/lib.rs"));
        assert!(!gate.is_writable("/home/pat/src/lib.rs"));
        gate.authorize_read("/home/pat/src/lib.rs").unwrap();
        assert!(gate.authorize_write("/home/pat/src/lib.rs").is_err());
    }

    #[test]
    fn invalid_policy_disables_the_gate_with_a_diagnostic() {
        let gate = gate("/home/pat", "[readonly]\n+ /a\n   + b");
        assert!(!gate.is_enabled());
        assert_eq!(gate.diagnostic().unwrap().kind, ErrorKind::IndentTooDeep);
        assert!(!gate.is_readable("/a"));
        let err = gate.authorize_read("/a").unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn home_is_cut_at_the_first_line() {
        let gate = gate("/home/pat\nnoise from the shell\n", "[readwrite]\n+ ~");
        assert!(gate.is_writable("/home/pat/notes"));
    }

    #[test]
    fn relative_home_is_rejected() {
        let mut transport = FakeTransport {
            home: "pat",
            config: "[readonly]\n+ ~",
        };
        assert!(FileGate::start(&mut transport, "sftp").is_err());
    }

    #[test]
    fn transport_failure_propagates() {
        assert!(FileGate::start(&mut FailingTransport, "sftp").is_err());
    }

    #[test]
    fn revoke_denies_everything() {
        let mut gate = gate("/home/pat", "[readwrite]\n+ ~");
        assert!(gate.is_writable("/home/pat/notes"));
        gate.revoke();
        assert!(!gate.is_enabled());
        assert!(!gate.is_readable("/home/pat/notes"));
        assert!(gate.authorize_read("/home/pat/notes").is_err());
    }

    #[test]
    fn denied_paths_fail_authorization_with_permission_denied() {
        let gate = gate("/home/pat", "[readonly]\n+ ~");
        let err = gate.authorize_read("/home/pat/.ssh/id_rsa").unwrap_err();
        assert!(err.to_string().contains("permission denied"));
    }
}
