//! Node command capability -- the trait the harness core is generic over.
//!
//! The [`NodeClient`] trait abstracts the remote-shell transport, allowing
//! production code to use [`OpenSshNode`](crate::ssh::OpenSshNode) while
//! tests substitute simulated nodes. The harness never holds a handle to a
//! remote process; everything is a command dispatch whose result is
//! interpreted by the caller.

use std::future::Future;

use volharness_core::error::RemoteError;

/// Synchronous-in-effect remote command capability for one node.
///
/// All three dispatch methods block the caller until the remote side
/// responds. `run_background` responds as soon as the launch command is
/// accepted, which says nothing about the launched process being ready;
/// readiness must be established by a separate probe.
///
/// # Error Handling
///
/// - Non-zero exit: [`RemoteError::CommandFailed`] carrying the exit status
///   and the combined captured output
/// - Launch rejection: [`RemoteError::Launch`]
/// - Transport failure before the command ran: [`RemoteError::Transport`]
pub trait NodeClient: Send + Sync + 'static {
    /// Logical node name.
    fn name(&self) -> &str;

    /// Run a command, discarding its output.
    fn run(&self, command: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Run a command and capture its combined stdout/stderr.
    ///
    /// On failure the error carries the captured output so callers can
    /// surface it for diagnosis.
    fn run_with_output(
        &self,
        command: &str,
    ) -> impl Future<Output = Result<String, RemoteError>> + Send;

    /// Launch a command detached from the session.
    ///
    /// Returns once the launch is accepted -- **not** once the launched
    /// process is ready.
    fn run_background(&self, command: &str)
    -> impl Future<Output = Result<(), RemoteError>> + Send;
}
