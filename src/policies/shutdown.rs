//! # Cooperative shutdown flags.
//!
//! The engine never cancels work preemptively. It only *polls* a
//! [`ShutdownFlag`] between chunks; whoever owns the process lifecycle sets it.
//!
//! - [`ShutdownFlag`] one-way flag backed by a [`CancellationToken`].
//! - [`ShutdownHook`] fans a single shutdown request out to many flags, and can
//!   listen for OS termination signals on behalf of a host application.
//!
//! ## Signals
//! **Unix platforms:** `SIGINT`, `SIGTERM`, `SIGQUIT`.
//!
//! **Windows platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One-way shutdown signal.
///
/// Cheap to clone; all clones observe the same state. Once requested, a flag
/// stays requested.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag {
    token: CancellationToken,
}

impl ShutdownFlag {
    /// Creates a flag that has not been requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot read; may change between calls.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Requests shutdown. Idempotent.
    pub fn request(&self) {
        self.token.cancel();
    }

    /// Completes once shutdown has been requested.
    pub async fn requested(&self) {
        self.token.cancelled().await
    }
}

/// Requests shutdown on every registered flag at once.
///
/// Host applications register the flag of each engine they run and call
/// [`ShutdownHook::request_all`] from their own lifecycle hook, or let
/// [`ShutdownHook::spawn_signal_listener`] do it on SIGINT/SIGTERM.
#[derive(Clone, Debug, Default)]
pub struct ShutdownHook {
    flags: Arc<Mutex<Vec<ShutdownFlag>>>,
}

impl ShutdownHook {
    /// Creates an empty hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a flag; a flag registered after `request_all` is not requested retroactively.
    pub fn register(&self, flag: ShutdownFlag) {
        self.lock().push(flag);
    }

    /// Number of registered flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Requests shutdown on every registered flag.
    pub fn request_all(&self) {
        let flags = self.lock();
        tracing::info!(flags = flags.len(), "requesting shutdown for registered engines");
        for flag in flags.iter() {
            flag.request();
        }
    }

    /// Spawns a task that calls [`ShutdownHook::request_all`] on the first termination signal.
    ///
    /// Returns `Err` if signal registration fails.
    pub fn spawn_signal_listener(&self) -> std::io::Result<JoinHandle<()>> {
        let signals = ShutdownSignals::register()?;
        let hook = self.clone();
        Ok(tokio::spawn(async move {
            signals.wait().await;
            hook.request_all();
        }))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ShutdownFlag>> {
        // Flags are plain handles; a poisoned list is still usable.
        self.flags.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(unix)]
struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    async fn wait(mut self) {
        tokio::select! {
            _ = self.sigint.recv()  => {},
            _ = self.sigterm.recv() => {},
            _ = self.sigquit.recv() => {},
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn register() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn wait(self) {
        let _ = tokio::signal::ctrl_c().await;
    }
}
