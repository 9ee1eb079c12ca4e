//! Cancellation of the streaming loop by SIGINT/SIGTERM.

use async_channel::{Receiver, Sender};
use tracing::debug;

/// Cloneable token that flips once and stays cancelled.
///
/// Cancelling closes an internal channel, which wakes every task waiting in
/// [`CancellationToken::cancelled`].
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Sender<()>,
    receiver: Receiver<()>,
}

impl CancellationToken {
    /// A fresh, uncancelled token
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::bounded(1);
        Self { sender, receiver }
    }

    /// Cancel the token; later calls are no-ops
    pub fn cancel(&self) {
        self.sender.close();
    }

    /// Whether [`CancellationToken::cancel`] has been called
    pub fn is_cancelled(&self) -> bool {
        self.receiver.is_closed()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        // Nothing is ever sent, so recv only returns when the channel closes.
        let _ = self.receiver.recv().await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancel `token` when the process receives SIGINT or SIGTERM.
///
/// The handler runs on its own thread so the default "terminate" action of
/// those signals is replaced by a clean shutdown of the log stream.
#[cfg(unix)]
pub fn cancel_on_signals(token: CancellationToken) -> std::io::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::Builder::new()
        .name("dlog-signals".into())
        .spawn(move || {
            for signal in signals.forever() {
                debug!("Received signal {}", signal);
                token.cancel();
            }
        })?;
    Ok(())
}

/// Signals are not hooked off Unix; Ctrl+C terminates the process directly.
#[cfg(not(unix))]
pub fn cancel_on_signals(_token: CancellationToken) -> std::io::Result<()> {
    debug!("Signal handling is not available on this platform");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancelled_resolves_after_cancel() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = std::thread::spawn(move || smol::block_on(waiter.cancelled()));
        token.cancel();
        handle.join().unwrap();
    }
}
