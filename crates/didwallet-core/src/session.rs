//! Scoped ownership of an open wallet handle.

use crate::config::{WalletConfig, WalletCredentials};
use crate::error::WalletResult;
use crate::service::{WalletHandle, WalletService};
use tracing::warn;

/// An open wallet that is closed when the guard goes away.
///
/// Call [`WalletSession::close`] to observe the close result; otherwise the
/// handle is closed on drop and any error is only logged.
pub struct WalletSession<'a, S: WalletService + ?Sized> {
    service: &'a S,
    wallet_id: String,
    handle: WalletHandle,
    open: bool,
}

impl<'a, S: WalletService + ?Sized> WalletSession<'a, S> {
    /// Open a wallet and take ownership of its handle.
    pub fn open(
        service: &'a S,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> WalletResult<Self> {
        let handle = service.open_wallet(config, credentials)?;
        Ok(Self {
            service,
            wallet_id: config.id.clone(),
            handle,
            open: true,
        })
    }

    pub fn handle(&self) -> WalletHandle {
        self.handle
    }

    pub fn wallet_id(&self) -> &str {
        &self.wallet_id
    }

    /// Close the handle now and report the result.
    pub fn close(mut self) -> WalletResult<()> {
        self.open = false;
        self.service.close_wallet(self.handle)
    }
}

impl<S: WalletService + ?Sized> Drop for WalletSession<'_, S> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = self.service.close_wallet(self.handle) {
            warn!(wallet = %self.wallet_id, handle = %self.handle, error = %e, "Failed to close wallet on drop");
        }
    }
}

impl<S: WalletService + ?Sized> std::fmt::Debug for WalletSession<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("wallet_id", &self.wallet_id)
            .field("handle", &self.handle)
            .field("open", &self.open)
            .finish()
    }
}
