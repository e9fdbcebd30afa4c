//! Detect whether we run inside a Safe wallet shell.

use std::time::Duration;

use samm_store::Session;
use samm_tx::SafeWallet;

/// How long the shell gets to answer `safe_info`.
pub const SAFE_APP_PROBE_TIMEOUT: Duration = Duration::from_millis(2_500);

/// Ask the shell for Safe info and record the outcome in the session.
///
/// Success within `timeout` marks a Safe app. An error or timeout marks a
/// standalone run; the pending request is dropped, so it can never flip the
/// flag afterwards.
pub async fn detect_safe_app(wallet: &dyn SafeWallet, session: &mut Session, timeout: Duration) -> bool {
    let is_safe_app = match tokio::time::timeout(timeout, wallet.safe_info()).await {
        Ok(Ok(info)) => {
            tracing::debug!(safe = %info.safe_address, chain_id = info.chain_id, "running inside safe");
            true
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "safe info fetch failed");
            false
        }
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "safe info probe timed out");
            false
        }
    };
    session.set_is_safe_app(is_safe_app);
    is_safe_app
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use async_trait::async_trait;
    use samm_store::MemoryStorage;
    use samm_tx::{SafeInfo, SafeTransaction, SafeTxHash};
    use samm_types::{Result, SammError};
    use std::sync::Arc;

    struct SlowWallet {
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl SafeWallet for SlowWallet {
        async fn safe_info(&self) -> Result<SafeInfo> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(SammError::Other("not in an iframe".into()));
            }
            Ok(SafeInfo {
                safe_address: Address::repeat_byte(0x5a),
                chain_id: 1,
                owners: vec![],
                threshold: 1,
                modules: vec![],
            })
        }

        async fn send_transactions(&self, _txs: &[SafeTransaction]) -> Result<SafeTxHash> {
            Err(SammError::Other("read-only".into()))
        }
    }

    fn session() -> Session {
        Session::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_success_within_timeout() {
        let wallet = SlowWallet { delay: Duration::from_millis(1_000), fail: false };
        let mut session = session();

        assert!(detect_safe_app(&wallet, &mut session, SAFE_APP_PROBE_TIMEOUT).await);
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(session.is_safe_app(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_is_final() {
        let wallet = SlowWallet { delay: Duration::from_millis(5_000), fail: false };
        let mut session = session();

        assert!(!detect_safe_app(&wallet, &mut session, SAFE_APP_PROBE_TIMEOUT).await);
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(session.is_safe_app(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_is_not_safe_app() {
        let wallet = SlowWallet { delay: Duration::ZERO, fail: true };
        let mut session = session();

        assert!(!detect_safe_app(&wallet, &mut session, SAFE_APP_PROBE_TIMEOUT).await);
        assert_eq!(session.is_safe_app(), Some(false));
    }
}
