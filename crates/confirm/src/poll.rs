//! Receipt polling confirmer.

use crate::{Cancellation, ConfirmationError, Confirmer, Receipt};
use alloy_primitives::{ChainId, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionReceipt;
use capability::PendingTransaction;
use config::ConfirmationPolicy;
use std::{future::Future, time::Duration};
use tokio::time::{self, MissedTickBehavior};
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, info, warn};

/// Receipt fields the poll loop cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptStatus {
    pub block_number: u64,
    pub gas_used: u64,
    pub success: bool,
}

/// Read access to receipts and the chain head of a single chain.
pub trait ReceiptSource: Send + Sync {
    /// Chain this source reads from.
    fn chain_id(&self) -> ChainId;

    /// Receipt of a mined transaction, `None` while it is still pending.
    fn receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = eyre::Result<Option<ReceiptStatus>>> + Send;

    /// Latest block number.
    fn block_number(&self) -> impl Future<Output = eyre::Result<u64>> + Send;
}

/// [`ReceiptSource`] backed by an RPC provider.
#[derive(Debug, Clone)]
pub struct RpcReceipts<P> {
    provider: P,
    chain_id: ChainId,
}

impl<P> RpcReceipts<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, chain_id: ChainId) -> Self {
        Self { provider, chain_id }
    }
}

impl<P> ReceiptSource for RpcReceipts<P>
where
    P: Provider + Clone,
{
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn receipt(&self, tx_hash: TxHash) -> eyre::Result<Option<ReceiptStatus>> {
        let receipt: Option<TransactionReceipt> =
            self.provider.get_transaction_receipt(tx_hash).await?;
        let Some(receipt) = receipt else {
            return Ok(None);
        };

        // Some nodes hand out receipts for pending blocks.
        let Some(block_number) = receipt.block_number else {
            return Ok(None);
        };

        Ok(Some(ReceiptStatus {
            block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
        }))
    }

    async fn block_number(&self) -> eyre::Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }
}

// 100ms, 200ms, 400ms, 800ms between the 5 attempts of a single query.
const RETRY_BASE_MS: u64 = 2;
const RETRY_FACTOR: u64 = 50;
const RETRY_ATTEMPTS: usize = 5;

/// Confirms transactions by polling a [`ReceiptSource`].
///
/// Each poll fetches the receipt; once mined, the chain head is compared
/// against the receipt's block until the policy depth is reached. Reverts are
/// reported as soon as the receipt shows them. Individual queries are retried
/// with exponential backoff before the wait fails with
/// [`ConfirmationError::Rpc`].
#[derive(Debug, Clone)]
pub struct PollingConfirmer<S> {
    source: S,
    policy: ConfirmationPolicy,
}

impl<S> PollingConfirmer<S>
where
    S: ReceiptSource,
{
    pub const fn new(source: S, policy: ConfirmationPolicy) -> Self {
        Self { source, policy }
    }

    pub const fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    async fn wait_for_depth(&self, tx_hash: TxHash) -> Result<Receipt, ConfirmationError> {
        let required = self.policy.confirmations.max(1);
        let period = self.policy.poll_interval.max(Duration::from_millis(1));
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let Some(status) = self
                .with_retry(tx_hash, || self.source.receipt(tx_hash))
                .await?
            else {
                debug!(%tx_hash, "Transaction not yet included");
                continue;
            };

            if !status.success {
                warn!(
                    %tx_hash,
                    block_number = status.block_number,
                    "Transaction reverted"
                );
                return Err(ConfirmationError::Reverted {
                    tx_hash,
                    block_number: status.block_number,
                });
            }

            let head = if required == 1 {
                status.block_number
            } else {
                self.with_retry(tx_hash, || self.source.block_number())
                    .await?
            };
            let depth = head.saturating_sub(status.block_number) + 1;

            if depth < required {
                debug!(%tx_hash, depth, required, "Waiting for confirmations");
                continue;
            }

            info!(
                chain_id = self.source.chain_id(),
                %tx_hash,
                block_number = status.block_number,
                gas_used = status.gas_used,
                depth,
                "Transaction confirmed"
            );

            return Ok(Receipt {
                chain_id: self.source.chain_id(),
                tx_hash,
                block_number: status.block_number,
                gas_used: status.gas_used,
            });
        }
    }

    async fn with_retry<T, F, Fut>(&self, tx_hash: TxHash, query: F) -> Result<T, ConfirmationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = eyre::Result<T>>,
    {
        let strategy = ExponentialBackoff::from_millis(RETRY_BASE_MS)
            .factor(RETRY_FACTOR)
            .take(RETRY_ATTEMPTS - 1);

        let mut query = query;
        Retry::start(strategy, || {
            let attempt = query();
            async move {
                attempt.await.map_err(|e| {
                    warn!(%tx_hash, error = %e, "Receipt poll failed, will retry");
                    e
                })
            }
        })
        .await
        .map_err(|source| ConfirmationError::Rpc {
            chain_id: self.source.chain_id(),
            tx_hash,
            source,
        })
    }
}

impl<S> Confirmer for PollingConfirmer<S>
where
    S: ReceiptSource,
{
    async fn confirm(
        &self,
        pending: PendingTransaction,
        cancel: &Cancellation,
    ) -> Result<Receipt, ConfirmationError> {
        let PendingTransaction { chain_id, tx_hash } = pending;

        if chain_id != self.source.chain_id() {
            return Err(ConfirmationError::ChainMismatch {
                tx_hash,
                submitted: chain_id,
                served: self.source.chain_id(),
            });
        }

        if cancel.is_cancelled() {
            return Err(ConfirmationError::Cancelled { tx_hash });
        }

        let timeout = self.policy.timeout;
        debug!(
            chain_id,
            %tx_hash,
            confirmations = self.policy.confirmations,
            ?timeout,
            "Waiting for transaction"
        );

        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                warn!(%tx_hash, "Confirmation cancelled");
                Err(ConfirmationError::Cancelled { tx_hash })
            }
            result = time::timeout(timeout, self.wait_for_depth(tx_hash)) => {
                result.unwrap_or_else(|_| {
                    warn!(%tx_hash, ?timeout, "Confirmation timed out");
                    Err(ConfirmationError::Timeout { tx_hash, timeout })
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation;
    use alloy_primitives::b256;
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    const CHAIN_ID: ChainId = 10;
    const TX_HASH: TxHash =
        b256!("1111111111111111111111111111111111111111111111111111111111111111");

    #[derive(Debug, Clone, Copy)]
    enum Reply {
        Pending,
        Mined { block_number: u64, success: bool },
        Error,
    }

    /// Replays scripted replies; the last one repeats once the script runs out.
    struct MockSource {
        receipts: Mutex<VecDeque<Reply>>,
        heads: Mutex<VecDeque<u64>>,
        receipt_calls: AtomicUsize,
    }

    impl MockSource {
        fn new(receipts: &[Reply], heads: &[u64]) -> Self {
            Self {
                receipts: Mutex::new(receipts.iter().copied().collect()),
                heads: Mutex::new(heads.iter().copied().collect()),
                receipt_calls: AtomicUsize::new(0),
            }
        }

        fn next<T: Copy>(queue: &Mutex<VecDeque<T>>) -> T {
            let mut queue = queue.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                *queue.front().expect("script must not be empty")
            }
        }
    }

    impl ReceiptSource for &MockSource {
        fn chain_id(&self) -> ChainId {
            CHAIN_ID
        }

        async fn receipt(&self, _tx_hash: TxHash) -> eyre::Result<Option<ReceiptStatus>> {
            self.receipt_calls.fetch_add(1, Ordering::SeqCst);
            match MockSource::next(&self.receipts) {
                Reply::Pending => Ok(None),
                Reply::Mined {
                    block_number,
                    success,
                } => Ok(Some(ReceiptStatus {
                    block_number,
                    gas_used: 21_000,
                    success,
                })),
                Reply::Error => Err(eyre::eyre!("connection reset")),
            }
        }

        async fn block_number(&self) -> eyre::Result<u64> {
            Ok(MockSource::next(&self.heads))
        }
    }

    fn policy(confirmations: u64) -> ConfirmationPolicy {
        ConfirmationPolicy {
            confirmations,
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }

    fn pending() -> PendingTransaction {
        PendingTransaction::new(CHAIN_ID, TX_HASH)
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_after_inclusion() {
        let source = MockSource::new(
            &[
                Reply::Pending,
                Reply::Pending,
                Reply::Mined {
                    block_number: 100,
                    success: true,
                },
            ],
            &[100],
        );
        let confirmer = PollingConfirmer::new(&source, policy(1));

        let receipt = confirmer
            .confirm(pending(), &Cancellation::never())
            .await
            .unwrap();

        assert_eq!(receipt.chain_id, CHAIN_ID);
        assert_eq!(receipt.tx_hash, TX_HASH);
        assert_eq!(receipt.block_number, 100);
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(source.receipt_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_confirmation_depth() {
        let source = MockSource::new(
            &[Reply::Mined {
                block_number: 100,
                success: true,
            }],
            &[100, 101, 102],
        );
        let confirmer = PollingConfirmer::new(&source, policy(3));

        let receipt = confirmer
            .confirm(pending(), &Cancellation::never())
            .await
            .unwrap();

        assert_eq!(receipt.block_number, 100);
        assert_eq!(source.receipt_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_is_terminal() {
        let source = MockSource::new(
            &[Reply::Mined {
                block_number: 7,
                success: false,
            }],
            &[50],
        );
        let confirmer = PollingConfirmer::new(&source, policy(3));

        let err = confirmer
            .confirm(pending(), &Cancellation::never())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ConfirmationError::Reverted {
                block_number: 7,
                ..
            }
        ));
        assert_eq!(err.tx_hash(), TX_HASH);
        assert_eq!(source.receipt_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_never_mined() {
        let source = MockSource::new(&[Reply::Pending], &[0]);
        let confirmer = PollingConfirmer::new(&source, policy(1));

        let err = confirmer
            .confirm(pending(), &Cancellation::never())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ConfirmationError::Timeout { timeout, .. } if timeout == Duration::from_secs(60)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_wait() {
        let source = MockSource::new(&[Reply::Pending], &[0]);
        let confirmer = PollingConfirmer::new(&source, policy(1));
        let (handle, signal) = cancellation();

        let canceller = async {
            time::sleep(Duration::from_secs(5)).await;
            handle.cancel();
        };
        let (result, ()) = tokio::join!(confirmer.confirm(pending(), &signal), canceller);

        let err = result.unwrap_err();
        assert!(err.is_cancelled());
        assert!(source.receipt_calls.load(Ordering::SeqCst) < 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start_skips_polling() {
        let source = MockSource::new(&[Reply::Pending], &[0]);
        let confirmer = PollingConfirmer::new(&source, policy(1));
        let (handle, signal) = cancellation();
        handle.cancel();

        let err = confirmer.confirm(pending(), &signal).await.unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(source.receipt_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_transaction_from_other_chain() {
        let source = MockSource::new(&[Reply::Pending], &[0]);
        let confirmer = PollingConfirmer::new(&source, policy(1));

        let err = confirmer
            .confirm(
                PendingTransaction::new(1, TX_HASH),
                &Cancellation::never(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ConfirmationError::ChainMismatch {
                submitted: 1,
                served: CHAIN_ID,
                ..
            }
        ));
        assert_eq!(source.receipt_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_rpc_errors_are_retried() {
        let source = MockSource::new(
            &[
                Reply::Error,
                Reply::Error,
                Reply::Mined {
                    block_number: 3,
                    success: true,
                },
            ],
            &[3],
        );
        let confirmer = PollingConfirmer::new(&source, policy(1));

        let receipt = confirmer
            .confirm(pending(), &Cancellation::never())
            .await
            .unwrap();

        assert_eq!(receipt.block_number, 3);
        assert_eq!(source.receipt_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_rpc_errors_surface() {
        let source = MockSource::new(&[Reply::Error], &[0]);
        let confirmer = PollingConfirmer::new(&source, policy(1));

        let err = confirmer
            .confirm(pending(), &Cancellation::never())
            .await
            .unwrap_err();

        assert!(matches!(err, ConfirmationError::Rpc { chain_id: CHAIN_ID, .. }));
        assert_eq!(
            source.receipt_calls.load(Ordering::SeqCst),
            RETRY_ATTEMPTS
        );
    }
}
