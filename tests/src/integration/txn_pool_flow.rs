//! # Transaction Pool Flows
//!
//! A full node container (genesis-loaded ledger, pool server, three
//! endpoints, three stateless validators and one stateful validator) driven
//! from the outside.
//!
//! ## Flows Tested
//!
//! 1. **Ingress → validators → verified pool**: a funded, signed transfer is accepted
//! 2. **Concurrent duplicates**: two submitters racing on one hash get exactly one admission
//! 3. **Fail-fast**: stateless and stateful failures reject with the failing validator named
//! 4. **Block assembly**: committed transactions leave the pool and cannot re-enter
//! 5. **Registry churn**: validators join and leave through the response endpoint
//! 6. **Timeout**: a silent validator expires the transaction

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rand::Rng;
    use tokio::sync::{mpsc, oneshot};
    use tokio::time::timeout;

    use node_runtime::{GenesisConfig, NodeConfig, TxPoolContainer};
    use qc_06_txn_pool::{
        spawn_validator, ActorRole, CallerId, Capability, PoolQuery, PoolStatus, QueryReply,
        Sender, StatelessValidator, Transaction, TxOutcome, TxPoolApi, TxPoolConfig, TxPoolError,
        TxRequest, TxStatus, ValidateRequest, ValidatorId, ValidatorKind, ValidatorLink,
        VerifyRspHandle,
    };
    use shared_types::{Address, MutableTransaction, Payload, ShardId, Sig};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const ALICE: Address = [0xA1; 20];
    const BOB: Address = [0xB0; 20];
    const CAROL: Address = [0xC4; 20];

    const WAIT: Duration = Duration::from_secs(5);

    fn node_config() -> NodeConfig {
        NodeConfig {
            shard_id: ShardId::ROOT,
            txpool: TxPoolConfig {
                bypass_ledger_check: false,
                validation_timeout_ms: 300,
                ..TxPoolConfig::for_testing()
            },
            genesis: GenesisConfig::devnet(ALICE, 10_000_000),
            stateless_validators: 3,
            stateful_validator: true,
        }
    }

    /// A signed transfer from `payer` to BOB with a random nonce.
    fn transfer(payer: Address, amount: u64) -> Arc<Transaction> {
        let mut tx = MutableTransaction::new(Payload::Transfer { to: BOB, amount });
        tx.nonce = rand::thread_rng().gen();
        tx.gas_price = 1;
        tx.gas_limit = 21_000;
        tx.payer = payer;
        tx.sigs = vec![Sig {
            pub_keys: vec![[0x11; 32]],
            m: 1,
            sig_data: vec![vec![0xAB; 64]],
        }];
        Arc::new(tx.into_immutable().unwrap())
    }

    async fn submit_and_wait(container: &TxPoolContainer, tx: Arc<Transaction>) -> TxOutcome {
        let ticket = container.server().submit(tx, Sender::Nil).unwrap();
        timeout(WAIT, ticket.wait()).await.expect("timeout waiting for outcome")
    }

    async fn pool_status(container: &TxPoolContainer) -> PoolStatus {
        let (reply, rx) = oneshot::channel();
        container
            .endpoints()
            .query
            .send(PoolQuery::Status { reply })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    async fn verified_listing(container: &TxPoolContainer) -> QueryReply {
        let (reply, rx) = oneshot::channel();
        container
            .endpoints()
            .query
            .send(PoolQuery::PoolState {
                by_count: false,
                reply,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    fn failing_validator(outcome: &TxOutcome) -> Option<&ValidatorId> {
        match outcome.error() {
            Some(TxPoolError::ValidationFailed { validator, .. }) => Some(validator),
            _ => None,
        }
    }

    // =============================================================================
    // INGRESS → VALIDATORS → VERIFIED POOL
    // =============================================================================

    #[tokio::test]
    async fn test_funded_transfer_is_verified() {
        let container = TxPoolContainer::start(&node_config()).await.unwrap();
        let tx = transfer(ALICE, 500);

        let outcome = submit_and_wait(&container, tx.clone()).await;
        assert_eq!(outcome, TxOutcome::Accepted(tx.hash()));

        let listing = verified_listing(&container).await;
        assert_eq!(listing.hashes(), vec![tx.hash()]);
        assert_eq!(
            container.server().tx_status(&tx.hash()),
            Some(TxStatus::Verified)
        );

        let status = pool_status(&container).await;
        assert_eq!(status.pending_count, 0);
        assert_eq!(status.verified_count, 1);
        assert_eq!(status.in_flight, 0);
        assert_eq!(status.validators, 4);

        container.shutdown().await;
    }

    #[tokio::test]
    async fn test_ingress_endpoint_admits_transaction() {
        let container = TxPoolContainer::start(&node_config()).await.unwrap();
        let tx = transfer(ALICE, 1);

        container
            .endpoints()
            .ingress
            .send(TxRequest {
                tx: tx.clone(),
                sender: Sender::Api(CallerId::new()),
            })
            .await
            .unwrap();

        let server = container.server();
        let verified = timeout(WAIT, async {
            while server.tx_status(&tx.hash()) != Some(TxStatus::Verified) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(verified.is_ok(), "transaction never reached the verified pool");

        container.shutdown().await;
    }

    // =============================================================================
    // CONCURRENT DUPLICATES
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_admit_once() {
        let container = TxPoolContainer::start(&node_config()).await.unwrap();
        let tx = transfer(ALICE, 42);

        let mut submitters = Vec::new();
        for _ in 0..2 {
            let server = container.server();
            let tx = tx.clone();
            submitters.push(tokio::spawn(async move {
                let mut tickets = Vec::new();
                let mut duplicates = 0;
                for _ in 0..4 {
                    match server.submit(tx.clone(), Sender::Nil) {
                        Ok(ticket) => tickets.push(ticket),
                        Err(TxPoolError::DuplicateTransaction(_)) => duplicates += 1,
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
                (tickets, duplicates)
            }));
        }

        let mut tickets = Vec::new();
        let mut duplicates = 0;
        for submitter in submitters {
            let (t, d) = submitter.await.unwrap();
            tickets.extend(t);
            duplicates += d;
        }

        assert_eq!(tickets.len(), 1);
        assert_eq!(duplicates, 7);

        let ticket = tickets.pop().unwrap();
        let outcome = timeout(WAIT, ticket.wait()).await.unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(container.server().stats().duplicates, 7);
        assert_eq!(pool_status(&container).await.verified_count, 1);

        container.shutdown().await;
    }

    // =============================================================================
    // FAIL-FAST
    // =============================================================================

    #[tokio::test]
    async fn test_unfunded_payer_rejected_by_stateful_validator() {
        let container = TxPoolContainer::start(&node_config()).await.unwrap();
        let tx = transfer(CAROL, 1);

        let outcome = submit_and_wait(&container, tx.clone()).await;
        assert!(!outcome.is_accepted());
        assert_eq!(
            failing_validator(&outcome),
            Some(&ValidatorId::new("stateful-0"))
        );

        let status = pool_status(&container).await;
        assert_eq!(status.pending_count, 0);
        assert_eq!(status.verified_count, 0);
        assert!(container.server().tx_status(&tx.hash()).is_none());

        container.shutdown().await;
    }

    #[tokio::test]
    async fn test_overspend_rejected() {
        let container = TxPoolContainer::start(&node_config()).await.unwrap();

        let outcome = submit_and_wait(&container, transfer(ALICE, 10_000_000)).await;
        assert_eq!(
            failing_validator(&outcome),
            Some(&ValidatorId::new("stateful-0"))
        );

        container.shutdown().await;
    }

    #[tokio::test]
    async fn test_unsigned_rejected_by_stateless_validator() {
        let container = TxPoolContainer::start(&node_config()).await.unwrap();

        let mut tx = MutableTransaction::new(Payload::Transfer { to: BOB, amount: 1 });
        tx.gas_price = 1;
        tx.gas_limit = 21_000;
        tx.payer = ALICE;
        let tx = Arc::new(tx.into_immutable().unwrap());

        let outcome = submit_and_wait(&container, tx).await;
        let validator = failing_validator(&outcome).expect("validation failure");
        assert!(validator.as_str().starts_with("stateless-"));

        container.shutdown().await;
    }

    // =============================================================================
    // BLOCK ASSEMBLY
    // =============================================================================

    #[tokio::test]
    async fn test_committed_transaction_leaves_pool_and_cannot_return() {
        let container = TxPoolContainer::start(&node_config()).await.unwrap();
        let server = container.server();
        let tx = transfer(ALICE, 100);

        assert!(submit_and_wait(&container, tx.clone()).await.is_accepted());

        let height = container
            .ledger()
            .commit_block(ShardId::ROOT, &[tx.as_ref()])
            .unwrap();
        assert_eq!(height, 1);
        assert_eq!(server.remove_committed(&[tx.hash()]), vec![tx.hash()]);
        assert!(verified_listing(&container).await.is_empty());

        let outcome = submit_and_wait(&container, tx.clone()).await;
        let Some(TxPoolError::ValidationFailed { validator, reason }) = outcome.error() else {
            panic!("expected validation failure, got {outcome:?}");
        };
        assert_eq!(validator, &ValidatorId::new("stateful-0"));
        assert!(reason.contains("already committed"));

        container.shutdown().await;
    }

    // =============================================================================
    // REGISTRY CHURN
    // =============================================================================

    #[tokio::test]
    async fn test_validator_joins_and_leaves_through_response_endpoint() {
        let container = TxPoolContainer::start(&node_config()).await.unwrap();

        let extra = spawn_validator(
            ValidatorId::new("stateless-extra"),
            ValidatorKind::Stateless(StatelessValidator),
            container.endpoints().verify_rsp.clone(),
        );
        extra.register().await.unwrap();
        assert_eq!(pool_status(&container).await.validators, 5);

        assert!(submit_and_wait(&container, transfer(ALICE, 3))
            .await
            .is_accepted());

        extra.unregister(false).await.unwrap();
        assert_eq!(pool_status(&container).await.validators, 4);
        assert_eq!(
            extra.unregister(false).await,
            Err(TxPoolError::UnknownValidator(ValidatorId::new(
                "stateless-extra"
            )))
        );

        extra.shutdown();
        container.shutdown().await;
    }

    // =============================================================================
    // TIMEOUT
    // =============================================================================

    #[tokio::test]
    async fn test_silent_validator_expires_transaction() {
        let container = TxPoolContainer::start(&node_config()).await.unwrap();
        let server = container.server();

        // Receives requests and never answers.
        let (inbox, mut silent) = mpsc::unbounded_channel::<ValidateRequest>();
        let (response, _rx) = VerifyRspHandle::channel(ActorRole::VerifyResponse, 1);
        server
            .register_validator(
                ValidatorId::new("silent"),
                Capability::Stateless,
                ValidatorLink { inbox, response },
            )
            .unwrap();

        let tx = transfer(ALICE, 7);
        let outcome = submit_and_wait(&container, tx.clone()).await;
        assert_eq!(
            outcome.error(),
            Some(&TxPoolError::ValidationTimeout { timeout_ms: 300 })
        );
        assert_eq!(silent.recv().await.map(|req| req.tx.hash()), Some(tx.hash()));
        assert_eq!(server.stats().expired, 1);
        assert_eq!(pool_status(&container).await.pending_count, 0);

        container.shutdown().await;
    }
}
