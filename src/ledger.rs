//! Ledger client capability: balance and nonce queries, transfer submission,
//! receipt waits.
//!
//! Signing and the wire format live behind [`LedgerClient`]; the rest of the
//! crate never touches a raw transaction.

use std::time::Duration;

use alloy_consensus::{SignableTransaction, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tokio::time::sleep;

use crate::accounts::Account;
use crate::error::{Error, Result};

/// Identifier of a submitted transaction.
pub type TxId = B256;

/// Final status of a confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Transaction executed successfully.
    Success,
    /// Transaction was included but did not succeed.
    Failed,
}

/// One value transfer, built per submission and consumed by signing.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Sending account, providing the signing key.
    pub sender: Account,
    /// Receiving address.
    pub receiver: Address,
    /// Transfer value in wei.
    pub amount: U256,
    /// Gas limit for the transfer.
    pub gas_limit: u64,
    /// Fixed gas price in wei.
    pub gas_price: u128,
    /// Sender nonce for this transfer.
    pub nonce: u64,
    /// Target chain id.
    pub chain_id: u64,
}

/// View of the chain consumed by the distributor and the dispatch engine.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Chain id of the connected node.
    async fn chain_id(&self) -> Result<u64>;

    /// Current transaction count for `address`.
    async fn get_nonce(&self, address: Address) -> Result<u64>;

    /// Current balance of `address` in wei.
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Signs and submits one transfer.
    ///
    /// Success means the node accepted the transaction into its local pool,
    /// not that it was mined.
    async fn submit(&self, request: TransferRequest) -> Result<TxId>;

    /// Waits for the receipt of `tx`, bounded by `timeout`.
    async fn wait_for_receipt(&self, tx: TxId, timeout: Duration) -> Result<ReceiptStatus>;
}

/// [`LedgerClient`] over an HTTP JSON-RPC endpoint.
#[derive(Debug)]
pub struct HttpLedger {
    provider: RootProvider<Ethereum>,
}

impl HttpLedger {
    /// Creates a client for the given RPC URL.
    pub fn new(url: &str) -> Result<Self> {
        let url = url.parse().map_err(|err| Error::Config(format!("invalid rpc url: {err}")))?;
        let client = RpcClient::builder().http(url);
        Ok(Self { provider: RootProvider::<Ethereum>::new(client) })
    }
}

#[async_trait]
impl LedgerClient for HttpLedger {
    async fn chain_id(&self) -> Result<u64> {
        self.provider.get_chain_id().await.map_err(|err| Error::Rpc(err.to_string()))
    }

    async fn get_nonce(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .await
            .map_err(|err| Error::Rpc(err.to_string()))
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.provider.get_balance(address).await.map_err(|err| Error::Rpc(err.to_string()))
    }

    async fn submit(&self, request: TransferRequest) -> Result<TxId> {
        let tx = TxLegacy {
            chain_id: Some(request.chain_id),
            nonce: request.nonce,
            gas_price: request.gas_price,
            gas_limit: request.gas_limit,
            to: TxKind::Call(request.receiver),
            value: request.amount,
            input: Bytes::new(),
        };

        let signer = PrivateKeySigner::from_bytes(&request.sender.private_key)
            .map_err(|err| Error::Submission(format!("bad sender key: {err}")))?;
        let signature = signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|err| Error::Submission(format!("signing failed: {err}")))?;
        let signed = tx.into_signed(signature);
        let raw: Bytes = signed.encoded_2718().into();
        let tx_hash = *signed.hash();

        let _ = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|err| Error::Submission(err.to_string()))?;

        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx: TxId, timeout: Duration) -> Result<ReceiptStatus> {
        let poll = async {
            loop {
                match self.provider.get_transaction_receipt(tx).await {
                    Ok(Some(receipt)) => {
                        return if receipt.status() {
                            Ok(ReceiptStatus::Success)
                        } else {
                            Ok(ReceiptStatus::Failed)
                        };
                    }
                    Ok(None) => sleep(Duration::from_secs(1)).await,
                    Err(err) => return Err(Error::Rpc(err.to_string())),
                }
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| Error::ReceiptTimeout { tx, timeout_secs: timeout.as_secs() })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_rpc_url() {
        match HttpLedger::new("not a url") {
            Err(Error::Config(_)) => {}
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }
}
