//! Test account pool: generation, persistence, and the sender/receiver split.

use std::fs;
use std::path::Path;

use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Account with address and private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    /// Account address.
    pub address: Address,
    /// Account private key.
    pub private_key: B256,
}

impl Account {
    /// Creates a new account by deriving the address from the private key.
    pub fn from_private_key(private_key: B256) -> Self {
        let signer = PrivateKeySigner::from_bytes(&private_key).expect("valid private key");
        Self { address: signer.address(), private_key }
    }

    /// Parses an externally supplied private key, rejecting invalid scalars.
    pub fn try_from_private_key(private_key: B256) -> Result<Self> {
        let signer = PrivateKeySigner::from_bytes(&private_key)
            .map_err(|err| Error::Config(format!("invalid private key: {err}")))?;
        Ok(Self { address: signer.address(), private_key })
    }

    /// Generates a fresh account with a random private key.
    pub fn generate() -> Self {
        // Rejection-sample until the scalar is a valid secp256k1 key.
        loop {
            let mut bytes = [0u8; 32];
            rand::rng().fill_bytes(&mut bytes);
            let private_key = B256::from(bytes);
            if let Ok(signer) = PrivateKeySigner::from_bytes(&private_key) {
                return Self { address: signer.address(), private_key };
            }
        }
    }
}

/// Cache-file record for one account.
#[derive(Debug, Serialize, Deserialize)]
struct AccountRecord {
    index: usize,
    address: Address,
    private_key: B256,
}

/// Fixed-size pool of generated accounts.
///
/// The pool is split by convention: indices `[0, n/2)` are transfer senders,
/// `[n/2, n)` are receivers. Accounts are immutable once created.
#[derive(Debug, Clone)]
pub struct AccountPool {
    accounts: Vec<Account>,
}

impl AccountPool {
    /// Generates `n` fresh, independent accounts.
    pub fn create(n: usize) -> Self {
        let mut accounts = Vec::with_capacity(n);
        for i in 0..n {
            accounts.push(Account::generate());
            if (i + 1) % 500 == 0 {
                tracing::info!(created = i + 1, total = n, "generating accounts");
            }
        }
        Self { accounts }
    }

    /// Writes the full set to `path` as ordered JSON records.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let records: Vec<AccountRecord> = self
            .accounts
            .iter()
            .enumerate()
            .map(|(index, account)| AccountRecord {
                index,
                address: account.address,
                private_key: account.private_key,
            })
            .collect();
        fs::write(path, serde_json::to_string_pretty(&records)?)?;
        Ok(())
    }

    /// Reloads a previously persisted set.
    ///
    /// Fails with [`Error::SizeMismatch`] when the stored set's length does
    /// not equal `expected`. Callers should treat that as "no valid cache"
    /// and fall back to [`AccountPool::create`].
    pub fn reload(path: &Path, expected: usize) -> Result<Self> {
        let records: Vec<AccountRecord> = serde_json::from_str(&fs::read_to_string(path)?)?;
        if records.len() != expected {
            return Err(Error::SizeMismatch { expected, found: records.len() });
        }
        let accounts =
            records.iter().map(|record| Account::from_private_key(record.private_key)).collect();
        Ok(Self { accounts })
    }

    /// Reloads the cached pool, generating (and persisting) a fresh one when
    /// the cache is absent, unreadable, or the wrong size.
    pub fn load_or_create(path: &Path, n: usize) -> Result<Self> {
        match Self::reload(path, n) {
            Ok(pool) => {
                tracing::info!(count = n, path = %path.display(), "loaded cached accounts");
                Ok(pool)
            }
            Err(err) => {
                tracing::info!(%err, "account cache unusable, generating a fresh pool");
                let pool = Self::create(n);
                pool.persist(path)?;
                Ok(pool)
            }
        }
    }

    /// All pooled accounts in order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Number of pooled accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the pool holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// First half of the pool: transfer senders.
    pub fn senders(&self) -> &[Account] {
        &self.accounts[..self.accounts.len() / 2]
    }

    /// Second half of the pool: transfer receivers.
    pub fn receivers(&self) -> &[Account] {
        &self.accounts[self.accounts.len() / 2..]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_accounts_are_unique() {
        let pool = AccountPool::create(20);
        let addresses: HashSet<Address> = pool.accounts().iter().map(|a| a.address).collect();
        assert_eq!(addresses.len(), 20);
    }

    #[test]
    fn split_halves_are_disjoint() {
        let pool = AccountPool::create(10);
        assert_eq!(pool.senders().len(), 5);
        assert_eq!(pool.receivers().len(), 5);

        let senders: HashSet<Address> = pool.senders().iter().map(|a| a.address).collect();
        for receiver in pool.receivers() {
            assert!(!senders.contains(&receiver.address));
        }
    }

    #[test]
    fn persist_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let pool = AccountPool::create(8);
        pool.persist(&path).unwrap();
        let reloaded = AccountPool::reload(&path, 8).unwrap();

        assert_eq!(pool.accounts(), reloaded.accounts());
    }

    #[test]
    fn reload_rejects_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        AccountPool::create(4).persist(&path).unwrap();

        match AccountPool::reload(&path, 6) {
            Err(Error::SizeMismatch { expected, found }) => {
                assert_eq!(expected, 6);
                assert_eq!(found, 4);
            }
            other => panic!("expected SizeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn load_or_create_falls_back_on_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        AccountPool::create(4).persist(&path).unwrap();

        let pool = AccountPool::load_or_create(&path, 6).unwrap();
        assert_eq!(pool.len(), 6);
        // The fresh pool replaced the undersized cache on disk.
        assert_eq!(AccountPool::reload(&path, 6).unwrap().accounts(), pool.accounts());
    }
}
