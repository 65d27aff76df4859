//! `RocksDB` storage implementation.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use gliter_ledger_core::{
    Balance, PaymentId, Transaction, TransactionId, TransactionKind, TransactionStatus, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{PaymentOutcome, Settlement, Store};

/// Number of lock stripes guarding balance read-modify-writes.
const LOCK_STRIPES: usize = 64;

/// RocksDB-backed storage implementation.
///
/// Compound operations serialize per user through a lock stripe picked by
/// the user id, then commit all writes in one `WriteBatch`. The stripe
/// closes the check-then-act race between concurrent spends and between a
/// spend and a settlement for the same user; the batch makes the balance
/// write and the transaction write indivisible.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: Vec<Mutex<()>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// The lock stripe guarding a user's balance.
    fn user_lock(&self, user_id: &UserId) -> &Mutex<()> {
        let idx = user_id
            .as_bytes()
            .iter()
            .fold(0usize, |acc, b| acc.wrapping_mul(31) ^ usize::from(*b));
        &self.locks[idx % LOCK_STRIPES]
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Resolve a 16-byte index value to its transaction.
    fn transaction_from_index(&self, data: &[u8]) -> Result<Option<Transaction>> {
        if data.len() != 16 {
            return Err(StoreError::Database(format!(
                "malformed transaction index value ({} bytes)",
                data.len()
            )));
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(data);
        let tx_id = TransactionId::from_bytes(bytes)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        self.get_transaction(&tx_id)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Balance Operations
    // =========================================================================

    fn get_balance(&self, user_id: &UserId) -> Result<Option<Balance>> {
        let cf = self.cf(cf::BALANCES)?;
        let key = keys::balance_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_balance(&self, balance: &Balance) -> Result<()> {
        let cf = self.cf(cf::BALANCES)?;
        let key = keys::balance_key(&balance.user_id);
        let value = Self::serialize(balance)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        let key = keys::transaction_key(transaction_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_transaction_by_payment(&self, payment_id: &PaymentId) -> Result<Option<Transaction>> {
        let cf = self.cf(cf::TRANSACTIONS_BY_PAYMENT)?;
        let key = keys::payment_key(payment_id);

        match self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
        {
            Some(data) => self.transaction_from_index(&data),
            None => Ok(None),
        }
    }

    fn find_transaction_by_reference(
        &self,
        external_reference: &str,
    ) -> Result<Option<Transaction>> {
        let cf = self.cf(cf::TRANSACTIONS_BY_REFERENCE)?;
        let key = keys::reference_key(external_reference);

        match self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
        {
            Some(data) => self.transaction_from_index(&data),
            None => Ok(None),
        }
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // ULIDs order the index chronologically; collect and reverse for
        // newest first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }

            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn record_pending_purchase(&self, transaction: &Transaction) -> Result<()> {
        let payment_id =
            transaction
                .payment_id
                .as_ref()
                .ok_or_else(|| StoreError::MissingPaymentRef {
                    transaction_id: transaction.id.to_string(),
                })?;
        let external_reference = transaction.external_reference.as_deref().ok_or_else(|| {
            StoreError::MissingPaymentRef {
                transaction_id: transaction.id.to_string(),
            }
        })?;

        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let cf_by_payment = self.cf(cf::TRANSACTIONS_BY_PAYMENT)?;
        let cf_by_reference = self.cf(cf::TRANSACTIONS_BY_REFERENCE)?;

        let tx_key = keys::transaction_key(&transaction.id);
        let user_tx_key = keys::user_transaction_key(&transaction.user_id, &transaction.id);
        let payment_key = keys::payment_key(payment_id);
        let reference_key = keys::reference_key(external_reference);
        let value = Self::serialize(transaction)?;
        let tx_id_bytes = transaction.id.to_bytes();

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_tx, &tx_key, &value);
        batch.put_cf(&cf_by_user, &user_tx_key, []);
        batch.put_cf(&cf_by_payment, &payment_key, tx_id_bytes);
        batch.put_cf(&cf_by_reference, &reference_key, tx_id_bytes);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn settle_payment(
        &self,
        external_reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<Settlement> {
        let Some(found) = self.find_transaction_by_reference(external_reference)? else {
            return Ok(Settlement::Unknown);
        };

        let _guard = self
            .user_lock(&found.user_id)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Re-read under the lock; a concurrent callback for the same
        // payment may have settled it between lookup and lock.
        let Some(mut tx) = self.get_transaction(&found.id)? else {
            return Ok(Settlement::Unknown);
        };
        if tx.status != TransactionStatus::Pending {
            return Ok(Settlement::AlreadySettled);
        }

        match outcome {
            PaymentOutcome::Approved => {
                let mut balance = self
                    .get_balance(&tx.user_id)?
                    .unwrap_or_else(|| Balance::new(tx.user_id));

                balance.balance += tx.amount;
                balance.total_purchased += tx.amount;
                balance.last_updated = chrono::Utc::now();
                tx.status = TransactionStatus::Completed;

                let cf_balances = self.cf(cf::BALANCES)?;
                let cf_tx = self.cf(cf::TRANSACTIONS)?;

                let mut batch = WriteBatch::default();
                batch.put_cf(
                    &cf_balances,
                    keys::balance_key(&tx.user_id),
                    Self::serialize(&balance)?,
                );
                batch.put_cf(&cf_tx, keys::transaction_key(&tx.id), Self::serialize(&tx)?);

                self.db
                    .write(batch)
                    .map_err(|e| StoreError::Database(e.to_string()))?;

                tracing::info!(
                    user_id = %tx.user_id,
                    transaction_id = %tx.id,
                    credited = %tx.amount,
                    new_balance = %balance.balance,
                    "Purchase settled"
                );

                Ok(Settlement::Credited {
                    new_balance: balance.balance,
                })
            }
            PaymentOutcome::Rejected => {
                tx.status = TransactionStatus::Failed;

                let cf_tx = self.cf(cf::TRANSACTIONS)?;
                self.db
                    .put_cf(&cf_tx, keys::transaction_key(&tx.id), Self::serialize(&tx)?)
                    .map_err(|e| StoreError::Database(e.to_string()))?;

                tracing::info!(
                    user_id = %tx.user_id,
                    transaction_id = %tx.id,
                    "Purchase marked failed"
                );

                Ok(Settlement::MarkedFailed)
            }
        }
    }

    fn spend(&self, user_id: &UserId, amount: i64, transaction: &Transaction) -> Result<i64> {
        let _guard = self
            .user_lock(user_id)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut balance = self
            .get_balance(user_id)?
            .unwrap_or_else(|| Balance::new(*user_id));

        if balance.balance < amount {
            return Err(StoreError::InsufficientCredits {
                balance: balance.balance,
                required: amount,
            });
        }

        balance.balance -= amount;
        balance.total_spent += amount;
        balance.last_updated = chrono::Utc::now();

        let cf_balances = self.cf(cf::BALANCES)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_balances,
            keys::balance_key(user_id),
            Self::serialize(&balance)?,
        );
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(&transaction.id),
            Self::serialize(transaction)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_transaction_key(user_id, &transaction.id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(balance.balance)
    }

    fn add_credits(&self, user_id: &UserId, amount: i64, transaction: &Transaction) -> Result<i64> {
        let _guard = self
            .user_lock(user_id)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut balance = self
            .get_balance(user_id)?
            .unwrap_or_else(|| Balance::new(*user_id));

        balance.balance += amount;
        // Bonus and refund grants do not count toward total_purchased;
        // only settled purchases do, and those go through settle_payment.
        if transaction.kind == TransactionKind::Purchase {
            balance.total_purchased += amount;
        }
        balance.last_updated = chrono::Utc::now();

        let cf_balances = self.cf(cf::BALANCES)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_balances,
            keys::balance_key(user_id),
            Self::serialize(&balance)?,
        );
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(&transaction.id),
            Self::serialize(transaction)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_transaction_key(user_id, &transaction.id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(balance.balance)
    }
}
