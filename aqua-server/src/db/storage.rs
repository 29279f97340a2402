//! redb-based storage layer
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `clients` | `client_id` | `ClientAccount` | Client accounts |
//! | `client_emails` | lower-cased email | `client_id` | Email lookup index |
//! | `orders` | `order_id` | `Order` | Orders |
//! | `client_orders` | `(client_id, order_id)` | `()` | Per-client order index |
//! | `settlements` | idempotency key | `SettlementRecord` | Applied ledger mutations |
//! | `payments` | transaction id | `PaymentRecord` | Gateway top-ups |
//! | `saved_cards` | `client_id` | `SavedCard` | Tokenized cards |
//!
//! Every ledger mutation and order transition runs inside one write
//! transaction. redb allows a single writer at a time, so read-modify-write
//! on a client record cannot interleave with another writer.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::de::DeserializeOwned;
use shared::models::ClientAccount;
use shared::order::Order;
use shared::types::Id;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::models::{PaymentRecord, SavedCard, SettlementRecord};

/// Client accounts: key = client_id, value = JSON-serialized ClientAccount
const CLIENTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("clients");

/// Email index: key = lower-cased email, value = client_id
const CLIENT_EMAILS_TABLE: TableDefinition<&str, i64> = TableDefinition::new("client_emails");

/// Orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// Per-client order index: key = (client_id, order_id), value = empty
const CLIENT_ORDERS_TABLE: TableDefinition<(i64, i64), ()> = TableDefinition::new("client_orders");

/// Applied settlements: key = idempotency key, value = JSON-serialized SettlementRecord
const SETTLEMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("settlements");

/// Payments: key = transaction id, value = JSON-serialized PaymentRecord
const PAYMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("payments");

/// Saved cards: key = client_id, value = JSON-serialized SavedCard
const SAVED_CARDS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("saved_cards");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Email already registered to another client: {0}")]
    EmailTaken(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Storage backed by redb
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and throwaway runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CLIENTS_TABLE)?;
            let _ = write_txn.open_table(CLIENT_EMAILS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(CLIENT_ORDERS_TABLE)?;
            let _ = write_txn.open_table(SETTLEMENTS_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(SAVED_CARDS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Clients ==========

    pub fn get_client(&self, client_id: Id) -> StorageResult<Option<ClientAccount>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CLIENTS_TABLE)?;
        let client = table.get(client_id)?.map(|v| decode(v.value())).transpose()?;
        Ok(client)
    }

    pub fn get_client_txn(
        &self,
        txn: &WriteTransaction,
        client_id: Id,
    ) -> StorageResult<Option<ClientAccount>> {
        let table = txn.open_table(CLIENTS_TABLE)?;
        let client = table.get(client_id)?.map(|v| decode(v.value())).transpose()?;
        Ok(client)
    }

    /// Look up a client by (already normalized) email
    pub fn find_client_by_email(&self, mail: &str) -> StorageResult<Option<ClientAccount>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(CLIENT_EMAILS_TABLE)?;
        let Some(client_id) = index.get(mail)?.map(|g| g.value()) else {
            return Ok(None);
        };
        let table = read_txn.open_table(CLIENTS_TABLE)?;
        let client = table.get(client_id)?.map(|v| decode(v.value())).transpose()?;
        Ok(client)
    }

    pub fn find_client_by_email_txn(
        &self,
        txn: &WriteTransaction,
        mail: &str,
    ) -> StorageResult<Option<ClientAccount>> {
        let client_id = {
            let index = txn.open_table(CLIENT_EMAILS_TABLE)?;
            index.get(mail)?.map(|g| g.value())
        };
        match client_id {
            Some(id) => self.get_client_txn(txn, id),
            None => Ok(None),
        }
    }

    /// Insert or replace a client and keep the email index current
    pub fn put_client(&self, txn: &WriteTransaction, client: &ClientAccount) -> StorageResult<()> {
        {
            let mut index = txn.open_table(CLIENT_EMAILS_TABLE)?;
            let owner = index.get(client.mail.as_str())?.map(|g| g.value());
            match owner {
                Some(id) if id != client.id => {
                    return Err(StorageError::EmailTaken(client.mail.clone()));
                }
                Some(_) => {}
                None => {
                    index.insert(client.mail.as_str(), client.id)?;
                }
            }
        }
        let mut table = txn.open_table(CLIENTS_TABLE)?;
        let value = serde_json::to_vec(client)?;
        table.insert(client.id, value.as_slice())?;
        Ok(())
    }

    // ========== Orders ==========

    pub fn get_order(&self, order_id: Id) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let order = table.get(order_id)?.map(|v| decode(v.value())).transpose()?;
        Ok(order)
    }

    pub fn get_order_txn(&self, txn: &WriteTransaction, order_id: Id) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let order = table.get(order_id)?.map(|v| decode(v.value())).transpose()?;
        Ok(order)
    }

    /// Insert or replace an order and index it under its client
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.id, value.as_slice())?;
        }
        let mut index = txn.open_table(CLIENT_ORDERS_TABLE)?;
        index.insert((order.client, order.id), ())?;
        Ok(())
    }

    /// All orders of a client, newest first
    pub fn client_orders(&self, client_id: Id) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(CLIENT_ORDERS_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for entry in index.range((client_id, i64::MIN)..=(client_id, i64::MAX))?.rev() {
            let (key, _) = entry?;
            let (_, order_id) = key.value();
            if let Some(v) = orders_table.get(order_id)? {
                orders.push(decode::<Order>(v.value())?);
            }
        }
        Ok(orders)
    }

    /// All orders of a client, newest first (within transaction)
    pub fn client_orders_txn(&self, txn: &WriteTransaction, client_id: Id) -> StorageResult<Vec<Order>> {
        let order_ids: Vec<i64> = {
            let index = txn.open_table(CLIENT_ORDERS_TABLE)?;
            let mut ids = Vec::new();
            for entry in index.range((client_id, i64::MIN)..=(client_id, i64::MAX))?.rev() {
                let (key, _) = entry?;
                ids.push(key.value().1);
            }
            ids
        };

        let table = txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::with_capacity(order_ids.len());
        for order_id in order_ids {
            if let Some(v) = table.get(order_id)? {
                orders.push(decode::<Order>(v.value())?);
            }
        }
        Ok(orders)
    }

    // ========== Settlements (idempotency) ==========

    pub fn get_settlement(&self, key: &str) -> StorageResult<Option<SettlementRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTLEMENTS_TABLE)?;
        let record = table.get(key)?.map(|v| decode(v.value())).transpose()?;
        Ok(record)
    }

    pub fn get_settlement_txn(
        &self,
        txn: &WriteTransaction,
        key: &str,
    ) -> StorageResult<Option<SettlementRecord>> {
        let table = txn.open_table(SETTLEMENTS_TABLE)?;
        let record = table.get(key)?.map(|v| decode(v.value())).transpose()?;
        Ok(record)
    }

    pub fn put_settlement(&self, txn: &WriteTransaction, record: &SettlementRecord) -> StorageResult<()> {
        let mut table = txn.open_table(SETTLEMENTS_TABLE)?;
        let value = serde_json::to_vec(record)?;
        table.insert(record.key.as_str(), value.as_slice())?;
        Ok(())
    }

    // ========== Payments ==========

    pub fn get_payment(&self, transaction_id: &str) -> StorageResult<Option<PaymentRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        let record = table.get(transaction_id)?.map(|v| decode(v.value())).transpose()?;
        Ok(record)
    }

    pub fn get_payment_txn(
        &self,
        txn: &WriteTransaction,
        transaction_id: &str,
    ) -> StorageResult<Option<PaymentRecord>> {
        let table = txn.open_table(PAYMENTS_TABLE)?;
        let record = table.get(transaction_id)?.map(|v| decode(v.value())).transpose()?;
        Ok(record)
    }

    pub fn put_payment(&self, txn: &WriteTransaction, record: &PaymentRecord) -> StorageResult<()> {
        let mut table = txn.open_table(PAYMENTS_TABLE)?;
        let value = serde_json::to_vec(record)?;
        table.insert(record.transaction_id.as_str(), value.as_slice())?;
        Ok(())
    }

    // ========== Saved cards ==========

    pub fn get_saved_card(&self, client_id: Id) -> StorageResult<Option<SavedCard>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SAVED_CARDS_TABLE)?;
        let card = table.get(client_id)?.map(|v| decode(v.value())).transpose()?;
        Ok(card)
    }

    pub fn put_saved_card(&self, txn: &WriteTransaction, card: &SavedCard) -> StorageResult<()> {
        let mut table = txn.open_table(SAVED_CARDS_TABLE)?;
        let value = serde_json::to_vec(card)?;
        table.insert(card.client_id, value.as_slice())?;
        Ok(())
    }

    /// Remove a saved card, returning whether one existed
    pub fn remove_saved_card(&self, txn: &WriteTransaction, client_id: Id) -> StorageResult<bool> {
        let mut table = txn.open_table(SAVED_CARDS_TABLE)?;
        let removed = table.remove(client_id)?.is_some();
        Ok(removed)
    }
}
