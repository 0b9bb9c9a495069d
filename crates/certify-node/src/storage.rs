//! RocksDB storage backend for the Certify node.
//!
//! Uniqueness of certificate ids and admin usernames is enforced with
//! pessimistic transactions: the key is locked with `get_for_update`,
//! checked, written and committed as one unit. Every commit is synced to
//! disk before returning.

use chrono::{DateTime, Utc};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, TransactionDB,
    TransactionDBOptions, TransactionOptions, WriteOptions,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

use certify_core::{AdminPrincipal, Certificate, CertificateDraft, CertificateId};
use certify_credentials::{CertificateStore, StoreError};

/// Column family names for different data types.
const CF_CERTIFICATES: &str = "certificates";
const CF_PRINCIPALS: &str = "principals";
const CF_SESSIONS: &str = "sessions";

/// A persisted admin session, keyed by the token digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// RocksDB-backed storage for the Certify node.
pub struct Storage {
    db: TransactionDB,
}

impl Storage {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|e| StoreError::Database(e.to_string()))?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_CERTIFICATES, Options::default()),
            ColumnFamilyDescriptor::new(CF_PRINCIPALS, Options::default()),
            ColumnFamilyDescriptor::new(CF_SESSIONS, Options::default()),
        ];

        let db: TransactionDB = TransactionDB::open_cf_descriptors(
            &opts,
            &TransactionDBOptions::default(),
            path,
            cf_descriptors,
        )
        .map_err(db_err)?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family '{}' not found", name)))
    }

    fn write_options() -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        opts
    }

    /// Atomically write `value` under `key` unless the key already exists.
    /// Returns `false` when the key was taken.
    fn insert_if_absent(
        &self,
        cf_name: &str,
        key: &[u8],
        value: &[u8],
    ) -> Result<bool, StoreError> {
        let cf = self.cf(cf_name)?;
        let txn = self
            .db
            .transaction_opt(&Self::write_options(), &TransactionOptions::default());

        if txn.get_for_update_cf(&cf, key, true).map_err(db_err)?.is_some() {
            txn.rollback().map_err(db_err)?;
            return Ok(false);
        }
        txn.put_cf(&cf, key, value).map_err(db_err)?;
        txn.commit().map_err(db_err)?;
        Ok(true)
    }

    /// Unconditional write.
    fn put_value(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let cf = self.cf(cf_name)?;
        let txn = self
            .db
            .transaction_opt(&Self::write_options(), &TransactionOptions::default());
        txn.put_cf(&cf, key, value).map_err(db_err)?;
        txn.commit().map_err(db_err)
    }

    fn get_value<V: DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<V>, StoreError> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, key).map_err(db_err)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn delete_value(&self, cf_name: &str, key: &[u8]) -> Result<(), StoreError> {
        let cf = self.cf(cf_name)?;
        let txn = self
            .db
            .transaction_opt(&Self::write_options(), &TransactionOptions::default());
        txn.delete_cf(&cf, key).map_err(db_err)?;
        txn.commit().map_err(db_err)
    }

    /// Store the admin principal if no principal with that username exists.
    /// Returns `true` if it was inserted.
    pub fn seed_principal(&self, principal: &AdminPrincipal) -> Result<bool, StoreError> {
        let value = encode(principal)?;
        self.insert_if_absent(CF_PRINCIPALS, principal.username.as_bytes(), &value)
    }

    /// Look up a principal by username.
    pub fn get_principal(&self, username: &str) -> Result<Option<AdminPrincipal>, StoreError> {
        self.get_value(CF_PRINCIPALS, username.as_bytes())
    }

    /// Persist a session under its token digest.
    pub fn put_session(&self, digest: &str, session: &SessionRecord) -> Result<(), StoreError> {
        self.put_value(CF_SESSIONS, digest.as_bytes(), &encode(session)?)
    }

    /// Fetch a session by token digest.
    pub fn get_session(&self, digest: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.get_value(CF_SESSIONS, digest.as_bytes())
    }

    /// Remove a session.
    pub fn delete_session(&self, digest: &str) -> Result<(), StoreError> {
        self.delete_value(CF_SESSIONS, digest.as_bytes())
    }

    /// Delete every session that expired at or before `now`, in one
    /// commit. Returns the number removed.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let cf = self.cf(CF_SESSIONS)?;
        let mut expired = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item.map_err(db_err)?;
            let record: SessionRecord = decode(&value)?;
            if record.expires_at <= now {
                expired.push(key);
            }
        }
        if expired.is_empty() {
            return Ok(0);
        }

        let txn = self
            .db
            .transaction_opt(&Self::write_options(), &TransactionOptions::default());
        for key in &expired {
            txn.delete_cf(&cf, key).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)?;
        Ok(expired.len())
    }
}

impl CertificateStore for Storage {
    fn put(&self, draft: CertificateDraft) -> Result<Certificate, StoreError> {
        let id = draft.id.clone();
        let certificate = draft.into_certificate(Utc::now());
        let value = encode(&certificate)?;

        if !self.insert_if_absent(CF_CERTIFICATES, id.as_bytes(), &value)? {
            return Err(StoreError::DuplicateId(id));
        }
        tracing::debug!(certificate_id = %id, "certificate persisted");
        Ok(certificate)
    }

    fn get(&self, id: &CertificateId) -> Result<Option<Certificate>, StoreError> {
        self.get_value(CF_CERTIFICATES, id.as_bytes())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let cf = self.cf(CF_CERTIFICATES)?;
        let mut count = 0;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item.map_err(db_err)?;
            count += 1;
        }
        Ok(count)
    }
}

fn db_err(e: rocksdb::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}
