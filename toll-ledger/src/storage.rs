//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `transactions` - Toll transaction records (key: event_id)
//! - `indices` - Secondary index for by-tag scans (key: TAG:<tagId>:<eventId>)

use crate::{
    error::Result,
    types::TollTransaction,
    Config,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use toll_model::{EventId, TagId};

const CF_TRANSACTIONS: &str = "transactions";
const CF_INDICES: &str = "indices";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_transactions()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened toll ledger at {:?}", path);

        Ok(Self { db })
    }

    fn cf_options_transactions() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| crate::Error::Storage(format!("Column family {} not found", name)))
    }

    fn index_key(tag_id: &TagId, event_id: &EventId) -> Vec<u8> {
        format!("TAG:{}:{}", tag_id, event_id).into_bytes()
    }

    /// Whether a record exists for this event id
    pub fn exists(&self, event_id: &EventId) -> Result<bool> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        Ok(self.db.get_cf(cf, event_id.as_str().as_bytes())?.is_some())
    }

    /// Get a transaction record
    pub fn get(&self, event_id: &EventId) -> Result<Option<TollTransaction>> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        match self.db.get_cf(cf, event_id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write a transaction record and its by-tag index in one batch
    pub fn put(&self, tx: &TollTransaction) -> Result<()> {
        let cf_tx = self.cf_handle(CF_TRANSACTIONS)?;
        let cf_idx = self.cf_handle(CF_INDICES)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_tx, tx.event_id.as_str().as_bytes(), bincode::serialize(tx)?);
        batch.put_cf(
            cf_idx,
            Self::index_key(&tx.tag_id, &tx.event_id),
            tx.event_id.as_str().as_bytes(),
        );

        self.db.write(batch)?;
        Ok(())
    }

    /// Scan all transactions for a tag, in key order
    pub fn scan_by_tag(&self, tag_id: &TagId) -> Result<Vec<TollTransaction>> {
        let cf_idx = self.cf_handle(CF_INDICES)?;
        let prefix = format!("TAG:{}:", tag_id);

        let mut out = Vec::new();
        let iter = self.db.iterator_cf(
            cf_idx,
            IteratorMode::From(prefix.as_bytes(), rocksdb::Direction::Forward),
        );
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let event_id = EventId::new(String::from_utf8_lossy(&value).to_string());
            if let Some(tx) = self.get(&event_id)? {
                out.push(tx);
            }
        }
        Ok(out)
    }
}
