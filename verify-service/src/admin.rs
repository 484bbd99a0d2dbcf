//! Operator/demo administration
//!
//! Thin surface over the vendor directory and the caches: seed demo
//! accounts, adjust balances, and manage the blacklist by hand.

use crate::{
    cache::{BlacklistCache, TagCache},
    vendor::StaticVendorDirectory,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use toll_model::TagId;
use tracing::info;

/// Seeds and tweaks demo state
pub struct DemoSeeder {
    vendor: Arc<StaticVendorDirectory>,
    tag_cache: Arc<TagCache>,
    blacklist: Arc<BlacklistCache>,
}

impl DemoSeeder {
    /// Wire up the seeder
    pub fn new(
        vendor: Arc<StaticVendorDirectory>,
        tag_cache: Arc<TagCache>,
        blacklist: Arc<BlacklistCache>,
    ) -> Self {
        Self {
            vendor,
            tag_cache,
            blacklist,
        }
    }

    /// Register a tag at the vendor with a starting balance
    pub fn seed_tag(&self, tag_id: TagId, balance: Decimal) {
        info!(tag = %tag_id, %balance, "demo tag seeded");
        self.vendor.register_with_balance(tag_id, balance);
    }

    /// Force a cached tag's balance (no-op if the tag is not cached)
    pub fn set_balance(&self, tag_id: &TagId, balance: Decimal) -> bool {
        self.tag_cache.modify(tag_id, |acct| acct.balance = balance)
    }

    /// Block a tag
    pub fn blacklist(&self, tag_id: TagId, reason: impl Into<String>) {
        self.blacklist.add(tag_id, reason);
    }

    /// Unblock a tag
    pub fn unblacklist(&self, tag_id: &TagId) {
        self.blacklist.remove(tag_id);
    }
}
