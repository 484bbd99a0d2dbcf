//! Tag vendor directory
//!
//! The tag issuer owns the account of record. The orchestrator only
//! consults it on cache miss; once cached, the local balance is
//! authoritative until the entry expires.

use crate::{cache::TagCache, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use toll_model::{TagAccount, TagId, VehicleType};
use tracing::{debug, info};

/// Account lookup at the tag issuer
#[async_trait]
pub trait VendorDirectory: Send + Sync {
    /// Fetch the account for a tag. `Ok(None)` means the tag is
    /// unregistered; `Err` is an infrastructure failure and retryable.
    async fn fetch_account(&self, tag_id: &TagId) -> Result<Option<TagAccount>>;
}

/// In-memory vendor directory for demos and tests.
///
/// In open-world mode any unknown tag resolves to a fresh light-vehicle
/// account with the default starting balance, so simulated traffic
/// never dead-ends on registration.
pub struct StaticVendorDirectory {
    accounts: DashMap<TagId, TagAccount>,
    open_world: bool,
}

/// Starting balance handed to open-world accounts
const OPEN_WORLD_BALANCE: Decimal = dec!(500);

impl StaticVendorDirectory {
    /// Directory that only knows explicitly registered tags
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            open_world: false,
        }
    }

    /// Directory that fabricates accounts for unknown tags
    pub fn open_world() -> Self {
        Self {
            accounts: DashMap::new(),
            open_world: true,
        }
    }

    /// Register an account
    pub fn register(&self, account: TagAccount) {
        self.accounts.insert(account.tag_id.clone(), account);
    }

    /// Register a tag with just a balance (light vehicle, generated plate)
    pub fn register_with_balance(&self, tag_id: TagId, balance: Decimal) {
        let account = TagAccount {
            vehicle_number: format!("VEH-{}", tag_id),
            vehicle_type: VehicleType::Light,
            balance,
            current_trip: None,
            tag_id,
        };
        self.register(account);
    }
}

impl Default for StaticVendorDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VendorDirectory for StaticVendorDirectory {
    async fn fetch_account(&self, tag_id: &TagId) -> Result<Option<TagAccount>> {
        if let Some(account) = self.accounts.get(tag_id) {
            return Ok(Some(account.clone()));
        }
        if self.open_world {
            debug!(tag = %tag_id, "open-world account fabricated");
            return Ok(Some(TagAccount {
                tag_id: tag_id.clone(),
                vehicle_number: format!("VEH-{}", tag_id),
                vehicle_type: VehicleType::Light,
                balance: OPEN_WORLD_BALANCE,
                current_trip: None,
            }));
        }
        Ok(None)
    }
}

/// Refresh vendor-owned fields for every cached tag.
///
/// Balance and trip context stay local (the applier owns them); only
/// vehicle registration data is taken from the vendor. Re-putting the
/// entry extends its TTL, so tags seen recently stay warm. Returns the
/// number of accounts refreshed.
pub async fn refresh_cached_tags(
    vendor: &dyn VendorDirectory,
    cache: &TagCache,
) -> Result<usize> {
    let mut refreshed = 0;
    for tag_id in cache.cached_tags() {
        let Some(mut cached) = cache.get(&tag_id) else {
            continue;
        };
        if let Some(fresh) = vendor.fetch_account(&tag_id).await? {
            cached.vehicle_number = fresh.vehicle_number;
            cached.vehicle_type = fresh.vehicle_type;
            cache.put(cached);
            refreshed += 1;
        }
    }
    info!(count = refreshed, "tag cache refreshed from vendor");
    Ok(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    #[tokio::test]
    async fn test_unknown_tag_is_none_when_closed_world() {
        let vendor = StaticVendorDirectory::new();
        let account = vendor.fetch_account(&TagId::new("T404")).await.unwrap();
        assert!(account.is_none());
    }

    #[tokio::test]
    async fn test_open_world_fabricates_account() {
        let vendor = StaticVendorDirectory::open_world();
        let account = vendor
            .fetch_account(&TagId::new("T404"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.balance, dec!(500));
        assert_eq!(account.vehicle_type, VehicleType::Light);
    }

    #[tokio::test]
    async fn test_refresh_preserves_local_balance() {
        let vendor = StaticVendorDirectory::new();
        vendor.register_with_balance(TagId::new("T1"), dec!(999));

        let cache = TagCache::new(Duration::from_secs(300));
        cache.put(TagAccount {
            tag_id: TagId::new("T1"),
            vehicle_number: "OLD-PLATE".to_string(),
            vehicle_type: VehicleType::Light,
            balance: dec!(470),
            current_trip: None,
        });

        let refreshed = refresh_cached_tags(&vendor, &cache).await.unwrap();
        assert_eq!(refreshed, 1);

        let account = cache.get(&TagId::new("T1")).unwrap();
        assert_eq!(account.balance, dec!(470));
        assert_eq!(account.vehicle_number, "VEH-T1");
    }
}
