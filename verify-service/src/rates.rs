//! Static toll rate table
//!
//! Rates are keyed by plaza, lane and vehicle class. Pricing happens at
//! the lane reader in production; the table here prices simulated reads
//! and backstops readers that publish a zero toll.

use dashmap::DashMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use toll_model::VehicleType;

/// Plaza/lane/class rate lookup
pub struct RateTable {
    rates: DashMap<String, Decimal>,
}

impl RateTable {
    /// Empty table
    pub fn new() -> Self {
        Self {
            rates: DashMap::new(),
        }
    }

    /// Table pre-loaded with the demo plaza rates
    pub fn with_defaults() -> Self {
        let table = Self::new();
        table.set("PLZ1", "L1", VehicleType::Light, dec!(30));
        table.set("PLZ1", "L1", VehicleType::Heavy, dec!(60));
        table.set("PLZ6", "L9", VehicleType::Light, dec!(50));
        table.set("PLZ6", "L9", VehicleType::Heavy, dec!(90));
        table
    }

    fn key(plaza_id: &str, lane_id: &str, vehicle_type: VehicleType) -> String {
        format!("{}:{}:{}", plaza_id, lane_id, vehicle_type.code())
    }

    /// Set the rate for a plaza/lane/class
    pub fn set(&self, plaza_id: &str, lane_id: &str, vehicle_type: VehicleType, rate: Decimal) {
        self.rates
            .insert(Self::key(plaza_id, lane_id, vehicle_type), rate);
    }

    /// Rate for a plaza/lane/class, if configured
    pub fn rate(&self, plaza_id: &str, lane_id: &str, vehicle_type: VehicleType) -> Option<Decimal> {
        self.rates
            .get(&Self::key(plaza_id, lane_id, vehicle_type))
            .map(|r| *r)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates_cover_demo_plazas() {
        let table = RateTable::with_defaults();
        assert_eq!(table.rate("PLZ1", "L1", VehicleType::Light), Some(dec!(30)));
        assert_eq!(table.rate("PLZ1", "L1", VehicleType::Heavy), Some(dec!(60)));
        assert_eq!(table.rate("PLZ6", "L9", VehicleType::Light), Some(dec!(50)));
        assert_eq!(table.rate("PLZ6", "L9", VehicleType::Heavy), Some(dec!(90)));
    }

    #[test]
    fn test_unknown_lane_has_no_rate() {
        let table = RateTable::with_defaults();
        assert_eq!(table.rate("PLZ2", "L1", VehicleType::Light), None);
    }

    #[test]
    fn test_set_overrides_existing_rate() {
        let table = RateTable::with_defaults();
        table.set("PLZ1", "L1", VehicleType::Light, dec!(35));
        assert_eq!(table.rate("PLZ1", "L1", VehicleType::Light), Some(dec!(35)));
    }
}
