//! Job categories.
//!
//! A [`JobType`] is a stable identifier for one kind of task. The core never
//! interprets it beyond keying its tables; resource semantics belong to the
//! job implementations registered with the dispatcher.

use serde::{Deserialize, Serialize};

/// A category of task an agent can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    // ---------------------------------------------------------------------
    // Destinations
    // ---------------------------------------------------------------------
    /// Inventory-capable blocks that accept deposited payloads. Not a task
    /// of its own: scanned so that depositing agents can find destinations.
    Storage,

    // ---------------------------------------------------------------------
    // Harvesters
    // ---------------------------------------------------------------------
    /// Harvest fully grown apricorns.
    ApricornHarvester,
    /// Harvest amethyst clusters.
    AmethystHarvester,
    /// Harvest ripe berries.
    BerryHarvester,
    /// Harvest mature crops.
    CropHarvester,
    /// Collect honey from full hives.
    HoneyCollector,
    /// Harvest grown mints.
    MintHarvester,
    /// Harvest mature nether wart.
    NetherwartHarvester,
    /// Harvest grown tumblestone.
    TumblestoneHarvester,
    /// Pick up loose items lying on the ground.
    GroundItemGatherer,

    // ---------------------------------------------------------------------
    // Tenders
    // ---------------------------------------------------------------------
    /// Water dry farmland.
    CropIrrigator,
    /// Put out fires.
    FireExtinguisher,
    /// Refuel furnaces.
    FuelGenerator,
    /// Refuel brewing stands.
    BrewingStandFuelGenerator,
    /// Tend to nearby agents or players.
    Healer,

    // ---------------------------------------------------------------------
    // Generators
    // ---------------------------------------------------------------------
    /// Produce fishing loot while idle.
    FishingLootGenerator,
    /// Fill cauldrons with lava.
    LavaGenerator,
    /// Fill cauldrons with water.
    WaterGenerator,
    /// Fill cauldrons with powder snow.
    SnowGenerator,
    /// Produce loot from underwater dives.
    DiveLooter,
    /// Produce loot from foraging pickups.
    PickUpLooter,
}

impl JobType {
    /// Every job type, in declaration order.
    pub const ALL: [Self; 21] = [
        Self::Storage,
        Self::ApricornHarvester,
        Self::AmethystHarvester,
        Self::BerryHarvester,
        Self::CropHarvester,
        Self::HoneyCollector,
        Self::MintHarvester,
        Self::NetherwartHarvester,
        Self::TumblestoneHarvester,
        Self::GroundItemGatherer,
        Self::CropIrrigator,
        Self::FireExtinguisher,
        Self::FuelGenerator,
        Self::BrewingStandFuelGenerator,
        Self::Healer,
        Self::FishingLootGenerator,
        Self::LavaGenerator,
        Self::WaterGenerator,
        Self::SnowGenerator,
        Self::DiveLooter,
        Self::PickUpLooter,
    ];

    /// The stable `snake_case` name used in configuration files and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::ApricornHarvester => "apricorn_harvester",
            Self::AmethystHarvester => "amethyst_harvester",
            Self::BerryHarvester => "berry_harvester",
            Self::CropHarvester => "crop_harvester",
            Self::HoneyCollector => "honey_collector",
            Self::MintHarvester => "mint_harvester",
            Self::NetherwartHarvester => "netherwart_harvester",
            Self::TumblestoneHarvester => "tumblestone_harvester",
            Self::GroundItemGatherer => "ground_item_gatherer",
            Self::CropIrrigator => "crop_irrigator",
            Self::FireExtinguisher => "fire_extinguisher",
            Self::FuelGenerator => "fuel_generator",
            Self::BrewingStandFuelGenerator => "brewing_stand_fuel_generator",
            Self::Healer => "healer",
            Self::FishingLootGenerator => "fishing_loot_generator",
            Self::LavaGenerator => "lava_generator",
            Self::WaterGenerator => "water_generator",
            Self::SnowGenerator => "snow_generator",
            Self::DiveLooter => "dive_looter",
            Self::PickUpLooter => "pick_up_looter",
        }
    }
}

impl core::fmt::Display for JobType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_sorted_and_unique() {
        let mut sorted = JobType::ALL.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), JobType::ALL.len());
        assert_eq!(sorted, JobType::ALL.to_vec());
    }

    #[test]
    fn serde_name_matches_as_str() {
        for job in JobType::ALL {
            let json = serde_json::to_string(&job).ok();
            assert_eq!(json, Some(format!("\"{}\"", job.as_str())));
        }
    }

    #[test]
    fn display_uses_config_name() {
        assert_eq!(JobType::BerryHarvester.to_string(), "berry_harvester");
    }
}
