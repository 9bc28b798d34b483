//! Domain types for the one managed entity: a seed pack.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel for omitted free-text fields.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Approximate seed count on hand, ordered from least to most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuantityBucket {
    #[serde(rename = "Very Few")]
    VeryFew,
    Few,
    Medium,
    Lots,
    Bulk,
}

impl QuantityBucket {
    pub const ALL: [QuantityBucket; 5] = [
        QuantityBucket::VeryFew,
        QuantityBucket::Few,
        QuantityBucket::Medium,
        QuantityBucket::Lots,
        QuantityBucket::Bulk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityBucket::VeryFew => "Very Few",
            QuantityBucket::Few => "Few",
            QuantityBucket::Medium => "Medium",
            QuantityBucket::Lots => "Lots",
            QuantityBucket::Bulk => "Bulk",
        }
    }
}

impl fmt::Display for QuantityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantityBucket {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ParseEnumError {
                kind: "quantity",
                value: s.to_string(),
            })
    }
}

/// Fixed plant-type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlantType {
    Vegetable,
    Herb,
    Flower,
    Fruit,
    #[serde(rename = "Trees & Shrubs")]
    TreesAndShrubs,
    Other,
}

impl PlantType {
    pub const ALL: [PlantType; 6] = [
        PlantType::Vegetable,
        PlantType::Herb,
        PlantType::Flower,
        PlantType::Fruit,
        PlantType::TreesAndShrubs,
        PlantType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlantType::Vegetable => "Vegetable",
            PlantType::Herb => "Herb",
            PlantType::Flower => "Flower",
            PlantType::Fruit => "Fruit",
            PlantType::TreesAndShrubs => "Trees & Shrubs",
            PlantType::Other => "Other",
        }
    }
}

impl fmt::Display for PlantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlantType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ParseEnumError {
                kind: "plant type",
                value: s.to_string(),
            })
    }
}

/// One stored seed pack. The id is store-assigned, unique and immutable;
/// records are created and read, never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPack {
    pub id: i64,
    pub seed_name: String,
    pub variety: String,
    pub quantity: QuantityBucket,
    pub plant_type: PlantType,
    pub seed_source: String,
    pub date_acquired: NaiveDate,
}

/// Insertion payload. Omitted variety/source default to [`UNKNOWN`], an
/// omitted date to the date of entry; the id is never caller-supplied.
#[derive(Debug, Clone)]
pub struct NewSeedPack {
    pub seed_name: String,
    pub variety: Option<String>,
    pub quantity: QuantityBucket,
    pub plant_type: PlantType,
    pub seed_source: Option<String>,
    pub date_acquired: Option<NaiveDate>,
}

impl NewSeedPack {
    pub fn new(seed_name: impl Into<String>, quantity: QuantityBucket, plant_type: PlantType) -> Self {
        Self {
            seed_name: seed_name.into(),
            variety: None,
            quantity,
            plant_type,
            seed_source: None,
            date_acquired: None,
        }
    }
}

/// Optional browse filters, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct SeedFilter {
    pub plant_type: Option<PlantType>,
    pub quantity: Option<QuantityBucket>,
    pub seed_source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_buckets_are_ordered() {
        assert!(QuantityBucket::VeryFew < QuantityBucket::Few);
        assert!(QuantityBucket::Lots < QuantityBucket::Bulk);
    }

    #[test]
    fn quantity_round_trips_through_display() {
        for q in QuantityBucket::ALL {
            assert_eq!(q.as_str().parse::<QuantityBucket>(), Ok(q));
        }
    }

    #[test]
    fn plant_type_parses_case_insensitively() {
        assert_eq!("herb".parse::<PlantType>(), Ok(PlantType::Herb));
        assert_eq!("Trees & Shrubs".parse::<PlantType>(), Ok(PlantType::TreesAndShrubs));
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        assert!("Cactus".parse::<PlantType>().is_err());
        assert!("Heaps".parse::<QuantityBucket>().is_err());
    }
}
