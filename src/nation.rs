// =============================================================================
// CN DASHBOARD — nation.rs
// Snapshot records: nations, wars and the per-nation war count index
// =============================================================================
//
// Records arrive from the published statistics files as-is. Technology,
// infrastructure and land are kept as the raw published strings (they carry
// thousands separators) and parsed on demand.
// =============================================================================

use crate::constants::{open_defensive_slots, war_status_is_active};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parse a published numeric field such as "12,345.67".
/// Anything unparsable or non-finite is 0.
pub fn parse_game_number(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

// -----------------------------------------------------------------------------
// Nation
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nation {
    pub id: u64,
    pub name: String,
    pub ruler: String,
    pub alliance: String,
    pub alliance_id: u64, // 0 = unaligned
    pub strength: f64,
    pub technology: String,
    pub infrastructure: String,
    pub land: String,
    pub nuclear_weapons: u32,
    pub activity: String,
    pub government_type: String,
    pub in_war_mode: bool,
    pub rank: Option<u32>,
}

impl Nation {
    pub fn technology_value(&self) -> f64 {
        parse_game_number(&self.technology)
    }

    pub fn infrastructure_value(&self) -> f64 {
        parse_game_number(&self.infrastructure)
    }

    pub fn land_value(&self) -> f64 {
        parse_game_number(&self.land)
    }

    pub fn is_anarchy(&self) -> bool {
        self.government_type.trim().eq_ignore_ascii_case("anarchy")
    }

    pub fn is_unaligned(&self) -> bool {
        self.alliance_id == 0
    }
}

// -----------------------------------------------------------------------------
// War
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct War {
    pub war_id: u64,
    pub declaring_id: u64,
    pub receiving_id: u64,
    pub declaring_alliance_id: u64,
    pub receiving_alliance_id: u64,
    pub status: String,
}

impl War {
    pub fn is_active(&self) -> bool {
        war_status_is_active(&self.status)
    }
}

// -----------------------------------------------------------------------------
// WarCounts — active wars per nation, split by side
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SideCounts {
    attacking: u32,
    defending: u32,
}

#[derive(Debug, Clone, Default)]
pub struct WarCounts {
    counts: HashMap<u64, SideCounts>,
}

impl WarCounts {
    pub fn from_wars(wars: &[War]) -> Self {
        let mut counts: HashMap<u64, SideCounts> = HashMap::new();
        for war in wars.iter().filter(|w| w.is_active()) {
            counts.entry(war.declaring_id).or_default().attacking += 1;
            counts.entry(war.receiving_id).or_default().defending += 1;
        }
        WarCounts { counts }
    }

    pub fn attacking(&self, nation_id: u64) -> u32 {
        self.counts.get(&nation_id).map(|c| c.attacking).unwrap_or(0)
    }

    pub fn defending(&self, nation_id: u64) -> u32 {
        self.counts.get(&nation_id).map(|c| c.defending).unwrap_or(0)
    }

    pub fn open_slots(&self, nation_id: u64) -> u32 {
        open_defensive_slots(self.defending(nation_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn war(declaring_id: u64, receiving_id: u64, status: &str) -> War {
        War {
            war_id: declaring_id * 1000 + receiving_id,
            declaring_id,
            receiving_id,
            declaring_alliance_id: 1,
            receiving_alliance_id: 2,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_parse_game_number_separators() {
        assert_eq!(parse_game_number("12,345.50"), 12345.5);
        assert_eq!(parse_game_number(" 1 000 "), 1000.0);
        assert_eq!(parse_game_number("42"), 42.0);
    }

    #[test]
    fn test_parse_game_number_garbage_is_zero() {
        assert_eq!(parse_game_number(""), 0.0);
        assert_eq!(parse_game_number("n/a"), 0.0);
        assert_eq!(parse_game_number("NaN"), 0.0);
        assert_eq!(parse_game_number("inf"), 0.0);
    }

    #[test]
    fn test_anarchy_case_insensitive() {
        let mut n = Nation { government_type: "ANARCHY".into(), ..Default::default() };
        assert!(n.is_anarchy());
        n.government_type = "Democracy".into();
        assert!(!n.is_anarchy());
    }

    #[test]
    fn test_war_counts_skip_inactive() {
        let wars = vec![
            war(1, 10, "Active"),
            war(2, 10, "Ended"),
            war(3, 10, "EXPIRED"),
            war(4, 10, "Peace Offered"),
            war(1, 11, "active"),
        ];
        let counts = WarCounts::from_wars(&wars);
        assert_eq!(counts.defending(10), 2);
        assert_eq!(counts.attacking(1), 2);
        assert_eq!(counts.attacking(2), 0);
        assert_eq!(counts.defending(11), 1);
        assert_eq!(counts.open_slots(10), 1);
    }

    #[test]
    fn test_war_counts_unknown_nation_is_zero() {
        let counts = WarCounts::from_wars(&[]);
        assert_eq!(counts.attacking(99), 0);
        assert_eq!(counts.defending(99), 0);
        assert_eq!(counts.open_slots(99), 3);
    }

    #[test]
    fn test_open_slots_clamped_when_over_cap() {
        let wars: Vec<War> = (1..=4).map(|a| war(a, 50, "Active")).collect();
        let counts = WarCounts::from_wars(&wars);
        assert_eq!(counts.defending(50), 4);
        assert_eq!(counts.open_slots(50), 0);
    }
}
