// =============================================================================
// CN DASHBOARD — stagger.rs
// Stagger eligibility engine
// =============================================================================
//
// For two alliances, pairs every eligible defender with the attackers that
// may legally declare on it:
//
//   ratio      = effective_attacker_ns / defender_ns
//   band       = [0.75 * defender_ns, 1.33 * defender_ns]
//   reduction  = infrastructure * 3 + land * 1.5
//
// An attacker qualifies when it sits within RANK_WINDOW of the defender
// (when both ranks are known) and can sell down into the band. Evaluation
// errors for a single attacker only drop that attacker.
//
// Pure computation: no I/O, no logging, no shared state.
// =============================================================================

use crate::constants::{
    open_defensive_slots, INFRA_NS_PER_UNIT, LAND_NS_PER_UNIT, RANK_WINDOW, STAGGER_MAX_RATIO,
    STAGGER_MIN_RATIO,
};
use crate::nation::{Nation, War, WarCounts};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StaggerError {
    #[error("attacking and defending alliance are the same ({0})")]
    SameAlliance(u64),
    #[error("military NS must be a finite number (got {0})")]
    InvalidMilitaryNs(f64),
    #[error("snapshot contains nation {0} more than once")]
    DuplicateNation(u64),
    #[error("nation {0} has a non-finite strength")]
    NonFiniteStrength(u64),
    #[error("defending nation {0} has no positive strength")]
    NonPositiveDefenderStrength(u64),
}

// -----------------------------------------------------------------------------
// Options
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaggerOptions {
    pub hide_anarchy: bool,
    pub hide_peace_mode: bool,
    pub hide_non_priority: bool,
    pub include_full_targets: bool,
    pub sell_down_enabled: bool,
    #[serde(rename = "militaryNS")]
    pub military_ns: f64,
}

impl StaggerOptions {
    /// NS subtracted from an attacker before the ratio is taken.
    fn ratio_deduction(&self) -> f64 {
        if self.sell_down_enabled && self.military_ns > 0.0 {
            self.military_ns
        } else {
            0.0
        }
    }
}

// -----------------------------------------------------------------------------
// Output
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefendingNation {
    pub id: u64,
    pub name: String,
    pub ruler: String,
    pub alliance: String,
    pub alliance_id: u64,
    pub strength: f64,
    pub technology: f64,
    pub activity: String,
    pub in_war_mode: bool,
    pub government_type: String,
    pub open_war_slots: u32,
    pub current_wars: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleAttacker {
    pub id: u64,
    pub name: String,
    pub ruler: String,
    pub alliance: String,
    pub alliance_id: u64,
    pub strength: f64,
    pub technology: f64,
    pub nuclear_weapons: u32,
    pub activity: String,
    pub in_war_mode: bool,
    pub government_type: String,
    pub current_wars: u32, // offensive wars already declared
    pub strength_ratio: f64,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaggerEligibility {
    pub defending_nation: DefendingNation,
    pub eligible_attackers: Vec<EligibleAttacker>,
}

// -----------------------------------------------------------------------------
// Sell-down feasibility
// -----------------------------------------------------------------------------

/// Whether `attacker`, after dropping `military_ns` and selling off up to all
/// of its infrastructure and land, can land inside the stagger band of a
/// defender with `defender_strength`.
pub fn can_sell_into_range(
    attacker: &Nation,
    defender_strength: f64,
    military_ns: f64,
) -> Result<bool, StaggerError> {
    if !attacker.strength.is_finite() {
        return Err(StaggerError::NonFiniteStrength(attacker.id));
    }
    if !military_ns.is_finite() {
        return Err(StaggerError::InvalidMilitaryNs(military_ns));
    }
    // a negative deduction never qualifies
    if military_ns < 0.0 {
        return Ok(false);
    }

    let max_reduction = max_reduction(attacker);
    let effective_ns = attacker.strength - military_ns;
    let min_band = STAGGER_MIN_RATIO * defender_strength;
    let max_band = STAGGER_MAX_RATIO * defender_strength;

    let feasible = if effective_ns >= min_band && effective_ns <= max_band {
        true
    } else if effective_ns > max_band {
        effective_ns - max_band <= max_reduction
    } else {
        min_band - effective_ns <= max_reduction
    };
    Ok(feasible)
}

fn max_reduction(nation: &Nation) -> f64 {
    nation.infrastructure_value() * INFRA_NS_PER_UNIT + nation.land_value() * LAND_NS_PER_UNIT
}

fn within_rank_window(attacker: &Nation, defender: &Nation) -> bool {
    match (attacker.rank, defender.rank) {
        (Some(a), Some(d)) => a.abs_diff(d) <= RANK_WINDOW,
        _ => true,
    }
}

/// Strength ratio of an attacker that passes every filter, `None` otherwise.
fn evaluate_attacker(
    attacker: &Nation,
    defender: &Nation,
    options: &StaggerOptions,
) -> Result<Option<f64>, StaggerError> {
    if !defender.strength.is_finite() {
        return Err(StaggerError::NonFiniteStrength(defender.id));
    }
    if defender.strength <= 0.0 {
        return Err(StaggerError::NonPositiveDefenderStrength(defender.id));
    }

    let effective_strength = attacker.strength - options.ratio_deduction();
    let ratio = effective_strength / defender.strength;

    if !within_rank_window(attacker, defender) {
        return Ok(None);
    }
    if !can_sell_into_range(attacker, defender.strength, options.military_ns)? {
        return Ok(None);
    }
    if options.hide_anarchy && attacker.is_anarchy() {
        return Ok(None);
    }
    if options.hide_peace_mode && !attacker.in_war_mode {
        return Ok(None);
    }
    Ok(Some(ratio))
}

fn is_priority(defender: &Nation, open_war_slots: u32, current_wars: u32) -> bool {
    defender.is_anarchy() || (open_war_slots > 0 && current_wars > 0)
}

// -----------------------------------------------------------------------------
// Engine
// -----------------------------------------------------------------------------

pub fn compute_eligibility(
    attacking_alliance_id: u64,
    defending_alliance_id: u64,
    nations: &[Nation],
    wars: &[War],
    options: &StaggerOptions,
) -> Result<Vec<StaggerEligibility>, StaggerError> {
    if attacking_alliance_id == defending_alliance_id {
        return Err(StaggerError::SameAlliance(attacking_alliance_id));
    }
    if !options.military_ns.is_finite() {
        return Err(StaggerError::InvalidMilitaryNs(options.military_ns));
    }

    let mut seen = HashSet::with_capacity(nations.len());
    for nation in nations {
        if !seen.insert(nation.id) {
            return Err(StaggerError::DuplicateNation(nation.id));
        }
    }

    let attackers: Vec<&Nation> = nations
        .iter()
        .filter(|n| n.alliance_id == attacking_alliance_id)
        .collect();
    let defenders = nations
        .iter()
        .filter(|n| n.alliance_id == defending_alliance_id);
    let counts = WarCounts::from_wars(wars);

    let mut results = Vec::new();
    for defender in defenders {
        let current_wars = counts.defending(defender.id);
        let open_war_slots = open_defensive_slots(current_wars);
        if open_war_slots == 0 && !options.include_full_targets {
            continue;
        }

        let mut eligible: Vec<EligibleAttacker> = attackers
            .iter()
            .filter_map(|attacker| {
                // an evaluation error only disqualifies this attacker
                let ratio = evaluate_attacker(attacker, defender, options).ok()??;
                Some(to_eligible_attacker(attacker, ratio, counts.attacking(attacker.id)))
            })
            .collect();
        eligible.sort_by(|a, b| b.strength.total_cmp(&a.strength));

        if options.hide_non_priority && !is_priority(defender, open_war_slots, current_wars) {
            continue;
        }
        if eligible.is_empty() {
            continue;
        }

        results.push(StaggerEligibility {
            defending_nation: to_defending_nation(defender, open_war_slots, current_wars),
            eligible_attackers: eligible,
        });
    }

    results.sort_by(|a, b| {
        b.defending_nation
            .strength
            .total_cmp(&a.defending_nation.strength)
    });
    Ok(results)
}

fn to_defending_nation(n: &Nation, open_war_slots: u32, current_wars: u32) -> DefendingNation {
    DefendingNation {
        id: n.id,
        name: n.name.clone(),
        ruler: n.ruler.clone(),
        alliance: n.alliance.clone(),
        alliance_id: n.alliance_id,
        strength: n.strength,
        technology: n.technology_value(),
        activity: n.activity.clone(),
        in_war_mode: n.in_war_mode,
        government_type: n.government_type.clone(),
        open_war_slots,
        current_wars,
    }
}

fn to_eligible_attacker(n: &Nation, strength_ratio: f64, current_wars: u32) -> EligibleAttacker {
    EligibleAttacker {
        id: n.id,
        name: n.name.clone(),
        ruler: n.ruler.clone(),
        alliance: n.alliance.clone(),
        alliance_id: n.alliance_id,
        strength: n.strength,
        technology: n.technology_value(),
        nuclear_weapons: n.nuclear_weapons,
        activity: n.activity.clone(),
        in_war_mode: n.in_war_mode,
        government_type: n.government_type.clone(),
        current_wars,
        strength_ratio,
        rank: n.rank,
    }
}
