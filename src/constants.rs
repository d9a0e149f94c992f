//! Game rule constants for the CyberNations dashboard
//!
//! These constants pin down the declaration rules the targeting
//! engine enforces, plus the service identity printed on startup.

/// Service name
pub const SERVICE_NAME: &str = "CN Dashboard";

/// Service version
pub const VERSION: &str = "0.1.0";

/// Project tagline
pub const TAGLINE: &str = "Alliance aid, war and stagger targeting for CyberNations";

// ═══════════════════════════════════════════════════════════════
// War slots
// ═══════════════════════════════════════════════════════════════

/// Hard cap on simultaneous defensive wars per nation
pub const MAX_DEFENSIVE_WARS: u32 = 3;

/// War statuses that mark a war as no longer active
pub const INACTIVE_WAR_STATUSES: [&str; 2] = ["ended", "expired"];

// ═══════════════════════════════════════════════════════════════
// Stagger band
// ═══════════════════════════════════════════════════════════════

/// Lowest attacker/defender strength ratio allowed to declare
pub const STAGGER_MIN_RATIO: f64 = 0.75;

/// Highest attacker/defender strength ratio allowed to declare
pub const STAGGER_MAX_RATIO: f64 = 1.33;

/// NS shed per unit of infrastructure sold
pub const INFRA_NS_PER_UNIT: f64 = 3.0;

/// NS shed per unit of land sold
pub const LAND_NS_PER_UNIT: f64 = 1.5;

/// Maximum global rank distance between attacker and defender
pub const RANK_WINDOW: u32 = 100;

// ═══════════════════════════════════════════════════════════════
// Display functions
// ═══════════════════════════════════════════════════════════════

/// Print the startup banner
pub fn print_banner() {
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║                 CYBERNATIONS DASHBOARD                    ║");
    println!("║                                                            ║");
    println!("║  Aid slots • Wars • Stagger targeting                     ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
    println!("  {} v{}", SERVICE_NAME, VERSION);
    println!("  {}", TAGLINE);
    println!();
}

/// True unless the status is one of the inactive markers (case-insensitive)
pub fn war_status_is_active(status: &str) -> bool {
    let status = status.trim();
    !INACTIVE_WAR_STATUSES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(status))
}

/// Open defensive slots for a given defensive war count
pub fn open_defensive_slots(defending_wars: u32) -> u32 {
    MAX_DEFENSIVE_WARS.saturating_sub(defending_wars)
}
