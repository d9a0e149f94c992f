mod api;
mod config;
mod constants;
mod import;
mod nation;
mod snapshot;
mod stagger;

use crate::config::{AppConfig, SourceConfig, DEFAULT_DOWNLOAD_ATTEMPTS};
use crate::stagger::StaggerOptions;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    constants::print_banner();

    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    let outcome = match cmd {
        "serve"   => run_server().await,
        "import"  => run_import(&args[2..]).await,
        "stagger" => run_stagger(&args[2..]).await,
        _         => {
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = outcome {
        log::error!("❌ {}", e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("CN Dashboard — available commands:");
    println!("  serve                                   — run the REST API (CN_* env vars)");
    println!("  import  <nations> <wars>                — load statistics and print counts");
    println!("  stagger <nations> <wars> <att> <def>    — offline stagger targeting report");
    println!("          [--hide-anarchy] [--hide-peace] [--priority-only]");
    println!("          [--include-full] [--sell-down=<militaryNS>]");
    println!();
    println!("  <nations>/<wars> accept a local .zip/.txt path or an http(s) URL");
}

// =============================================================================
// serve
// =============================================================================

async fn run_server() -> Result<(), String> {
    let config = AppConfig::from_env().map_err(|e| e.to_string())?;
    let state = api::AppState::new(config.clone());

    match import::load_snapshot(&config.sources).await {
        Ok(snapshot) => {
            log::info!(
                "✅ Initial snapshot: {} nations, {} wars",
                snapshot.nations.len(),
                snapshot.wars.len()
            );
            state.store.replace(snapshot).await;
        }
        Err(e) => log::warn!("⚠️ Starting without a snapshot: {}", e),
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {}", config.bind_addr, e))?;
    log::info!("📡 API listening on {}", config.bind_addr);

    axum::serve(listener, api::router(state))
        .await
        .map_err(|e| format!("server error: {}", e))
}

// =============================================================================
// import
// =============================================================================

fn sources_from_args(args: &[String]) -> Result<SourceConfig, String> {
    match args {
        [nations, wars, ..] => Ok(SourceConfig {
            nations: Some(nations.clone()),
            wars: Some(wars.clone()),
            download_attempts: DEFAULT_DOWNLOAD_ATTEMPTS,
        }),
        _ => Err("expected <nations> <wars> sources".to_string()),
    }
}

async fn run_import(args: &[String]) -> Result<(), String> {
    let sources = sources_from_args(args)?;
    let snapshot = import::load_snapshot(&sources).await.map_err(|e| e.to_string())?;

    let alliances: std::collections::HashSet<u64> = snapshot
        .nations
        .iter()
        .filter(|n| !n.is_unaligned())
        .map(|n| n.alliance_id)
        .collect();
    println!("Nations:     {:>8}", snapshot.nations.len());
    println!("Alliances:   {:>8}", alliances.len());
    println!("Wars:        {:>8}", snapshot.wars.len());
    println!("Active wars: {:>8}", snapshot.active_war_count());
    Ok(())
}

// =============================================================================
// stagger
// =============================================================================

fn parse_stagger_flags(flags: &[String]) -> Result<StaggerOptions, String> {
    let mut options = StaggerOptions::default();
    for flag in flags {
        match flag.as_str() {
            "--hide-anarchy"  => options.hide_anarchy = true,
            "--hide-peace"    => options.hide_peace_mode = true,
            "--priority-only" => options.hide_non_priority = true,
            "--include-full"  => options.include_full_targets = true,
            other => match other.strip_prefix("--sell-down=") {
                Some(raw) => {
                    let military_ns: f64 = raw
                        .parse()
                        .map_err(|_| format!("invalid military NS: {}", raw))?;
                    options.sell_down_enabled = true;
                    options.military_ns = military_ns;
                }
                None => return Err(format!("unknown flag: {}", other)),
            },
        }
    }
    Ok(options)
}

async fn run_stagger(args: &[String]) -> Result<(), String> {
    if args.len() < 4 {
        return Err("expected <nations> <wars> <attacking> <defending>".to_string());
    }
    let sources = sources_from_args(args)?;
    let attacking: u64 = args[2].parse().map_err(|_| format!("invalid alliance id: {}", args[2]))?;
    let defending: u64 = args[3].parse().map_err(|_| format!("invalid alliance id: {}", args[3]))?;
    if attacking == defending {
        return Err("attacking and defending alliance must differ".to_string());
    }
    let options = parse_stagger_flags(&args[4..])?;

    let snapshot = import::load_snapshot(&sources).await.map_err(|e| e.to_string())?;
    let report = stagger::compute_eligibility(
        attacking,
        defending,
        &snapshot.nations,
        &snapshot.wars,
        &options,
    )
    .map_err(|e| e.to_string())?;

    println!("\n=== Stagger targets: {} → {} ===\n", attacking, defending);
    println!("   {:<30} {:>12} {:>5} {:>5}", "Defender", "NS", "Wars", "Open");
    println!("   {}", "─".repeat(56));
    for entry in &report {
        let d = &entry.defending_nation;
        println!("   {:<30} {:>12.2} {:>5} {:>5}", d.name, d.strength, d.current_wars, d.open_war_slots);
        for a in &entry.eligible_attackers {
            println!("      ↳ {:<26} {:>12.2}  ratio {:.3}", a.name, a.strength, a.strength_ratio);
        }
    }
    println!("\n   {} targets", report.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_stagger_flags() {
        let options = parse_stagger_flags(&args(&[
            "--hide-anarchy",
            "--priority-only",
            "--sell-down=2500",
        ]))
        .unwrap();
        assert!(options.hide_anarchy);
        assert!(options.hide_non_priority);
        assert!(!options.hide_peace_mode);
        assert!(options.sell_down_enabled);
        assert_eq!(options.military_ns, 2500.0);
    }

    #[test]
    fn test_stagger_flags_reject_unknown() {
        assert!(parse_stagger_flags(&args(&["--everything"])).is_err());
        assert!(parse_stagger_flags(&args(&["--sell-down=lots"])).is_err());
    }

    #[test]
    fn test_sources_from_args() {
        let sources = sources_from_args(&args(&["n.zip", "w.zip"])).unwrap();
        assert_eq!(sources.nations.as_deref(), Some("n.zip"));
        assert_eq!(sources.wars.as_deref(), Some("w.zip"));
        assert!(sources_from_args(&args(&["n.zip"])).is_err());
    }
}
