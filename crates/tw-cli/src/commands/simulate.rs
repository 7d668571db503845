use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use tw_core::entity::EntityKind;
use tw_simulation::{SimEvent, SimEventKind, Simulation};

/// Run a headless simulation and report the census and event log.
pub fn run(
    config_path: Option<&Path>,
    hours: f64,
    seed: Option<u64>,
    verbose: bool,
) -> Result<(), String> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(format!("hours must be a non-negative number, got {hours}"));
    }
    let mut config = super::load_config(config_path)?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let seed = config.seed;

    let mut sim = Simulation::from_config(config)
        .map_err(|e| format!("simulation setup failed: {e}"))?;
    let steps = sim
        .run_hours(hours)
        .map_err(|e| format!("simulation error: {e}"))?;

    // Header
    println!(
        "  {} {}",
        "Simulation".bold(),
        format!("({hours}h, seed={seed})").dimmed()
    );
    println!(
        "  {steps} sub-steps run, {} events logged",
        sim.events().len()
    );
    println!("  World time: {}", super::format_time(sim.time()));
    println!();

    // Events
    let events = sim.events().events();
    if verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in events {
            let tick_label = format!("[tick {:>6}]", event.tick).dimmed();
            println!("  {tick_label} {}", colorize_event(event));
        }
        if events.is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    } else {
        let notable: Vec<_> = events.iter().filter(|e| label(&e.kind).is_some()).collect();
        if !notable.is_empty() {
            println!("  {}", "Notable Events".bold().underline());
            for event in notable {
                if let Some(tag) = label(&event.kind) {
                    println!("  {tag}  {}", event.description);
                }
            }
            println!();
        }
    }

    population_table(&sim);
    tribe_table(&sim);
    Ok(())
}

fn population_table(sim: &Simulation) {
    println!("  {}", "Population".bold().underline());
    println!();

    let counts = sim.world().entities.counts_by_kind();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Kind", "Count"]);
    for kind in EntityKind::ALL {
        let count = counts.get(&kind).copied().unwrap_or(0);
        table.add_row(vec![kind.to_string(), count.to_string()]);
    }
    println!("{table}");
    println!();
}

fn tribe_table(sim: &Simulation) {
    println!("  {}", "Tribes".bold().underline());
    println!();

    let world = sim.world();
    if world.tribes.is_empty() {
        println!("  {}", "(no tribes left)".dimmed());
        println!();
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Tribe", "Leader", "Members", "Objective", "Buildings"]);
    for tribe in world.tribes.iter() {
        let buildings = world
            .entities
            .iter_kind(EntityKind::Building)
            .filter(|b| b.tribe() == Some(tribe.id))
            .count();
        table.add_row(vec![
            tribe.id.to_string(),
            tribe.leader.to_string(),
            world.tribe_members(tribe.id).len().to_string(),
            tribe.objective.to_string(),
            buildings.to_string(),
        ]);
    }
    println!("{table}");
    println!();
}

/// Tag for notifications worth showing without `--verbose`.
fn label(kind: &SimEventKind) -> Option<colored::ColoredString> {
    match kind {
        SimEventKind::Died { .. } => Some("DEATH".red().bold()),
        SimEventKind::Born { .. } => Some("BIRTH".green().bold()),
        SimEventKind::TribeFounded { .. } => Some("TRIBE".cyan().bold()),
        SimEventKind::TribeDissolved { .. } => Some(" GONE".red()),
        SimEventKind::LeaderSucceeded { .. } => Some("HEIR ".cyan()),
        SimEventKind::BuildingCompleted { .. } => Some("BUILT".blue()),
        SimEventKind::BuildingDestroyed { .. } => Some("RUIN ".yellow()),
        SimEventKind::Theft { .. } => Some("THEFT".yellow().bold()),
        _ => None,
    }
}

fn colorize_event(event: &SimEvent) -> colored::ColoredString {
    let description = event.description.as_str();
    match event.kind {
        SimEventKind::Died { .. } | SimEventKind::TribeDissolved { .. } => {
            description.red().bold()
        }
        SimEventKind::Born { .. } | SimEventKind::Conceived { .. } => description.green(),
        SimEventKind::TribeFounded { .. }
        | SimEventKind::LeaderSucceeded { .. }
        | SimEventKind::StanceChanged { .. }
        | SimEventKind::ObjectiveChanged { .. } => description.cyan(),
        SimEventKind::BuildingPlaced { .. }
        | SimEventKind::BuildingCompleted { .. }
        | SimEventKind::BuildingDismantled { .. }
        | SimEventKind::BuildingTakenOver { .. } => description.blue(),
        SimEventKind::BuildingDestroyed { .. } | SimEventKind::Theft { .. } => {
            description.yellow()
        }
    }
}
