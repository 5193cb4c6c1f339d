mod sim;

use clap::{Parser, ValueEnum};
use pkg_chaos::{ChaosManager, EventResult};
use pkg_constants::paths::DEFAULT_SCENARIO_CONFIG;
use pkg_controllers::usage::UsageController;
use pkg_types::config::{ScenarioFile, load_config_file};
use sim::{Simulation, TickReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "k3rs-sim", about = "Deterministic k3rs cluster simulator")]
struct Cli {
    /// Path to YAML scenario file
    #[arg(long, short, default_value = DEFAULT_SCENARIO_CONFIG)]
    config: String,

    /// Number of ticks to run
    #[arg(long)]
    ticks: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    // Load scenario (returns an empty scenario if not found)
    let file: ScenarioFile = load_config_file(&cli.config)?;
    info!("Scenario file: {}", cli.config);

    // Merge: CLI args > scenario file > defaults
    let ticks = cli.ticks.or(file.ticks).unwrap_or(10);
    let growth = file.usage_growth.unwrap_or(1.0);

    let cluster = file.build_cluster()?;
    info!("Starting k3rs-sim");
    info!("  Ticks:     {}", ticks);
    info!("  Nodes:     {}", cluster.nodes().count());
    info!("  Pods:      {}", cluster.pods().count());
    info!("  Events:    {}", file.events.len());

    let mut sim = Simulation::new(
        cluster,
        ChaosManager::new(file.events),
        UsageController::new(growth),
    );

    for tick in 0..ticks {
        let report = sim.run_tick(tick)?;
        match cli.output {
            OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
            OutputFormat::Text => print_report(&report),
        }
    }

    if let OutputFormat::Text = cli.output {
        print_cluster(&sim);
    }

    Ok(())
}

fn print_report(report: &TickReport) {
    println!("== tick {}", report.tick);
    for outcome in &report.chaos {
        let kind = outcome.event["type"].as_str().unwrap_or("?");
        match &outcome.result {
            EventResult::Executed(_) => println!("  chaos     {:<16} executed", kind),
            EventResult::Failed(f) => println!("  chaos     {:<16} failed: {}", kind, f.reason),
        }
    }
    for d in report.scaling.iter().filter(|d| d.scaled()) {
        println!(
            "  hpa       {:<16} {} -> {} replicas",
            d.hpa_id, d.current_replicas, d.desired_replicas
        );
    }
    for (pod, node) in &report.scheduling.assignments {
        println!("  schedule  {:<16} -> {}", pod, node);
    }
    for pod in &report.scheduling.unschedulable_pods {
        println!("  schedule  {:<16} unschedulable", pod);
    }
}

fn print_cluster(sim: &Simulation) {
    let cluster = sim.cluster();
    println!("== final state");
    println!("{:<16} {:<10} {:>10} {:>14} PODS", "NODE", "CORDONED", "CPU", "MEMORY");
    for node in cluster.nodes() {
        let usage = node.usage();
        println!(
            "{:<16} {:<10} {:>10} {:>14} {}",
            node.id,
            node.is_cordoned(),
            format!("{:.2}/{:.2}", usage.cpu, node.allocatable.cpu),
            format!("{:.0}/{:.0}", usage.memory, node.allocatable.memory),
            node.pods_running().len()
        );
    }
    println!();
    println!("{:<16} {:<12} {:<16} RESTARTS", "POD", "PHASE", "NODE");
    for pod in cluster.pods() {
        println!(
            "{:<16} {:<12} {:<16} {}",
            pod.id,
            pod.phase().to_string(),
            pod.assigned_node().unwrap_or("<none>"),
            pod.restart_count()
        );
    }
}
