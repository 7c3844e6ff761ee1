use spikenet::observer::{histogram, NetworkAdapter};
use spikenet::{Network, NetworkConfig, NoiseStimulus, Simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let command = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or("demo");

    let result = match command {
        "demo" => run_demo(json),
        "grow" => run_grow(json),
        "help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_help() {
    println!("spikenet (layered spiking network with avalanche dynamics)");
    println!("usage:");
    println!("  cargo run                 fixed full network, noisy stimulus");
    println!("  cargo run -- grow         growable network, one node every 5 ticks");
    println!("  cargo run -- <cmd> --json print the final snapshot as JSON");
    println!("  RUST_LOG=debug cargo run  per-avalanche logging");
}

fn run_demo(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Lower threshold than the default so noise can start cascades.
    let cfg = NetworkConfig {
        threshold: 1.0,
        seed: Some(7),
        sweep_cap: Some(500),
        ..NetworkConfig::full()
    };
    let net = Network::with_config(&[10, 40, 10], cfg)?;
    let feed = NoiseStimulus::new(10, 0.0, 1.0, 7);
    let mut sim = Simulation::new(net, feed);

    for report in sim.run(300)? {
        if report.tick % 50 == 0 {
            let d = sim.network().diagnostics();
            println!(
                "t={:4} spiking={:3} refractory={:3} mean_charge={:.3} out={:?}",
                report.tick,
                d.spiking,
                d.refractory,
                d.mean_total_input,
                report
                    .output
                    .iter()
                    .map(|v| format!("{v:.2}"))
                    .collect::<Vec<_>>()
            );
        }
    }

    summarize(sim.network(), json)
}

fn run_grow(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = NetworkConfig {
        threshold: 0.5,
        seed: Some(11),
        sweep_cap: Some(500),
        ..NetworkConfig::growable(3, false)
    };
    let net = Network::with_config(&[10, 40, 10], cfg)?;
    let feed = NoiseStimulus::new(10, 0.0, 1.0, 11);
    let mut sim = Simulation::new(net, feed).with_growth_every(5);

    for report in sim.run(250)? {
        if let Some(id) = report.grew {
            if report.tick % 25 == 0 {
                println!(
                    "t={:4} grew node {} hidden={} links={}",
                    report.tick,
                    id,
                    sim.network().hidden_count(),
                    sim.network().link_count()
                );
            }
        }
    }

    summarize(sim.network(), json)
}

fn summarize(net: &Network, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let sizes = net.avalanche_size_history();
    info!(
        avalanches = sizes.len(),
        nodes = net.node_count(),
        links = net.link_count(),
        "run finished"
    );

    println!("avalanche size distribution:");
    for bin in histogram(sizes, Some(10)) {
        println!("  [{:4}, {:4}) {}", bin.start, bin.end, "#".repeat(bin.count.min(60)));
    }

    if json {
        let snapshot = NetworkAdapter::new(net).snapshot_hidden();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}
