use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use syncytium_core::{init_logging, Network, SimConfig};
use syncytium_data::Endpoint;
use syncytium_observer::RemoteReasoner;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a headless simulation
    Run {
        /// Custom config file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        /// Number of ticks to simulate
        #[arg(long, default_value_t = 200)]
        ticks: u64,

        /// Initial population (overrides the config file)
        #[arg(long)]
        population: Option<usize>,

        /// RNG seed for a reproducible run (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,

        /// Milliseconds between ticks; 0 runs flat out
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,

        /// Network purpose to set before the run
        #[arg(long)]
        purpose: Option<String>,

        /// Base URL of a remote reasoning service; local heuristics when absent
        #[arg(long)]
        reasoner_url: Option<String>,
    },
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            println!("{}", toml::to_string_pretty(&SimConfig::default())?);
        }
        Commands::Run {
            config,
            ticks,
            population,
            seed,
            interval_ms,
            purpose,
            reasoner_url,
        } => {
            let mut sim_config = match SimConfig::load(&config) {
                Ok(loaded) => loaded,
                Err(e) => {
                    tracing::warn!(path = %config, error = %e, "config not loaded, using defaults");
                    SimConfig::default()
                }
            };
            if let Some(population) = population {
                sim_config.world.initial_population = population;
            }
            if let Some(seed) = seed {
                sim_config.world.seed = Some(seed);
            }
            sim_config.validate()?;

            let mut network = match reasoner_url {
                Some(url) => {
                    let reasoner = Arc::new(RemoteReasoner::new(url));
                    Network::with_collaborators(
                        sim_config.clone(),
                        reasoner.clone(),
                        reasoner.clone(),
                        reasoner,
                    )
                }
                None => Network::new(sim_config.clone()),
            };

            let created = network.initialize(sim_config.world.initial_population);
            println!("Spawned {created} cell(s)");

            if let Some(purpose) = purpose {
                match network.set_purpose(&purpose).await {
                    Ok(guidance) => println!("Purpose set. Guidance: {guidance}"),
                    Err(e) => eprintln!("Purpose rejected: {e}"),
                }
            }

            for _ in 0..ticks {
                network.tick().await;
                if network.registry().alive_count() == 0 {
                    println!("All cells are dead; stopping early.");
                    break;
                }
                if interval_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                }
            }

            let snapshot = network.snapshot();
            println!(
                "Finished at tick {}: {} alive / {} total cell(s)",
                snapshot.tick_count,
                snapshot.alive_count(),
                snapshot.cells.len()
            );
            for message in network.recent_messages() {
                println!("[{} -> {}] {}", message.source, message.target, message.content);
            }

            // A parting broadcast exercises the chat log end to end.
            let outcome = network
                .send_message(Endpoint::User, Endpoint::Broadcast, "thank you all")
                .await?;
            println!("Farewell broadcast: {}", outcome.rationale);
        }
    }

    Ok(())
}
