use anyhow::Context;
use clap::Parser;
use ghostrace_simulator::{draw_frame, render_frame, Config, Simulator, Strategy};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Game seed; every race replays identically from it
    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(short, long, default_value_t = 5)]
    races: usize,

    /// Racer id to back each race (random when omitted)
    #[arg(long)]
    racer: Option<String>,

    #[arg(short, long, default_value_t = 10)]
    amount: i64,

    /// Skip the reveal animation
    #[arg(long)]
    instant: bool,

    /// Print the race history as JSON when done
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Load config
    let config = match &args.config {
        Some(path) => Config::load(path).context("failed to load config")?,
        None => Config::default(),
    };
    let config = config.validate().context("invalid config")?;

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, races = args.races, "starting simulator");

    let strategy = Strategy {
        racer: args.racer,
        amount: args.amount,
    };
    let mut simulator = Simulator::new(&config, seed);
    let mut drawn = 0;
    let mut draw_error = None;
    let records = simulator
        .run(args.races, &strategy, args.instant, |catalog, frame| {
            // Stop drawing after the first failure; the races still settle
            if draw_error.is_some() {
                return;
            }
            let text = render_frame(catalog, frame);
            match draw_frame(&mut std::io::stdout().lock(), &text, drawn, frame.finished) {
                Ok(lines) => drawn = lines,
                Err(err) => {
                    warn!(?err, "failed to draw track");
                    draw_error = Some(err);
                }
            }
        })
        .await
        .context("race failed")?;
    if let Some(err) = draw_error {
        return Err(err).context("failed to draw track");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for record in &records {
            println!("{}", record.header());
            println!("  {}", record.order_text());
            println!("  {}", record.settlement.narrative);
        }
    }
    let session = simulator.session();
    println!(
        "Bankroll: {} after {} race(s)",
        session.bankroll(),
        records.len()
    );
    if !session.can_place_bet() {
        println!("{}", session.status());
    }

    Ok(())
}
