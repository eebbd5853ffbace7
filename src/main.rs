use anyhow::Result;
use clap::Parser;
use frontier::config::Config;
use frontier::extract::extract_seeds;
use frontier::report::ReportClient;
use frontier::search::{EngineConfig, Goal, Kind, Node, Normalizer, SearchEngine, SearchOutcome};
use frontier::snapshot::SnapshotWriter;
use frontier::{HttpOracle, RelationOracle, StaticOracle};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "frontier")]
#[command(about = "Search the people/places API for the configured target and report where it was seen")]
struct Args {
    /// Answer oracle queries from a JSON fixture instead of the live API
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Print the report payload instead of submitting it
    #[arg(long)]
    dry_run: bool,

    /// Override search.max_steps
    #[arg(long)]
    max_steps: Option<usize>,

    /// Do not write progress snapshots
    #[arg(long)]
    no_snapshots: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(max_steps) = args.max_steps {
        config.search.max_steps = max_steps;
    }
    log::info!("Configuration loaded successfully");

    let normalizer = config.normalizer()?;
    let seeds = collect_seeds(&config, &normalizer).await?;
    if seeds.is_empty() {
        anyhow::bail!("No seeds: set seeds.people / seeds.places or point seeds.note_* at a note mentioning known names");
    }

    match &args.fixture {
        Some(path) => {
            log::info!("Using offline fixture {}", path.display());
            let oracle = StaticOracle::load(path, &normalizer)?;
            execute(oracle, &config, normalizer, seeds, &args).await
        }
        None => {
            let oracle = HttpOracle::new(
                &config.api.base_url,
                config.api_key()?,
                config.request_timeout(),
                config.api.max_retries,
            )?;
            execute(oracle, &config, normalizer, seeds, &args).await
        }
    }
}

/// Explicit seeds first, then names found in the note.
async fn collect_seeds(config: &Config, normalizer: &Normalizer) -> Result<Vec<(Kind, String)>> {
    let mut seeds = config.explicit_seeds();

    if let Some(source) = config.note_source() {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let note = source.load(&client).await?;
        let hints = config.seed_hints(normalizer);
        if hints.is_empty() {
            log::warn!("Note loaded but seeds.known_people / seeds.known_places are empty");
        }
        let found = extract_seeds(&note, &hints, normalizer);
        log::info!("Note mentions {} known names", found.len());
        seeds.extend(found.into_iter().map(|(kind, node)| (kind, node.into_string())));
    }

    Ok(seeds)
}

async fn execute<O: RelationOracle>(
    oracle: O,
    config: &Config,
    normalizer: Normalizer,
    seeds: Vec<(Kind, String)>,
    args: &Args,
) -> Result<()> {
    let target = config.target(&normalizer)?;
    let engine_config: EngineConfig = config.engine_config(&normalizer);
    let engine = SearchEngine::new(oracle, normalizer, engine_config);

    let mut state = engine.seed(seeds);
    let kind = config.search.target_kind;
    let mut goal = Goal::new(target, kind);
    if config.search.require_new_location {
        let known: Vec<Node> = state.seeds(kind.opposite()).iter().cloned().collect();
        log::info!("Ignoring sightings in {} already known {}s", known.len(), kind.opposite());
        goal = goal.ignoring(known);
    }

    let writer = if args.no_snapshots {
        None
    } else {
        Some(SnapshotWriter::create(&config.output.results_dir)?)
    };

    let start = Instant::now();
    let outcome = engine
        .run_with(&mut state, &goal, |state, report| {
            if let Some(writer) = &writer {
                if let Err(e) = writer.write_progress(state, report) {
                    log::warn!("Failed to write snapshot for step {}: {}", report.step, e);
                }
            }
        })
        .await?;
    let elapsed = start.elapsed();

    let flags = engine.oracle().flags();
    if let Some(writer) = &writer {
        writer.write_summary(&state, &outcome, &flags)?;
    }

    log::info!("=== Search Complete ===");
    log::info!("People queried: {}", state.visited(Kind::Person).len());
    log::info!("Places queried: {}", state.visited(Kind::Place).len());
    log::info!("Failed queries: {}", state.failures().len());
    log::info!("Time: {:?}", elapsed);
    for flag in &flags {
        println!("Flag candidate: {}", flag);
    }

    let discovery = match &outcome {
        SearchOutcome::Found(discovery) => discovery,
        SearchOutcome::Exhausted { steps } => {
            println!("{} not found: all frontiers exhausted after {} steps", goal.target, steps);
            return Ok(());
        }
        SearchOutcome::Aborted { steps, pending } => {
            println!(
                "{} not found: stopped after {} steps with {} nodes still queued (raise --max-steps)",
                goal.target, steps, pending
            );
            return Ok(());
        }
    };

    println!(
        "{} found in {} {} (step {})",
        discovery.target, discovery.via_kind, discovery.via, discovery.step
    );

    let answer = serde_json::Value::String(discovery.via.to_string());
    if args.dry_run {
        let mut preview = serde_json::json!({
            "task": config.report.task,
            "apikey": "***",
            "answer": answer,
        });
        if let Some(writer) = &writer {
            writer.write_answer(&preview)?;
        }
        preview["dry_run"] = serde_json::Value::Bool(true);
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let client = ReportClient::new(&config.report.url, config.api_key()?, config.request_timeout())?;
    let payload = client.payload(&config.report.task, answer);
    if let Some(writer) = &writer {
        writer.write_answer(&serde_json::json!({
            "task": payload.task,
            "answer": payload.answer,
        }))?;
    }
    let reply = client.submit(&payload).await?;
    println!("Report reply: {}", reply);

    Ok(())
}
