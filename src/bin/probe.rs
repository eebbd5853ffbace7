use clap::Parser;
use frontier::search::Kind;
use frontier::{Config, HttpOracle, RelationOracle};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "probe")]
#[command(about = "Ask the people/places API about a single name and show what comes back")]
struct Args {
    /// What the query names: person or place
    kind: Kind,

    /// Name to look up (normalized before sending)
    query: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load()?;
    let normalizer = config.normalizer()?;

    let query = normalizer
        .node(&args.query)
        .ok_or_else(|| anyhow::anyhow!("Query '{}' normalizes to nothing", args.query))?;

    let oracle = HttpOracle::new(
        &config.api.base_url,
        config.api_key()?,
        config.request_timeout(),
        config.api.max_retries,
    )?;

    let start = Instant::now();
    let raw = oracle.query(args.kind, query.as_str()).await?;
    let duration = start.elapsed();

    println!("{} {} -> {} {}(s) in {:?}", args.kind, query, raw.len(), args.kind.opposite(), duration);
    for value in &raw {
        match normalizer.node(value) {
            Some(node) if node.as_str() != value => println!("  {} (as {})", value, node),
            Some(_) => println!("  {}", value),
            None => println!("  {} (ignored)", value),
        }
    }
    for flag in oracle.flags() {
        println!("Flag candidate: {}", flag);
    }

    Ok(())
}
