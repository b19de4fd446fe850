//! densindex CLI — run and inspect the name-registry indexer.
//!
//! Usage:
//! ```bash
//! densindex run  --node-url ws://localhost:1337 --protocol-nft <currency>.<token> [--db ./dens.db]
//! densindex info [--db ./dens.db]
//! densindex version
//! ```

use std::env;
use std::process;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use densindex_core::AssetClass;
use densindex_ingest::{Indexer, IndexerConfig};
use densindex_store::RegistryStore;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]).await,
        "info" => cmd_info(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("densindex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_usage() {
    println!("densindex {}", env!("CARGO_PKG_VERSION"));
    println!("Reorg-safe indexer for on-chain name-ownership records\n");
    println!("USAGE:");
    println!("    densindex <COMMAND> [OPTIONS]\n");
    println!("COMMANDS:");
    println!("    run      Run the indexer against a chain-sync endpoint");
    println!("    info     Show registry statistics for a database");
    println!("    version  Print version");
    println!("    help     Print this help\n");
    println!("OPTIONS (run):");
    println!("    --node-url <URL>          Chain-sync WebSocket endpoint (required)");
    println!("    --protocol-nft <CC.TN>    Protocol NFT as hex pair (required)");
    println!("    --db <PATH>               Registry database path [default: ./dens.db]");
    println!("OPTIONS (info):");
    println!("    --db <PATH>               Registry database path [default: ./dens.db]");
}

/// Value of `--name value` in `args`, if present.
fn flag(args: &[String], name: &str) -> Option<String> {
    args.windows(2)
        .find(|pair| pair[0] == name)
        .map(|pair| pair[1].clone())
}

async fn cmd_run(args: &[String]) -> Result<()> {
    let node_url = flag(args, "--node-url").context("--node-url is required")?;
    let protocol_nft: AssetClass = flag(args, "--protocol-nft")
        .context("--protocol-nft is required")?
        .parse()
        .context("--protocol-nft must be '<currency hex>.<token hex>'")?;

    let mut config = IndexerConfig::new(node_url, protocol_nft);
    if let Some(db) = flag(args, "--db") {
        config.db_path = db;
    }

    let indexer = Indexer::new(config).await?;
    tokio::select! {
        result = indexer.run() => result.map_err(Into::into),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}

async fn cmd_info(args: &[String]) -> Result<()> {
    let db = flag(args, "--db").unwrap_or_else(|| "./dens.db".into());
    let store = RegistryStore::open(&db).await?;

    println!("densindex v{}", env!("CARGO_PKG_VERSION"));
    println!("  Database: {db}");
    match store.recent_points(1).await?.first() {
        Some(tip) => println!("  Tip: {tip}"),
        None => println!("  Tip: origin (empty registry)"),
    }
    println!("  Points indexed: {}", store.point_count().await?);
    println!("  Live output refs: {}", store.live_ref_count().await?);
    println!("  Registered names: {}", store.name_count().await?);
    println!("  Record bundles: {}", store.record_bundle_count().await?);
    match store.protocol_asset_class().await? {
        Some(class) => println!("  Tracked protocol NFT: {class}"),
        None => println!("  Tracked protocol NFT: (not configured)"),
    }
    match store.select_protocol().await? {
        Some(protocol) => println!("  Protocol instance at: {}", protocol.tx_out_ref),
        None => println!("  Protocol instance at: (none live)"),
    }
    Ok(())
}
