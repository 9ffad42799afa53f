use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use mesh_topo::{Command, LayoutPhase, TopologyModel, load_snapshot};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Node telemetry JSON (array of node records).
    #[arg(long)]
    nodes: PathBuf,
    /// Neighbor link JSON (array of link records).
    #[arg(long)]
    links: PathBuf,
    /// Hop graph JSON with "nodes" and "edges" arrays.
    #[arg(long)]
    hops: PathBuf,
    /// Give up on settling after this many simulation ticks.
    #[arg(long, default_value_t = 600)]
    max_ticks: usize,
    /// Filter the node table before printing it.
    #[arg(long)]
    search: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let snapshot = load_snapshot(&args.nodes, &args.links, &args.hops)
        .context("loading telemetry snapshot")?;

    let mut model = TopologyModel::new();
    model.replace_snapshot(snapshot);
    if let Some(query) = args.search {
        model.apply(Command::Search(query));
    }

    let mut ticks = 0;
    while ticks < args.max_ticks {
        model.tick(1.0 / 60.0);
        ticks += 1;
        if model.layout().phase() == LayoutPhase::Settled {
            break;
        }
    }

    let stats = model.stats();
    println!(
        "{} nodes, {} links, {:.1} connections per node ({} links dropped, {} hop edges dropped)",
        stats.node_count,
        stats.link_count,
        stats.average_connections,
        stats.dropped_links,
        stats.dropped_hop_edges,
    );
    println!("layout {:?} after {ticks} ticks", model.layout().phase());
    for node in model.layout().nodes() {
        println!(
            "  {:<10} {:<20} ({:8.1}, {:8.1})",
            model.band_of(&node.id).label(),
            node.id,
            node.pos.x,
            node.pos.y,
        );
    }

    let now = chrono::Utc::now();
    let rows = model.projected_nodes();
    println!();
    println!("node table ({} rows):", rows.len());
    for record in rows {
        let battery = record
            .battery_level
            .map(|level| format!("{level:.0}%"))
            .unwrap_or_else(|| "--".to_owned());
        println!(
            "  {:<24} {:<8} {:>5} {:>3} links",
            record.display_name(),
            record.presence(now).label(),
            battery,
            model.connection_count(&record.node_id),
        );
    }

    Ok(())
}
