use anyhow::Context;
use gs_search::SessionSnapshot;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GRIDSTEP_SNAPSHOT").ok())
        .context("usage: gs-inspect <snapshot.json> (or set GRIDSTEP_SNAPSHOT)")?;

    // Outputs are opaque here, so read them as plain JSON.
    let snapshot = SessionSnapshot::<serde_json::Value>::read_from(&path)
        .with_context(|| format!("reading snapshot {path}"))?;

    let total = snapshot
        .space
        .grid_size()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "overflow".to_string());

    println!("session   {} ({})", snapshot.name, snapshot.session_id);
    println!("state     {}", snapshot.state);
    println!("progress  {} / {} trials", snapshot.trials_completed, total);
    println!("saved at  {}", snapshot.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    match &snapshot.comparer {
        Some(kind) => println!("comparer  {kind:?}"),
        None => println!("comparer  none"),
    }
    match &snapshot.best {
        Some(best) => println!("best      {best}"),
        None => println!("best      -"),
    }
    Ok(())
}
