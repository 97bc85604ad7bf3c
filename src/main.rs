use anyhow::Context;
use stratagraph::{Graph, GraphConfig};

fn load_config(path: Option<String>) -> anyhow::Result<GraphConfig> {
    let Some(path) = path else {
        return Ok(GraphConfig::default());
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config file {}", path))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config file {}", path))
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = load_config(std::env::args().nth(1))?;
    tracing::info!("Stratagraph v{}", stratagraph::version());

    let graph = Graph::open(config)?;
    let summary = graph.summary()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    graph.shutdown()?;
    Ok(())
}
