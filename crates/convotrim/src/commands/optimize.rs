use anyhow::Context;
use convotrim::ContextOptimizer;
use convotrim_core::OptimizerConfig;
use std::io::{self, Read, Write};
use std::path::Path;

fn load_config(path: Option<&Path>) -> anyhow::Result<OptimizerConfig> {
    let config = match path {
        Some(path) => OptimizerConfig::load(path)?,
        None => OptimizerConfig::from_env()?,
    };
    Ok(config)
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

pub fn run(input: Option<&Path>, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let raw = read_input(input)?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("request is not valid JSON")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let optimizer = ContextOptimizer::new(config)?;
    let result = runtime.block_on(optimizer.optimize_value(value))?;

    let output = serde_json::to_string_pretty(&result)?;
    let mut stdout = io::stdout();
    stdout.write_all(output.as_bytes())?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}
