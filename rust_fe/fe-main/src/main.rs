// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Parallel plan tool
//!
//! Reads a JSON plan spec, plans its scans, splits it into parallel plans
//! and prints them as explain text or as a JSON summary.

use clap::Parser;
use fe_catalog::Catalog;
use fe_planner::{
    build_plan, plan_parallel, summarize, ClusterMembership, ExplainLevel, MembershipUpdate,
    PlanExplain, PlanSpec, QueryOptions,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "conf/fe.toml")]
    config: PathBuf,

    /// Plan spec file; `-` reads stdin
    #[arg(short, long)]
    plan: PathBuf,

    /// Log level, overrides the configuration
    #[arg(short, long)]
    log_level: Option<String>,

    /// Explain level, overrides the configuration
    #[arg(short, long)]
    explain_level: Option<ExplainLevel>,

    /// Print a JSON summary instead of explain text
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    init_logging(&config.log_level)?;
    config.validate()?;
    debug!("Configuration loaded from: {:?}", args.config);

    let mut options = QueryOptions::from_config(&config)?;
    if let Some(level) = args.explain_level {
        options.explain_level = level;
    }

    let membership = Arc::new(ClusterMembership::new());
    if let Some(update) = MembershipUpdate::from_config(&config) {
        membership.update(update);
    }

    let spec = PlanSpec::from_json(&read_plan(&args.plan)?)?;
    let catalog = Catalog::new();
    let explain_level = options.explain_level;
    let mut built = build_plan(&spec, &catalog, &membership, options)?;
    let roots = plan_parallel(&mut built)?;
    info!(
        num_plans = roots.len(),
        num_fragments = built.ctx.num_fragments(),
        "planned {:?}",
        args.plan
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summarize(&built.ctx, &roots))?);
    } else {
        print!("{}", PlanExplain::new(&built.ctx, &roots, explain_level));
    }
    Ok(())
}

/// Initialize logging
fn init_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    Ok(())
}

/// Load configuration from file, then apply environment overrides
fn load_config(config_path: &Path) -> anyhow::Result<fe_common::Config> {
    let mut config = if config_path.exists() {
        fe_common::Config::from_file(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?
    } else {
        // Logging is not set up yet
        eprintln!("Config file not found: {:?}, using defaults", config_path);
        fe_common::Config::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

fn read_plan(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return Ok(content);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read plan {:?}: {}", path, e))?;
    if content.trim().is_empty() {
        warn!("Plan file {:?} is empty", path);
    }
    Ok(content)
}
