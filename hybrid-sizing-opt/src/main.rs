use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hybrid_model::Site;
use hybrid_sizing_opt::general::profiles::{ResourceProfiles, load_profile_map};
use hybrid_sizing_opt::io::{export_merged, export_shard, load_site_table, merge_output_dir};
use hybrid_sizing_opt::{AppConfig, RunConfig, run_all_shards, run_shard};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_CONFIG_PATH: &str = "sizing.toml";

fn print_usage() {
    println!("Usage: hybrid-sizing-opt [<shard_id> | all | merge] [config.toml]");
    println!();
    println!("  <shard_id>  size the sites of one shard (default 0)");
    println!("  all         size every shard on a local thread pool");
    println!("  merge       combine the per-shard outputs into one table");
}

fn load_inputs(run: &RunConfig) -> Result<(Vec<Site>, ResourceProfiles)> {
    let sites = load_site_table(&run.site_table, run.potential_scale)
        .with_context(|| format!("loading site table {}", run.site_table.display()))?;
    let solar = load_profile_map(&run.solar_profiles)
        .with_context(|| format!("loading solar profiles {}", run.solar_profiles.display()))?;
    let wind = load_profile_map(&run.wind_profiles)
        .with_context(|| format!("loading wind profiles {}", run.wind_profiles.display()))?;
    info!(sites = sites.len(), "inputs loaded");
    Ok((sites, ResourceProfiles::new(solar, wind)))
}

fn run_single_shard(shard_id: usize, config: &AppConfig) -> Result<()> {
    let (sites, profiles) = load_inputs(&config.run)?;
    let result = run_shard(
        shard_id,
        config.run.shard_count,
        &sites,
        &profiles,
        &config.sizing,
    )
    .with_context(|| format!("running shard {shard_id}"))?;

    export_shard(&config.run.output_dir, &result)
        .with_context(|| format!("writing shard {shard_id} results"))?;

    let summary = result.summary();
    println!(
        "Shard {}/{}: {} sites, {} solved, {} infeasible",
        summary.shard_id, summary.shard_count, summary.sites, summary.solved, summary.invalid_count
    );
    Ok(())
}

fn run_every_shard(config: &AppConfig) -> Result<()> {
    let (sites, profiles) = load_inputs(&config.run)?;
    let results = run_all_shards(
        config.run.shard_count,
        &sites,
        &profiles,
        &config.sizing,
        config.run.threads,
    )
    .context("running all shards")?;

    for result in &results {
        export_shard(&config.run.output_dir, result)
            .with_context(|| format!("writing shard {} results", result.shard.id))?;
    }
    merge(config)
}

fn merge(config: &AppConfig) -> Result<()> {
    let dir = &config.run.output_dir;
    let merged = merge_output_dir(dir, config.run.shard_count)
        .with_context(|| format!("merging shard outputs in {}", dir.display()))?;
    let summary = export_merged(dir, &merged).context("writing merged results")?;

    println!(
        "Merged {} shards: {} sites, {} solved, {} infeasible",
        summary.shards, summary.sites, summary.solved, summary.invalid_count
    );
    Ok(())
}

fn run(args: &[String]) -> Result<()> {
    let config_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let load = |path: &Path| {
        AppConfig::load_or_default(path)
            .with_context(|| format!("loading configuration {}", path.display()))
    };

    match args.get(1).map(|s| s.as_str()) {
        Some("-h") | Some("--help") => {
            print_usage();
            Ok(())
        }
        Some("all") => run_every_shard(&load(&config_path)?),
        Some("merge") => merge(&load(&config_path)?),
        Some(arg) => {
            let shard_id: usize = arg
                .parse()
                .with_context(|| format!("invalid shard id '{arg}'"))?;
            run_single_shard(shard_id, &load(&config_path)?)
        }
        None => run_single_shard(0, &load(&config_path)?),
    }
}

fn main() {
    let level = if env::var_os("HYBRID_SIZING_DEBUG").is_some() {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not install logger: {}", e);
    }

    let args: Vec<String> = env::args().collect();
    if let Err(e) = run(&args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
