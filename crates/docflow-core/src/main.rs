use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use docflow_core::{
    InMemoryCatalog, PipelineConfig, PipelineOrchestrator, PipelineState, RunReport, StageKind,
    StageProfile, WorkCatalog, WorkItemId,
};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn pipeline_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("catalog")
            .long("catalog")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("JSON catalog mapping work-item ids to descriptors"),
    )
    .arg(
        Arg::new("config")
            .long("config")
            .value_parser(value_parser!(PathBuf))
            .help("TOML pipeline configuration"),
    )
    .arg(
        Arg::new("seed")
            .long("seed")
            .value_parser(value_parser!(u64))
            .help("Random seed for reproducibility (overrides the config)"),
    )
    .arg(
        Arg::new("ids")
            .long("ids")
            .value_delimiter(',')
            .help("Process only these ids, in this order"),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Command::new("docflow")
        .version(docflow_core::VERSION)
        .about("Simulated document-intake pipeline")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            pipeline_args(Command::new("run").about("Process a catalog through every stage")).arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print the final session state as JSON"),
            ),
        )
        .subcommand(pipeline_args(
            Command::new("stats").about("Process a catalog and print stage profiles and stats"),
        ));

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("run", args)) => {
            let (orchestrator, state, report) = execute(args).await?;

            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print_summary(&state, &report);
                let stats = orchestrator.stats();
                println!();
                println!("Records stored: {}", stats.storage.records_stored);
                println!("Bytes stored:   {}", stats.storage.bytes_stored);
            }

            std::process::exit(if report.is_clean() { 0 } else { 1 });
        }
        Some(("stats", args)) => {
            let (orchestrator, _, _) = execute(args).await?;
            let profiles: Vec<StageProfile> =
                StageKind::ALL.into_iter().map(StageKind::profile).collect();
            let report = serde_json::json!({
                "stages": profiles,
                "stats": orchestrator.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

/// Load inputs, enqueue ids and drain the queue
async fn execute(
    args: &ArgMatches,
) -> Result<(PipelineOrchestrator<InMemoryCatalog>, PipelineState, RunReport)> {
    let catalog_path = args
        .get_one::<PathBuf>("catalog")
        .context("--catalog is required")?;
    let catalog = InMemoryCatalog::load(catalog_path)
        .with_context(|| format!("loading catalog {}", catalog_path.display()))?;

    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.get_one::<u64>("seed") {
        config = config.with_seed(*seed);
    }

    let ids: Vec<WorkItemId> = match args.get_many::<String>("ids") {
        Some(ids) => ids.map(|id| WorkItemId::new(id.trim())).collect(),
        None => catalog.ids(),
    };
    tracing::info!("Loaded {} catalog entries, {} queued", catalog.len(), ids.len());

    let mut state = PipelineState::new();
    state.enqueue_all(ids);

    let mut orchestrator = PipelineOrchestrator::new(config, catalog);
    let report = orchestrator.run_until_idle(&mut state).await?;

    Ok((orchestrator, state, report))
}

fn print_summary(state: &PipelineState, report: &RunReport) {
    println!("Processed files:");
    for file in state.processed() {
        println!(
            "  {:<12} {:<36} {:<6} {:>7.2}s  {:?}",
            file.work_item_id.as_str(),
            file.filename,
            file.file_type.as_str(),
            file.processing_time,
            file.status
        );
    }

    if !report.failed.is_empty() {
        println!();
        println!("Failed:");
        for (id, err) in &report.failed {
            println!("  {id}: {err}");
        }
    }

    let open = state.clarifications().iter().filter(|r| !r.answered).count();
    println!();
    println!(
        "Completed: {}  Failed: {}  Awaiting clarification: {}  Log entries: {}",
        report.completed.len(),
        report.failed.len(),
        open,
        state.logs().len()
    );
}
