//! fsc3d CLI - runs 3DFSC jobs and opens their results
//! Composition root: wires core services to the system adapters

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::info;

use config::ConfigArgs;
use fsc3d_core::application::{
    InstallRecipe, JobAdapter, Plot, ResultViewer, RunRequest, VolumeSelection,
};
use fsc3d_core::domain::params::{
    DEFAULT_D_THETA, DEFAULT_FSC_CUTOFF, DEFAULT_HIGH_PASS_FILTER, DEFAULT_NUM_THRESHOLDS,
    DEFAULT_SPHERICITY_THRESHOLD,
};
use fsc3d_core::domain::{JobLayout, MaskRef, RunParameters, RunResult, VolumeRef};
use fsc3d_core::port::cancel_channel;
use fsc3d_core::port::id_provider::UuidProvider;
use fsc3d_core::port::time_provider::SystemTimeProvider;
use fsc3d_infra_system::{ExternalViewer, MrcVolumeConverter, SubprocessRunner};

#[derive(Parser)]
#[command(name = "fsc3d")]
#[command(about = "Directional resolution estimation with 3DFSC", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run 3DFSC on a full map and its half-maps
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        /// Directory under which the job directory is created
        #[arg(long, env = "FSC3D_WORK_ROOT", default_value = config::DEFAULT_WORK_ROOT)]
        work_root: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check inputs and parameters without running anything
    Validate {
        #[command(flatten)]
        inputs: InputArgs,
    },

    /// Print the sphericity of a finished job
    Summary {
        /// Job directory (the one holding tmp/, extra/, logs/)
        #[arg(long)]
        job_dir: PathBuf,
    },

    /// Open results in external viewers
    View {
        #[arg(long)]
        job_dir: PathBuf,

        #[command(subcommand)]
        what: ViewCommand,
    },

    /// Print how to install 3DFSC
    InstallPlan,
}

#[derive(Subcommand)]
enum ViewCommand {
    /// Volumes as surfaces in ChimeraX
    Volumes {
        #[arg(long, value_enum, default_value_t = VolumeChoice::Original)]
        with: VolumeChoice,
    },
    /// One of the plots
    Plot {
        #[arg(value_enum)]
        kind: PlotChoice,
    },
    /// Map coloured by angular resolution
    Chimera,
}

#[derive(Clone, Copy, ValueEnum)]
enum VolumeChoice {
    Original,
    Thresholded,
    Binarized,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlotChoice {
    Histogram,
    Ft,
    Fsc,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Full map (MRC)
    #[arg(long)]
    full_map: PathBuf,

    /// Sampling rate of the full map in Å/px
    #[arg(long)]
    apix: f64,

    /// First half-map, supplied separately
    #[arg(long, requires = "half2")]
    half1: Option<PathBuf>,

    /// Second half-map, supplied separately
    #[arg(long, requires = "half1")]
    half2: Option<PathBuf>,

    /// Half-maps associated with the full map, as "half1,half2"
    #[arg(long)]
    associated_half_maps: Option<String>,

    /// Mask applied to the half-maps
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Angle of cone in degrees
    #[arg(long, default_value_t = DEFAULT_D_THETA)]
    dtheta: f64,

    #[arg(long, default_value_t = DEFAULT_FSC_CUTOFF)]
    fsc_cutoff: f64,

    #[arg(long, default_value_t = DEFAULT_SPHERICITY_THRESHOLD)]
    sphericity_threshold: f64,

    /// High-pass filter in Å
    #[arg(long, default_value_t = DEFAULT_HIGH_PASS_FILTER)]
    high_pass: f64,

    /// Number of thresholds for sphericity
    #[arg(long, default_value_t = DEFAULT_NUM_THRESHOLDS)]
    num_thresholds: u32,

    /// Run on CPU
    #[arg(long)]
    no_gpu: bool,

    #[arg(long, default_value_t = 0)]
    gpu_id: u32,
}

impl InputArgs {
    fn request(&self) -> Result<RunRequest> {
        let mut full_map = VolumeRef::new(expand_path(&self.full_map), self.apix);
        if let Some(pair) = &self.associated_half_maps {
            let (h1, h2) = pair
                .split_once(',')
                .context("--associated-half-maps expects \"half1,half2\"")?;
            full_map = full_map.with_half_maps(config::expand(h1.trim()), config::expand(h2.trim()));
        }

        let mut request = RunRequest::new(full_map).with_params(RunParameters {
            d_theta: self.dtheta,
            fsc_cutoff: self.fsc_cutoff,
            sphericity_threshold: self.sphericity_threshold,
            high_pass_filter: self.high_pass,
            num_thresholds: self.num_thresholds,
            use_gpu: !self.no_gpu,
            gpu_id: self.gpu_id,
        });

        if let (Some(h1), Some(h2)) = (&self.half1, &self.half2) {
            request = request.with_half_maps(
                VolumeRef::new(expand_path(h1), self.apix),
                VolumeRef::new(expand_path(h2), self.apix),
            );
        }
        if let Some(mask) = &self.mask {
            request = request.with_mask(MaskRef::new(expand_path(mask)));
        }

        Ok(request)
    }
}

fn expand_path(path: &std::path::Path) -> PathBuf {
    config::expand(&path.to_string_lossy())
}

#[derive(Tabled)]
struct ArtifactRow {
    artifact: String,
    path: String,
}

fn artifact_rows(result: &RunResult) -> Vec<ArtifactRow> {
    let mut rows = vec![ArtifactRow {
        artifact: "3D FSC volume".to_string(),
        path: result.volume.display().to_string(),
    }];
    rows.extend(result.secondary_artifacts().iter().map(|(name, path)| ArtifactRow {
        artifact: name.to_string(),
        path: path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string()),
    }));
    rows
}

fn build_adapter(config: Arc<fsc3d_core::domain::ToolConfig>) -> JobAdapter {
    let time_provider = Arc::new(SystemTimeProvider);
    JobAdapter::new(
        config,
        Arc::new(MrcVolumeConverter::new()),
        Arc::new(SubprocessRunner::new(time_provider.clone())),
        time_provider,
    )
}

fn print_problems(problems: &[String]) {
    println!("{}", "✗ Invalid inputs".red().bold());
    for p in problems {
        println!("  {} {}", "•".bold(), p);
    }
}

async fn run_job(adapter: &JobAdapter, inputs: &InputArgs, work_root: &str, as_json: bool) -> Result<()> {
    let request = inputs.request()?;

    let problems = adapter.validate(&request);
    if !problems.is_empty() {
        print_problems(&problems);
        anyhow::bail!("{} problem(s) with the inputs", problems.len());
    }

    let mut job = adapter
        .allocate_job(&config::expand(work_root), &UuidProvider)
        .context("Failed to create job directory")?;

    let (cancel_tx, cancel_token) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping 3DFSC");
            cancel_tx.cancel();
        }
    });

    let base_env: HashMap<String, String> = std::env::vars().collect();
    let result = adapter
        .run(&mut job, &request, &base_env, Some(cancel_token))
        .await
        .with_context(|| format!("Job {} failed (directory {})", job.id, job.layout.root().display()))?;

    let output = adapter.register_outputs(&job.layout, &result, &request.full_map)?;
    info!(job_id = %job.id, output = %output.file_name.display(), "Output registered");

    if as_json {
        let body = json!({
            "job_id": job.id,
            "job_dir": job.layout.root(),
            "state": job.state,
            "result": result,
            "output": output,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{}", "✓ 3D FSC finished".green().bold());
    println!();
    println!("  {} {}", "Job:".bold(), job.id);
    println!("  {} {}", "Directory:".bold(), job.layout.root().display());
    println!("  {} {:0.3}", "Sphericity:".bold(), result.sphericity);
    for w in &result.warnings {
        println!("  {} {}", "⚠".yellow(), w);
    }
    println!();
    println!("{}", Table::new(artifact_rows(&result)));

    Ok(())
}

fn view(viewer: &ResultViewer, layout: &JobLayout, what: ViewCommand) -> Result<()> {
    let opened = match what {
        ViewCommand::Volumes { with } => {
            let selection = match with {
                VolumeChoice::Original => VolumeSelection::Original,
                VolumeChoice::Thresholded => VolumeSelection::Thresholded,
                VolumeChoice::Binarized => VolumeSelection::ThresholdedBinarized,
                VolumeChoice::All => VolumeSelection::All,
            };
            viewer.show_volumes(layout, selection)?
        }
        ViewCommand::Plot { kind } => {
            let plot = match kind {
                PlotChoice::Histogram => Plot::Histogram,
                PlotChoice::Ft => Plot::FourierTransform,
                PlotChoice::Fsc => Plot::Fsc3d,
            };
            viewer.show_plot(layout, plot)?
        }
        ViewCommand::Chimera => viewer.show_chimera_animation(layout)?,
    };

    println!("{} {}", "✓ Opened".green(), opened.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;

    let cli = Cli::parse();
    let tool_config = Arc::new(cli.config.tool_config());
    info!(
        version = fsc3d_core::VERSION,
        home = %tool_config.home.display(),
        "fsc3d starting"
    );

    match cli.command {
        Commands::Run {
            inputs,
            work_root,
            json,
        } => {
            let adapter = build_adapter(tool_config);
            run_job(&adapter, &inputs, &work_root, json).await?;
        }

        Commands::Validate { inputs } => {
            let adapter = build_adapter(tool_config);
            let problems = adapter.validate(&inputs.request()?);
            if !problems.is_empty() {
                print_problems(&problems);
                std::process::exit(1);
            }
            println!("{}", "✓ Inputs are valid".green().bold());
        }

        Commands::Summary { job_dir } => {
            let adapter = build_adapter(tool_config);
            for line in adapter.summary(&JobLayout::new(job_dir)) {
                println!("{}", line);
            }
        }

        Commands::View { job_dir, what } => {
            let viewer = ResultViewer::new(tool_config, Arc::new(ExternalViewer::new()));
            view(&viewer, &JobLayout::new(job_dir), what)?;
        }

        Commands::InstallPlan => {
            for recipe in InstallRecipe::all(&tool_config) {
                println!(
                    "{} {} {}",
                    recipe.package.cyan().bold(),
                    recipe.version,
                    if recipe.default { "(default)" } else { "" }
                );
                println!("  {} {}", "Environment:".bold(), recipe.env_name);
                println!("  {} {}", "Install into:".bold(), tool_config.home.display());
                println!("  {} {}", "Target:".bold(), recipe.target);
                if !recipe.needed_programs.is_empty() {
                    println!("  {} {}", "Needs:".bold(), recipe.needed_programs.join(", "));
                }
                println!("  {}", "Command:".bold());
                println!("    {}", recipe.command);
            }
        }
    }

    Ok(())
}
