//! CLI dispatcher: selects the task variant, resolves the model, and routes
//! inputs through the 2-D tile compositor or the volumetric slice windower.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use restitch_core::backend::OrtRestorer;
use restitch_core::degrade::{add_gaussian_noise, degradation_rng};
use restitch_core::task::{ModelRoster, Task};
use restitch_core::tile::{composite, CompositeMode};
use restitch_core::volume::{process_volume, process_volume_checked};

pub mod io;

#[derive(Parser)]
#[command(
    name = "restitch",
    about = "Tiled and volumetric drivers for fixed-shape restoration models"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help = "Increase log verbosity (-v: debug, -vv: trace)"
    )]
    verbose: u8,

    #[arg(
        long = "log-filter",
        value_name = "FILTER",
        global = true,
        help = "Explicit tracing filter (overrides RUST_LOG and -v)"
    )]
    log_filter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore 2-D images, whole or tile by tile.
    Image(ImageArgs),
    /// Restore a 3-D volume slice by slice.
    Volume(VolumeArgs),
}

#[derive(Args)]
struct ModelArgs {
    #[arg(long, default_value = "color_dn", value_parser = Task::from_str)]
    task: Task,

    #[arg(long, default_value_t = 1, help = "Upscaling factor for the SR tasks")]
    scale: usize,

    #[arg(long, default_value_t = 15, help = "Noise level (sigma over 255)")]
    noise: u32,

    #[arg(long, default_value_t = 40, help = "JPEG quality of the degraded input")]
    jpeg: u32,

    #[arg(long, help = "Use the large real-SR model variant")]
    large: bool,

    #[arg(long, help = "Path to the ONNX model (overrides --roster)")]
    model: Option<PathBuf>,

    #[arg(long, help = "TOML roster mapping task names to model paths")]
    roster: Option<PathBuf>,
}

impl ModelArgs {
    /// `--model` wins, then the roster, then the conventional model-zoo
    /// location for the variant.
    fn resolve_model(&self) -> Result<PathBuf> {
        if let Some(path) = &self.model {
            return Ok(path.clone());
        }
        if let Some(roster_path) = &self.roster {
            let roster = ModelRoster::load(roster_path)?;
            if let Some(path) = roster.model_for(self.task) {
                return Ok(path.to_path_buf());
            }
        }
        Ok(Path::new("model_zoo").join(self.task.weight_file(
            self.scale,
            self.noise,
            self.jpeg,
            self.large,
        )))
    }
}

#[derive(Args)]
struct ImageArgs {
    #[arg(help = "Input .npy image, or a directory of them")]
    input: PathBuf,

    #[arg(short = 'o', long, help = "Output .npy file, or directory for batch runs")]
    output: PathBuf,

    #[command(flatten)]
    model: ModelArgs,

    #[arg(long, help = "Tile size; omit to restore each image in one call")]
    tile: Option<usize>,

    #[arg(long = "tile-overlap", default_value_t = 32)]
    tile_overlap: usize,

    #[arg(
        long = "synthesize-noise",
        help = "Degrade the (clean) inputs with Gaussian noise before restoring"
    )]
    synthesize_noise: bool,

    #[arg(long, default_value_t = 0, help = "Seed for degradation synthesis")]
    seed: u64,
}

#[derive(Args)]
struct VolumeArgs {
    #[arg(help = "Input .npy volume, laid out [H, D, W]")]
    input: PathBuf,

    #[arg(short = 'o', long, help = "Output .npy volume")]
    output: PathBuf,

    #[arg(
        long,
        help = "Companion volume that must match the input's shape (fail-fast check)"
    )]
    companion: Option<PathBuf>,

    #[command(flatten)]
    model: ModelArgs,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_filter.as_deref());

    match cli.command {
        Commands::Image(args) => run_image(args),
        Commands::Volume(args) => run_volume(args),
    }
}

/// Filter precedence: explicit `--log-filter`, then `RUST_LOG`, then the
/// `-v` count.
fn init_logging(verbose: u8, cli_filter: Option<&str>) {
    let filter = match cli_filter {
        Some(filter) => EnvFilter::new(filter),
        None => match std::env::var("RUST_LOG") {
            Ok(env) if !env.is_empty() => EnvFilter::new(env),
            _ => EnvFilter::new(match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }),
        },
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_image(args: ImageArgs) -> Result<()> {
    let task = args.model.task;
    if args.synthesize_noise && !task.is_denoise() {
        bail!("--synthesize-noise only applies to the denoising tasks, not {task}");
    }

    let model_path = args.model.resolve_model()?;
    let mut restorer = OrtRestorer::load(&model_path, task.contract(args.model.scale))?;
    let mode = CompositeMode::from_tile_args(args.tile, args.tile_overlap);

    let inputs = io::collect_npy_inputs(&args.input)?;
    if inputs.is_empty() {
        bail!("no .npy inputs under {}", args.input.display());
    }

    let batch = inputs.len() > 1 || args.input.is_dir();
    if batch {
        std::fs::create_dir_all(&args.output)
            .with_context(|| format!("creating output directory {}", args.output.display()))?;
    }

    for path in &inputs {
        let mut image = io::load_image(path)?;
        if args.synthesize_noise {
            synthesize_noise(&mut image, args.model.noise as f32, args.seed)?;
        }

        let restored = composite(&image, &mut restorer, mode)
            .with_context(|| format!("restoring {}", path.display()))?;

        let out_path = if batch {
            let name = path
                .file_name()
                .with_context(|| format!("input path {} has no file name", path.display()))?;
            args.output.join(name)
        } else {
            args.output.clone()
        };
        io::save_array(&out_path, &restored)?;
        info!(input = %path.display(), output = %out_path.display(), "image restored");
    }

    Ok(())
}

/// Per-image degradation with a fresh, identically seeded generator, so
/// the noise field of one input never depends on which other inputs
/// precede it in the batch.
fn synthesize_noise(image: &mut ndarray::Array3<f32>, sigma: f32, seed: u64) -> Result<()> {
    add_gaussian_noise(image, sigma, &mut degradation_rng(seed))
}

fn run_volume(args: VolumeArgs) -> Result<()> {
    let model_path = args.model.resolve_model()?;
    let mut restorer = OrtRestorer::load(&model_path, args.model.task.contract(1))?;

    let volume = io::load_volume(&args.input)?;
    let restored = match &args.companion {
        Some(path) => {
            let companion = io::load_volume(path)?;
            process_volume_checked(&volume, &companion, &mut restorer)?
        }
        None => process_volume(&volume, &mut restorer)?,
    };

    io::save_array(&args.output, &restored)?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        "volume restored"
    );
    Ok(())
}
