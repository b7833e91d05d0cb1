//! Randshear: random shear augmentation for image batches.
//!
//! Randshear shears batches of images, and the segmentation masks paired
//! with them, by a random per-image amount during training. Each image gets
//! a shear vector `(sx, sy)` drawn from configurable ranges with a random
//! shared sign; the vector becomes an affine transform that is resampled
//! with nearest or bilinear interpolation. At inference the layer is an
//! identity.
//!
//! # Modules
//!
//! - [`config`]: Layer parameters, validation and config files
//! - [`layer`]: The augmentation layer contract and [`RandomShear`]
//! - [`sampler`]: Random shear factor sampling
//! - [`transform`]: Shear matrices and applying them to tensors
//! - [`backend`]: Numeric operations and the affine resampler
//! - [`seed`]: Explicit random generator state
//! - [`sample`]: Sampling runs and their reports, for the CLI
//! - [`tensor_io`]: Tensor JSON files
//! - [`error`]: Error types for randshear operations

pub mod backend;
pub mod config;
pub mod error;
pub mod layer;
pub mod sample;
pub mod sampler;
pub mod seed;
pub mod tensor_io;
pub mod transform;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::RandomShearConfig;
pub use error::RandShearError;
pub use layer::{ImagePreprocessingLayer, LayerData, RandomShear};

/// The randshear CLI application.
#[derive(Parser)]
#[command(name = "randshear")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a layer config and print it in canonical form.
    Config(ConfigArgs),
    /// Sample shear vectors from a config without touching any images.
    Sample(SampleArgs),
    /// Shear an image tensor (and optionally its masks).
    Apply(ApplyArgs),
}

/// Arguments for the config subcommand.
#[derive(clap::Args)]
struct ConfigArgs {
    /// Config file (JSON, or YAML with a .yaml/.yml extension).
    config: PathBuf,

    /// Output format ('json' or 'text').
    #[arg(long, default_value = "json")]
    output: String,
}

/// Arguments for the sample subcommand.
#[derive(clap::Args)]
struct SampleArgs {
    /// Config file (JSON, or YAML with a .yaml/.yml extension).
    #[arg(long)]
    config: PathBuf,

    /// Number of images per sampling step.
    #[arg(long, default_value_t = 8)]
    batch_size: usize,

    /// Number of sampling steps (layer calls).
    #[arg(long, default_value_t = 1)]
    steps: usize,

    /// Seed to use instead of the one in the config.
    #[arg(long)]
    seed: Option<u64>,

    /// Output format ('text', 'json', or 'csv').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the apply subcommand.
#[derive(clap::Args)]
struct ApplyArgs {
    /// Config file (JSON, or YAML with a .yaml/.yml extension).
    #[arg(long)]
    config: PathBuf,

    /// Input image tensor (JSON).
    input: PathBuf,

    /// Output image tensor path.
    #[arg(short, long)]
    output: PathBuf,

    /// Segmentation mask tensor to shear alongside the images.
    #[arg(long, requires = "masks_output")]
    masks: Option<PathBuf>,

    /// Output path for the sheared masks.
    #[arg(long, requires = "masks")]
    masks_output: Option<PathBuf>,

    /// Seed to use instead of the one in the config.
    #[arg(long)]
    seed: Option<u64>,

    /// Run in inference mode (no shear is applied).
    #[arg(long)]
    inference: bool,
}

/// Run the randshear CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), RandShearError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Config(args)) => run_config(args),
        Some(Commands::Sample(args)) => run_sample(args),
        Some(Commands::Apply(args)) => run_apply(args),
        None => {
            println!("randshear {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Random shear augmentation for image batches.");
            println!();
            println!("Run 'randshear --help' for usage information.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when run() is embedded elsewhere.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .try_init();
}

/// Load a config file, applying an optional seed override.
fn load_config(
    path: &std::path::Path,
    seed: Option<u64>,
) -> Result<RandomShearConfig, RandShearError> {
    let mut config = config::read_config_file(path)?;
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    Ok(config)
}

/// Execute the config subcommand.
fn run_config(args: ConfigArgs) -> Result<(), RandShearError> {
    let config = config::read_config_file(&args.config)?;
    let layer = RandomShear::new(config)?;
    let exported = layer.get_config();

    match args.output.as_str() {
        "json" => {
            println!("{}", config::to_json_string(&exported)?);
        }
        "text" => {
            let (x, y) = (layer.x_range(), layer.y_range());
            if let Some(name) = &exported.name {
                println!("name:          {}", name);
            }
            println!(
                "x_factor:      {} (samples from [{}, {}])",
                exported.x_factor,
                x.lower(),
                x.upper()
            );
            println!(
                "y_factor:      {} (samples from [{}, {}])",
                exported.y_factor,
                y.lower(),
                y.upper()
            );
            println!("interpolation: {}", exported.interpolation);
            println!("fill_mode:     {}", exported.fill_mode);
            println!("fill_value:    {}", exported.fill_value);
            println!("data_format:   {}", exported.data_format);
            match exported.seed {
                Some(seed) => println!("seed:          {}", seed),
                None => println!("seed:          (random)"),
            }
        }
        other => {
            return Err(RandShearError::UnsupportedFormat(format!(
                "'{}' (supported: json, text)",
                other
            )));
        }
    }

    Ok(())
}

/// Execute the sample subcommand.
fn run_sample(args: SampleArgs) -> Result<(), RandShearError> {
    if !matches!(args.output.as_str(), "text" | "json" | "csv") {
        return Err(RandShearError::UnsupportedFormat(format!(
            "'{}' (supported: text, json, csv)",
            args.output
        )));
    }

    let config = load_config(&args.config, args.seed)?;
    let mut layer = RandomShear::new(config)?;
    let opts = sample::SampleOptions {
        batch_size: args.batch_size,
        steps: args.steps,
    };

    info!(
        batch_size = opts.batch_size,
        steps = opts.steps,
        "sampling shear vectors"
    );

    match args.output.as_str() {
        "csv" => {
            let vectors = sample::sample_shear_vectors(&mut layer, &opts)?;
            sample::write_vectors_csv(std::io::stdout().lock(), &vectors)?;
        }
        "json" => {
            let report = sample::sample_report(&mut layer, &opts)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            let report = sample::sample_report(&mut layer, &opts)?;
            print!("{}", report);
        }
    }

    Ok(())
}

/// Execute the apply subcommand.
fn run_apply(args: ApplyArgs) -> Result<(), RandShearError> {
    let config = load_config(&args.config, args.seed)?;
    let mut layer = RandomShear::new(config)?;

    let images = tensor_io::read_tensor_json(&args.input)?;
    let mut data = LayerData::new(images);
    if let Some(masks_path) = &args.masks {
        data = data.with_segmentation_masks(tensor_io::read_tensor_json(masks_path)?);
    }

    info!(
        input = %args.input.display(),
        shape = ?data.images.shape(),
        training = !args.inference,
        "applying random shear"
    );
    let output = layer.call(data, !args.inference)?;

    tensor_io::write_tensor_json(&args.output, &output.images)?;
    println!(
        "Wrote {:?} tensor to {}",
        output.images.shape(),
        args.output.display()
    );

    if let (Some(path), Some(masks)) = (&args.masks_output, &output.segmentation_masks) {
        tensor_io::write_tensor_json(path, masks)?;
        println!("Wrote {:?} masks to {}", masks.shape(), path.display());
    }

    Ok(())
}
