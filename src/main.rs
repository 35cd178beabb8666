use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tone_engine::{ColorMode, DitherAlgorithm, Point};
use tonekit::models::AppConfig;
use tonekit::services::{GammaOptions, ImagePipeline};

#[derive(Parser)]
#[command(name = "tonekit")]
#[command(about = "Tonekit - color-mode views, gamma, dithering and leveling for PNG/PNM images")]
struct Cli {
    /// YAML configuration file (falls back to $CONFIG_FILE)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Input file and how to interpret it
#[derive(Args)]
struct Input {
    /// PNG or PNM file to read
    input: PathBuf,

    /// Color mode the file's samples are stored in
    #[arg(long, default_value = "rgb")]
    source_mode: ColorMode,
}

#[derive(Subcommand)]
enum Commands {
    /// Print size, channels and gamma of an image
    Info {
        #[command(flatten)]
        input: Input,

        /// Print a JSON document instead of text
        #[arg(long)]
        json: bool,
    },
    /// Render one color-mode view (optionally a single channel) to a file
    Convert {
        #[command(flatten)]
        input: Input,

        /// Output file; the extension picks PNG or PNM
        output: PathBuf,

        /// View color mode (defaults to the configured one)
        #[arg(short, long)]
        mode: Option<ColorMode>,

        /// Keep only this channel (1-3)
        #[arg(long)]
        channel: Option<usize>,

        /// Treat the input as encoded at this gamma without resampling
        #[arg(long)]
        assign_gamma: Option<f64>,

        /// Resample to this gamma and write the output at it
        #[arg(long)]
        convert_gamma: Option<f64>,
    },
    /// Reduce each channel to a few bits with a dithering algorithm
    Dither {
        #[command(flatten)]
        input: Input,

        output: PathBuf,

        /// ordered, random_sync, random_nosync, floyd or atkinson
        #[arg(short, long)]
        algorithm: Option<DitherAlgorithm>,

        /// Bits per channel (1-8)
        #[arg(short, long)]
        bits: Option<u8>,

        #[arg(short, long)]
        mode: Option<ColorMode>,

        /// Seed for the random variants
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Draw the 256-bin intensity histogram as a 256x256 graph
    Histogram {
        #[command(flatten)]
        input: Input,

        output: PathBuf,

        #[arg(short, long)]
        mode: Option<ColorMode>,

        #[arg(long)]
        channel: Option<usize>,
    },
    /// Stretch levels so the remaining pixels span the full range
    Level {
        #[command(flatten)]
        input: Input,

        output: PathBuf,

        /// Fraction of darkest and brightest pixels to ignore
        #[arg(long)]
        ignore: Option<f64>,
    },
    /// Draw an anti-aliased line over the image
    Line {
        #[command(flatten)]
        input: Input,

        output: PathBuf,

        /// Start point as x,y
        #[arg(long, value_parser = parse_point)]
        from: Point,

        /// End point as x,y
        #[arg(long, value_parser = parse_point)]
        to: Point,

        /// Full stroke width in pixels
        #[arg(short, long)]
        width: Option<f64>,

        /// Line color as r,g,b in [0, 1]
        #[arg(long, value_parser = parse_color)]
        color: Option<[f64; 3]>,
    },
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("{part:?}: {e}")))
        .collect::<Result<_, _>>()?;
    values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected {N} comma-separated numbers, got {}", v.len()))
}

fn parse_point(s: &str) -> Result<Point, String> {
    let [x, y] = parse_numbers::<2>(s)?;
    Ok(Point::new(x, y))
}

fn parse_color(s: &str) -> Result<[f64; 3], String> {
    let color = parse_numbers::<3>(s)?;
    if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
        return Err(format!("color components must be in [0, 1], got {s}"));
    }
    Ok(color)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tonekit=info,tone_engine=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let config_file = cli
        .config
        .or_else(|| std::env::var("CONFIG_FILE").ok().map(PathBuf::from));

    let Some(command) = cli.command else {
        run_status_command(config_file.as_deref());
        return Ok(());
    };

    let config = Arc::new(AppConfig::load(config_file.as_deref())?);
    let pipeline = ImagePipeline::new(config.clone());

    match command {
        Commands::Info { input, json } => {
            let loaded = pipeline.load(&input.input, input.source_mode)?;
            let info = pipeline.info(&loaded);
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{}", info.path);
                println!("  format:   {}", info.format);
                println!("  size:     {}x{}", info.width, info.height);
                println!("  channels: {}", info.channels);
                println!("  max:      {}", info.max_value);
                println!("  gamma:    {}", info.gamma);
            }
        }
        Commands::Convert {
            input,
            output,
            mode,
            channel,
            assign_gamma,
            convert_gamma,
        } => {
            let loaded = pipeline.load(&input.input, input.source_mode)?;
            let mode = mode.map_or_else(|| config.color_mode(), Ok)?;
            let gamma = GammaOptions {
                assign: assign_gamma,
                convert: convert_gamma,
            };
            let (pixels, gamma) = pipeline.convert(&loaded.image, mode, channel, gamma)?;
            tonekit::services::save(&output, &pixels, gamma)?;
            report(&output);
        }
        Commands::Dither {
            input,
            output,
            algorithm,
            bits,
            mode,
            seed,
        } => {
            let loaded = pipeline.load(&input.input, input.source_mode)?;
            let mode = mode.map_or_else(|| config.color_mode(), Ok)?;
            let algorithm = algorithm.map_or_else(|| config.dither_algorithm(), Ok)?;
            let bits = bits.unwrap_or(config.dither.bits);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let pixels = pipeline.dither(&loaded.image, mode, algorithm, bits, &mut rng)?;
            pipeline.save(&output, &pixels)?;
            report(&output);
        }
        Commands::Histogram {
            input,
            output,
            mode,
            channel,
        } => {
            let loaded = pipeline.load(&input.input, input.source_mode)?;
            let mode = mode.map_or_else(|| config.color_mode(), Ok)?;
            let pixels = pipeline.histogram(&loaded.image, mode, channel)?;
            pipeline.save(&output, &pixels)?;
            report(&output);
        }
        Commands::Level {
            input,
            output,
            ignore,
        } => {
            let loaded = pipeline.load(&input.input, input.source_mode)?;
            let ignore = ignore.unwrap_or(config.leveling.ignore_fraction);
            let pixels = pipeline.level(&loaded.image, ignore)?;
            pipeline.save(&output, &pixels)?;
            report(&output);
        }
        Commands::Line {
            input,
            output,
            from,
            to,
            width,
            color,
        } => {
            let loaded = pipeline.load(&input.input, input.source_mode)?;
            let width = width.unwrap_or(config.annotation.width);
            let color = color.unwrap_or(config.annotation.color);
            let pixels = pipeline.annotate(&loaded.image, from, to, width, color)?;
            pipeline.save(&output, &pixels)?;
            report(&output);
        }
    }

    Ok(())
}

fn report(output: &Path) {
    println!("Wrote {}", output.display());
}

/// Show configuration source and the accepted names
fn run_status_command(config_file: Option<&Path>) {
    println!("tonekit {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Configuration:");
    match config_file {
        Some(path) => println!("  config = {}", path.display()),
        None => println!("  config = (defaults)"),
    }
    println!();
    let modes: Vec<&str> = ColorMode::ALL.iter().map(|m| m.name()).collect();
    println!("Color modes:       {}", modes.join(", "));
    let algorithms: Vec<&str> = DitherAlgorithm::ALL.iter().map(|a| a.name()).collect();
    println!("Dither algorithms: {}", algorithms.join(", "));
    println!();
    println!("Run 'tonekit --help' for the list of commands.");
}
