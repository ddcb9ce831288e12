use batch_watermark::config::{
    self, ConfigOverrides, DecodeErrorPolicy, OutputLayout, PlacementOverrides,
    ProcessingOverrides,
};
use batch_watermark::{output, process};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Flags that override the config file. Unset flags leave it alone.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Watermark image, PNG with alpha recommended [default: watermark.png]
    #[arg(long, global = true)]
    watermark: Option<PathBuf>,

    /// Directory of source photos [default: ./in]
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Output root directory [default: ./out]
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Distance of the watermark from the left edge, in pixels [default: 0]
    #[arg(long, global = true, alias = "offset_x", allow_negative_numbers = true)]
    offset_x: Option<i64>,

    /// Distance of the watermark from the bottom edge, in pixels [default: 0]
    #[arg(long, global = true, alias = "offset_y", allow_negative_numbers = true)]
    offset_y: Option<i64>,

    /// Watermark height as a percentage of each image's height [default: 10]
    #[arg(long, global = true, alias = "height_percentage")]
    height_percentage: Option<u32>,

    /// Comma-separated output sizes, e.g. `source,500,thumb=200` [default: source]
    #[arg(long, global = true)]
    sizes: Option<String>,

    /// JPEG quality, 1-100 [default: 85]
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Output layout [default: labeled]
    #[arg(long, global = true, value_enum)]
    layout: Option<OutputLayout>,

    /// What to do with images that fail to decode [default: abort]
    #[arg(long, global = true, value_enum)]
    on_decode_error: Option<DecodeErrorPolicy>,

    /// Maximum parallel workers (capped at the number of CPU cores)
    #[arg(long, global = true)]
    max_processes: Option<usize>,
}

impl RunArgs {
    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            watermark: self.watermark,
            input: self.input,
            output: self.output,
            sizes: self.sizes,
            quality: self.quality,
            layout: self.layout,
            on_decode_error: self.on_decode_error,
            placement: PlacementOverrides {
                offset_x: self.offset_x,
                offset_y: self.offset_y,
                height_percentage: self.height_percentage,
            },
            processing: ProcessingOverrides {
                max_processes: self.max_processes,
            },
        }
    }
}

#[derive(Parser)]
#[command(name = "batch-watermark")]
#[command(about = "Watermark a directory of photos, with multi-size output")]
#[command(long_about = "\
Watermark a directory of photos, with multi-size output

Every regular file in the input directory is decoded, the watermark is
scaled to a percentage of the photo's height and blended into the
bottom-left corner (shifted by the offsets), and one JPEG per size is
written:

  out/
  ├── source/          # size \"source\": composited, original width
  │   └── dawn.jpg
  └── 500/             # size \"500\": resized to 500px wide
      └── dawn.jpg

Settings come from stock defaults, then --config FILE, then flags.
Run 'batch-watermark gen-config' to print a documented config file.

Set RUST_LOG=info (or debug) for diagnostic logging on stderr.")]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watermark all input images (default)
    Run,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let config =
                config::load_config(cli.config.as_deref(), &cli.run.into_overrides())?;
            init_thread_pool(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::run(&config, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            output::print_summary(&result?, &config.watermark);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. The user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
