use clap::{Parser, Subcommand};
use media_ingest::config::{self, UploadOptions};
use media_ingest::output;
use media_ingest::types::ArtifactResult;
use media_ingest::upload::{Ingestor, UploadError, UploadRequest};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Per-request overrides shared by `ingest` and `check`.
#[derive(clap::Args, Clone)]
struct UploadArgs {
    /// Upload type: 1 image, 2 avatar/cover, 3 photo, 4 video, 5 audio
    #[arg(long = "type", default_value_t = config::DEFAULT_UPLOAD_TYPE)]
    upload_type: i32,

    /// Album id; photos in an album get a box-clipped small variant
    #[arg(long)]
    album: Option<u64>,

    /// Output box width (avatar size, album clip box)
    #[arg(long)]
    width: Option<u32>,

    /// Output box height (avatar size, album clip box)
    #[arg(long)]
    height: Option<u32>,

    /// Override the configured static root
    #[arg(long)]
    static_dir: Option<String>,
}

#[derive(Parser)]
#[command(name = "media-ingest")]
#[command(about = "Validate uploads and store resized images and media stills")]
#[command(long_about = "\
Validate uploads and store resized images and media stills

Artifacts are written under the static root:

  {static}/upload/
  ├── bigpic/20240102/            # type 1: full size + _small variant
  │   ├── 1704193200000000000.jpeg
  │   └── 1704193200000000000_small.jpeg
  ├── smallpic/20240102/          # type 2: avatar/cover, single artifact
  ├── bigsmallpic/20240102/       # type 3: photo + _small (box-clipped in albums)
  └── media/
      ├── mp4/20240102/           # type 4: video + extracted .jpg still
      └── mp3/20240102/           # type 5: audio + extracted .jpg still

Logging goes to stderr and honours RUST_LOG (default: info).

Run 'media-ingest gen-config' to generate a documented media-ingest.toml.")]
#[command(version)]
struct Cli {
    /// Config file; a missing file means stock defaults
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store files (directories are walked recursively)
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        upload: UploadArgs,

        /// Public URL of the artifact this upload replaces (single input only)
        #[arg(long)]
        last_source: Option<String>,

        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Validate and decode files without storing anything
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        upload: UploadArgs,
    },
    /// Print a stock media-ingest.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Ingest {
            paths,
            upload,
            last_source,
            json,
        } => {
            let files = collect_files(&paths);
            if last_source.is_some() && files.len() != 1 {
                return Err("--last-source needs exactly one input file".into());
            }
            let ingest_config = config::load_config(&cli.config)?;
            init_thread_pool(&ingest_config.processing);
            let ingestor = Ingestor::new(ingest_config);
            let options = UploadOptions {
                last_source,
                ..upload_options(&upload)
            };

            let results: Vec<ArtifactResult> = files
                .par_iter()
                .map(|path| match read_request(path) {
                    Ok(request) => ingestor.ingest(&request, options.clone()),
                    Err(e) => ArtifactResult::failed(&display_name(path), e.to_string()),
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                output::print_results(&results);
            }
        }
        Command::Check { paths, upload } => {
            let ingest_config = config::load_config(&cli.config)?;
            init_thread_pool(&ingest_config.processing);
            let ingestor = Ingestor::new(ingest_config);
            let options = upload_options(&upload);

            let entries: Vec<(String, Result<_, String>)> = collect_files(&paths)
                .par_iter()
                .map(|path| {
                    let outcome = read_request(path)
                        .map_err(|e| e.to_string())
                        .and_then(|request| {
                            ingestor
                                .inspect(&request, options.clone())
                                .map_err(|e: UploadError| e.to_string())
                        });
                    (display_name(path), outcome)
                })
                .collect();
            output::print_check(&entries);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn upload_options(args: &UploadArgs) -> UploadOptions {
    UploadOptions {
        static_dir: args.static_dir.clone(),
        album_id: args.album,
        upload_type: Some(args.upload_type),
        width: args.width,
        height: args.height,
        ..UploadOptions::default()
    }
}

/// Size the global rayon pool from `[processing]`.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Expand directory arguments into the files beneath them, sorted.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = paths
        .iter()
        .flat_map(|path| {
            WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
        })
        .collect();
    files.sort();
    files.dedup();
    files
}

fn read_request(path: &Path) -> std::io::Result<UploadRequest> {
    let data = std::fs::read(path)?;
    Ok(UploadRequest::new(display_name(path), data))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
