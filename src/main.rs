use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use trailer_photo_qc::imaging::{QualityProfile, RawImageInput, RustBackend};
use trailer_photo_qc::pipeline::{self, LabelledInput};
use trailer_photo_qc::{config, imaging, output};
use walkdir::WalkDir;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "trailer-photo-qc")]
#[command(about = "Quality gate and normalization for trailer audit photos")]
#[command(long_about = "\
Quality gate and normalization for trailer audit photos

Every capture is decoded and bounded to 2560 px, checked for blur and
exposure, tone-corrected, and re-encoded for upload.

Pipeline per capture:

  decode + resize  →  quality gate  →  post-process  →  encode
                          │
                          └─ rejected: too blurry / too dark (retake)

Inputs can be files or directories. Directories are walked recursively and
only files with a supported image extension are picked up.

Run 'trailer-photo-qc gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Gate, normalize, and re-encode captures
    Process {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for accepted images
        #[arg(long, default_value = "processed")]
        output: PathBuf,

        /// Use the pro capture quality instead of the standard one
        #[arg(long)]
        pro: bool,

        /// Write a JSON report of every capture to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Run the quality gate only and print the metrics
    Check {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Process {
            inputs,
            output: output_dir,
            pro,
            report,
        } => {
            let pipeline_config = config::load_config(&cli.config)?;
            init_thread_pool(&pipeline_config.processing);

            let paths = collect_inputs(&inputs)?;
            tracing::info!(count = paths.len(), "processing captures");
            let labelled = paths
                .into_iter()
                .map(|path| {
                    LabelledInput::new(path.display().to_string(), RawImageInput::Path(path))
                })
                .collect();

            let profile = if pro {
                QualityProfile::Pro
            } else {
                QualityProfile::Standard
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = pipeline::process_batch(
                &RustBackend::new(),
                labelled,
                &pipeline_config,
                profile,
                Some(tx),
            );
            printer.join().unwrap();

            std::fs::create_dir_all(&output_dir)?;
            let mut written = HashSet::new();
            for entry in &result.entries {
                let Some(image) = entry.processed() else {
                    continue;
                };
                let stem = Path::new(&entry.label)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| entry.label.clone());
                let name = unique_name(&output_dir, &stem, image.format.extension(), &mut written);
                std::fs::write(output_dir.join(name), &image.bytes)?;
            }

            if let Some(report_path) = report {
                let json = serde_json::to_string_pretty(&result.report())?;
                std::fs::write(&report_path, json)?;
                tracing::info!(path = %report_path.display(), "wrote report");
            }

            println!();
            println!("{}", output::format_batch_summary(&result));
        }
        Command::Check { inputs } => {
            let pipeline_config = config::load_config(&cli.config)?;
            let backend = RustBackend::new();
            for path in collect_inputs(&inputs)? {
                let label = path.display().to_string();
                match pipeline::assess_image(&backend, RawImageInput::Path(path), &pipeline_config)
                {
                    Ok(assessment) => output::print_assessment(&label, &assessment),
                    Err(e) => println!("! {} failed at {}: {}", label, e.stage(), e),
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Expand CLI inputs into image files.
///
/// Files are taken as given, whatever their extension (the decoder sniffs the
/// content). Directories are walked recursively in sorted order and filtered to
/// supported image extensions.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, walkdir::Error> {
    let extensions = imaging::supported_input_extensions();
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry?;
            let supported = entry
                .path()
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .is_some_and(|e| extensions.contains(&e.as_str()));
            if entry.file_type().is_file() && supported {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// `RUST_LOG` when set and valid, `info` otherwise.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// `stem.ext`, or `stem-2.ext`, `stem-3.ext`, ... when the name was already
/// used in this run or a file of that name exists in `dir`.
fn unique_name(dir: &Path, stem: &str, extension: &str, taken: &mut HashSet<String>) -> String {
    let mut name = format!("{stem}.{extension}");
    let mut n = 2;
    while taken.contains(&name) || dir.join(&name).exists() {
        name = format!("{stem}-{n}.{extension}");
        n += 1;
    }
    taken.insert(name.clone());
    name
}
