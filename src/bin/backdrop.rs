use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "backdrop", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a single image into a poster.
    Render(RenderArgs),
    /// Compose many images in parallel into an output directory.
    Batch(BatchArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    opts: ConfigArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Input images.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for `<stem>.<ext>` outputs.
    #[arg(long)]
    out_dir: PathBuf,

    /// Worker threads (defaults to available cores).
    #[arg(long)]
    threads: Option<usize>,

    #[command(flatten)]
    opts: ConfigArgs,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Pipeline config JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Output quality 0-100 (JPEG only).
    #[arg(long)]
    quality: Option<u8>,

    /// Background tint: `#rrggbb` or `derive`.
    #[arg(long)]
    tint: Option<String>,

    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    #[arg(long)]
    blur_radius: Option<u32>,

    /// Blurred layer strength 0.0-1.0.
    #[arg(long)]
    opacity: Option<f32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Jpeg,
    Png,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn load_config(args: &ConfigArgs) -> anyhow::Result<backdrop::PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            backdrop::PipelineConfig::from_json_str(&text)
                .with_context(|| format!("parse config '{}'", path.display()))?
        }
        None => backdrop::PipelineConfig::default(),
    };

    if let Some(v) = args.width {
        config.width = v;
    }
    if let Some(v) = args.height {
        config.height = v;
    }
    if let Some(v) = args.quality {
        config.quality = v;
    }
    if let Some(v) = &args.tint {
        config.tint = v.parse().with_context(|| format!("parse --tint '{v}'"))?;
    }
    if let Some(v) = args.format {
        config.format = match v {
            FormatChoice::Jpeg => backdrop::OutputFormat::Jpeg,
            FormatChoice::Png => backdrop::OutputFormat::Png,
        };
    }
    if let Some(v) = args.blur_radius {
        config.blur_radius = v;
    }
    if let Some(v) = args.opacity {
        config.overlay_opacity = v;
    }

    config.validate()?;
    Ok(config)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = load_config(&args.opts)?;
    let bytes = render_file(&args.in_path, &args.out, &config)?;
    tracing::info!(out = %args.out.display(), bytes, "wrote poster");
    Ok(())
}

/// Read `input`, compose it, write the result to `out`; returns the bytes written.
fn render_file(
    input: &Path,
    out: &Path,
    config: &backdrop::PipelineConfig,
) -> anyhow::Result<usize> {
    let bytes =
        std::fs::read(input).with_context(|| format!("read input '{}'", input.display()))?;
    let poster = backdrop::process(&bytes, config)
        .with_context(|| format!("compose '{}'", input.display()))?;
    write_output(out, &poster)?;
    Ok(poster.len())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let config = load_config(&args.opts)?;
    let workers = backdrop::Workers::new(args.threads)?;

    // Read, compose and write per input, so one bad path only fails its own item.
    let results = workers.run_all(&args.inputs, |path| {
        let out = output_path(&args.out_dir, path, config.format);
        render_file(path, &out, &config).map(|bytes| (out, bytes))
    });

    let mut failed = 0usize;
    for (path, res) in args.inputs.iter().zip(results) {
        match res {
            Ok((out, bytes)) => {
                tracing::info!(
                    input = %path.display(),
                    out = %out.display(),
                    bytes,
                    "wrote poster"
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!(input = %path.display(), "{e:#}");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} inputs failed", args.inputs.len());
    }
    Ok(())
}

fn output_path(dir: &Path, input: &Path, format: backdrop::OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "poster".to_string());
    dir.join(format!("{stem}.{}", format.extension()))
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes)
        .with_context(|| format!("write output '{}'", path.display()))
}
