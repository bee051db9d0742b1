use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "inset", version)]
struct Cli {
    /// Log compositor steps to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a draw script as a PNG.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input draw script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Ignore inset mode; every call draws as on a plain surface.
    #[arg(long)]
    no_inset: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_script(path: &Path) -> anyhow::Result<inset::DrawScript> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("open draw script '{}'", path.display()))?;
    let script = inset::DrawScript::from_json(&json).with_context(|| "parse draw script JSON")?;
    Ok(script)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut script = read_script(&args.in_path)?;
    script.settings = script.settings.apply_env()?;
    script.validate()?;

    let base_dir = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let frame = if args.no_inset {
        script.render_plain(base_dir)?
    } else {
        script.render(base_dir)?
    };

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    frame
        .to_rgba_image()?
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
