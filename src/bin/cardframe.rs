use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use sha2::Digest as _;

use cardframe::{
    CardConfig, CardSession, FontRole, FontSet, MedianCut, OriginalUpload, PaletteExtractor,
    PersistedState,
};

#[derive(Parser, Debug)]
#[command(name = "cardframe", version)]
struct Cli {
    /// Raise log verbosity (`-v` info, `-vv` debug). `RUST_LOG` also applies.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the card at export scale and write the PNG.
    Export(ExportArgs),
    /// Print the palette and average color of an image.
    Palette(PaletteArgs),
    /// Run a live session for a while and write the last preview frame.
    Preview(PreviewArgs),
    /// Print the submission payload without sending anything.
    Payload(PayloadArgs),
    /// Print the resolved fonts and the SHA-256 of their bytes.
    Fonts(FontsArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Saved card state JSON.
    #[arg(long)]
    state: PathBuf,

    /// Portrait image.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Output directory; the filename is derived from the character name.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Export scale (overrides the config).
    #[arg(long)]
    scale: Option<f64>,

    /// Config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PaletteArgs {
    #[arg(long)]
    image: PathBuf,

    /// Palette size.
    #[arg(long, default_value_t = 5)]
    colors: usize,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[arg(long)]
    state: PathBuf,

    #[arg(long)]
    image: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// How long to run the session.
    #[arg(long, default_value_t = 1000)]
    duration_ms: u64,

    /// Redraw on every animation tick.
    #[arg(long)]
    animate: bool,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PayloadArgs {
    #[arg(long)]
    state: PathBuf,

    #[arg(long)]
    image: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FontsArgs {
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Palette(args) => cmd_palette(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Payload(args) => cmd_payload(args),
        Command::Fonts(args) => cmd_fonts(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CardConfig> {
    match path {
        Some(p) => CardConfig::from_json_file(p)
            .with_context(|| format!("load config '{}'", p.display())),
        None => Ok(CardConfig::default()),
    }
}

fn read_state(path: &Path) -> anyhow::Result<PersistedState> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read state '{}'", path.display()))?;
    PersistedState::from_json(&text).with_context(|| format!("parse state '{}'", path.display()))
}

fn read_image(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))
}

/// Build a session from saved state and an optional portrait, with color analysis finished.
fn settle_session(
    cfg: CardConfig,
    state: &PersistedState,
    upload: Option<&[u8]>,
) -> anyhow::Result<CardSession> {
    let now = Instant::now();
    let mut session = CardSession::from_config(cfg, now)?;
    session.restore(state, now);
    if let Some(bytes) = upload {
        if session.upload_image(bytes, now).is_none() {
            anyhow::bail!("{}", session.status());
        }
        while session.pending_extractions() > 0 {
            session.pump(Instant::now())?;
        }
    }
    Ok(session)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(scale) = args.scale {
        cfg.export_scale = scale;
        cfg.validate()?;
    }
    let state = read_state(&args.state)?;
    let upload = args.image.as_deref().map(read_image).transpose()?;

    let mut session = settle_session(cfg, &state, upload.as_deref())?;
    let artifact = session.export(Instant::now())?;
    let path = artifact.write_to_dir(&args.out_dir)?;

    eprintln!(
        "wrote {} ({}x{} @{}x)",
        path.display(),
        artifact.width,
        artifact.height,
        artifact.scale
    );
    Ok(())
}

fn cmd_palette(args: PaletteArgs) -> anyhow::Result<()> {
    let bytes = read_image(&args.image)?;
    let portrait = cardframe::decode_portrait(&bytes, 0)?;
    let average = cardframe::average_color(&portrait.pixels);
    println!("average  {}", average.describe());
    match MedianCut::default().extract(&portrait.pixels, args.colors) {
        Ok(palette) => {
            for (i, c) in palette.iter().take(args.colors).enumerate() {
                println!("palette[{i}]  {}", c.describe());
            }
        }
        Err(e) => eprintln!("palette unavailable: {e}"),
    }
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if args.animate && cfg.animation_interval_ms.is_none() {
        cfg.animation_interval_ms = Some(33);
    }
    let state = read_state(&args.state)?;
    let upload = args.image.as_deref().map(read_image).transpose()?;

    let start = Instant::now();
    let end = start + Duration::from_millis(args.duration_ms);
    let mut session = CardSession::from_config(cfg, start)?;
    session.restore(&state, start);
    if let Some(bytes) = upload.as_deref() {
        session.upload_image(bytes, start);
    }

    let mut extractions = 0u32;
    loop {
        let now = Instant::now();
        if now >= end {
            break;
        }
        let report = session.pump(now)?;
        if report.extraction.is_some() {
            extractions += 1;
        }
        let wake = session.next_wake(now).unwrap_or(end).min(end);
        if let Some(wait) = wake.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
    }
    // Serve whatever is still due so the written frame reflects the latest state.
    if session.scheduler().next_deadline().is_some_and(|d| d <= Instant::now()) {
        session.pump(Instant::now())?;
    }

    let frame = session
        .preview()
        .context("session ended before the first preview was drawn")?;
    let img = frame.to_rgba_image()?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    img.save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} after {} redraws, {} extraction stages; status: {}",
        args.out.display(),
        session.scheduler().renders(),
        extractions,
        session.status()
    );
    Ok(())
}

fn cmd_payload(args: PayloadArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let state = read_state(&args.state)?;
    let upload = args.image.as_deref().map(read_image).transpose()?;

    let mut session = settle_session(cfg, &state, upload.as_deref())?;
    let artifact = session.export(Instant::now())?;
    let original = match (&args.image, upload) {
        (Some(path), Some(bytes)) => Some(OriginalUpload {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "original".to_string()),
            content_type: image::ImageFormat::from_path(path)
                .map(|f| f.to_mime_type().to_string())
                .unwrap_or_else(|_| "application/octet-stream".to_string()),
            bytes,
        }),
        _ => None,
    };
    let unix_now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let submission = cardframe::prepare_submission(
        session.inputs(),
        session.dominant(),
        &artifact,
        original.as_ref(),
        unix_now,
    )?;
    println!("{}", submission.payload_json()?);
    for part in &submission.parts {
        eprintln!(
            "part {}: {} ({}, {} bytes)",
            part.field,
            part.filename,
            part.content_type,
            part.bytes.len()
        );
    }
    Ok(())
}

fn cmd_fonts(args: FontsArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let fonts = FontSet::resolve(&cfg.fonts);
    for (label, role) in [("bold", FontRole::Bold), ("regular", FontRole::Regular)] {
        match fonts.face(role) {
            Some(face) => {
                println!("{label}:");
                println!("  family: {}", face.family);
                println!("  index:  {}", face.index);
                println!("  sha256: {}", sha256_hex(&face.bytes));
            }
            None => println!("{label}: <none>"),
        }
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
