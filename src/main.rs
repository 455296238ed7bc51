use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, info, warn};
use simplelog::{Config, WriteLogger};

use pagecrop::editor::Outcome;
use pagecrop::editor::coords::{ClientPoint, PointerInput, SurfaceLayout};
use pagecrop::{EditorConfig, EditorSession, PointerEvent, Scale};

const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(
    name = "pagecrop",
    version,
    about = "Mark one crop region per page of a document"
)]
struct Cli {
    /// YAML editor configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Zoom factor, or `fit` to fit the container width
    #[arg(long)]
    zoom: Option<ZoomArg>,

    /// Container width in pixels used by `--zoom fit`
    #[arg(long)]
    container_width: Option<f32>,

    /// Crop region as PAGE:X0,Y0,X1,Y1 in raster pixels (repeatable)
    #[arg(long = "select", value_name = "PAGE:X0,Y0,X1,Y1")]
    selections: Vec<SelectArg>,

    /// Write the composited surface of the last visited page as PNG
    #[arg(long, value_name = "OUT.png")]
    preview: Option<PathBuf>,

    document: PathBuf,
}

#[derive(Clone, Copy, Debug)]
struct ZoomArg(Scale);

impl FromStr for ZoomArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("fit") {
            return Ok(Self(Scale::Fit));
        }
        s.parse::<f32>()
            .ok()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| Self(Scale::Factor(f)))
            .ok_or_else(|| format!("expected a positive number or `fit`, got `{s}`"))
    }
}

#[derive(Clone, Copy, Debug)]
struct SelectArg {
    page: usize,
    from: (f32, f32),
    to: (f32, f32),
}

impl FromStr for SelectArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (page, coords) = s
            .split_once(':')
            .ok_or_else(|| format!("expected PAGE:X0,Y0,X1,Y1, got `{s}`"))?;
        let page = page
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("bad page `{page}`: {e}"))?;
        let values = coords
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("bad coordinate in `{coords}`: {e}"))?;
        let [x0, y0, x1, y1] = values[..] else {
            return Err(format!("expected four coordinates, got {}", values.len()));
        };
        Ok(Self {
            page,
            from: (x0, y0),
            to: (x1, y1),
        })
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    match &cli.log_file {
        Some(path) => WriteLogger::init(
            cli.log_level,
            Config::default(),
            File::create(path).with_context(|| format!("creating log file {path:?}"))?,
        )?,
        None => WriteLogger::init(cli.log_level, Config::default(), std::io::stderr())?,
    }
    Ok(())
}

#[cfg(feature = "pdf")]
fn open_session(bytes: Vec<u8>, config: EditorConfig) -> Result<EditorSession> {
    Ok(EditorSession::open(
        pagecrop::render::MupdfRenderer,
        bytes,
        config,
    )?)
}

#[cfg(not(feature = "pdf"))]
fn open_session(_bytes: Vec<u8>, _config: EditorConfig) -> Result<EditorSession> {
    bail!("no document renderer available; rebuild with `--features pdf`")
}

fn settle(session: &mut EditorSession) -> Result<()> {
    if !session.wait_until_idle(RENDER_TIMEOUT) {
        bail!("timed out waiting for page {} to render", session.current_page());
    }
    Ok(())
}

fn apply_selection(session: &mut EditorSession, select: &SelectArg) -> Result<()> {
    session.go_to_page(select.page);
    settle(session)?;
    if session.current_page() != select.page {
        warn!(
            "Page {} is out of range, selection applied to page {}",
            select.page,
            session.current_page()
        );
    }

    // Selections are given in raster pixels, so display the surface natively.
    session.set_surface_layout(SurfaceLayout::native(session.surface().dimensions()));

    let point = |(x, y): (f32, f32)| PointerInput::Mouse(ClientPoint::new(x, y));
    session.handle_pointer(PointerEvent::Down(point(select.from)));
    session.handle_pointer(PointerEvent::Move(point(select.to)));
    match session.handle_pointer(PointerEvent::Up) {
        Outcome::Commit(rect) => info!("Selected {rect:?} on page {}", select.page),
        other => warn!("Selection on page {} not committed: {other:?}", select.page),
    }
    Ok(())
}

fn write_preview(session: &EditorSession, path: &Path) -> Result<()> {
    session
        .surface()
        .save(path)
        .with_context(|| format!("writing preview {path:?}"))?;
    info!("Preview written to {path:?}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    info!("Starting pagecrop");

    let mut config = match &cli.config {
        Some(path) => EditorConfig::load_or_default(path),
        None => EditorConfig::default(),
    };
    if let Some(ZoomArg(scale)) = cli.zoom {
        config.initial_scale = match scale {
            Scale::Fit => None,
            Scale::Factor(f) => Some(f),
        };
    }

    let bytes =
        fs::read(&cli.document).with_context(|| format!("reading {:?}", cli.document))?;
    let fit = config.initial_scale.is_none();
    let mut session = open_session(bytes, config)?;
    if let Some(width) = cli.container_width {
        session.set_container_width(width);
        if fit {
            session.fit_to_width();
        }
    }
    settle(&mut session)?;

    for select in &cli.selections {
        apply_selection(&mut session, select)?;
    }

    if let Some(path) = &cli.preview {
        write_preview(&session, path)?;
    }

    session.poll_renders();
    for notification in session.notifications().all() {
        warn!("{}", notification.message);
    }

    let selections = session.require_selections()?;
    println!("{}", serde_json::to_string_pretty(&selections)?);

    info!("Shutting down pagecrop");
    Ok(())
}
