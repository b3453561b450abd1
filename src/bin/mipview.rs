use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use mipview::{
    AffineTransform3D, Argb, ArgbPassthrough, ArrayGrid, CanvasSize, ImagePyramid, Interpolation,
    LatestResult, MultiResolutionRenderer, PaintOutcome, RenderBuffer, RenderSource, RenderState,
    RendererOpts, SourceAndConverter, VoxelGrid,
};

#[derive(Parser, Debug)]
#[command(name = "mipview", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Progressively render an image pyramid to a PNG.
    Render(RenderArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InterpolationArg {
    Nearest,
    Linear,
}

impl From<InterpolationArg> for Interpolation {
    fn from(v: InterpolationArg) -> Self {
        match v {
            InterpolationArg::Nearest => Interpolation::NearestNeighbor,
            InterpolationArg::Linear => Interpolation::NLinear,
        }
    }
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input PNG. A synthetic test pattern is used when omitted.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Side length of the synthetic test pattern.
    #[arg(long, default_value_t = 1024)]
    pattern_size: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory receiving one PNG per progressive pass.
    #[arg(long)]
    passes_dir: Option<PathBuf>,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 512)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 512)]
    height: u32,

    /// Zoom factor (1.0: one image pixel per canvas pixel).
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// Rotation around the canvas centre, in degrees.
    #[arg(long, default_value_t = 0.0)]
    rotate: f64,

    /// Horizontal pan in canvas pixels.
    #[arg(long, default_value_t = 0.0)]
    pan_x: f64,

    /// Vertical pan in canvas pixels.
    #[arg(long, default_value_t = 0.0)]
    pan_y: f64,

    /// Maximum number of pyramid levels.
    #[arg(long, default_value_t = 8)]
    levels: usize,

    /// Sampling method.
    #[arg(long, value_enum, default_value_t = InterpolationArg::Linear)]
    interpolation: InterpolationArg,

    /// Renderer options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the progressive passes and render full resolution once.
    #[arg(long, default_value_t = false)]
    headless: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let opts = match &args.config {
        Some(path) => RendererOpts::from_json_path(path)?,
        None => RendererOpts::default(),
    };

    let grid = match &args.in_path {
        Some(path) => load_png(path)?,
        None => test_pattern(args.pattern_size),
    };
    let [img_w, img_h, _] = grid.dimensions();
    let pyramid = ImagePyramid::build("image", grid, args.levels)?;
    let source = RenderSource::new(
        Arc::new(SourceAndConverter::new(
            Arc::new(pyramid),
            Arc::new(ArgbPassthrough),
        )),
        args.interpolation.into(),
    );

    let canvas = CanvasSize::new(args.width, args.height);
    let viewer = viewer_transform(&args, canvas, img_w as f64, img_h as f64);
    let state = RenderState::new(viewer, 0, [source]);

    let target = Arc::new(LatestResult::new(canvas));
    let renderer = MultiResolutionRenderer::new(opts, target.clone())?;

    if let Some(dir) = &args.passes_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create passes dir '{}'", dir.display()))?;
    }

    let final_buffer = if args.headless {
        let result = renderer.render_full(&state)?;
        Arc::clone(result.buffer())
    } else {
        renderer.request_repaint();
        let mut pass = 0usize;
        loop {
            match renderer.paint(&state) {
                PaintOutcome::Idle => break,
                PaintOutcome::Cancelled => continue,
                PaintOutcome::Failed(e) => return Err(e.into()),
                PaintOutcome::Rendered(result) => {
                    eprintln!(
                        "pass {pass}: scale {} ({}x{}) in {:.2} ms{}",
                        result.screen_scale().factor,
                        result.buffer().width(),
                        result.buffer().height(),
                        result.render_nanos() as f64 / 1e6,
                        if result.is_complete() { ", complete" } else { "" },
                    );
                    if let Some(dir) = &args.passes_dir {
                        write_png(&dir.join(format!("pass-{pass:03}.png")), result.buffer())?;
                    }
                    pass += 1;
                }
            }
        }
        let latest = target
            .latest()
            .context("renderer finished without presenting a result")?;
        Arc::clone(latest.buffer())
    };

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    write_png(&args.out, &final_buffer)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn viewer_transform(
    args: &RenderArgs,
    canvas: CanvasSize,
    img_w: f64,
    img_h: f64,
) -> AffineTransform3D {
    let to_origin = AffineTransform3D::from_translation([
        -(img_w - 1.0) / 2.0,
        -(img_h - 1.0) / 2.0,
        0.0,
    ]);
    let to_canvas = AffineTransform3D::from_translation([
        (f64::from(canvas.width) - 1.0) / 2.0 + args.pan_x,
        (f64::from(canvas.height) - 1.0) / 2.0 + args.pan_y,
        0.0,
    ]);
    to_canvas
        .concatenate(&AffineTransform3D::from_rotation_z(args.rotate.to_radians()))
        .concatenate(&AffineTransform3D::from_scale(args.zoom))
        .concatenate(&to_origin)
}

fn load_png(path: &Path) -> anyhow::Result<ArrayGrid<Argb>> {
    let img = image::open(path)
        .with_context(|| format!("read image '{}'", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    Ok(ArrayGrid::from_fn([w as usize, h as usize, 1], |x, y, _| {
        let p = img.get_pixel(x as u32, y as u32);
        Argb::from_channels(p[3], p[0], p[1], p[2])
    }))
}

fn test_pattern(size: u32) -> ArrayGrid<Argb> {
    let size = size.max(1) as usize;
    ArrayGrid::from_fn([size, size, 1], |x, y, _| {
        let r = (x * 255 / size) as u8;
        let g = (y * 255 / size) as u8;
        let b = if (x / 32 + y / 32) % 2 == 0 { 200 } else { 40 };
        Argb::from_channels(255, r, g, b)
    })
}

fn write_png(path: &Path, buffer: &RenderBuffer) -> anyhow::Result<()> {
    image::save_buffer_with_format(
        path,
        &buffer.to_rgba8(),
        buffer.width(),
        buffer.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
