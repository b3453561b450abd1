use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use serde_json::json;
use sha2::Digest as _;

#[derive(Clone, Debug)]
struct BenchArgs {
    width: u32,
    height: u32,
    image_size: u32,
    levels: usize,
    zoom: f64,
    warmup: u32,
    repeats: u32,
    threads: Option<usize>,
    bands_per_thread: usize,
    out_dir: PathBuf,
}

#[derive(Clone, Debug, Default)]
struct RunMetrics {
    renderer_create: Duration,
    first_pass: Duration,
    to_complete: Duration,
    full_res_pass: Duration,
    headless: Duration,
    wall_total: Duration,
    passes: usize,
    digest: String,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = parse_args()?;

    if args.width == 0 || args.height == 0 {
        anyhow::bail!("--width/--height must be > 0");
    }
    if args.image_size == 0 || args.levels == 0 {
        anyhow::bail!("--image-size and --levels must be > 0");
    }
    if !(args.zoom > 0.0) {
        anyhow::bail!("--zoom must be > 0");
    }
    if let Some(n) = args.threads
        && n == 0
    {
        anyhow::bail!("--threads must be >= 1 when set");
    }

    let out_dir = if args.out_dir.is_absolute() {
        args.out_dir.clone()
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(&args.out_dir)
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create out dir '{}'", out_dir.display()))?;

    let build_t0 = Instant::now();
    let state = build_state(&args)?;
    eprintln!(
        "pyramid: {size}x{size}, {levels} level(s), built in {ms:.1}ms",
        size = args.image_size,
        levels = state.sources()[0].source().num_mipmap_levels(),
        ms = build_t0.elapsed().as_secs_f64() * 1000.0,
    );

    if args.warmup > 0 {
        eprintln!("warmup: {} run(s)", args.warmup);
        for _ in 0..args.warmup {
            let _ = run_once(&args, &state)?;
        }
    }

    eprintln!(
        "bench: {repeats} run(s) ({profile} build), canvas {w}x{h}, zoom {zoom}, threads={threads}, bands/thread={bands}",
        repeats = args.repeats,
        profile = if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        w = args.width,
        h = args.height,
        zoom = args.zoom,
        threads = args
            .threads
            .map(|n| n.to_string())
            .unwrap_or_else(|| "auto".to_string()),
        bands = args.bands_per_thread,
    );

    let mut runs = Vec::<RunMetrics>::with_capacity(args.repeats as usize);
    for _ in 0..args.repeats {
        runs.push(run_once(&args, &state)?);
    }

    if let Some(first) = runs.first()
        && runs.iter().any(|r| r.digest != first.digest)
    {
        anyhow::bail!("final frames differ between runs (non-deterministic output)");
    }

    report_percentiles(&runs);
    write_summary(&out_dir, &args, &runs)?;
    Ok(())
}

fn build_state(args: &BenchArgs) -> anyhow::Result<mipview::RenderState> {
    let size = args.image_size as usize;
    let grid = mipview::ArrayGrid::from_fn([size, size, 1], |x, y, _| {
        let r = (x * 255 / size) as u8;
        let g = (y * 255 / size) as u8;
        let b = if (x / 64 + y / 64) % 2 == 0 { 220 } else { 30 };
        mipview::Argb::from_channels(255, r, g, b)
    });
    let pyramid = mipview::ImagePyramid::build("bench", grid, args.levels)?;
    let source = mipview::RenderSource::new(
        Arc::new(mipview::SourceAndConverter::new(
            Arc::new(pyramid),
            Arc::new(mipview::ArgbPassthrough),
        )),
        mipview::Interpolation::NLinear,
    );

    let half_image = (f64::from(args.image_size) - 1.0) / 2.0;
    let viewer = mipview::AffineTransform3D::from_translation([
        (f64::from(args.width) - 1.0) / 2.0,
        (f64::from(args.height) - 1.0) / 2.0,
        0.0,
    ])
    .concatenate(&mipview::AffineTransform3D::from_rotation_z(0.3))
    .concatenate(&mipview::AffineTransform3D::from_scale(args.zoom))
    .concatenate(&mipview::AffineTransform3D::from_translation([
        -half_image,
        -half_image,
        0.0,
    ]));
    Ok(mipview::RenderState::new(viewer, 0, [source]))
}

fn run_once(args: &BenchArgs, state: &mipview::RenderState) -> anyhow::Result<RunMetrics> {
    let wall = Instant::now();

    let create_t0 = Instant::now();
    let target = Arc::new(mipview::LatestResult::new(mipview::CanvasSize::new(
        args.width,
        args.height,
    )));
    let opts = mipview::RendererOpts {
        num_rendering_threads: args.threads,
        bands_per_thread: args.bands_per_thread,
        ..mipview::RendererOpts::default()
    };
    let renderer = mipview::MultiResolutionRenderer::new(opts, target.clone())?;
    let mut m = RunMetrics {
        renderer_create: create_t0.elapsed(),
        ..RunMetrics::default()
    };

    let t0 = Instant::now();
    renderer.request_repaint();
    loop {
        match renderer.paint(state) {
            mipview::PaintOutcome::Idle => break,
            mipview::PaintOutcome::Cancelled => continue,
            mipview::PaintOutcome::Failed(e) => return Err(e.into()),
            mipview::PaintOutcome::Rendered(result) => {
                if m.passes == 0 {
                    m.first_pass = t0.elapsed();
                }
                m.passes += 1;
                if result.scale_index() == 0 {
                    m.full_res_pass = Duration::from_nanos(result.render_nanos());
                }
                if result.is_complete() {
                    m.to_complete = t0.elapsed();
                }
            }
        }
    }

    let latest = target
        .latest()
        .context("progressive run finished without presenting a frame")?;
    m.digest = sha256_hex(latest.buffer().pixels());

    let t1 = Instant::now();
    let _ = renderer.render_full(state)?;
    m.headless = t1.elapsed();

    m.wall_total = wall.elapsed();
    Ok(m)
}

fn sha256_hex(pixels: &[u32]) -> String {
    let mut hasher = sha2::Sha256::new();
    for px in pixels {
        hasher.update(px.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn parse_args() -> anyhow::Result<BenchArgs> {
    let mut args = std::env::args().skip(1);
    let mut out = BenchArgs {
        width: 1280,
        height: 720,
        image_size: 4096,
        levels: 10,
        zoom: 0.4,
        warmup: 1,
        repeats: 20,
        threads: None,
        bands_per_thread: 10,
        out_dir: PathBuf::from("out"),
    };

    while let Some(a) = args.next() {
        match a.as_str() {
            "--width" => out.width = parse_u32(args.next(), "--width")?,
            "--height" => out.height = parse_u32(args.next(), "--height")?,
            "--image-size" => out.image_size = parse_u32(args.next(), "--image-size")?,
            "--levels" => out.levels = parse_usize(args.next(), "--levels")?,
            "--zoom" => {
                let v = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("missing value for --zoom"))?;
                out.zoom = v
                    .parse::<f64>()
                    .with_context(|| format!("parse --zoom value '{v}'"))?;
            }
            "--warmup" => out.warmup = parse_u32(args.next(), "--warmup")?,
            "--repeats" => out.repeats = parse_u32(args.next(), "--repeats")?,
            "--threads" => out.threads = Some(parse_usize(args.next(), "--threads")?),
            "--bands-per-thread" => {
                out.bands_per_thread = parse_usize(args.next(), "--bands-per-thread")?
            }
            "--out-dir" => {
                out.out_dir = PathBuf::from(args.next().ok_or_else(|| {
                    anyhow::anyhow!("missing value for --out-dir (expected a path)")
                })?)
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => anyhow::bail!("unknown arg '{a}' (try --help)"),
        }
    }

    Ok(out)
}

fn print_help() {
    eprintln!(
        r#"mipview-bench

Renders a synthetic pyramid progressively (coarse to full resolution) repeatedly and reports
p50/p90/p99 for each stage.

Usage:
  cargo run -q --release
  cargo run -q --release -- --repeats 50 --threads 4
  cargo run -q --release -- --width 1920 --height 1080 --zoom 1.0

Args:
  --width N             (default 1280)
  --height N            (default 720)
  --image-size N        (default 4096; side of the synthetic level-0 image)
  --levels N            (default 10)
  --zoom F              (default 0.4)
  --warmup N            (default 1)
  --repeats N           (default 20)
  --threads N           projector worker threads (default auto)
  --bands-per-thread N  (default 10)
  --out-dir PATH        (default out; relative to the bench crate)
"#
    );
}

fn parse_u32(v: Option<String>, flag: &str) -> anyhow::Result<u32> {
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<u32>()
        .with_context(|| format!("parse {flag} value '{v}'"))
}

fn parse_usize(v: Option<String>, flag: &str) -> anyhow::Result<usize> {
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<usize>()
        .with_context(|| format!("parse {flag} value '{v}'"))
}

type Getter = fn(&RunMetrics) -> Duration;
type Field = (&'static str, Getter);

fn fields() -> [Field; 6] {
    [
        ("renderer_create", |m| m.renderer_create),
        ("first_pass", |m| m.first_pass),
        ("to_complete", |m| m.to_complete),
        ("full_res_pass", |m| m.full_res_pass),
        ("headless", |m| m.headless),
        ("wall_total", |m| m.wall_total),
    ]
}

fn collect(runs: &[RunMetrics], f: Getter) -> Vec<Duration> {
    let mut v = runs.iter().map(f).collect::<Vec<_>>();
    v.sort_by_key(|d| d.as_nanos());
    v
}

fn p(v: &[Duration], p: f64) -> Duration {
    if v.is_empty() {
        return Duration::ZERO;
    }
    let n = v.len();
    let rank = (p * (n as f64)).ceil().clamp(1.0, n as f64) as usize;
    v[rank - 1]
}

fn fmt_ms(d: Duration) -> String {
    format!("{:.3}ms", d.as_secs_f64() * 1000.0)
}

fn report_percentiles(runs: &[RunMetrics]) {
    eprintln!("\npercentiles across runs (p50/p90/p99):");
    for (name, getter) in fields() {
        let v = collect(runs, getter);
        eprintln!(
            "  {name:16} p50={p50:>10}  p90={p90:>10}  p99={p99:>10}",
            name = name,
            p50 = fmt_ms(p(&v, 0.50)),
            p90 = fmt_ms(p(&v, 0.90)),
            p99 = fmt_ms(p(&v, 0.99))
        );
    }
    if let Some(first) = runs.first() {
        eprintln!("  passes/run: {}  final frame sha256: {}", first.passes, first.digest);
    }
}

fn write_summary(
    out_dir: &std::path::Path,
    args: &BenchArgs,
    runs: &[RunMetrics],
) -> anyhow::Result<()> {
    let stages = fields()
        .into_iter()
        .map(|(name, getter)| {
            let v = collect(runs, getter);
            (
                name.to_string(),
                json!({
                    "p50_ms": p(&v, 0.50).as_secs_f64() * 1000.0,
                    "p90_ms": p(&v, 0.90).as_secs_f64() * 1000.0,
                    "p99_ms": p(&v, 0.99).as_secs_f64() * 1000.0,
                }),
            )
        })
        .collect::<serde_json::Map<_, _>>();

    let summary = json!({
        "canvas": [args.width, args.height],
        "image_size": args.image_size,
        "levels": args.levels,
        "zoom": args.zoom,
        "threads": args.threads,
        "repeats": runs.len(),
        "passes_per_run": runs.first().map_or(0, |r| r.passes),
        "final_frame_sha256": runs.first().map(|r| r.digest.clone()),
        "stages": stages,
    });

    let path = out_dir.join("summary.json");
    let f = std::fs::File::create(&path)
        .with_context(|| format!("create '{}'", path.display()))?;
    serde_json::to_writer_pretty(f, &summary)
        .with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
