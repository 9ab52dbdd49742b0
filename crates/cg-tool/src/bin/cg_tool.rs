use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use cellgrid::{
    Cell, Corners, FountainDecoderSink, FountainEncoderStream, Point2d, Raster, RasterView,
    ScanStep, StreamConfig, calculate_midpoints, quad_center, subdivide,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cg_tool")]
#[command(about = "Sample color-cell grids and frame payloads as fountain packets")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a payload as fountain packets.
    Encode(EncodeArgs),
    /// Rebuild a payload from fountain packets.
    Decode(DecodeArgs),
    /// Rectify a quad and sample its four child cells.
    Sample(SampleArgs),
}

#[derive(Args, Debug, Clone)]
struct EncodeArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value_t = StreamConfig::default().packet_size)]
    packet_size: usize,
    /// Packets written, as a multiple of the systematic block count.
    #[arg(long, default_value_t = 1.5)]
    redundancy: f64,
}

#[derive(Args, Debug, Clone)]
struct DecodeArgs {
    #[arg(long)]
    input: PathBuf,
    /// Payload length in bytes.
    #[arg(long)]
    size: usize,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value_t = StreamConfig::default().packet_size)]
    packet_size: usize,
}

#[derive(Args, Debug, Clone)]
struct SampleArgs {
    #[arg(long)]
    image: PathBuf,
    /// Quad corners as `x0,y0,x1,y1,x2,y2,x3,y3` in top-left, top-right,
    /// bottom-left, bottom-right order.
    #[arg(long, value_parser = parse_corners, allow_hyphen_values = true)]
    corners: Corners,
    /// Write the report here instead of stdout.
    #[arg(long)]
    json: Option<PathBuf>,
    /// Sample every other scanline.
    #[arg(long)]
    alternate: bool,
}

#[derive(Debug, Clone, Serialize)]
struct PointDto {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Serialize)]
struct MidpointsDto {
    top: Option<PointDto>,
    bottom: Option<PointDto>,
    left: Option<PointDto>,
    right: Option<PointDto>,
}

#[derive(Debug, Clone, Serialize)]
struct CellDto {
    quadrant: &'static str,
    window: [usize; 4],
    rgb: [u8; 3],
    mean_rgb: [u8; 3],
    overexposed: bool,
}

#[derive(Debug, Clone, Serialize)]
struct SampleReport {
    width: usize,
    height: usize,
    center: Option<PointDto>,
    midpoints: MidpointsDto,
    cells: Vec<CellDto>,
}

const QUADRANTS: [&str; 4] = ["top_left", "top_right", "bottom_left", "bottom_right"];

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Encode(args) => run_encode(args),
        Command::Decode(args) => run_decode(args),
        Command::Sample(args) => run_sample(args),
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    ensure!(
        args.redundancy.is_finite() && args.redundancy > 0.0,
        "redundancy must be a positive number, got {}",
        args.redundancy
    );
    let config = StreamConfig::with_packet_size(args.packet_size);
    config.validate().context("invalid packet layout")?;

    let input =
        File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?;
    let stream = FountainEncoderStream::from_reader(input, config.clone())
        .with_context(|| format!("encoding {}", args.input.display()))?;

    let packets = packet_count(stream.blocks_required(), args.redundancy);
    info!(
        payload_len = stream.payload_len(),
        packets,
        packet_size = config.packet_size,
        "writing fountain packets"
    );

    let out = File::create(&args.out).with_context(|| format!("creating {}", args.out.display()))?;
    let mut writer = BufWriter::new(out);
    let wanted = (packets * config.packet_size) as u64;
    let written = io::copy(&mut stream.take(wanted), &mut writer)
        .with_context(|| format!("writing {}", args.out.display()))?;
    writer.flush().context("flushing packets")?;

    if written < wanted {
        warn!(written, wanted, "stream ended early");
    }
    Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let config = StreamConfig::with_packet_size(args.packet_size);
    let mut sink =
        FountainDecoderSink::new(args.size, config).context("setting up fountain decoder")?;

    let wire = fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    sink.write_bytes(&wire)
        .with_context(|| format!("decoding {}", args.input.display()))?;

    let received = sink.received_count();
    let Some(payload) = sink.into_payload() else {
        bail!("payload not recoverable from {received} distinct packets");
    };
    info!(received, payload_len = payload.len(), "payload recovered");

    fs::write(&args.out, payload).with_context(|| format!("writing {}", args.out.display()))
}

fn run_sample(args: SampleArgs) -> Result<()> {
    let img = load_rgb(&args.image)?;
    let view = img.as_view();
    let step = if args.alternate {
        ScanStep::Alternate
    } else {
        ScanStep::Every
    };

    let Some(mids) = calculate_midpoints(&args.corners) else {
        bail!("corners do not form a usable quad");
    };
    let Some(children) = subdivide(&args.corners) else {
        bail!("quad midpoints incomplete: {mids:?}");
    };

    let mut cells = Vec::with_capacity(children.len());
    for (child, quadrant) in children.iter().zip(QUADRANTS) {
        let Some([x, y, w, h]) = clamp_window(child, view) else {
            warn!(quadrant, "cell has no pixels inside the image");
            continue;
        };
        let cell = Cell::with_window(view, x, y, w, h)
            .with_context(|| format!("windowing {quadrant} cell"))?;
        let sample = cell.calc_rgb_detailed(step);
        cells.push(CellDto {
            quadrant,
            window: [x, y, w, h],
            rgb: sample.value,
            mean_rgb: cell.mean_rgb(step),
            overexposed: sample.overexposed,
        });
    }

    let report = SampleReport {
        width: view.width(),
        height: view.height(),
        center: quad_center(&args.corners).map(point_dto),
        midpoints: MidpointsDto {
            top: mids.top.map(point_dto),
            bottom: mids.bottom.map(point_dto),
            left: mids.left.map(point_dto),
            right: mids.right.map(point_dto),
        },
        cells,
    };

    match args.json {
        Some(path) => write_json(&path, &report),
        None => {
            let text = serde_json::to_string_pretty(&report).context("serializing json")?;
            println!("{text}");
            Ok(())
        }
    }
}

fn load_rgb(path: &Path) -> Result<Raster> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let rgb = dyn_img.to_rgb8();
    let (w, h) = rgb.dimensions();

    Raster::from_vec(w as usize, h as usize, 3, rgb.into_raw())
        .with_context(|| format!("constructing raster from {}", path.display()))
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn point_dto(p: Point2d) -> PointDto {
    PointDto { x: p.x, y: p.y }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn packet_count(blocks_required: usize, redundancy: f64) -> usize {
    ((blocks_required as f64) * redundancy).ceil().max(1.0) as usize
}

/// Bounding box of `quad` clipped to the image, as `[x, y, cols, rows]`.
#[allow(clippy::cast_sign_loss)]
fn clamp_window(quad: &Corners, view: RasterView<'_>) -> Option<[usize; 4]> {
    let (x, y, w, h) = quad.bounding_box()?;
    let clip = |start: i32, len: u32, limit: usize| {
        let lo = start.max(0) as usize;
        let hi = (i64::from(start) + i64::from(len)).clamp(0, limit as i64) as usize;
        (hi > lo).then(|| (lo, hi - lo))
    };
    let (x, cols) = clip(x, w, view.width())?;
    let (y, rows) = clip(y, h, view.height())?;
    Some([x, y, cols, rows])
}

fn parse_corners(s: &str) -> Result<Corners, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate: {e}"))?;
    let [x0, y0, x1, y1, x2, y2, x3, y3] = values[..] else {
        return Err(format!("expected 8 coordinates, got {}", values.len()));
    };

    Ok(Corners::new(
        Point2d::new(x0, y0),
        Point2d::new(x1, y1),
        Point2d::new(x2, y2),
        Point2d::new(x3, y3),
    ))
}
