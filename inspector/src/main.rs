use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::{BridgeState, GuiBridge};
use gui_bridge::model::MeasurementPayload;
use std::net::SocketAddr;
use std::path::PathBuf;
use thermcore::view::CalibrationMode;
use thermcore::Palette;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::{ContainerConfig, InspectorConfig};
use workflow::runner::Runner;

mod export;
mod generator;
mod gui_bridge;
mod storage;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Thermal frame inspection and annotation driver")]
struct Args {
    /// Load an inspector config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// JSON thermal frame; a synthetic scene is used when omitted
    #[arg(long)]
    frame: Option<PathBuf>,
    #[arg(long, default_value = "demo-measurement")]
    measurement: String,
    #[arg(long, default_value_t = Palette::Iron)]
    palette: Palette,
    #[arg(long)]
    calibration_min: Option<f32>,
    #[arg(long)]
    calibration_max: Option<f32>,
    /// Fallback maximum when the frame carries no reported maximum
    #[arg(long)]
    max_temp_hint: Option<f32>,
    /// Place a marker at data pixel X,Y (repeatable)
    #[arg(long = "mark", value_parser = parse_point)]
    marks: Vec<(u32, u32)>,
    /// Write the annotated raster as PNG
    #[arg(long)]
    png: Option<PathBuf>,
    #[arg(long, default_value_t = 4)]
    png_scale: u32,
    #[arg(long, default_value = "tools/data/markers")]
    store_dir: PathBuf,
    #[arg(long, default_value_t = 800.0)]
    width: f64,
    #[arg(long, default_value_t = 600.0)]
    height: f64,
    #[arg(long, default_value_t = 40.0)]
    padding: f64,
    /// Keep the HTTP bridge alive for viewers
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: SocketAddr,
}

fn parse_point(raw: &str) -> Result<(u32, u32), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {raw:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in {raw:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in {raw:?}: {e}"))?;
    Ok((x, y))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.workflow {
        InspectorConfig::load(path)?
    } else {
        InspectorConfig::from_args(
            args.measurement,
            args.palette,
            args.frame,
            args.max_temp_hint,
            args.calibration_min,
            args.calibration_max,
            ContainerConfig {
                width: args.width,
                height: args.height,
                padding: args.padding,
            },
            args.store_dir,
        )
    };

    let runner = Runner::new(config.clone());
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating inspection runtime")?;
    let result = runtime.block_on(runner.execute(&args.marks))?;
    let session = &result.session;

    if let Some(status) = session.status() {
        println!("{}", status);
    }
    if let Some(frame) = session.frame() {
        let range = session.calibration().range();
        println!(
            "{} -> {}x{} frame, {:.1}..{:.1} C, palette {}, calibration {:.1}..{:.1} ({:?})",
            session.measurement_id(),
            frame.width(),
            frame.height(),
            frame.min_temp(),
            frame.max_temp(),
            session.palette(),
            range.min,
            range.max,
            session.calibration().mode()
        );
    }
    if let Some(hot) = result.hottest {
        println!("hottest pixel ({}, {}) at {:.2} C", hot.x, hot.y, hot.temperature);
    }
    for marker in session.markers().iter() {
        println!(
            "  #{} {} ({}, {}) {:.2} C {} {}",
            session.markers().number_of(marker.id).unwrap_or(0),
            marker.id,
            marker.x,
            marker.y,
            marker.temperature,
            marker.element_type,
            marker.final_action
        );
    }

    if let (Some(path), Some(raster)) = (args.png.as_ref(), session.raster()) {
        let image = export::annotated_image(raster, session.markers(), args.png_scale)?;
        export::write_png(path, &image)?;
        println!("wrote {}", path.display());
    }

    if args.serve {
        let bridge = GuiBridge::new(BridgeState::new(runner.sync()));
        if let Some(frame) = session.frame() {
            bridge.publish(MeasurementPayload {
                measurement_id: session.measurement_id().to_string(),
                frame: frame.clone(),
                calibration: (session.calibration().mode() == CalibrationMode::Manual)
                    .then(|| session.calibration_seed()),
                palette: session.palette(),
            })?;
        }
        bridge.spawn(args.bind)?;
        println!("HTTP bridge running on {} (Ctrl+C to stop)...", args.bind);
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
