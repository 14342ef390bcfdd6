use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use glam::vec3;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use gscene::animation::{AnimationConfig, Easing};
use gscene::attrs;
use gscene::config::DirtyRectangleConfig;
use gscene::render::recording::{recording_backend, DrawCommand, RecordingLog};
use gscene::{Canvas, CanvasConfig, NodeConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Animates a small scene and prints the draw calls of every frame")]
struct Cli {
	#[arg(long, help = "Canvas config as JSON, e.g. {\"width\": 800, \"dirtyRectangle\": {\"debug\": true}}")]
	config: Option<PathBuf>,
	#[arg(long, default_value_t = 8, help = "Number of frames to run")]
	frames: u32,
	#[arg(long, help = "Repaint the whole canvas every frame")]
	full_repaint: bool,
	#[arg(short, long, help = "Log debug output")]
	verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	tracing_subscriber::registry()
		.with(fmt::layer())
		.with(if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO })
		.init();

	let mut config = match &cli.config {
		Some(path) => CanvasConfig::from_json(&fs::read_to_string(path)?)?,
		None => CanvasConfig::default(),
	};
	if cli.full_repaint {
		config.dirty_rectangle = DirtyRectangleConfig {
			enable: false,
			..config.dirty_rectangle
		};
	}

	let log = RecordingLog::new();
	let mut canvas = Canvas::new(config, recording_backend(&log))?;

	let group = canvas.add_group(NodeConfig::group().name("planets"))?;
	canvas.group(group)?.move_to(vec3(320., 240., 0.));

	let sun = canvas.scene_mut().spawn_shape(
		NodeConfig::shape("circle")
			.name("sun")
			.attrs(attrs! { "r" => 40., "fill" => "#ffcc00" }),
	)?;
	let planet = canvas.scene_mut().spawn_shape(
		NodeConfig::shape("circle")
			.name("planet")
			.z_index(1)
			.attrs(attrs! { "x" => 120., "r" => 10., "fill" => "#3366ff" }),
	)?;
	let mut planets = canvas.group(group)?;
	planets.add(sun)?;
	planets.add(planet)?;

	canvas.add_shape(
		NodeConfig::shape("rect")
			.name("backdrop")
			.z_index(-1)
			.attrs(attrs! { "width" => 100., "height" => 40., "fill" => "#222222" }),
	)?;

	canvas.shape(planet)?.animate(
		AnimationConfig::to(attrs! { "x" => 60., "fill" => "#ff3366" })
			.duration(100.)
			.easing(Easing::CubicInOut),
	)?;

	info!("Scene:\n{}", canvas.scene());

	for frame in 0..cli.frames {
		let now = f64::from(frame) * 16.;
		let stats = canvas.tick(now)?;
		println!(
			"frame {frame} at {now}ms: {} drawn{}",
			stats.drawn,
			if stats.skipped { ", skipped" } else { "" }
		);
		for command in log.take() {
			match command {
				DrawCommand::Draw {
					entity,
					shape_type,
					world_transform,
					..
				} => println!(
					"  draw {shape_type} {entity} at {}",
					world_transform.transform_point3(glam::Vec3::ZERO)
				),
				DrawCommand::Clear(Some(region)) => {
					println!("  clear {} .. {}", region.min(), region.max())
				}
				DrawCommand::Clear(None) => println!("  clear all"),
				other => println!("  {other:?}"),
			}
		}
	}

	canvas.destroy()?;
	Ok(())
}
