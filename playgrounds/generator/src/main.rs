use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use generator_playground::field_engine::GeneratorConfig;
use generator_playground::{summarize, DemoRun, DemoSettings, DemoSource, GeneratorPlaygroundPlugin};

/// Generates a signed distance field without a window and reports its range.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// Input of the generation.
	#[arg(long, value_enum, default_value_t = DemoSource::Cube)]
	source: DemoSource,
	/// Procedural catalog entry for the procedural source.
	#[arg(long, default_value = "sphere")]
	shape: String,
	/// Field resolution along every axis.
	#[arg(long, default_value_t = 64)]
	resolution: u32,
	/// Voxels covered by one chunk along every axis.
	#[arg(long, default_value_t = 32)]
	voxel_size: u32,
	/// Triangles per chunk.
	#[arg(long, default_value_t = 8192)]
	chunk_size: u32,
	#[arg(long)]
	half_precision: bool,
	/// Resample the finished field at this resolution.
	#[arg(long)]
	resample: Option<u32>,
	#[arg(long, default_value_t = 100_000)]
	max_frames: u32,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let settings = DemoSettings {
		source: args.source,
		shape: args.shape,
		resolution: args.resolution,
		voxel_size: args.voxel_size,
		half_precision: args.half_precision,
		resample: args.resample,
	};
	let config = GeneratorConfig { mesh_chunk_size: args.chunk_size, ..Default::default() };

	let mut app = App::new();
	app.add_plugins(MinimalPlugins)
		.add_plugins(LogPlugin::default())
		.add_plugins(GeneratorPlaygroundPlugin { settings, config });

	let mut frames = 0;
	while frames < args.max_frames {
		app.update();
		frames += 1;
		if app.world().get_resource::<DemoRun>().is_some_and(|run| run.finished) {
			break;
		}
	}

	let summary = summarize(app.world())?;
	if !summary.state.is_complete() {
		anyhow::bail!("generation of '{}' didn't complete in {} frames", summary.model_name, frames);
	}

	println!(
		"generated '{}' at {} in {} frames across {} session(s)",
		summary.model_name, summary.resolution, frames, summary.sessions
	);
	match summary.range {
		Some((min, max)) => println!("distance range [{:.4}, {:.4}]", min, max),
		None => println!("the field has no sampled distances"),
	}
	Ok(())
}
