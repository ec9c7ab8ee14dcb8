use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use profile_viz::config::ViewerConfig;
use profile_viz::facade::Facade;
use tracing::{error, info, info_span};
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(about = "viz-cli loads a profile capture and inspects or exports it.", long_about = None)]
struct VizCli {
    #[command(subcommand)]
    command: VizCommand,
}

#[derive(Subcommand, Debug)]
enum VizCommand {
    #[clap(about = "Parse a profile and print its threads, counters and duration.")]
    Info { profile: PathBuf },
    #[clap(about = "Parse a profile and re-emit it as the lossless JSON export format.")]
    ExportJson {
        profile: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    #[clap(about = "Render one thread lane of a profile to a standalone SVG file.")]
    ExportSvg {
        profile: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 0)]
        lane: usize,
        #[arg(long, default_value_t = 1600.0)]
        width: f32,
        #[arg(long, default_value_t = 900.0)]
        height: f32,
    },
}

fn main() {
    set_global_subscriber();

    let cli = VizCli::parse();
    match cli.command {
        VizCommand::Info { profile } => cmd_info(&profile),
        VizCommand::ExportJson { profile, output } => cmd_export_json(&profile, &output),
        VizCommand::ExportSvg {
            profile,
            output,
            lane,
            width,
            height,
        } => cmd_export_svg(&profile, &output, lane, width, height),
    }
}

fn load_facade(path: &PathBuf) -> Option<(Facade, profile_viz::session::ProfileHandle)> {
    let _span = info_span!("load_profile", path = %path.display()).entered();
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(err) => {
            error!(error = %err, "failed to read profile file");
            return None;
        }
    };
    let mut facade = Facade::new(ViewerConfig::default());
    match facade.load_profile(&bytes) {
        Ok(handle) => {
            info!("profile loaded");
            Some((facade, handle))
        }
        Err(err) => {
            error!(error = %err, "failed to parse profile");
            None
        }
    }
}

fn cmd_info(path: &PathBuf) {
    let Some((facade, handle)) = load_facade(path) else {
        std::process::exit(1);
    };
    let state = facade.get_state();
    let Some(summary) = state.profiles.iter().find(|p| p.handle == handle.0) else {
        return;
    };
    println!("profile: {}", summary.label);
    println!("lanes:");
    for lane in &state.lanes {
        println!("  - {} ({}px, visible={})", lane.kind, lane.height_px, lane.visible);
    }
}

fn cmd_export_json(path: &PathBuf, output: &PathBuf) {
    let Some((facade, _handle)) = load_facade(path) else {
        std::process::exit(1);
    };
    match facade.export_json() {
        Ok(json) => {
            if let Err(err) = fs::write(output, json) {
                error!(error = %err, "failed to write json output");
                std::process::exit(1);
            }
            info!(path = %output.display(), "wrote json export");
        }
        Err(err) => {
            error!(error = %err, "failed to export json");
            std::process::exit(1);
        }
    }
}

fn cmd_export_svg(path: &PathBuf, output: &PathBuf, lane_index: usize, width: f32, height: f32) {
    let Some((mut facade, handle)) = load_facade(path) else {
        std::process::exit(1);
    };
    let lane_id = {
        let lanes = facade.lanes();
        let thread_lanes: Vec<_> = lanes
            .lanes()
            .iter()
            .filter(|l| l.profile_handle == handle)
            .collect();
        let Some(lane) = thread_lanes.get(lane_index) else {
            error!(lane_index, available = thread_lanes.len(), "lane index out of range");
            std::process::exit(1);
        };
        lane.id
    };
    match facade.export_svg(lane_id, width, height) {
        Ok(svg) => {
            if let Err(err) = fs::write(output, svg) {
                error!(error = %err, "failed to write svg output");
                std::process::exit(1);
            }
            info!(path = %output.display(), "wrote svg export");
        }
        Err(err) => {
            error!(error = %err, "failed to export svg");
            std::process::exit(1);
        }
    }
}

fn set_global_subscriber() {
    let default_env_filter = EnvFilter::try_new("viz_cli=info,profile_viz=info").expect("hard-coded env filter should be valid");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(default_env_filter);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_file(false)
        .with_line_number(false)
        .pretty()
        .finish()
        .init();
}
