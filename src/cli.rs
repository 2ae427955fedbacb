use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use sqip_triangle::{ENV_VENDOR_DIR, PluginOptions};

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Directory holding the bundled `<os>-<arch>/triangle` binaries
    #[arg(long, env = ENV_VENDOR_DIR, global = true)]
    pub vendor_dir: Option<PathBuf>,
    /// Log more detail (-v for debug, -vv for trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report which triangle binary would be used
    Check,
    /// Triangulate an image into an SVG placeholder
    Convert(ConvertCommand),
}

#[derive(Args, Debug)]
pub struct ConvertCommand {
    /// Input image path
    pub input: PathBuf,
    /// Output SVG path (defaults to input name with `.svg`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// JSON plugin configuration (`pluginOptions`, `options`, `sqipConfig`)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Print the triangle argument list before running it
    #[arg(long = "print-args")]
    pub print_args: bool,
    #[command(flatten)]
    pub triangle_options: TriangleOptionsArgs,
}

/// Options forwarded to the binary. Each one overrides the config file.
#[derive(Args, Debug, Default)]
pub struct TriangleOptionsArgs {
    /// Number of triangles (defaults to a size-dependent value)
    #[arg(long)]
    pub nf: Option<u32>,
    /// Background color, e.g. `#654321`
    #[arg(long)]
    pub bg: Option<String>,
    /// Blur radius
    #[arg(long = "blur")]
    pub blur: Option<f64>,
    /// Maximum number of points
    #[arg(long = "max-points")]
    pub max_points: Option<u32>,
    /// Wireframe mode: 0 none, 1 with wireframe, 2 wireframe only
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=2))]
    pub wireframe: Option<u32>,
    /// Stroke width
    #[arg(long = "stroke-width")]
    pub stroke_width: Option<f64>,
    /// Number of concurrent workers inside triangle
    #[arg(long)]
    pub workers: Option<u32>,
    /// Output in grayscale
    #[arg(long)]
    pub grayscale: bool,
    /// Use a solid stroke color
    #[arg(long = "solid-stroke")]
    pub solid_stroke: bool,
}

impl TriangleOptionsArgs {
    /// Write the options given on the command line into `options`.
    pub fn apply_to(&self, options: &mut PluginOptions) {
        if let Some(nf) = self.nf {
            options.insert("nf", nf);
        }
        if let Some(bg) = &self.bg {
            options.insert("bg", bg.as_str());
        }
        if let Some(blur) = self.blur {
            options.insert("bl", blur);
        }
        if let Some(max_points) = self.max_points {
            options.insert("pts", max_points);
        }
        if let Some(wireframe) = self.wireframe {
            options.insert("wf", wireframe);
        }
        if let Some(stroke_width) = self.stroke_width {
            options.insert("st", stroke_width);
        }
        if let Some(workers) = self.workers {
            options.insert("cw", workers);
        }
        if self.grayscale {
            options.insert("gr", true);
        }
        if self.solid_stroke {
            options.insert("sl", true);
        }
    }
}
