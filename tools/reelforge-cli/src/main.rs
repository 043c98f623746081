//! ReelForge CLI: create, inspect, and render short-form video projects.
//!
//! Usage:
//!   reelforge init <NAME>          Create a new project
//!   reelforge list                 List projects
//!   reelforge info <ID>            Show project information
//!   reelforge validate <ID>        Check a project before rendering
//!   reelforge import <ID> <FILE>   Copy a media file into a project
//!   reelforge slideshow <ID>       Lay out images and script lines on the timeline
//!   reelforge render <ID>          Render a project to MP4
//!   reelforge overlay <ID>         Preview the template overlay as PNG
//!   reelforge captions <ID>        Write SRT captions from the script
//!   reelforge extract <HTML>       Pull a product script out of a saved page
//!   reelforge check                Check external tools and fonts

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reelforge_common::config::AppConfig;
use reelforge_project_model::ProjectStore;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelforge",
    about = "Compose vertical product videos from images, text, and narration",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Projects directory (overrides the config file)
    #[arg(long, global = true)]
    projects_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project with empty image, text, and audio tracks
    Init {
        /// Project name
        name: String,

        /// Canvas width
        #[arg(long)]
        width: Option<u32>,

        /// Canvas height
        #[arg(long)]
        height: Option<u32>,

        /// Frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Duration in seconds
        #[arg(long)]
        duration: Option<f64>,
    },

    /// List projects, most recently updated first
    List,

    /// Show project information
    Info {
        /// Project id
        id: String,
    },

    /// Validate a project
    Validate {
        /// Project id
        id: String,
    },

    /// Copy a media file into a project's assets
    Import {
        /// Project id
        id: String,

        /// File to import
        file: PathBuf,
    },

    /// Replace image and text clips with a captioned slideshow
    Slideshow {
        /// Project id
        id: String,

        /// Image to show, in order (repeatable; defaults to imported image assets)
        #[arg(long = "image")]
        images: Vec<PathBuf>,

        /// Shortest slide before rescaling, in seconds
        #[arg(long, default_value_t = 2.0)]
        min_slide: f64,

        /// Longest slide before rescaling, in seconds
        #[arg(long, default_value_t = 5.0)]
        max_slide: f64,
    },

    /// Render a project to video
    Render {
        /// Project id
        id: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Synthesize the script as narration
        #[arg(long)]
        tts: bool,
    },

    /// Render the template overlay to a PNG
    Overlay {
        /// Project id
        id: String,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Image drawn under the overlay
        #[arg(long)]
        background: Option<PathBuf>,
    },

    /// Write evenly timed captions from the project script
    Captions {
        /// Project id
        id: String,

        /// Output path (.srt or .vtt)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract a product script from a saved HTML page
    Extract {
        /// HTML file
        html: PathBuf,

        /// Page URL, for site detection and relative links
        #[arg(long)]
        url: Option<String>,

        /// Store the script in this project
        #[arg(long)]
        project: Option<String>,

        /// Call to action appended to the script
        #[arg(long)]
        cta: Option<String>,

        /// Show the price as an approximate KRW amount
        #[arg(long)]
        krw: bool,
    },

    /// Check external tools and fonts
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(dir) = cli.projects_dir {
        config.projects_dir = dir;
    }
    reelforge_common::logging::init_logging(&config.logging);

    let store = ProjectStore::new(&config.projects_dir);

    match cli.command {
        Commands::Init {
            name,
            width,
            height,
            fps,
            duration,
        } => commands::init::run(&store, &config, name, width, height, fps, duration),
        Commands::List => commands::list::run(&store),
        Commands::Info { id } => commands::info::run(&store, &id),
        Commands::Validate { id } => commands::validate::run(&store, &id),
        Commands::Import { id, file } => commands::import::run(&store, &id, file),
        Commands::Slideshow {
            id,
            images,
            min_slide,
            max_slide,
        } => commands::slideshow::run(&store, &id, images, min_slide, max_slide),
        Commands::Render { id, output, tts } => {
            commands::render::run(&store, &config, &id, output, tts).await
        }
        Commands::Overlay {
            id,
            output,
            background,
        } => commands::overlay::run(&store, &config, &id, output, background),
        Commands::Captions { id, output } => commands::captions::run(&store, &id, output),
        Commands::Extract {
            html,
            url,
            project,
            cta,
            krw,
        } => commands::extract::run(&store, html, url, project, cta, krw),
        Commands::Check => commands::check::run(&store, &config),
    }
}
