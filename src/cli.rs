//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Attention heatmap - inspect and render recorded browsing sessions
#[derive(Parser, Debug)]
#[command(name = "attention-heatmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print session info and per-page point counts
    Inspect {
        /// Session archive (webgazer-session-*.json)
        archive: PathBuf,
    },

    /// Render one page of a session as a PNG overlay
    Render {
        /// Session archive (webgazer-session-*.json)
        archive: PathBuf,

        /// Page to render (defaults to the first visited page)
        #[arg(short, long)]
        page: Option<String>,

        /// Output PNG file
        #[arg(short, long, default_value = "heatmap.png")]
        out: PathBuf,

        /// Overlay width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Overlay height in pixels
        #[arg(long, default_value = "800")]
        height: u32,

        /// Horizontal scroll offset of the page
        #[arg(long, default_value = "0")]
        scroll_x: f64,

        /// Vertical scroll offset of the page
        #[arg(long, default_value = "0")]
        scroll_y: f64,

        /// Leave gaze points out
        #[arg(long)]
        no_gaze: bool,

        /// Leave pointer points out
        #[arg(long)]
        no_mouse: bool,
    },

    /// List visited pages in first-visit order
    Pages {
        /// Session archive (webgazer-session-*.json)
        archive: PathBuf,
    },
}
