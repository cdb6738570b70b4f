mod cli;

use anyhow::{bail, Context, Result};
use attention_heatmap::archive::{self, SessionArchive};
use attention_heatmap::heatmap::{HeatmapFilters, HeatmapViewer, RenderOutcome, ScrollOffset};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    attention_heatmap::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { archive } => inspect(&archive),
        Commands::Pages { archive } => pages(&archive),
        Commands::Render {
            archive,
            page,
            out,
            width,
            height,
            scroll_x,
            scroll_y,
            no_gaze,
            no_mouse,
        } => {
            let filters = HeatmapFilters {
                show_gaze: !no_gaze,
                show_mouse: !no_mouse,
            };
            render(&archive, page, &out, (width, height), (scroll_x, scroll_y), filters)
        }
    }
}

fn load(path: &Path) -> Result<SessionArchive> {
    archive::read_archive(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn format_time(epoch_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(epoch_ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| epoch_ms.to_string())
}

fn inspect(path: &Path) -> Result<()> {
    let session = load(path)?;
    let info = &session.session_info;

    println!("Session:  {}", path.display());
    println!("Started:  {}", format_time(info.start_time));
    println!("Ended:    {}", format_time(info.end_time));
    println!("Duration: {}s", info.duration);
    println!("Gaze:     {} points", info.total_gaze_points);
    println!("Mouse:    {} points", info.total_mouse_points);
    println!();

    for page in &info.pages_visited {
        let (gaze, mouse) = session.counts_for_page(page);
        println!("  {:<32} gaze={:<7} mouse={}", page, gaze, mouse);
    }
    Ok(())
}

fn pages(path: &Path) -> Result<()> {
    let session = load(path)?;
    for page in &session.session_info.pages_visited {
        println!("{}", page);
    }
    Ok(())
}

fn render(
    path: &Path,
    page: Option<String>,
    out: &Path,
    size: (u32, u32),
    scroll: (f64, f64),
    filters: HeatmapFilters,
) -> Result<()> {
    let session = load(path)?;
    if let Some(page) = &page {
        if !session.session_info.pages_visited.contains(page) {
            tracing::warn!("Page {} was not visited in this session", page);
        }
    }

    let mut viewer = HeatmapViewer::with_size(size.0, size.1);
    let scroll = ScrollOffset {
        x: scroll.0,
        y: scroll.1,
    };
    let stats = match viewer.load_with_view(session, page, filters, scroll) {
        RenderOutcome::Rendered(stats) => stats,
        RenderOutcome::NoPagesVisited => bail!("{} has no visited pages", path.display()),
        RenderOutcome::ArchiveRequired => bail!("no session loaded"),
    };

    viewer
        .canvas()
        .save_png(out)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!(
        "Rendered {} ({} gaze, {} mouse, {} off-screen) to {}",
        viewer.current_page(),
        stats.gaze_drawn,
        stats.mouse_drawn,
        stats.culled,
        out.display()
    );
    Ok(())
}
