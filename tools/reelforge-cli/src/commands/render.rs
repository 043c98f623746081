//! Render a project to MP4.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use reelforge_common::config::AppConfig;
use reelforge_project_model::ProjectStore;
use reelforge_render_engine::{
    render_task, ExportJob, InMemoryJobStore, JobState, JobStore, RenderOptions,
};

use super::load_project;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run(
    store: &ProjectStore,
    config: &AppConfig,
    id: &str,
    output: Option<PathBuf>,
    tts: bool,
) -> anyhow::Result<()> {
    let project = load_project(store, id)?;
    let output = output.unwrap_or_else(|| {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        store.renders_dir(id).join(format!("render_{stamp}.mp4"))
    });

    println!("Rendering project: {} ({})", project.name, project.id);
    println!(
        "  Canvas: {}x{} @ {}fps, {:.2}s ({} frames)",
        project.width,
        project.height,
        project.fps,
        project.duration,
        project.frame_count()
    );
    println!("  Narration: {}", if tts { "on" } else { "off" });
    println!("  Output: {}", output.display());
    println!();

    let job = ExportJob::new(project, &output)
        .with_narration(tts)
        .with_options(RenderOptions::from_config(config));

    let jobs = InMemoryJobStore::new();
    let job_id = jobs.submit(render_task(job));
    tracing::debug!(job = %job_id, "Render job submitted");

    let status = loop {
        let Some(status) = jobs.poll(&job_id) else {
            anyhow::bail!("Render job {job_id} disappeared");
        };
        if status.is_finished() {
            break status;
        }
        if status.state == JobState::Running {
            print!("\r  Progress: {:.1}%", status.progress * 100.0);
            let _ = std::io::stdout().flush();
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };
    println!();

    match status.state {
        JobState::Done => {
            let path = status.output.unwrap_or(output);
            println!();
            println!("[OK] Rendered to {}", path.display());
            Ok(())
        }
        _ => {
            let reason = status.error.unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("Render failed: {reason}")
        }
    }
}
