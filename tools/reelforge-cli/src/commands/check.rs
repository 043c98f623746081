//! Check the external tools and fonts a render depends on.

use reelforge_common::config::{config_file_path, AppConfig};
use reelforge_project_model::ProjectStore;
use reelforge_render_engine::video::command_exists;
use reelforge_render_engine::FontBook;

pub fn run(store: &ProjectStore, config: &AppConfig) -> anyhow::Result<()> {
    println!("ReelForge Environment Check");
    println!("{}", "=".repeat(50));

    let tools = [
        ("ffmpeg", true, "frame encoding"),
        ("ffprobe", true, "video clip probing"),
        ("edge-tts", false, "narration (preferred)"),
        ("espeak-ng", false, "narration (fallback)"),
    ];
    let mut missing_required = 0;
    for (binary, required, purpose) in tools {
        let found = command_exists(binary);
        let mark = match (found, required) {
            (true, _) => "[OK]",
            (false, true) => "[MISSING]",
            (false, false) => "[--]",
        };
        if !found && required {
            missing_required += 1;
        }
        println!("  {mark:<10} {binary:<10} {purpose}");
    }
    println!();

    match FontBook::resolve(&config.fonts) {
        Ok(fonts) => match fonts.source() {
            Some(path) => println!("  Font: {}", path.display()),
            None => println!("  Font: built-in (no configured font found)"),
        },
        Err(e) => println!("  Font: unavailable ({e})"),
    }
    println!("  TTS backend: {} (voice {})", config.tts.backend, config.tts.voice);
    println!("  Config: {}", config_file_path().display());
    println!("  Projects: {}", store.root().display());
    println!();

    if missing_required > 0 {
        println!("{missing_required} required tool(s) missing; rendering will fail.");
    } else {
        println!("All required tools found.");
    }
    Ok(())
}
