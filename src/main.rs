mod audio;
mod beatmap;
mod cli;
mod config;
mod difficulty;
mod encode;
mod error;
mod songs;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{BufRead, Write};
use std::path::Path;

use beatmap::Pipeline;
use cli::Cli;
use config::AnalysisConfig;
use difficulty::Difficulty;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Config values apply only where the CLI is still at its default
    let mut analysis = AnalysisConfig::default();
    let mut config_difficulty = None;
    if let Some(path) = config::find_config(cli.config.clone()) {
        if let Some(cfg) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            if cli.songs_dir == config::default_songs_dir() { cli.songs_dir = cfg.paths.songs_dir; }
            if cli.beatmap_dir == config::default_beatmap_dir() { cli.beatmap_dir = cfg.paths.beatmap_dir; }
            if cli.seed.is_none() { cli.seed = cfg.beatmap.seed; }
            config_difficulty = cfg.beatmap.difficulty;
            analysis = cfg.analysis;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    if cli.min_note_gap != config::default_min_note_gap() { analysis.min_note_gap = cli.min_note_gap; }
    if cli.tolerance != config::default_tolerance() { analysis.tolerance = cli.tolerance; }
    if cli.hop_length != config::default_hop_length() { analysis.hop_length = cli.hop_length; }
    analysis.validate()?;

    let difficulty = match cli.difficulty.or(config_difficulty) {
        Some(d) => d,
        None => prompt_difficulty(),
    };

    let songs = if cli.files.is_empty() {
        std::fs::create_dir_all(&cli.songs_dir)
            .with_context(|| format!("Failed to create {}", cli.songs_dir.display()))?;
        songs::discover_songs(&cli.songs_dir)?
    } else {
        cli.files.clone()
    };

    if songs.is_empty() {
        println!("Place songs in the '{}/' folder.", cli.songs_dir.display());
        return Ok(());
    }

    std::fs::create_dir_all(&cli.beatmap_dir)
        .with_context(|| format!("Failed to create {}", cli.beatmap_dir.display()))?;

    log::info!("notesmith - beatmap generator");
    log::info!("Difficulty: {} (stride {})", difficulty, difficulty.stride());
    log::info!("Songs: {}, output: {}", songs.len(), cli.beatmap_dir.display());

    let pipeline = Pipeline::new(analysis);

    let pb = ProgressBar::new(songs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} songs {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut failed = 0usize;
    for song in &songs {
        let name = song.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        pb.set_message(name.clone());

        let out_path = songs::beatmap_path(&cli.beatmap_dir, song, difficulty);
        match generate_song(&pipeline, song, &out_path, difficulty, cli.seed) {
            Ok(count) => pb.println(format!("Saved {} notes to {}", count, out_path.display())),
            Err(err) => {
                failed += 1;
                log::error!("Skipping {}: {:#}", name, err);
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("done");

    if failed > 0 {
        log::warn!("{} of {} songs failed", failed, songs.len());
    }
    log::info!("Done! Beatmaps in {}", cli.beatmap_dir.display());
    Ok(())
}

/// Build and save one beatmap. Nothing is written unless the song decodes.
fn generate_song(
    pipeline: &Pipeline,
    song: &Path,
    out_path: &Path,
    difficulty: Difficulty,
    seed: Option<u64>,
) -> Result<usize> {
    log::info!("Generating for: {}", song.display());
    let signal = audio::decode::load_signal(song)?;

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let beatmap = pipeline.generate(&signal, difficulty, &mut rng);
    if beatmap.is_empty() {
        log::warn!("No notes landed on the beat in {}", song.display());
    } else {
        log::info!("{} notes at {:.1} BPM", beatmap.len(), beatmap.tempo_bpm);
    }

    encode::json::write_beatmap(out_path, &beatmap)?;
    Ok(beatmap.len())
}

/// Ask on stdin; anything but a valid choice means Normal.
fn prompt_difficulty() -> Difficulty {
    print!("{}Enter number (1-3): ", Difficulty::menu());
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line);
    match read.ok().and_then(|_| Difficulty::from_menu_choice(&line)) {
        Some(d) => d,
        None => {
            log::warn!("Invalid choice {:?}, using {}", line.trim(), Difficulty::default());
            Difficulty::default()
        }
    }
}

