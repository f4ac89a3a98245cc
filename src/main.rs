use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{info, warn};

use tetratab::audio::{WavAnalyzer, DEFAULT_DETECTION_LIMIT};
use tetratab::batch::parse_batch_with;
use tetratab::midi_file::MidiExport;
use tetratab::render::{self, Cover};
use tetratab::{
    find_positions, frequency_to_midi, midi_to_frequency, midi_to_note_name, note_name_to_midi,
    suggest_movements, InstrumentProfile, ResolvePolicy, Tablature, TablatureBuilder,
};

/// Map notes, frequencies and recordings onto four-string bouzouki tablature
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON instrument profile; defaults to the tetrachord bouzouki
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show frequency and fretboard positions of a note name
    Note {
        /// Note name, e.g. G#4
        name: String,
    },
    /// Show note name and fretboard positions of a frequency
    Freq {
        /// Frequency in Hz
        hz: f64,
    },
    /// Build tablature from a batch such as "D4,0.5; F#4,1.0; A4,0.25"
    Tab {
        /// Semicolon separated note,duration pairs
        batch: String,

        /// Keep going past unresolvable notes instead of failing
        #[arg(long)]
        lenient: bool,

        #[command(flatten)]
        export: ExportArgs,
    },
    /// Detect notes in a WAV recording and build tablature from them
    Audio {
        /// Path to the WAV file
        wav_file: PathBuf,

        /// Maximum number of detected notes
        #[arg(long, default_value_t = DEFAULT_DETECTION_LIMIT)]
        limit: usize,

        #[command(flatten)]
        export: ExportArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct ExportArgs {
    /// Print the tablature as JSON instead of text lines
    #[arg(long)]
    json: bool,

    /// Write a MIDI file
    #[arg(long)]
    midi: Option<PathBuf>,

    /// Write a printable text document
    #[arg(long)]
    document: Option<PathBuf>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// Date printed on the document cover
    #[arg(long)]
    date: Option<String>,

    /// Signature printed on the document cover
    #[arg(long)]
    signature: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let profile = match &args.profile {
        Some(path) => InstrumentProfile::load(path)
            .with_context(|| format!("Error loading profile '{}'", path.display()))?,
        None => InstrumentProfile::default(),
    };

    match args.command {
        Commands::Note { name } => {
            let midi = note_name_to_midi(&name)?;
            println!("Frequency: {} Hz", midi_to_frequency(midi));
            print_positions(&profile, midi);
        }
        Commands::Freq { hz } => {
            let midi = frequency_to_midi(hz)?;
            println!("Note: {}", midi_to_note_name(midi));
            print_positions(&profile, midi);
        }
        Commands::Tab {
            batch,
            lenient,
            export,
        } => {
            let policy = if lenient {
                ResolvePolicy::Lenient
            } else {
                ResolvePolicy::Strict
            };
            let (observations, malformed) =
                parse_batch_with(&batch, policy).context("Error in batch input")?;
            for error in &malformed {
                eprintln!("Skipped entry: {}", error);
            }
            let outcome = TablatureBuilder::new(&profile, policy)
                .build(&observations)
                .context("Error in batch input")?;
            for rejection in &outcome.rejected {
                eprintln!("Skipped entry {}: {}", rejection.index, rejection.error);
            }
            report(&profile, &outcome.tablature, &export)?;
        }
        Commands::Audio {
            wav_file,
            limit,
            export,
        } => {
            let analyzer = WavAnalyzer::open(&wav_file)
                .with_context(|| format!("Error reading audio file '{}'", wav_file.display()))?;
            let analysis = analyzer.analyze(limit);
            if analysis.notes.is_empty() {
                bail!(
                    "No pitch detected in '{}' ({} frames skipped)",
                    wav_file.display(),
                    analysis.skipped_frames
                );
            }
            println!("Detected notes: {}", analysis.notes.join(", "));
            println!(
                "Frames analyzed: {}, skipped: {}",
                analysis.frames_analyzed, analysis.skipped_frames
            );

            let outcome = TablatureBuilder::new(&profile, ResolvePolicy::Lenient)
                .build(&analysis.observations())?;
            if !outcome.rejected.is_empty() {
                warn!("{} detection(s) could not be resolved", outcome.rejected.len());
            }
            report(&profile, &outcome.tablature, &export)?;
        }
    }

    Ok(())
}

fn print_positions(profile: &InstrumentProfile, midi: i32) {
    let positions = find_positions(profile, midi);
    if positions.is_empty() {
        println!("Not playable on this instrument");
        return;
    }

    println!("Positions:");
    for position in &positions {
        println!("→ string: {}, fret: {}", position.string, position.fret);
    }
    println!();
    print!("{}", render::render_positions(profile, midi));
}

fn report(profile: &InstrumentProfile, tab: &Tablature, export: &ExportArgs) -> Result<()> {
    if export.json {
        println!("{}", serde_json::to_string_pretty(tab)?);
    } else {
        print!("{}", render::render_listing(tab));
    }

    let advisories = suggest_movements(tab, profile.movement_threshold);
    if !advisories.is_empty() {
        println!();
        for advisory in &advisories {
            println!("👉 {}", advisory);
        }
    }

    if let Some(path) = &export.midi {
        MidiExport::from_tablature(tab).write_file(path)?;
        info!("wrote {}", path.display());
    }

    if let Some(path) = &export.document {
        let mut cover = Cover {
            date: export.date.clone(),
            signature: export.signature.clone(),
            ..Cover::default()
        };
        if let Some(title) = &export.title {
            cover.title = title.clone();
        }
        write_document(path, &render::render_document(profile, tab, &cover))?;
        info!("wrote {}", path.display());
    }

    Ok(())
}

fn write_document(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write document '{}'", path.display()))
}
