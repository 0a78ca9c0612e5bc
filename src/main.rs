use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bedside::config::{Config, PatientProfile, openai_api_key};
use bedside::voice::{AudioCapture, AudioPlayback, TextToSpeech, has_speech};
use bedside::Daemon;

/// Bedside - single-patient monitoring daemon
#[derive(Parser)]
#[command(name = "bedside", version, about)]
struct Cli {
    /// Path to the config file (defaults to the platform config dir)
    #[arg(short, long, env = "BEDSIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start monitoring for the patient described in a profile file
    Run {
        /// Path to the patient profile TOML file
        #[arg(short, long)]
        profile: PathBuf,
    },
    /// Print a stored patient record
    Show {
        /// Patient name
        #[arg(short, long)]
        name: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,bedside=info",
        1 => "info,bedside=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run { profile } => {
            let profile = PatientProfile::load(&profile)?;
            let daemon = Daemon::new(config)?;
            daemon.run(profile).await?;
        }
        Command::Show { name } => {
            let daemon = Daemon::new(config)?;
            match daemon.patient_repo().find(&name)? {
                Some(record) => {
                    println!("{}", record.spoken_summary());
                    println!(
                        "Food intake: {} times, Water intake: {} times",
                        record.food_intake, record.water_intake
                    );
                }
                None => println!("no record for {name}"),
            }
        }
        Command::TestMic { duration } => {
            let mut capture = AudioCapture::new()?;
            println!("recording for {duration}s...");
            let samples = capture.listen(Duration::from_secs(duration)).await?;
            println!(
                "captured {} samples, speech detected: {}",
                samples.len(),
                has_speech(&samples)
            );
        }
        Command::TestTts { text } => {
            let tts = TextToSpeech::new(
                openai_api_key()?,
                config.voice.tts_voice.clone(),
                config.voice.tts_speed,
                config.voice.tts_model.clone(),
            )?;
            let audio = tts.synthesize(&text).await?;
            let mut playback = AudioPlayback::new()?;
            playback.play_mp3(&audio).await?;
        }
    }

    Ok(())
}
