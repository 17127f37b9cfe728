use clap::Parser;
use crossbeam::channel::{unbounded, Receiver};
use dialoguer::MultiSelect;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::{thread, time::Duration};
use strumtrainer::{
    audio::{list_midi_outputs, AudioOutput, CountVoiceBank, LogSink, MidiDispatcher, SynthDispatcher},
    cli::{validate_device, Args, Command, GenerateArgs, LibraryCommand, PatternSource, PlayArgs},
    config::OutputKind,
    create_engine,
    library::{JsonPatternStore, PatternStore},
    logging,
    pattern::{default_for, find_preset, PRESETS},
    ui::TransportView,
    AudioSink, Pattern, PatternGenerator, Result, RhythmType, Settings, TrainerError,
};

const POLL_INTERVAL: Duration = Duration::from_millis(30);

fn main() {
    let args = parse_command_line_arguments();
    initialize_logging(args.verbose);

    if let Err(e) = run(args) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn initialize_logging(verbose: bool) {
    if let Err(e) = logging::init_logger(verbose) {
        eprintln!("Logger initialization failed: {}", e);
    }
    log::info!("Application starting");
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn run(args: Args) -> Result<()> {
    let mut settings = Settings::load(args.config.as_deref())?;
    match args.command {
        Command::Play(play) => run_play(&play, &mut settings),
        Command::Generate(generate) => run_generate(&generate, &settings),
        Command::Presets => {
            list_presets();
            Ok(())
        }
        Command::Library(command) => run_library(command, &settings),
        Command::Devices => list_available_devices(),
    }
}

/// The sink the engine plays into, plus whatever keeps its device open.
struct Output {
    sink: Arc<dyn AudioSink>,
    _stream: Option<AudioOutput>,
}

fn open_output(settings: &Settings) -> Result<Output> {
    match settings.output {
        OutputKind::Audio => {
            let sample_rate = AudioOutput::default_sample_rate()?;
            let voices = match &settings.voices_dir {
                Some(dir) => CountVoiceBank::load(dir, sample_rate),
                None => CountVoiceBank::empty(),
            };
            let (dispatcher, mixer) = SynthDispatcher::new(sample_rate, settings.volume, voices);
            let stream = AudioOutput::open(mixer)?;
            if stream.sample_rate() != sample_rate {
                log::warn!(
                    "Output runs at {} Hz but tones were rendered at {} Hz",
                    stream.sample_rate(),
                    sample_rate
                );
            }
            Ok(Output {
                sink: Arc::new(dispatcher),
                _stream: Some(stream),
            })
        }
        OutputKind::Midi => {
            if let Some(device_name) = &settings.midi_device {
                let devices = list_midi_outputs()?;
                validate_device(device_name, &devices).map_err(TrainerError::Midi)?;
            }
            let dispatcher = MidiDispatcher::connect(settings.midi_device.as_deref())?;
            Ok(Output {
                sink: Arc::new(dispatcher),
                _stream: None,
            })
        }
        OutputKind::Log => Ok(Output {
            sink: Arc::new(LogSink),
            _stream: None,
        }),
    }
}

fn open_library(settings: &Settings) -> Result<JsonPatternStore> {
    JsonPatternStore::open(settings.library_file()?)
}

fn resolve_pattern(source: PatternSource, settings: &Settings) -> Result<Pattern> {
    match source {
        PatternSource::Preset(id) => find_preset(&id)
            .ok_or(TrainerError::PatternNotFound(id))?
            .pattern(),
        PatternSource::Notation(text) => Pattern::parse(settings.time_signature, &text),
        PatternSource::Random(types) => {
            PatternGenerator::new().generate(settings.time_signature, &types)
        }
        PatternSource::Saved(id) => Ok(open_library(settings)?.load(&id)?.pattern),
        PatternSource::Default => default_for(settings.time_signature),
    }
}

/// Sends a message each time Enter is pressed.
fn spawn_enter_watcher() -> Receiver<()> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut line = String::new();
        while let Ok(n) = stdin.lock().read_line(&mut line) {
            if n == 0 || tx.send(()).is_err() {
                break;
            }
            line.clear();
        }
    });
    rx
}

fn run_play(play: &PlayArgs, settings: &mut Settings) -> Result<()> {
    play.apply(settings);
    settings.validate()?;

    let pattern = resolve_pattern(play.source(), settings)?;
    let output = open_output(settings)?;
    println!(
        "{} at {} BPM: {}",
        pattern.time_signature(),
        settings.bpm,
        pattern.to_notation()
    );
    println!("Press Enter to stop...");

    let engine = create_engine(settings, pattern, output.sink.clone())?;
    let stop_rx = spawn_enter_watcher();
    let view = TransportView::new(play.bars);
    engine.start();

    loop {
        let snapshot = engine.snapshot();
        view.update(&snapshot, &engine.pattern(), engine.config().bpm);

        if play.bars.is_some_and(|bars| snapshot.measure_index >= bars) {
            log::info!("Played {} measures", snapshot.measure_index);
            break;
        }
        if !engine.is_playing() || stop_rx.try_recv().is_ok() {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    let measures = engine.snapshot().measure_index;
    engine.stop();
    view.finish();
    println!("Stopped after {} complete measures", measures);
    Ok(())
}

fn pick_rhythm_types() -> Result<Vec<RhythmType>> {
    let labels: Vec<&str> = RhythmType::ALL.iter().map(|t| t.label()).collect();
    let defaults: Vec<bool> = RhythmType::ALL
        .iter()
        .map(|t| matches!(t, RhythmType::Eighth | RhythmType::Quarter))
        .collect();
    let chosen = MultiSelect::new()
        .with_prompt("Rhythm types (space to toggle, enter to confirm)")
        .items(&labels)
        .defaults(&defaults)
        .interact()
        .map_err(|e| TrainerError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
    Ok(chosen.into_iter().map(|i| RhythmType::ALL[i]).collect())
}

fn run_generate(generate: &GenerateArgs, settings: &Settings) -> Result<()> {
    let time_signature = generate.time_signature.unwrap_or(settings.time_signature);
    let types = if generate.pick {
        pick_rhythm_types()?
    } else {
        generate.types.clone()
    };

    let pattern = match generate.seed {
        Some(seed) => PatternGenerator::with_rng(StdRng::seed_from_u64(seed))
            .generate(time_signature, &types)?,
        None => PatternGenerator::new().generate(time_signature, &types)?,
    };
    println!("{}  {}", time_signature, pattern.to_notation());
    println!("{}", pattern.arrows());

    if let Some(name) = &generate.save {
        let saved = open_library(settings)?.save(name, &pattern)?;
        println!("Saved as {}", saved.id);
    }
    Ok(())
}

fn list_presets() {
    println!("Built-in patterns:");
    for preset in PRESETS {
        println!(
            "  {:<18} {:<16} {:<4} {:<8} {}",
            preset.id, preset.name, preset.time_signature, preset.category, preset.notation
        );
    }
}

fn run_library(command: LibraryCommand, settings: &Settings) -> Result<()> {
    let mut store = open_library(settings)?;
    match command {
        LibraryCommand::List => {
            let saved = store.list();
            if saved.is_empty() {
                println!("No saved patterns in {}", store.path().display());
            }
            for entry in saved {
                println!(
                    "  {:<20} {:<20} {:<4} {}",
                    entry.id,
                    entry.name,
                    entry.pattern.time_signature(),
                    entry.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        LibraryCommand::Show { id } => {
            let entry = store.load(&id)?;
            println!("{} ({})", entry.name, entry.pattern.time_signature());
            println!("{}", entry.pattern.to_notation());
            println!("{}", entry.pattern.arrows());
        }
        LibraryCommand::Delete { id } => {
            store.delete(&id)?;
            println!("Deleted {}", id);
        }
        LibraryCommand::Rename { id, name } => {
            let entry = store.rename(&id, &name)?;
            println!("Renamed {} to '{}'", entry.id, entry.name);
        }
    }
    Ok(())
}

fn list_available_devices() -> Result<()> {
    let devices = list_midi_outputs()?;
    println!("Available MIDI output devices:");
    for device in devices {
        println!("  - {}", device);
    }
    Ok(())
}
