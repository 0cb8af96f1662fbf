// Just Warming Up: CLI entry point.
//
// Reads a surface-temperature history and writes MIDI files with one note
// per month, year and/or decade. The pipeline for each resolution:
// read → average → normalize → bucket → MIDI output.
//
// Usage:
//   sonify [OPTIONS]
//     --mode <MODE>         0|monthly, 1|yearly, 2|decade, 3|all (default: all)
//     --source <CSV>        Temperature table (default: NH.Ts+dSST.csv)
//     --output <BASE>       Output base name (default: just_warming_up)
//     --tempo <BPM>         Tempo (default: 120)
//     --velocity <N>        Note velocity 0-127 (default: 100)
//     --min-note <N>        Lowest note (default: 0)
//     --max-note <N>        Highest note (default: 127)
//     --overflow <POLICY>   drop|clamp for values above the top threshold
//     --missing <TOKEN>     Missing-value marker (default: ***)
//     --config <JSON>       Load settings from a JSON file; flags override it
//     --verbose             Log every pipeline stage

use std::path::PathBuf;
use std::str::FromStr;

use warming_music::bucket::OverflowPolicy;
use warming_music::{Mode, Sequencer, SonifyConfig, logging};

/// Default source table (NASA GISTEMP northern-hemisphere means).
const DEFAULT_SOURCE: &str = "NH.Ts+dSST.csv";

/// Flags as given on the command line; `None` means "not given".
#[derive(Default)]
struct Args {
    mode: Option<String>,
    source: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<String>,
    tempo: Option<u16>,
    velocity: Option<u8>,
    min_note: Option<i32>,
    max_note: Option<i32>,
    overflow: Option<OverflowPolicy>,
    missing: Option<String>,
    verbose: bool,
}

fn main() {
    let args = parse_args();
    logging::init(args.verbose);

    let mut config = match &args.config {
        Some(path) => SonifyConfig::load(path).unwrap_or_else(|e| fail(&e)),
        None => SonifyConfig::default(),
    };
    apply_overrides(&mut config, &args);

    let mode = Mode::from_str(args.mode.as_deref().unwrap_or("all")).unwrap_or_else(|e| fail(&e));
    let source = args.source.unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE));
    let sequencer = Sequencer::new(config).unwrap_or_else(|e| fail(&e));

    match sequencer.run(mode, &source) {
        Ok(reports) => {
            for report in reports {
                println!(
                    "{} was created ({} {} notes, {} above the top threshold)",
                    report.path.display(),
                    report.notes,
                    report.resolution,
                    report.overflowed
                );
            }
        }
        Err(e) => fail(&e),
    }
}

fn apply_overrides(config: &mut SonifyConfig, args: &Args) {
    if let Some(output) = &args.output {
        config.output_base = output.clone();
    }
    if let Some(tempo) = args.tempo {
        config.tempo_bpm = tempo;
    }
    if let Some(velocity) = args.velocity {
        config.velocity = velocity;
    }
    if let Some(min_note) = args.min_note {
        config.min_note = min_note;
    }
    if let Some(max_note) = args.max_note {
        config.max_note = max_note;
    }
    if let Some(overflow) = args.overflow {
        config.overflow = overflow;
    }
    if let Some(missing) = &args.missing {
        config.missing_sentinel = missing.clone();
    }
}

fn fail(err: &dyn std::fmt::Display) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Args {
    let mut args = Args::default();
    let argv: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < argv.len() {
        let flag = argv[i].as_str();
        match flag {
            "--mode" => args.mode = Some(value(&argv, &mut i, flag)),
            "--source" => args.source = Some(PathBuf::from(value(&argv, &mut i, flag))),
            "--config" => args.config = Some(PathBuf::from(value(&argv, &mut i, flag))),
            "--output" => args.output = Some(value(&argv, &mut i, flag)),
            "--tempo" => args.tempo = Some(parsed(&argv, &mut i, flag)),
            "--velocity" => args.velocity = Some(parsed(&argv, &mut i, flag)),
            "--min-note" => args.min_note = Some(parsed(&argv, &mut i, flag)),
            "--max-note" => args.max_note = Some(parsed(&argv, &mut i, flag)),
            "--overflow" => {
                let raw = value(&argv, &mut i, flag);
                args.overflow = Some(raw.parse().unwrap_or_else(|e: String| fail(&e)));
            }
            "--missing" => args.missing = Some(value(&argv, &mut i, flag)),
            "--verbose" | "-v" => args.verbose = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    args
}

/// The argument following `flag`, advancing the cursor past it.
fn value(argv: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    argv.get(*i).cloned().unwrap_or_else(|| {
        eprintln!("{flag} requires a value");
        std::process::exit(1);
    })
}

fn parsed<T: FromStr>(argv: &[String], i: &mut usize, flag: &str) -> T {
    value(argv, i, flag).parse().unwrap_or_else(|_| {
        eprintln!("{flag} requires a valid number");
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("Usage: sonify [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --mode <MODE>         0|monthly, 1|yearly, 2|decade, 3|all (default: all)");
    println!("  --source <CSV>        Temperature table (default: {DEFAULT_SOURCE})");
    println!("  --output <BASE>       Output base name (default: just_warming_up)");
    println!("  --tempo <BPM>         Tempo (default: 120)");
    println!("  --velocity <N>        Note velocity 0-127 (default: 100)");
    println!("  --min-note <N>        Lowest note (default: 0)");
    println!("  --max-note <N>        Highest note (default: 127)");
    println!(
        "  --overflow <POLICY>   drop|clamp for values above the top threshold (default: drop)"
    );
    println!("  --missing <TOKEN>     Missing-value marker (default: ***)");
    println!("  --config <JSON>       Load settings from a JSON file; flags override it");
    println!("  --verbose, -v         Log every pipeline stage");
    println!("  --help, -h            Show this help");
}
