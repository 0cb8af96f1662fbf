// Log output for the `sonify` binary.
//
// The library only emits `tracing` events; installing a subscriber is left
// to the binary. Output goes to stderr so stdout stays free for the summary
// of written files. The level is fixed by the caller (no env filter).

use tracing::Level;

/// Install the global `fmt` subscriber. `verbose` enables per-stage debug
/// events. Calling this twice is harmless; the second call does nothing.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
