use std::{io, sync::Once, thread};

use log::LevelFilter;

static INIT_TEST_LOGGER: Once = Once::new();

// Print vote set events at `level` or above to stdout, tagged with the test thread's name. Only the
// first call in a test binary installs the logger.
pub(crate) fn setup_logger(level: LevelFilter) {
    INIT_TEST_LOGGER.call_once(|| {
        fern::Dispatch::new()
            .format(|out, message, record| {
                let thread = thread::current();
                out.finish(format_args!(
                    "{} {:<5} {}: {}",
                    thread.name().unwrap_or("unnamed"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(level)
            .chain(io::stdout())
            .apply()
            .unwrap();
    })
}
