use std::io::Write;

use chrono::Utc;
use log::LevelFilter;

/// Initializes logging for the process.
///
/// Honors `RUST_LOG` when set, otherwise logs at info and above. Each
/// line carries a UTC timestamp, the level, and the module that logged.
pub fn init_logger() {
    let mut builder = env_logger::Builder::new();

    builder.format(|formatter, record| {
        writeln!(
            formatter,
            "{} [{}] ({}): {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    } else {
        builder.filter(None, LevelFilter::Info);
    }

    builder.init();
}
