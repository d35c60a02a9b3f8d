/// Shopdash Report
///
/// Loads a sales table, applies the filter from the environment and prints
/// every dashboard result as JSON on stdout.

use shopdash::{filter, ConfigError, DashboardSnapshot, FilteredSnapshot, ReportConfig, TableCache};
use std::io::{self, Write};

fn config_error(err: ConfigError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ReportConfig::from_env().map_err(config_error)?;

    let cache = TableCache::new();
    let loaded = cache.get_or_load(&config.data_path);
    if loaded.report.total_parse_warnings() > 0 {
        log::warn!(
            "{} values could not be parsed and were treated as missing",
            loaded.report.total_parse_warnings()
        );
    }

    let view = filter(&loaded.table, &config.filter);
    log::info!("{} of {} rows match the filter", view.len(), loaded.table.len());

    let report = FilteredSnapshot {
        filter: config.filter.clone(),
        snapshot: DashboardSnapshot::compute(&view).with_top_categories(config.top_categories),
    };
    log::info!("\n{}", report.snapshot.kpis);

    let json = if config.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}
