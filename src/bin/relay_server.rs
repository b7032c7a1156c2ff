use std::sync::Arc;
use std::{env, process};

use callrelay::config::Config;
use callrelay::log::log_sink::LogSink;
use callrelay::log::logger::Logger;
use callrelay::signaling::run::{listen_addr, run_relay_server_with_log};

fn main() -> std::io::Result<()> {
    // --- Parse CLI args ----------------------------------------------------
    //
    // Supported:
    //   cargo run --bin relay_server
    //      -> built-in defaults (0.0.0.0:8080, plaintext)
    //
    //   cargo run --bin relay_server -- relay.conf
    //      -> settings from relay.conf

    let args: Vec<String> = env::args().collect();

    let config = match args.len() {
        1 => Config::empty(),
        2 => match Config::load(&args[1]) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("[relay_server] {e}");
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage:");
            eprintln!("  {}            # listen on 0.0.0.0:8080", args[0]);
            eprintln!("  {} [CONFIG]   # e.g. relay_default.conf", args[0]);
            process::exit(1);
        }
    };

    // --- Start process logger ----------------------------------------------
    let logger = Logger::start_server(1024, &config);
    let log_sink: Arc<dyn LogSink> = Arc::new(logger.handle());

    eprintln!(
        "[relay_server] starting on {} (log file {})",
        listen_addr(&config),
        logger.file_path().display()
    );

    // --- Run relay (blocks) ------------------------------------------------
    run_relay_server_with_log(&config, log_sink)
}
