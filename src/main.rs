use std::io;
use std::process;

use cpulog_rs::generator::{generate_log, DEFAULT_LOG_START};
use cpulog_rs::{repl, EngineConfig, QueryEngine, Result};

fn parse_arg(flag: &str) -> Option<String> {
    let mut args = std::env::args();
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
    }
    None
}

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|arg| arg == flag)
}

fn run() -> Result<()> {
    let mut config = match parse_arg("--config") {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(path) = parse_arg("--log") {
        config = config.with_raw_log(path);
    }
    if let Some(dir) = parse_arg("--shard-dir") {
        config = config.with_shard_dir(dir);
    }

    if has_flag("--generate") {
        let mut rng = rand::thread_rng();
        generate_log(&config, DEFAULT_LOG_START, &mut rng)?;
    }

    let mut engine = QueryEngine::new(config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    repl::run(&mut engine, stdin.lock(), &mut stdout)
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(error) = run() {
        tracing::error!(%error, "fatal error");
        process::exit(1);
    }
}
