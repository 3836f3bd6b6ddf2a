//! # tsh
//!
//! Interactive shell entry point. A feeder thread turns raw stdin
//! bytes into console interrupts; the interpreter loop blocks reading
//! committed lines from the same console.

use std::env;
use std::io;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::thread;

use console_core::Console;
use console_device::CellGrid;
use shell_cli::{feeder, Repl, ShellSettings};
use shell_exec::HostProcesses;

#[derive(Default)]
struct Config {
    settings_path: Option<String>,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    let settings = match &config.settings_path {
        Some(path) => ShellSettings::load(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => ShellSettings::default(),
    };

    let console = Arc::new(Console::new(CellGrid::new()));
    let mut repl = Repl::new(
        Arc::clone(&console),
        HostProcesses::new(),
        settings,
        io::stdout(),
        io::stderr(),
    );

    let dump = repl.dump_flag();
    let feeder_console = Arc::clone(&console);
    let _feeder =
        thread::spawn(move || feeder::pump(&feeder_console, io::stdin().lock(), &dump));

    if let Err(e) = repl.run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--settings" | "-s" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --settings".to_string());
                }
                config.settings_path = Some(args[i].clone());
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --settings <FILE>    JSON settings override file");
    eprintln!("  -h, --help               Show this help message");
}
