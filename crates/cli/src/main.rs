//! Memory-system simulator command loop.
//!
//! This binary provides the interactive surface over the simulator core.
//! It performs:
//! 1. **Interactive run:** read commands from stdin with a prompt.
//! 2. **Script run:** execute a command file line by line.
//! 3. **Configuration:** optionally override the built-in defaults from a
//!    JSON file before the first `init`.

use clap::Parser;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use memsim_core::config::{AllocStrategy, CachePolicy, Config, VmPolicy};
use memsim_core::MemoryManager;

#[derive(Parser, Debug)]
#[command(
    name = "memsim",
    version,
    about = "Educational memory-system simulator",
    long_about = "Simulates a heap allocator, a three-level cache hierarchy, and a demand-paged\n\
                  virtual memory translator over one pool of simulated RAM.\n\n\
                  Commands are read from stdin (or SCRIPT when given); type 'help' at the\n\
                  prompt for the command list."
)]
struct Cli {
    /// Command script to execute instead of reading stdin.
    script: Option<PathBuf>,

    /// JSON configuration file overriding the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(message) => {
                eprintln!("Error loading config {}: {}", path.display(), message);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    match cli.script {
        Some(path) => {
            let content = fs::read_to_string(&path).unwrap_or_else(|e| {
                eprintln!("Error reading script {}: {}", path.display(), e);
                process::exit(1);
            });
            run(content.lines().map(str::to_string), config, false);
        }
        None => {
            let stdin = io::stdin();
            let lines = stdin.lock().lines().map_while(Result::ok);
            run(lines, config, true);
        }
    }
}

/// Reads and parses a JSON configuration file.
fn load_config(path: &PathBuf) -> Result<Config, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    Config::from_json(&content).map_err(|e| e.to_string())
}

/// Drives the command loop over `lines` until `exit` or end of input.
fn run(lines: impl Iterator<Item = String>, mut config: Config, interactive: bool) {
    let mut manager: Option<MemoryManager> = None;

    println!("Welcome to MemSim. Type 'help' for commands.");

    let mut lines = lines;
    loop {
        if interactive {
            print!("> ");
            io::stdout().flush().ok();
        }
        let Some(line) = lines.next() else {
            break;
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&action) = tokens.first() else {
            continue;
        };

        match action {
            "exit" => break,
            "help" => print_help(),
            "init" => match tokens.get(1).and_then(|t| t.parse::<usize>().ok()) {
                Some(size) => match MemoryManager::new(size, &config) {
                    Ok(mem) => manager = Some(mem),
                    Err(e) => println!("{}", e),
                },
                None => println!("Usage: init <size>"),
            },
            // `set` may precede `init`: it adjusts the pending configuration
            // and is re-applied to the live simulator when one exists.
            "set" => handle_set(&tokens, &mut config, manager.as_mut()),
            _ => match manager.as_mut() {
                None => println!("Error: Memory not initialized. Run 'init <size>' first."),
                Some(mem) => handle_core_command(action, &tokens, mem),
            },
        }
    }
}

/// Dispatches a post-`init` command against the simulator.
fn handle_core_command(action: &str, tokens: &[&str], mem: &mut MemoryManager) {
    match action {
        "malloc" => match tokens.get(1).and_then(|t| t.parse::<usize>().ok()) {
            Some(size) => match mem.malloc(size) {
                Ok(offset) => println!("Allocated at address: {}", offset),
                Err(_) => println!("Allocation failed (Not enough memory)"),
            },
            None => println!("Usage: malloc <size>"),
        },
        "free" => match tokens.get(1).and_then(|t| t.parse::<usize>().ok()) {
            Some(value) => {
                if let Err(e) = mem.free_smart(value) {
                    println!("{}", e);
                }
            }
            None => println!("Usage: free <block_id> OR free <address>"),
        },
        "read" => match tokens.get(1).and_then(|t| t.parse::<usize>().ok()) {
            Some(addr) => match mem.access(addr, 'R') {
                Ok(()) => println!("Read from address {}", addr),
                Err(e) => println!("{}", e),
            },
            None => println!("Usage: read <address>"),
        },
        "write" => {
            let addr = tokens.get(1).and_then(|t| t.parse::<usize>().ok());
            let value = tokens.get(2).and_then(|t| t.parse::<i64>().ok());
            match (addr, value) {
                (Some(addr), Some(value)) => match mem.access(addr, 'W') {
                    // The value is logged only; the simulation stores no data.
                    Ok(()) => println!("Wrote {} to address {}", value, addr),
                    Err(e) => println!("{}", e),
                },
                _ => println!("Usage: write <address> <value>"),
            }
        }
        "enable_vm" => match tokens.get(1).and_then(|t| t.parse::<usize>().ok()) {
            Some(page_size) if page_size > 0 => mem.enable_vm(page_size),
            _ => println!("Usage: enable_vm <page_size>"),
        },
        "dump" => mem.dump_memory(),
        "stats" => mem.print_stats(),
        _ => println!("Unknown command '{}'. Type 'help' for commands.", action),
    }
}

/// Handles the `set` command family against the pending configuration and
/// the live simulator (when initialized).
fn handle_set(tokens: &[&str], config: &mut Config, manager: Option<&mut MemoryManager>) {
    match tokens.get(1).copied() {
        Some("allocator") => {
            // Strategy names may span two tokens ("first fit").
            let name = tokens[2..].join(" ");
            let strategy = match name.as_str() {
                "first fit" => AllocStrategy::FirstFit,
                "best fit" => AllocStrategy::BestFit,
                "worst fit" => AllocStrategy::WorstFit,
                "buddy" => AllocStrategy::Buddy,
                _ => {
                    println!("Unknown strategy. Use: first fit, best fit, worst fit, buddy.");
                    return;
                }
            };
            config.allocator.strategy = strategy;
            if let Some(mem) = manager {
                mem.set_strategy(strategy);
            }
            println!("Strategy changed to {}.", strategy);
        }
        Some("cache") if tokens.get(2) == Some(&"policy") => {
            let policy = match tokens.get(3).copied() {
                Some("fifo") => CachePolicy::Fifo,
                Some("lru") => CachePolicy::Lru,
                Some("lfu") => CachePolicy::Lfu,
                Some(_) => {
                    println!("Unknown policy. Use: fifo, lru, lfu");
                    return;
                }
                None => {
                    println!("Usage: set cache policy <fifo|lru|lfu>");
                    return;
                }
            };
            config.cache.policy = policy;
            if let Some(mem) = manager {
                mem.set_cache_policy(policy);
            }
            println!("Cache Policy set to {}", policy);
        }
        Some("vm") => match tokens.get(2).copied() {
            Some("policy") => {
                let policy = match tokens.get(3).copied() {
                    Some("fifo") => VmPolicy::Fifo,
                    Some("lru") => VmPolicy::Lru,
                    Some("clock") => VmPolicy::Clock,
                    Some(_) => {
                        println!("Unknown policy. Use: fifo, lru, clock");
                        return;
                    }
                    None => {
                        println!("Usage: set vm policy <fifo|lru|clock>");
                        return;
                    }
                };
                config.vm.policy = policy;
                if let Some(mem) = manager {
                    mem.set_vm_policy(policy);
                }
                println!("VM Policy set to {}", policy);
            }
            Some("latency") => match tokens.get(3).and_then(|t| t.parse::<u64>().ok()) {
                Some(ms) => {
                    config.vm.disk_latency_ms = ms;
                    if let Some(mem) = manager {
                        mem.set_vm_latency(ms);
                    }
                    println!("VM Disk Latency set to {}ms", ms);
                }
                None => println!("Usage: set vm latency <ms>"),
            },
            _ => println!("Unknown VM setting. Use: policy, latency"),
        },
        _ => println!("Usage: set <allocator|cache policy|vm policy|vm latency> ..."),
    }
}

/// Prints the command reference.
fn print_help() {
    println!("Commands:");
    println!("  init <size>          - Initialize memory");
    println!("  enable_vm <page_size>- Enable Virtual Memory");
    println!("  malloc <size>        - Allocate bytes");
    println!("  free <value>         - Free by block id or payload address");
    println!("  read <addr>          - Read from address (Cache Test)");
    println!("  write <addr> <val>   - Write to address (Cache Test)");
    println!("  set allocator <first fit|best fit|worst fit|buddy>");
    println!("  set cache policy <fifo|lru|lfu>");
    println!("  set vm policy <fifo|lru|clock>");
    println!("  set vm latency <ms>");
    println!("  dump                 - Show memory map");
    println!("  stats                - Show usage stats");
    println!("  exit                 - Quit program");
}
