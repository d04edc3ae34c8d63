//! Three-reel slot command line
//!
//! Usage:
//!   rf-reel-sim simulate --spins 1000000 --seed 7     - Batch RTP simulation
//!   rf-reel-sim reels --seed 7                        - Reel statistics
//!   rf-reel-sim paylines                              - Payline patterns and pays
//!   rf-reel-sim play --spins 10                       - Play spins on one machine
//!
//! Every command accepts `--config <file.json|file.yaml>`.

use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rf_reel_engine::{
    Credits, MachineConfig, REEL_COUNT, SlotMachine, SpinResult, SymbolCatalog, WINDOW_SIZE,
    Window,
};
use rf_reel_sim::{SimConfig, Simulator};

#[derive(Parser)]
#[command(name = "rf-reel-sim", about = "Three-reel slot engine tools")]
struct Cli {
    /// Machine definition (JSON or YAML); defaults to the classic machine
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch simulation and report RTP
    Simulate {
        #[arg(short = 'n', long, default_value_t = 1_000_000)]
        spins: u64,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        /// Worker threads (0 = one per CPU)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
        #[arg(short, long, default_value = "0.05")]
        bet: Credits,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-reel symbol counts
    Reels {
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        /// Also print every strip
        #[arg(long)]
        strips: bool,
    },
    /// Show the payline patterns and three-of-a-kind pays
    Paylines,
    /// Spin a single machine
    Play {
        #[arg(short = 'n', long, default_value_t = 10)]
        spins: u32,
        /// Seed the machine for a reproducible session
        #[arg(short, long)]
        seed: Option<u64>,
        /// Skip the reveal delay
        #[arg(long)]
        instant: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let machine_config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            spins,
            seed,
            threads,
            bet,
            json,
        } => simulate(
            machine_config,
            SimConfig {
                spins,
                seed,
                threads,
                bet,
            },
            json,
        ),
        Commands::Reels { seed, strips } => show_reels(machine_config, seed, strips),
        Commands::Paylines => show_paylines(&machine_config),
        Commands::Play {
            spins,
            seed,
            instant,
        } => play(machine_config, spins, seed, instant),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<MachineConfig> {
    match path {
        Some(path) => MachineConfig::load(path)
            .with_context(|| format!("Failed to load machine config {}", path.display())),
        None => Ok(MachineConfig::default()),
    }
}

fn simulate(machine_config: MachineConfig, config: SimConfig, json: bool) -> Result<()> {
    let simulator = Simulator::new(machine_config, config.seed)?;
    let report = simulator.run(&config)?;

    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("Machine:     {}", report.machine);
    println!("Spins:       {} on {} workers", report.spins, report.threads);
    println!("Bet:         {}", report.bet);
    println!("Wagered:     {}", report.wagered);
    println!("Won:         {}", report.won);
    println!("RTP:         {:.3}%", report.rtp);
    println!("Hit rate:    {:.3}%", report.hit_rate);
    println!("Max win:     {}", report.max_win);
    println!("All-wild:    {}", report.all_wild_hits);
    println!();
    println!("Line hits:");
    for (i, hits) in report.line_hits.iter().enumerate() {
        println!("  line {}: {}", i + 1, hits);
    }
    println!("Symbol wins:");
    for tally in &report.symbols {
        println!("  {:<14} {}", tally.name, tally.line_wins);
    }
    println!();
    println!("Elapsed: {} ms", report.elapsed_ms);
    Ok(())
}

fn show_reels(machine_config: MachineConfig, seed: u64, strips: bool) -> Result<()> {
    let machine = SlotMachine::seeded(machine_config, seed)?;

    for reel in machine.reel_statistics() {
        println!("Reel {} ({} symbols)", reel.reel, reel.length);
        for count in &reel.counts {
            println!("  {:<14} {}", count.name, count.count);
        }
    }

    if strips {
        let catalog = machine.catalog();
        for reel in machine.reels().reels() {
            let names: Vec<&str> = reel.symbols().iter().map(|&id| catalog.name_of(id)).collect();
            println!();
            println!("Reel {} strip:", reel.index() + 1);
            println!("  {}", names.join(", "));
        }
    }
    Ok(())
}

fn show_paylines(machine_config: &MachineConfig) -> Result<()> {
    const ROW_NAMES: [&str; WINDOW_SIZE] = ["top", "middle", "bottom"];

    for (i, payline) in machine_config.paylines.iter().enumerate() {
        let rows: Vec<&str> = payline
            .rows
            .iter()
            .map(|&r| ROW_NAMES.get(r as usize).copied().unwrap_or("?"))
            .collect();
        println!("Line {}: {:?}  ({})", i + 1, payline.rows, rows.join(" → "));

        for row in 0..WINDOW_SIZE as u8 {
            let cells: String = payline
                .rows
                .iter()
                .map(|&r| if r == row { "■ " } else { "· " })
                .collect();
            println!("    {}", cells.trim_end());
        }
    }

    let paytable = machine_config.pay_table()?;
    let catalog = paytable.catalog();
    let premium = catalog.premium_tiers();
    let overrides = paytable.overrides();

    println!();
    println!("Pays (three of a kind):");
    for (id, symbol) in catalog.iter() {
        let multiplier = if symbol.wild {
            overrides.all_wild
        } else if premium.top == Some(id) {
            overrides.top_tier
        } else if premium.second == Some(id) {
            overrides.second_tier
        } else {
            symbol.multiplier
        };
        println!("  {:<14} x{}", symbol.name, multiplier);
    }
    Ok(())
}

fn play(machine_config: MachineConfig, spins: u32, seed: Option<u64>, instant: bool) -> Result<()> {
    let mut machine = match seed {
        Some(seed) => SlotMachine::seeded(machine_config, seed)?,
        None => SlotMachine::new(machine_config)?,
    };

    for _ in 0..spins {
        let ticket = match machine.request_spin() {
            Ok(ticket) => ticket,
            Err(rejection) => {
                println!("Spin rejected: {rejection}");
                break;
            }
        };

        if !instant {
            thread::sleep(ticket.reveal_after());
        }

        let result = machine.settle(ticket)?;
        print_spin(machine.catalog(), &result);
    }

    let state = machine.state();
    let stats = machine.stats();
    println!(
        "Balance {} | bet {} | {} spins, RTP {:.2}%, hit rate {:.2}%",
        state.balance,
        state.bet,
        stats.total_spins,
        stats.rtp(),
        stats.hit_rate()
    );
    Ok(())
}

fn print_spin(catalog: &SymbolCatalog, result: &SpinResult) {
    println!("Spin {} (bet {})", result.spin_id, result.bet);
    print_windows(catalog, &result.windows);

    for win in &result.wins {
        println!(
            "  line {}: {} x{} = {}{}",
            win.line,
            win.symbol_name,
            win.multiplier,
            win.amount,
            if win.is_special { " (premium)" } else { "" }
        );
    }
    if result.is_win() {
        println!("  WIN {} -> balance {}", result.total_win, result.new_balance);
    } else {
        println!("  no win -> balance {}", result.new_balance);
    }
}

fn print_windows(catalog: &SymbolCatalog, windows: &[Window; REEL_COUNT]) {
    for row in 0..WINDOW_SIZE {
        let cells: Vec<String> = windows
            .iter()
            .map(|window| format!("{:<14}", catalog.name_of(window[row])))
            .collect();
        println!("  | {} |", cells.join("| "));
    }
}
