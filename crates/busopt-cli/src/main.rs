use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use busopt_model::{HeaderRow, LoaderOptions, OptimizeOptions, SheetRef, DEFAULT_THRESHOLD};

mod report;

#[derive(Parser)]
#[command(name = "busopt")]
#[command(version, about = "Minimum-cost assignment of bus trips to routes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the assignment and write the result workbook
    Solve {
        #[command(flatten)]
        load: LoadArgs,
        /// Where to write the result workbook
        #[arg(short, long, default_value = "hasil_optimasi_bus.xlsx")]
        output: PathBuf,
        /// Trip counts at or below this are treated as unused
        #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold)]
        threshold: f64,
        /// Output format (pretty, json)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Currency label printed before amounts
        #[arg(long, default_value = "Rp")]
        currency: String,
    },
    /// Load and validate the input workbook without solving
    Check {
        #[command(flatten)]
        load: LoadArgs,
    },
}

#[derive(Args)]
struct LoadArgs {
    /// Workbook with the fleet and route sheets
    input: PathBuf,
    /// Fleet sheet name (default: first sheet)
    #[arg(long)]
    fleet_sheet: Option<String>,
    /// Route sheet name (default: second sheet)
    #[arg(long)]
    route_sheet: Option<String>,
    /// 0-based row of the fleet header, instead of searching for "Armada"
    #[arg(long)]
    fleet_header_row: Option<usize>,
    /// 0-based row of the route header, instead of searching for "Rute"
    #[arg(long)]
    route_header_row: Option<usize>,
    /// Both sheets start directly with data
    #[arg(long, conflicts_with_all = ["fleet_header_row", "route_header_row"])]
    no_header: bool,
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("must be a finite, non-negative number, got {}", value));
    }
    Ok(value)
}

impl LoadArgs {
    fn loader_options(&self) -> LoaderOptions {
        let mut options = LoaderOptions::default();

        if let Some(name) = &self.fleet_sheet {
            options = options.with_fleet_sheet(SheetRef::Name(name.clone()));
        }
        if let Some(name) = &self.route_sheet {
            options = options.with_route_sheet(SheetRef::Name(name.clone()));
        }

        if self.no_header {
            options = options
                .with_fleet_header(HeaderRow::None)
                .with_route_header(HeaderRow::None);
        }
        if let Some(row) = self.fleet_header_row {
            options = options.with_fleet_header(HeaderRow::Index(row));
        }
        if let Some(row) = self.route_header_row {
            options = options.with_route_header(HeaderRow::Index(row));
        }

        options
    }
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Solve {
            load,
            output,
            threshold,
            format,
            currency,
        } => {
            let dataset = match busopt_model::load_dataset(&load.input, &load.loader_options()) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Load error: {}", e);
                    std::process::exit(1);
                }
            };

            if format != "json" {
                println!("Fleet:");
                println!("{}", report::fleet_table(&dataset));
                println!();
                println!("Routes:");
                println!("{}", report::route_table(&dataset));
                println!();
            }

            let options = OptimizeOptions::default().with_threshold(threshold);
            let plan = match busopt_model::optimize(&dataset, &options) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Solve error: {}", e);
                    std::process::exit(1);
                }
            };

            if let Err(e) = busopt_model::write_results(&output, &plan) {
                eprintln!("Write error: {}", e);
                std::process::exit(1);
            }

            if format == "json" {
                let report = serde_json::json!({
                    "fleet": dataset.fleet,
                    "routes": dataset.routes,
                    "assignments": plan.rows,
                    "total_cost": plan.total_cost,
                    "output": output.display().to_string(),
                });
                match serde_json::to_string_pretty(&report) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("Error encoding report: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                println!("Optimal assignment:");
                println!("{}", report::plan_table(&plan));
                println!();
                println!("Total minimum cost: {} {}", currency, report::format_amount(plan.total_cost));
                println!();
                println!("✓ Results written to {}", output.display());
            }
        }
        Commands::Check { load } => {
            let dataset = match busopt_model::load_dataset(&load.input, &load.loader_options()) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("✗ {} has errors:", load.input.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            };

            let capacity = dataset.total_capacity();
            let demand = dataset.total_demand();
            info!(capacity, demand, "Checked {}", load.input.display());

            println!("✓ {} is valid", load.input.display());
            println!("  {} fleet units", dataset.fleet.len());
            println!("  {} routes", dataset.routes.len());
            println!("  total capacity {:.2}", capacity);
            println!("  total demand   {:.2}", demand);

            if dataset.capacity_covers_demand(1e-6) {
                println!("  capacity covers demand");
            } else {
                println!("  capacity is short by {:.2} trips; no assignment is possible", demand - capacity);
                std::process::exit(1);
            }
        }
    }
}
