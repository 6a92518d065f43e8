use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use cct_timetabler::checks::check_instance;
use cct_timetabler::finder::{try_find, FinderConfig};
use cct_timetabler::parser::parse_instance_file;
use cct_timetabler::solution::Solution;
use cct_timetabler::solution_output::write_solution;
use clap::Parser;
use log::LevelFilter;

mod driver;

use driver::DriverConfig;

#[derive(Debug, clap::Parser)]
struct Args {
    #[arg(short = 'i', long = "instance")]
    instance: PathBuf,
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
    #[arg(short = 's', long = "seed", default_value_t = 0x5EED)]
    seed: u64,
    #[arg(short = 't', long = "time", default_value_t = 10)]
    time_seconds: u64,
    #[arg(short = 'v', long = "verbosity", default_value_t = 1)]
    verbosity: u8,
}

fn verbosity_filter(level: u8) -> LevelFilter {
    match level {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(verbosity_filter(args.verbosity))
        .init();

    let instance = match parse_instance_file(&args.instance) {
        Ok(instance) => instance,
        Err(err) => {
            log::error!("failed to load {}: {err}", args.instance.display());
            return ExitCode::from(1);
        }
    };
    log::info!(
        "loaded instance {:?}: {} courses, {} rooms, {} lectures",
        instance.name,
        instance.num_courses(),
        instance.num_rooms(),
        instance.num_lectures()
    );
    check_instance(&instance);

    let mut rng = fastrand::Rng::with_seed(args.seed);
    let mut solution = Solution::empty(&instance);
    if !try_find(&instance, &FinderConfig::default(), &mut rng, &mut solution) {
        log::error!("could not find a feasible solution within the finder's retry budget");
        return ExitCode::from(2);
    }

    let driver_config = DriverConfig {
        rng_seed: args.seed,
        time_budget: Some(Duration::from_secs(args.time_seconds)),
        ..DriverConfig::default()
    };
    let result = driver::run(&instance, &solution, driver_config);
    log::info!("search finished with cost {}", result.final_cost);
    log::debug!("{}", result.log);

    if let Err(err) = write_solution(&args.output, &instance, &result.solution) {
        log::error!("failed to write solution to {}: {err}", args.output.display());
        return ExitCode::from(1);
    }

    log::info!("wrote solution to {}", args.output.display());
    ExitCode::from(0)
}
