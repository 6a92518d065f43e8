//! A simulated-annealing loop over the Swap and StabilizeRoom
//! neighborhoods. Not part of the published core: the CLI binary's way of
//! using the predict/perform protocol, the way the teacher's `solver.rs`
//! drives `Mutation` over its own evaluator.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use cct_timetabler::costs::full_cost;
use cct_timetabler::fingerprint::fingerprint;
use cct_timetabler::instance::Instance;
use cct_timetabler::solution::Solution;
use cct_timetabler::stabilize_room;
use cct_timetabler::swap::{self, PerformStrategy, PredictStrategy};

#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Upper bound on rounds, regardless of `time_budget`: a safety cap so
    /// a generous time budget on a tiny instance doesn't spin forever.
    pub num_rounds: u64,
    pub rng_seed: u64,
    /// Fraction of rounds that try a Swap move rather than a StabilizeRoom
    /// move.
    pub swap_fraction: f64,
    /// Wall-clock budget for the whole run; `None` means only `num_rounds`
    /// bounds it.
    pub time_budget: Option<Duration>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            num_rounds: 200_000,
            rng_seed: 0,
            swap_fraction: 0.85,
            time_budget: None,
        }
    }
}

pub struct DriverOutput {
    pub config: DriverConfig,
    pub final_cost: i32,
    pub log: String,
    pub solution: Solution,
}

/// The annealing temperature at `progress` (0.0 at the start of the run,
/// 1.0 at the end), mirroring the teacher's `solve_once` cooling curve.
fn temperature(progress: f32) -> f32 {
    5000.0 * (1.0 - progress).powi(6) + 0.1
}

fn accept(delta: i32, temperature: f32, rng: &mut fastrand::Rng) -> bool {
    if delta < 0 {
        return true;
    }
    rng.f32() < (-(delta as f32) / temperature).exp()
}

/// Runs `config.num_rounds` rounds of simulated annealing starting from
/// `initial_solution`, which must already be a feasible solution (e.g. as
/// produced by [`crate::finder::try_find`]).
pub fn run(instance: &Instance, initial_solution: &Solution, config: DriverConfig) -> DriverOutput {
    let mut rng = fastrand::Rng::with_seed(config.rng_seed);
    let mut solution = initial_solution.clone();
    let mut current_cost = full_cost(instance, &solution).total();
    let mut running_fp = fingerprint(instance, &solution);
    let mut log = String::new();

    macro_rules! logln {
        ( $( $args:expr ),* ) => {
            writeln!(&mut log, $( $args ),* ).unwrap()
        };
    }

    let start_time = Instant::now();
    logln!("Beginning anneal over {} rounds (seed {})", config.num_rounds, config.rng_seed);
    logln!("Initial cost: {current_cost}");

    let reporting_interval = (config.num_rounds / 20).max(1);

    let time_check_interval = 4096;
    let mut stopped_early_at = None;

    for round in 0..config.num_rounds {
        if round % reporting_interval == 0 {
            logln!("round {round:9}: cost {current_cost}");
        }
        if round % time_check_interval == 0 {
            if let Some(budget) = config.time_budget {
                if start_time.elapsed() >= budget {
                    stopped_early_at = Some(round);
                    break;
                }
            }
        }

        let progress = round as f32 / config.num_rounds.max(1) as f32;
        let temp = temperature(progress);

        if rng.f64() < config.swap_fraction {
            let mv = swap::generate_random(instance, &solution, &mut rng, false);
            let result = swap::predict(instance, &solution, &mv, PredictStrategy::Always, PredictStrategy::IfFeasible);
            if !result.feasible {
                continue;
            }
            if accept(result.delta.total(), temp, &mut rng) {
                swap::perform(instance, &mut solution, &mv, PerformStrategy::Always, &result);
                current_cost += result.delta.total();
                running_fp = running_fp.uncombine(result.fingerprint_minus).combine(result.fingerprint_plus);
            }
        } else {
            let mv = stabilize_room::generate_random(instance, &solution, &mut rng);
            let delta = stabilize_room::predict_cost(instance, &solution, &mv);
            if accept(delta.total(), temp, &mut rng) {
                let (plus, minus) = stabilize_room::predict_fingerprint(instance, &solution, &mv);
                stabilize_room::perform(instance, &mut solution, &mv);
                current_cost += delta.total();
                running_fp = running_fp.uncombine(minus).combine(plus);
            }
        }
    }

    debug_assert_eq!(running_fp, fingerprint(instance, &solution), "rolling fingerprint drifted from a full rescan");

    if let Some(round) = stopped_early_at {
        logln!("Stopped early at round {round} (time budget exhausted)");
    }
    logln!("Final cost: {current_cost}");
    logln!("Took {:.3}s", start_time.elapsed().as_secs_f32());

    DriverOutput {
        config,
        final_cost: current_cost,
        log,
        solution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cct_timetabler::finder::{try_find, FinderConfig};
    use cct_timetabler::ids::TeacherId;
    use cct_timetabler::instance::{Course, Room};

    fn toy_instance() -> Instance {
        Instance::build(
            "T".to_string(),
            vec![
                Course {
                    id: "A".into(),
                    teacher: TeacherId::from_index(0),
                    n_lectures: 2,
                    min_working_days: 2,
                    n_students: 10,
                },
                Course {
                    id: "B".into(),
                    teacher: TeacherId::from_index(1),
                    n_lectures: 1,
                    min_working_days: 1,
                    n_students: 5,
                },
            ],
            vec![
                Room { id: "R1".into(), capacity: 10 },
                Room { id: "R2".into(), capacity: 4 },
            ],
            vec![],
            vec!["T1".into(), "T2".into()],
            2,
            2,
            &[],
        )
    }

    #[test]
    fn incrementally_tracked_cost_matches_a_full_rescan_after_annealing() {
        let instance = toy_instance();
        let mut solution = Solution::empty(&instance);
        let mut rng = fastrand::Rng::with_seed(7);
        assert!(try_find(&instance, &FinderConfig::default(), &mut rng, &mut solution));

        let config = DriverConfig { num_rounds: 500, rng_seed: 3, ..DriverConfig::default() };
        let output = run(&instance, &solution, config);

        assert_eq!(output.final_cost, full_cost(&instance, &output.solution).total());
    }
}
