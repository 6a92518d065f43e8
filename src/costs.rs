//! The four weighted soft-cost objectives and full-cost evaluation.
//!
//! Mirrors the teacher's `EnumMap<Constraint, _>`-keyed cost counting, but
//! the per-objective weights here are fixed ITC-2007 constants rather than
//! a TOML-configurable table: this problem doesn't let the weights vary
//! per run, so the config-file/visitor machinery the teacher needed for
//! its per-deployment cost tuning has no counterpart here.

use std::fmt;

use enum_map::{Enum, EnumMap};
use strum::IntoStaticStr;

use crate::ids::{CourseId, CurriculumId, Day, Period};
use crate::instance::Instance;
use crate::solution::Solution;

pub type Cost = i32;

#[derive(Debug, Enum, IntoStaticStr, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    RoomCapacity,
    MinWorkingDays,
    CurriculumCompactness,
    RoomStability,
}

impl Objective {
    pub fn weight(self) -> Cost {
        match self {
            Objective::RoomCapacity => 1,
            Objective::MinWorkingDays => 5,
            Objective::CurriculumCompactness => 2,
            Objective::RoomStability => 1,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Per-objective violation counts (unweighted) plus their weighted total.
///
/// A [`CostBreakdown`] can hold either a from-scratch evaluation (all
/// fields non-negative) or an incremental delta (fields may be negative),
/// depending on who built it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostBreakdown {
    counts: EnumMap<Objective, Cost>,
}

impl CostBreakdown {
    pub fn zero() -> Self {
        CostBreakdown {
            counts: EnumMap::default(),
        }
    }

    pub fn add(&mut self, objective: Objective, amount: Cost) {
        self.counts[objective] += amount;
    }

    pub fn get(&self, objective: Objective) -> Cost {
        self.counts[objective]
    }

    pub fn total(&self) -> Cost {
        self.counts
            .iter()
            .map(|(objective, &count)| count * objective.weight())
            .sum()
    }

    pub fn merge(self, other: CostBreakdown) -> CostBreakdown {
        let mut result = self;
        for (objective, count) in other.counts {
            result.add(objective, count);
        }
        result
    }
}

impl fmt::Display for CostBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (objective, &count) in self.counts.iter() {
            writeln!(
                f,
                "{}: {} (weighted {})",
                objective.name(),
                count,
                count * objective.weight()
            )?;
        }
        writeln!(f, "Total: {}", self.total())
    }
}

/// Computes the full soft cost of `solution` from scratch, in
/// `O(C*R + C*D + Q*D*S)`. Used to seed a search and to sanity-check the
/// incrementally maintained running total.
pub fn full_cost(instance: &Instance, solution: &Solution) -> CostBreakdown {
    let mut cost = CostBreakdown::zero();

    for c in 0..instance.num_courses() {
        let course = CourseId::from_index(c);
        cost.add(Objective::RoomCapacity, room_capacity_cost(instance, solution, course));
        cost.add(
            Objective::MinWorkingDays,
            min_working_days_cost(instance, solution, course),
        );
        cost.add(Objective::RoomStability, room_stability_cost(instance, solution, course));
    }

    for q in 0..instance.num_curricula() {
        cost.add(
            Objective::CurriculumCompactness,
            curriculum_compactness_cost(instance, solution, CurriculumId::from_index(q)),
        );
    }

    cost
}

fn room_capacity_cost(instance: &Instance, solution: &Solution, course: CourseId) -> Cost {
    let n_students = instance.course(course).n_students as Cost;
    let mut cost = 0;
    for r in 0..instance.num_rooms() {
        let room = crate::ids::RoomId::from_index(r);
        if solution.sum_cr(course, room) > 0 {
            cost += (n_students - instance.room(room).capacity as Cost).max(0);
        }
    }
    cost
}

fn min_working_days_cost(instance: &Instance, solution: &Solution, course: CourseId) -> Cost {
    let min_working_days = instance.course(course).min_working_days as Cost;
    let mut working_days = 0;
    for d in 0..instance.num_days() {
        if solution.sum_cd(course, d) > 0 {
            working_days += 1;
        }
    }
    (min_working_days - working_days).max(0)
}

fn room_stability_cost(instance: &Instance, solution: &Solution, course: CourseId) -> Cost {
    let mut rooms_used = 0;
    for r in 0..instance.num_rooms() {
        let room = crate::ids::RoomId::from_index(r);
        if solution.sum_cr(course, room) > 0 {
            rooms_used += 1;
        }
    }
    (rooms_used - 1).max(0)
}

/// True when curriculum `q` has exactly one lecture at `(d, s)` and no
/// lecture in the periods immediately before or after on the same day:
/// an "isolated" lecture, the unit the compactness objective penalizes.
fn is_isolated(solution: &Solution, instance: &Instance, q: CurriculumId, d: Day, s: Period) -> bool {
    if solution.sum_qds(q, d, s) == 0 {
        return false;
    }
    let periods = instance.periods_per_day();
    let before = s > 0 && solution.sum_qds(q, d, s - 1) > 0;
    let after = s + 1 < periods && solution.sum_qds(q, d, s + 1) > 0;
    !before && !after
}

fn curriculum_compactness_cost(
    instance: &Instance,
    solution: &Solution,
    q: CurriculumId,
) -> Cost {
    let mut cost = 0;
    for d in 0..instance.num_days() {
        for s in 0..instance.periods_per_day() {
            if is_isolated(solution, instance, q, d, s) {
                cost += 1;
            }
        }
    }
    cost
}
