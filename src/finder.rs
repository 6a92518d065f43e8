//! Greedy randomized constructor for a feasible starting [`Solution`].
//!
//! Ranks courses by scarcity of available slots (the harder a course is
//! to place, the earlier it's attempted), blends in random noise so
//! repeated attempts don't all walk the identical order, and tries
//! candidate slots in random order until one satisfies every hard
//! constraint. If a lecture gets stuck, the whole attempt is abandoned
//! and retried with a fresh permutation, up to a finite budget.

use itertools::iproduct;

use crate::ids::{CourseId, Day, LectureId, Period, RoomId};
use crate::instance::Instance;
use crate::solution::Solution;

#[derive(Debug, Clone, Copy)]
pub struct FinderConfig {
    /// How much uniform noise (in units of slot count) to blend into the
    /// scarcity ranking; 0.0 is purely deterministic by scarcity.
    pub ranking_randomness: f64,
    /// How many full placement attempts to make before giving up.
    pub max_attempts: u32,
}

impl Default for FinderConfig {
    fn default() -> Self {
        FinderConfig {
            ranking_randomness: 2.0,
            max_attempts: 50,
        }
    }
}

fn slot_feasible(instance: &Instance, solution: &Solution, course: CourseId, room: RoomId, d: Day, s: Period) -> bool {
    if !instance.available(course, d, s) {
        return false;
    }
    if solution.c_rds(room, d, s).is_some() {
        return false;
    }
    if solution.sum_cds(course, d, s) > 0 {
        return false;
    }
    for &q in instance.curricula_of(course) {
        if solution.sum_qds(q, d, s) > 0 {
            return false;
        }
    }
    let teacher = instance.course(course).teacher;
    if solution.sum_tds(teacher, d, s) > 0 {
        return false;
    }
    true
}

fn course_scarcity(instance: &Instance, course: CourseId) -> u32 {
    let mut available = 0;
    for d in 0..instance.num_days() {
        for s in 0..instance.periods_per_day() {
            if instance.available(course, d, s) {
                available += 1;
            }
        }
    }
    available
}

/// Builds the order lectures will be attempted in: courses ranked from
/// scarcest available periods to most, with noise blended in so attempts
/// differ, then every lecture of a course enqueued together.
fn placement_order(instance: &Instance, rng: &mut fastrand::Rng, randomness: f64) -> Vec<LectureId> {
    let mut courses: Vec<(f64, CourseId)> = (0..instance.num_courses())
        .map(CourseId::from_index)
        .map(|c| {
            let noise = (rng.f64() - 0.5) * 2.0 * randomness;
            (course_scarcity(instance, c) as f64 + noise, c)
        })
        .collect();
    courses.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut order = Vec::with_capacity(instance.num_lectures());
    for (_, course) in courses {
        for lecture_idx in instance.lectures_of_course(course) {
            order.push(LectureId::from_index(lecture_idx));
        }
    }
    order
}

fn try_place_lecture(instance: &Instance, solution: &mut Solution, rng: &mut fastrand::Rng, lecture: LectureId) -> bool {
    let course = instance.lecture_course(lecture);

    let mut candidates: Vec<(RoomId, Day, Period)> = iproduct!(0..instance.num_rooms(), 0..instance.num_days(), 0..instance.periods_per_day())
        .map(|(r, d, s)| (RoomId::from_index(r), d, s))
        .collect();
    rng.shuffle(&mut candidates);

    for (room, d, s) in candidates {
        if slot_feasible(instance, solution, course, room, d, s) {
            solution.set_lecture_assignment(instance, lecture, room, d, s);
            return true;
        }
    }
    false
}

/// Attempts to build a feasible assignment into `solution`, which is
/// assumed empty (or is cleared on each retry). Returns whether it
/// succeeded within `config.max_attempts`; on failure `solution` is left
/// fully cleared.
pub fn try_find(instance: &Instance, config: &FinderConfig, rng: &mut fastrand::Rng, solution: &mut Solution) -> bool {
    for attempt in 0..config.max_attempts {
        log::debug!("feasible finder attempt {attempt}");

        for lecture_idx in 0..instance.num_lectures() {
            solution.clear_lecture_assignment(instance, LectureId::from_index(lecture_idx));
        }

        let order = placement_order(instance, rng, config.ranking_randomness);
        let mut stuck = false;
        for lecture in order {
            if !try_place_lecture(instance, solution, rng, lecture) {
                stuck = true;
                break;
            }
        }

        if !stuck {
            return true;
        }
    }

    for lecture_idx in 0..instance.num_lectures() {
        solution.clear_lecture_assignment(instance, LectureId::from_index(lecture_idx));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::full_cost;
    use crate::ids::TeacherId;
    use crate::instance::{Course, Room};

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
    fn finder_on_toy_instance_is_feasible_with_cost_at_most_one() {
        let instance = toy_instance();
        let mut solution = Solution::empty(&instance);
        let mut rng = fastrand::Rng::with_seed(1);
        let config = FinderConfig::default();

        assert!(try_find(&instance, &config, &mut rng, &mut solution));
        assert_eq!(solution.num_placed(), instance.num_lectures());

        let cost = full_cost(&instance, &solution).total();
        assert!(cost == 0 || cost == 1);
    }

    #[test]
    fn finder_places_every_lecture_in_a_distinct_legal_slot() {
        let instance = toy_instance();
        let mut solution = Solution::empty(&instance);
        let mut rng = fastrand::Rng::with_seed(42);
        let config = FinderConfig::default();

        assert!(try_find(&instance, &config, &mut rng, &mut solution));

        for c in 0..instance.num_courses() {
            for d in 0..instance.num_days() {
                for s in 0..instance.periods_per_day() {
                    assert!(solution.sum_cds(CourseId::from_index(c), d, s) <= 1);
                }
            }
        }
    }
}
