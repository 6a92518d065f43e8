//! The StabilizeRoom neighborhood: force every lecture of a course into a
//! single target room by replaying one chained Swap per already-placed
//! lecture of that course.

use crate::costs::{Cost, CostBreakdown, Objective};
use crate::fingerprint::Fingerprint;
use crate::ids::{CourseId, Day, Period, RoomId};
use crate::instance::Instance;
use crate::solution::Solution;
use crate::swap::{self, PerformStrategy, PredictStrategy, SwapMove};

/// `{c1, r2}`: collapse every lecture of `c1` into room `r2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizeRoomMove {
    pub c1: CourseId,
    pub r2: RoomId,
}

/// Computes the delta cost of `mv` without mutating `solution`. Only
/// RoomCapacity and RoomStability change; MinWorkingDays and
/// CurriculumCompactness are untouched since no lecture's day or period
/// moves, only its room.
///
/// Derives every stride from the axis it actually indexes (`num_courses`
/// for the course axis, `num_rooms` for the room axis) rather than
/// reusing one axis's size for another.
pub fn predict_cost(instance: &Instance, solution: &Solution, mv: &StabilizeRoomMove) -> CostBreakdown {
    let num_courses = instance.num_courses();
    let num_rooms = instance.num_rooms();
    let n_students = instance.course(mv.c1).n_students as Cost;

    // sum_cr_future[c * num_rooms + r]: what sum_cr[c][r] would become
    // after collapsing c1 into r2, before accounting for a course c2's
    // individual lectures getting displaced out of r2 one at a time below.
    let mut sum_cr_future = vec![0i32; num_courses * num_rooms];
    for c in 0..num_courses {
        for r in 0..num_rooms {
            sum_cr_future[c * num_rooms + r] = solution.sum_cr(CourseId::from_index(c), RoomId::from_index(r)) as i32;
        }
    }
    for r in 0..num_rooms {
        sum_cr_future[mv.c1.raw_index() * num_rooms + r] = 0;
    }
    sum_cr_future[mv.c1.raw_index() * num_rooms + mv.r2.raw_index()] = instance.course(mv.c1).n_lectures as i32;

    let mut room_capacity_cost: Cost = 0;

    for d in 0..instance.num_days() {
        for s in 0..instance.periods_per_day() {
            let Some(r1) = solution.r_cds(mv.c1, d, s) else { continue };
            let c2 = solution.c_rds(mv.r2, d, s);
            if c2 == Some(mv.c1) {
                continue;
            }

            let cap_r1 = instance.room(r1).capacity as Cost;
            let cap_r2 = instance.room(mv.r2).capacity as Cost;
            room_capacity_cost += (cap_r1 - n_students).min(0) + (n_students - cap_r2).max(0);

            if let Some(c2) = c2 {
                sum_cr_future[c2.raw_index() * num_rooms + mv.r2.raw_index()] -= 1;
                sum_cr_future[c2.raw_index() * num_rooms + r1.raw_index()] += 1;

                let stu_c2 = instance.course(c2).n_students as Cost;
                room_capacity_cost += (cap_r2 - stu_c2).min(0) + (stu_c2 - cap_r1).max(0);
            }
        }
    }

    let mut room_stability_cost: Cost = 0;
    for c in 0..num_courses {
        let course = CourseId::from_index(c);
        let mut prev_rooms = 0;
        let mut cur_rooms = 0;
        for r in 0..num_rooms {
            prev_rooms += (solution.sum_cr(course, RoomId::from_index(r)) as Cost).min(1);
            cur_rooms += (sum_cr_future[c * num_rooms + r] as Cost).min(1);
        }
        room_stability_cost += cur_rooms - prev_rooms;
    }

    let mut delta = CostBreakdown::zero();
    delta.add(Objective::RoomCapacity, room_capacity_cost);
    delta.add(Objective::RoomStability, room_stability_cost);
    delta
}

/// The hashes a perform of `mv` would add and remove from a rolling
/// fingerprint, without mutating `solution`.
pub fn predict_fingerprint(instance: &Instance, solution: &Solution, mv: &StabilizeRoomMove) -> (Fingerprint, Fingerprint) {
    let mut plus = Fingerprint::zero();
    let mut minus = Fingerprint::zero();

    for_each_placed_slot(instance, solution, mv.c1, |d, s, l1| {
        let swap_mv = SwapMove { l1, r2: mv.r2, d2: d, s2: s };
        let result = swap::predict(instance, solution, &swap_mv, PredictStrategy::Never, PredictStrategy::Never);
        plus = plus.combine(result.fingerprint_plus);
        minus = minus.combine(result.fingerprint_minus);
    });

    (plus, minus)
}

/// Unconditionally performs `mv`: every lecture of `c1` still in another
/// room is swapped into `r2`, displacing whatever occupies that slot.
pub fn perform(instance: &Instance, solution: &mut Solution, mv: &StabilizeRoomMove) {
    let slots: Vec<(Day, Period, crate::ids::LectureId)> = {
        let mut slots = Vec::new();
        for_each_placed_slot(instance, solution, mv.c1, |d, s, l1| slots.push((d, s, l1)));
        slots
    };

    for (d, s, l1) in slots {
        let swap_mv = SwapMove { l1, r2: mv.r2, d2: d, s2: s };
        let result = swap::predict(instance, solution, &swap_mv, PredictStrategy::Never, PredictStrategy::Never);
        swap::perform(instance, solution, &swap_mv, PerformStrategy::Always, &result);
    }
}

/// Draws a uniformly random `{c1, r2}` pair, redrawing until `r2` differs
/// from `c1`'s current room in at least one of its placed lectures (a move
/// that wouldn't change anything otherwise).
pub fn generate_random(instance: &Instance, solution: &Solution, rng: &mut fastrand::Rng) -> StabilizeRoomMove {
    loop {
        let mv = StabilizeRoomMove {
            c1: CourseId::from_index(rng.usize(0..instance.num_courses())),
            r2: RoomId::from_index(rng.usize(0..instance.num_rooms())),
        };
        let mut effective = false;
        for_each_placed_slot(instance, solution, mv.c1, |_, _, l1| {
            if solution.placement(l1).map(|p| p.room) != Some(mv.r2) {
                effective = true;
            }
        });
        if effective {
            return mv;
        }
    }
}

fn for_each_placed_slot(instance: &Instance, solution: &Solution, c1: CourseId, mut f: impl FnMut(Day, Period, crate::ids::LectureId)) {
    for d in 0..instance.num_days() {
        for s in 0..instance.periods_per_day() {
            let Some(r1) = solution.r_cds(c1, d, s) else { continue };
            let Some(l1) = solution.l_rds(r1, d, s) else { continue };
            f(d, s, l1);
        }
    }
}
