//! The Swap neighborhood: move one lecture to a target slot, possibly
//! displacing whatever occupies it. Exposes the predict/perform protocol
//! along with a lexicographic iterator and a random generator over moves.

use crate::costs::{Cost, CostBreakdown, Objective};
use crate::fingerprint::{placement_hash, Fingerprint};
use crate::ids::{CourseId, Day, LectureId, Period, RoomId};
use crate::instance::Instance;
use crate::solution::Solution;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictStrategy {
    Always,
    IfFeasible,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformStrategy {
    Always,
    IfFeasible,
    IfBetter,
    IfFeasibleAndBetter,
    Never,
}

/// `{l1, r2, d2, s2}`: move the lecture `l1` into slot `(r2, d2, s2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapMove {
    pub l1: LectureId,
    pub r2: RoomId,
    pub d2: Day,
    pub s2: Period,
}

/// Derived quantities for a [`SwapMove`] against a particular state: the
/// current placement of `l1`, and the occupant of the target slot if any.
#[derive(Debug, Clone, Copy)]
struct SwapHelper {
    c1: CourseId,
    r1: RoomId,
    d1: Day,
    s1: Period,
    l2: Option<LectureId>,
    c2: Option<CourseId>,
}

fn compute_helper(instance: &Instance, solution: &Solution, mv: &SwapMove) -> SwapHelper {
    let placement = solution
        .placement(mv.l1)
        .expect("swap move's l1 must already be placed");
    let c1 = instance.lecture_course(mv.l1);

    let l2 = solution.l_rds(mv.r2, mv.d2, mv.s2);
    let c2 = l2.map(|l2| instance.lecture_course(l2));

    SwapHelper {
        c1,
        r1: placement.room,
        d1: placement.day,
        s1: placement.period,
        l2,
        c2,
    }
}

/// A move is *effective* iff the two involved courses differ (moving a
/// lecture "onto itself" is a no-op).
fn is_effective(helper: &SwapHelper) -> bool {
    Some(helper.c1) != helper.c2
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SwapResult {
    pub feasible: bool,
    pub delta: CostBreakdown,
    /// Hash(es) of the placement(s) the move would add, for a rolling
    /// fingerprint maintained without rescanning the whole timetable.
    pub fingerprint_plus: Fingerprint,
    /// Hash(es) of the placement(s) the move would remove.
    pub fingerprint_minus: Fingerprint,
}

fn fingerprint_delta(mv: &SwapMove, helper: &SwapHelper) -> (Fingerprint, Fingerprint) {
    let mut plus = Fingerprint::zero().plus(placement_hash(mv.l1, mv.r2, mv.d2, mv.s2));
    let mut minus = Fingerprint::zero().plus(placement_hash(mv.l1, helper.r1, helper.d1, helper.s1));
    if let Some(l2) = helper.l2 {
        plus = plus.plus(placement_hash(l2, helper.r1, helper.d1, helper.s1));
        minus = minus.plus(placement_hash(l2, mv.r2, mv.d2, mv.s2));
    }
    (plus, minus)
}

fn check_lectures(
    solution: &Solution,
    arriving: Option<CourseId>,
    origin_d: Day,
    origin_s: Period,
    other: Option<CourseId>,
    target_d: Day,
    target_s: Period,
) -> bool {
    let Some(c) = arriving else { return true };
    let same_period = origin_d == target_d && origin_s == target_s;
    let same_course = other == Some(c);
    solution.sum_cds(c, target_d, target_s) as Cost - same_period as Cost - same_course as Cost <= 0
}

fn check_conflicts_curriculum(
    instance: &Instance,
    solution: &Solution,
    arriving: Option<CourseId>,
    origin_d: Day,
    origin_s: Period,
    other: Option<CourseId>,
    target_d: Day,
    target_s: Period,
) -> bool {
    let Some(c) = arriving else { return true };
    let same_period = origin_d == target_d && origin_s == target_s;
    for &q in instance.curricula_of(c) {
        let shares = other.is_some_and(|other| instance.share_curriculum(c, other, q));
        if solution.sum_qds(q, target_d, target_s) as Cost - same_period as Cost - shares as Cost > 0 {
            return false;
        }
    }
    true
}

fn check_conflicts_teacher(
    instance: &Instance,
    solution: &Solution,
    arriving: Option<CourseId>,
    origin_d: Day,
    origin_s: Period,
    other: Option<CourseId>,
    target_d: Day,
    target_s: Period,
) -> bool {
    let Some(c) = arriving else { return true };
    let same_period = origin_d == target_d && origin_s == target_s;
    let same_teacher = other.is_some_and(|other| instance.same_teacher(c, other));
    let teacher = instance.course(c).teacher;
    solution.sum_tds(teacher, target_d, target_s) as Cost - same_period as Cost - same_teacher as Cost <= 0
}

fn check_availabilities(instance: &Instance, arriving: Option<CourseId>, d: Day, s: Period) -> bool {
    match arriving {
        Some(c) => instance.available(c, d, s),
        None => true,
    }
}

fn check_hard_constraints(instance: &Instance, solution: &Solution, mv: &SwapMove, helper: &SwapHelper) -> bool {
    if Some(helper.c1) == helper.c2 {
        return true;
    }

    check_lectures(solution, Some(helper.c1), helper.d1, helper.s1, helper.c2, mv.d2, mv.s2)
        && check_lectures(solution, helper.c2, mv.d2, mv.s2, Some(helper.c1), helper.d1, helper.s1)
        && check_conflicts_curriculum(instance, solution, Some(helper.c1), helper.d1, helper.s1, helper.c2, mv.d2, mv.s2)
        && check_conflicts_curriculum(instance, solution, helper.c2, mv.d2, mv.s2, Some(helper.c1), helper.d1, helper.s1)
        && check_conflicts_teacher(instance, solution, Some(helper.c1), helper.d1, helper.s1, helper.c2, mv.d2, mv.s2)
        && check_conflicts_teacher(instance, solution, helper.c2, mv.d2, mv.s2, Some(helper.c1), helper.d1, helper.s1)
        && check_availabilities(instance, Some(helper.c1), mv.d2, mv.s2)
        && check_availabilities(instance, helper.c2, helper.d1, helper.s1)
}

fn room_capacity_delta(instance: &Instance, course: Option<CourseId>, from: RoomId, to: RoomId) -> Cost {
    let Some(c) = course else { return 0 };
    let n_students = instance.course(c).n_students as Cost;
    let cap_from = instance.room(from).capacity as Cost;
    let cap_to = instance.room(to).capacity as Cost;
    (cap_from - n_students).min(0) + (n_students - cap_to).max(0)
}

fn min_working_days_delta(
    instance: &Instance,
    solution: &Solution,
    from: Option<CourseId>,
    d_from: Day,
    to: Option<CourseId>,
    d_to: Day,
) -> Cost {
    let Some(c) = from else { return 0 };
    if to == Some(c) {
        return 0;
    }
    let mwd = instance.course(c).min_working_days as Cost;
    let mut prev_wd = 0;
    let mut cur_wd = 0;
    for d in 0..instance.num_days() {
        let count = solution.sum_cd(c, d) as Cost;
        prev_wd += count.min(1);
        let adjusted = count - (d == d_from) as Cost + (d == d_to) as Cost;
        cur_wd += adjusted.min(1);
    }
    (prev_wd - mwd).min(0) + (mwd - cur_wd).max(0)
}

fn room_stability_delta(
    instance: &Instance,
    solution: &Solution,
    from: Option<CourseId>,
    r_from: RoomId,
    to: Option<CourseId>,
    r_to: RoomId,
) -> Cost {
    let Some(c) = from else { return 0 };
    if r_from == r_to {
        return 0;
    }
    if to == Some(c) {
        return 0;
    }
    let mut prev_rooms = 0;
    let mut cur_rooms = 0;
    for r in 0..instance.num_rooms() {
        let room = RoomId::from_index(r);
        let count = solution.sum_cr(c, room) as Cost;
        prev_rooms += count.min(1);
        let adjusted = count - (room == r_from) as Cost + (room == r_to) as Cost;
        cur_rooms += adjusted.min(1);
    }
    (cur_rooms - 1).max(0) - (prev_rooms - 1).max(0)
}

fn curriculum_compactness_delta(
    instance: &Instance,
    solution: &Solution,
    from: Option<CourseId>,
    d_from: Day,
    s_from: Period,
    to: Option<CourseId>,
    d_to: Day,
    s_to: Period,
) -> Cost {
    let Some(c_from) = from else { return 0 };
    if to == Some(c_from) {
        return 0;
    }

    let periods = instance.periods_per_day() as i32;
    let s_from = s_from as i32;
    let s_to = s_to as i32;

    let mut total: Cost = 0;
    for &q in instance.curricula_of(c_from) {
        if let Some(c_to) = to {
            if instance.share_curriculum(c_to, c_from, q) {
                continue;
            }
        }

        // "raw": the occupancy before the move. "removed": raw with the
        // source slot vacated. "settled": removed with the target slot
        // filled. Isolation (an "alone" lecture) is evaluated against
        // each of these three configurations where relevant.
        let raw = |d: Day, s: i32| -> bool { s >= 0 && s < periods && solution.sum_qds(q, d, s as Period) > 0 };
        let removed = |d: Day, s: i32| -> bool {
            if d == d_from && s == s_from {
                false
            } else {
                raw(d, s)
            }
        };
        let settled = |d: Day, s: i32| -> bool {
            if d == d_to && s == s_to {
                true
            } else {
                removed(d, s)
            }
        };
        let alone = |f: &dyn Fn(Day, i32) -> bool, d: Day, s: i32| -> Cost { (f(d, s) && !f(d, s - 1) && !f(d, s + 1)) as Cost };

        let out_prev_before = alone(&raw, d_from, s_from - 1);
        let out_itself_before = alone(&raw, d_from, s_from);
        let out_next_before = alone(&raw, d_from, s_from + 1);

        let out_prev_after = alone(&removed, d_from, s_from - 1);
        let out_next_after = alone(&removed, d_from, s_from + 1);

        let in_prev_before = alone(&removed, d_to, s_to - 1);
        let in_next_before = alone(&removed, d_to, s_to + 1);
        let in_prev_after = alone(&settled, d_to, s_to - 1);
        let in_next_after = alone(&settled, d_to, s_to + 1);
        let in_itself_after = alone(&settled, d_to, s_to);

        total += (out_prev_after - out_prev_before)
            + (out_next_after - out_next_before)
            + (in_prev_after - in_prev_before)
            + (in_next_after - in_next_before)
            + (in_itself_after - out_itself_before);
    }
    total
}

fn compute_delta_cost(instance: &Instance, solution: &Solution, mv: &SwapMove, helper: &SwapHelper) -> CostBreakdown {
    let mut delta = CostBreakdown::zero();

    delta.add(
        Objective::RoomCapacity,
        room_capacity_delta(instance, Some(helper.c1), helper.r1, mv.r2)
            + room_capacity_delta(instance, helper.c2, mv.r2, helper.r1),
    );

    delta.add(
        Objective::MinWorkingDays,
        min_working_days_delta(instance, solution, Some(helper.c1), helper.d1, helper.c2, mv.d2)
            + min_working_days_delta(instance, solution, helper.c2, mv.d2, Some(helper.c1), helper.d1),
    );

    delta.add(
        Objective::CurriculumCompactness,
        curriculum_compactness_delta(instance, solution, Some(helper.c1), helper.d1, helper.s1, helper.c2, mv.d2, mv.s2)
            + curriculum_compactness_delta(instance, solution, helper.c2, mv.d2, mv.s2, Some(helper.c1), helper.d1, helper.s1),
    );

    delta.add(
        Objective::RoomStability,
        room_stability_delta(instance, solution, Some(helper.c1), helper.r1, helper.c2, mv.r2)
            + room_stability_delta(instance, solution, helper.c2, mv.r2, Some(helper.c1), helper.r1),
    );

    delta
}

/// Fills in `result.feasible` and/or `result.delta` per the requested
/// strategies, without mutating `solution`.
pub fn predict(
    instance: &Instance,
    solution: &Solution,
    mv: &SwapMove,
    predict_feasibility: PredictStrategy,
    predict_cost: PredictStrategy,
) -> SwapResult {
    let helper = compute_helper(instance, solution, mv);
    let mut result = SwapResult::default();

    if predict_feasibility == PredictStrategy::Always {
        result.feasible = check_hard_constraints(instance, solution, mv, &helper);
    }

    let want_cost = predict_cost == PredictStrategy::Always
        || (predict_cost == PredictStrategy::IfFeasible && result.feasible);
    if want_cost {
        result.delta = compute_delta_cost(instance, solution, mv, &helper);
    }

    (result.fingerprint_plus, result.fingerprint_minus) = fingerprint_delta(mv, &helper);

    result
}

/// Applies `mv` to `solution` if `perform` and `result` (from a prior
/// [`predict`]) say to. Returns whether it performed the move.
pub fn perform(instance: &Instance, solution: &mut Solution, mv: &SwapMove, perform: PerformStrategy, result: &SwapResult) -> bool {
    let should = match perform {
        PerformStrategy::Always => true,
        PerformStrategy::IfFeasible => result.feasible,
        PerformStrategy::IfBetter => result.delta.total() < 0,
        PerformStrategy::IfFeasibleAndBetter => result.feasible && result.delta.total() < 0,
        PerformStrategy::Never => false,
    };

    if should {
        let helper = compute_helper(instance, solution, mv);
        solution.set_lecture_assignment(instance, mv.l1, mv.r2, mv.d2, mv.s2);
        if let Some(l2) = helper.l2 {
            solution.set_lecture_assignment(instance, l2, helper.r1, helper.d1, helper.s1);
        }
    }

    should
}

/// Lexicographic iterator over candidate swap moves, innermost on `s2`,
/// skipping ineffective moves and one direction of each unordered pair of
/// occupied courses (so `{A swaps with B}` is only produced once).
pub struct SwapIter {
    l1: usize,
    r2: usize,
    d2: usize,
    s2: usize,
    started: bool,
}

impl SwapIter {
    pub fn new() -> Self {
        SwapIter {
            l1: 0,
            r2: 0,
            d2: 0,
            s2: 0,
            started: false,
        }
    }

    pub fn next(&mut self, instance: &Instance, solution: &Solution) -> Option<SwapMove> {
        loop {
            if !self.started {
                self.started = true;
            } else {
                self.s2 += 1;
                if self.s2 >= instance.periods_per_day() as usize {
                    self.s2 = 0;
                    self.d2 += 1;
                    if self.d2 >= instance.num_days() as usize {
                        self.d2 = 0;
                        self.r2 += 1;
                        if self.r2 >= instance.num_rooms() {
                            self.r2 = 0;
                            self.l1 += 1;
                            if self.l1 >= instance.num_lectures() {
                                return None;
                            }
                        }
                    }
                }
            }

            let mv = SwapMove {
                l1: LectureId::from_index(self.l1),
                r2: RoomId::from_index(self.r2),
                d2: self.d2 as Day,
                s2: self.s2 as Period,
            };
            let helper = compute_helper(instance, solution, &mv);
            if !is_effective(&helper) {
                continue;
            }
            if let Some(c2) = helper.c2 {
                if helper.c1.raw_index() <= c2.raw_index() {
                    continue;
                }
            }
            return Some(mv);
        }
    }
}

impl Default for SwapIter {
    fn default() -> Self {
        SwapIter::new()
    }
}

/// Draws a uniformly random effective move, redrawing until one is found,
/// and (if `require_feasible`) further redrawing until it also passes the
/// hard-constraint precheck.
pub fn generate_random(instance: &Instance, solution: &Solution, rng: &mut fastrand::Rng, require_feasible: bool) -> SwapMove {
    loop {
        let mv = SwapMove {
            l1: LectureId::from_index(rng.usize(0..instance.num_lectures())),
            r2: RoomId::from_index(rng.usize(0..instance.num_rooms())),
            d2: rng.u8(0..instance.num_days()),
            s2: rng.u8(0..instance.periods_per_day()),
        };
        let helper = compute_helper(instance, solution, &mv);
        if !is_effective(&helper) {
            continue;
        }
        if require_feasible {
            let result = predict(instance, solution, &mv, PredictStrategy::Always, PredictStrategy::Never);
            if !result.feasible {
                continue;
            }
        }
        return mv;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn base_solution(instance: &Instance) -> Solution {
        let mut solution = Solution::empty(instance);
        solution.set_lecture_assignment(instance, LectureId::from_index(0), RoomId::from_index(0), 0, 0);
        solution.set_lecture_assignment(instance, LectureId::from_index(1), RoomId::from_index(0), 1, 0);
        solution.set_lecture_assignment(instance, LectureId::from_index(2), RoomId::from_index(1), 0, 1);
        solution
    }

    #[test]
    fn moving_b_onto_a_is_infeasible() {
        let instance = toy_instance();
        let solution = base_solution(&instance);
        let mv = SwapMove {
            l1: LectureId::from_index(2),
            r2: RoomId::from_index(0),
            d2: 0,
            s2: 0,
        };
        let result = predict(&instance, &solution, &mv, PredictStrategy::Always, PredictStrategy::Never);
        assert!(!result.feasible);
    }

    #[test]
    fn moving_b_into_empty_slot_is_feasible_with_zero_delta() {
        let instance = toy_instance();
        let solution = base_solution(&instance);
        let mv = SwapMove {
            l1: LectureId::from_index(2),
            r2: RoomId::from_index(1),
            d2: 1,
            s2: 1,
        };
        let result = predict(&instance, &solution, &mv, PredictStrategy::Always, PredictStrategy::Always);
        assert!(result.feasible);
        assert_eq!(result.delta.total(), 0);
    }

    #[test]
    fn swapping_a_and_b_matches_full_cost_before_and_after() {
        let instance = toy_instance();
        let mut solution = base_solution(&instance);
        let pre = crate::costs::full_cost(&instance, &solution);

        let mv = SwapMove {
            l1: LectureId::from_index(0),
            r2: RoomId::from_index(1),
            d2: 0,
            s2: 1,
        };
        let result = predict(&instance, &solution, &mv, PredictStrategy::Always, PredictStrategy::Always);
        assert!(result.feasible);
        assert_eq!(result.delta.total(), 5);

        assert!(perform(&instance, &mut solution, &mv, PerformStrategy::Always, &result));
        let post = crate::costs::full_cost(&instance, &solution);
        assert_eq!(post.total(), pre.total() + result.delta.total());
    }

    #[test]
    fn perform_never_does_not_mutate() {
        let instance = toy_instance();
        let mut solution = base_solution(&instance);
        let mv = SwapMove {
            l1: LectureId::from_index(2),
            r2: RoomId::from_index(1),
            d2: 1,
            s2: 1,
        };
        let result = predict(&instance, &solution, &mv, PredictStrategy::Always, PredictStrategy::Always);
        assert!(!perform(&instance, &mut solution, &mv, PerformStrategy::Never, &result));
        assert_eq!(
            solution.placement(LectureId::from_index(2)).unwrap().day,
            0
        );
    }

    #[test]
    fn iterator_never_yields_ineffective_moves() {
        let instance = toy_instance();
        let solution = base_solution(&instance);
        let mut iter = SwapIter::new();
        let mut count = 0;
        while let Some(mv) = iter.next(&instance, &solution) {
            let helper = compute_helper(&instance, &solution, &mv);
            assert!(is_effective(&helper));
            count += 1;
        }
        assert!(count > 0);
    }
}
