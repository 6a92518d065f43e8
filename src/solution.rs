//! Mutable timetable state: the primary lecture -> (room, day, period)
//! assignment, plus every derived index kept in exact agreement with it.
//!
//! Every mutation goes through [`Solution::set_lecture_assignment`] or
//! [`Solution::clear_lecture_assignment`], which update the primary
//! assignment and every derived index together so the invariants in
//! SPEC_FULL.md section 3 never observably break.

use crate::ids::{CourseId, CurriculumId, Day, LectureId, Period, RoomId, TeacherId};
use crate::instance::Instance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub room: RoomId,
    pub day: Day,
    pub period: Period,
}

/// A flat `C x D x S`-ish counter array addressed by a hand-written (but
/// axis-size-derived) stride, the way the teacher's `AvailabilityMatrix`
/// addresses its `session x instructor` grid.
#[derive(Debug, Clone)]
struct Grid3 {
    dim2: usize,
    dim3: usize,
    data: Box<[u16]>,
}

impl Grid3 {
    fn new(dim1: usize, dim2: usize, dim3: usize) -> Self {
        Grid3 {
            dim2,
            dim3,
            data: vec![0u16; dim1 * dim2 * dim3].into_boxed_slice(),
        }
    }

    #[inline]
    fn index(&self, i1: usize, i2: usize, i3: usize) -> usize {
        (i1 * self.dim2 + i2) * self.dim3 + i3
    }

    #[inline]
    fn get(&self, i1: usize, i2: usize, i3: usize) -> u16 {
        self.data[self.index(i1, i2, i3)]
    }

    #[inline]
    fn add(&mut self, i1: usize, i2: usize, i3: usize, delta: i32) {
        let idx = self.index(i1, i2, i3);
        let cur = self.data[idx] as i32 + delta;
        debug_assert!(cur >= 0, "counter underflowed");
        self.data[idx] = cur as u16;
    }
}

#[derive(Debug, Clone)]
struct Grid2 {
    dim2: usize,
    data: Box<[u16]>,
}

impl Grid2 {
    fn new(dim1: usize, dim2: usize) -> Self {
        Grid2 {
            dim2,
            data: vec![0u16; dim1 * dim2].into_boxed_slice(),
        }
    }

    #[inline]
    fn index(&self, i1: usize, i2: usize) -> usize {
        i1 * self.dim2 + i2
    }

    #[inline]
    fn get(&self, i1: usize, i2: usize) -> u16 {
        self.data[self.index(i1, i2)]
    }

    #[inline]
    fn add(&mut self, i1: usize, i2: usize, delta: i32) {
        let idx = self.index(i1, i2);
        let cur = self.data[idx] as i32 + delta;
        debug_assert!(cur >= 0, "counter underflowed");
        self.data[idx] = cur as u16;
    }
}

/// A `R x D x S`-shaped grid of optional occupant indices, or `C x D x S`
/// for the room-of-course lookup.
#[derive(Debug, Clone)]
struct SlotGrid {
    dim2: usize,
    dim3: usize,
    data: Box<[i32]>,
}

impl SlotGrid {
    fn new(dim1: usize, dim2: usize, dim3: usize) -> Self {
        SlotGrid {
            dim2,
            dim3,
            data: vec![-1; dim1 * dim2 * dim3].into_boxed_slice(),
        }
    }

    #[inline]
    fn index(&self, i1: usize, i2: usize, i3: usize) -> usize {
        (i1 * self.dim2 + i2) * self.dim3 + i3
    }

    #[inline]
    fn get(&self, i1: usize, i2: usize, i3: usize) -> i32 {
        self.data[self.index(i1, i2, i3)]
    }

    #[inline]
    fn set(&mut self, i1: usize, i2: usize, i3: usize, value: i32) {
        let idx = self.index(i1, i2, i3);
        self.data[idx] = value;
    }
}

#[derive(Debug, Clone)]
pub struct Solution {
    assignment: Box<[Option<Placement>]>,
    sum_cds: Grid3,
    sum_qds: Grid3,
    sum_tds: Grid3,
    sum_cd: Grid2,
    sum_cr: Grid2,
    r_cds: SlotGrid,
    c_rds: SlotGrid,
    l_rds: SlotGrid,
}

impl Solution {
    pub fn empty(instance: &Instance) -> Self {
        let (c, r, q, t, d, s) = (
            instance.num_courses(),
            instance.num_rooms(),
            instance.num_curricula(),
            instance.num_teachers(),
            instance.num_days() as usize,
            instance.periods_per_day() as usize,
        );

        Solution {
            assignment: vec![None; instance.num_lectures()].into_boxed_slice(),
            sum_cds: Grid3::new(c, d, s),
            sum_qds: Grid3::new(q, d, s),
            sum_tds: Grid3::new(t, d, s),
            sum_cd: Grid2::new(c, d),
            sum_cr: Grid2::new(c, r),
            r_cds: SlotGrid::new(c, d, s),
            c_rds: SlotGrid::new(r, d, s),
            l_rds: SlotGrid::new(r, d, s),
        }
    }

    pub fn is_placed(&self, lecture: LectureId) -> bool {
        self.assignment[lecture.raw_index()].is_some()
    }

    pub fn placement(&self, lecture: LectureId) -> Option<Placement> {
        self.assignment[lecture.raw_index()]
    }

    pub fn num_placed(&self) -> usize {
        self.assignment.iter().filter(|p| p.is_some()).count()
    }

    pub fn sum_cds(&self, course: CourseId, d: Day, s: Period) -> u16 {
        self.sum_cds.get(course.raw_index(), d as usize, s as usize)
    }

    pub fn sum_qds(&self, curriculum: CurriculumId, d: Day, s: Period) -> u16 {
        self.sum_qds
            .get(curriculum.raw_index(), d as usize, s as usize)
    }

    pub fn sum_tds(&self, teacher: TeacherId, d: Day, s: Period) -> u16 {
        self.sum_tds
            .get(teacher.raw_index(), d as usize, s as usize)
    }

    pub fn sum_cd(&self, course: CourseId, d: Day) -> u16 {
        self.sum_cd.get(course.raw_index(), d as usize)
    }

    pub fn sum_cr(&self, course: CourseId, room: RoomId) -> u16 {
        self.sum_cr.get(course.raw_index(), room.raw_index())
    }

    pub fn r_cds(&self, course: CourseId, d: Day, s: Period) -> Option<RoomId> {
        let raw = self.r_cds.get(course.raw_index(), d as usize, s as usize);
        (raw >= 0).then(|| RoomId::from_index(raw as usize))
    }

    pub fn c_rds(&self, room: RoomId, d: Day, s: Period) -> Option<CourseId> {
        let raw = self.c_rds.get(room.raw_index(), d as usize, s as usize);
        (raw >= 0).then(|| CourseId::from_index(raw as usize))
    }

    pub fn l_rds(&self, room: RoomId, d: Day, s: Period) -> Option<LectureId> {
        let raw = self.l_rds.get(room.raw_index(), d as usize, s as usize);
        (raw >= 0).then(|| LectureId::from_index(raw as usize))
    }

    /// Removes `lecture`'s current placement, if any, unwinding every
    /// derived index's contribution from it.
    pub fn clear_lecture_assignment(&mut self, instance: &Instance, lecture: LectureId) {
        let Some(placement) = self.assignment[lecture.raw_index()] else {
            return;
        };
        let course = instance.lecture_course(lecture);
        let teacher = instance.course(course).teacher;
        let Placement { room, day, period } = placement;

        self.sum_cds.add(course.raw_index(), day as usize, period as usize, -1);
        for &q in instance.curricula_of(course) {
            self.sum_qds
                .add(q.raw_index(), day as usize, period as usize, -1);
        }
        self.sum_tds
            .add(teacher.raw_index(), day as usize, period as usize, -1);
        self.sum_cd.add(course.raw_index(), day as usize, -1);
        self.sum_cr.add(course.raw_index(), room.raw_index(), -1);

        self.r_cds
            .set(course.raw_index(), day as usize, period as usize, -1);
        self.c_rds
            .set(room.raw_index(), day as usize, period as usize, -1);
        self.l_rds
            .set(room.raw_index(), day as usize, period as usize, -1);

        self.assignment[lecture.raw_index()] = None;
    }

    /// Assigns `lecture` to `(room, day, period)`, first clearing any
    /// placement it already held. Does not check hard constraints; callers
    /// (neighborhoods, the feasible finder) are responsible for only
    /// calling this once the move has been established to be legal, or
    /// when deliberately constructing an infeasible intermediate state the
    /// search will subsequently repair or discard.
    pub fn set_lecture_assignment(
        &mut self,
        instance: &Instance,
        lecture: LectureId,
        room: RoomId,
        day: Day,
        period: Period,
    ) {
        self.clear_lecture_assignment(instance, lecture);

        let course = instance.lecture_course(lecture);
        let teacher = instance.course(course).teacher;

        self.sum_cds
            .add(course.raw_index(), day as usize, period as usize, 1);
        for &q in instance.curricula_of(course) {
            self.sum_qds
                .add(q.raw_index(), day as usize, period as usize, 1);
        }
        self.sum_tds
            .add(teacher.raw_index(), day as usize, period as usize, 1);
        self.sum_cd.add(course.raw_index(), day as usize, 1);
        self.sum_cr.add(course.raw_index(), room.raw_index(), 1);

        self.r_cds.set(
            course.raw_index(),
            day as usize,
            period as usize,
            room.raw_index() as i32,
        );
        self.c_rds.set(
            room.raw_index(),
            day as usize,
            period as usize,
            course.raw_index() as i32,
        );
        self.l_rds.set(
            room.raw_index(),
            day as usize,
            period as usize,
            lecture.raw_index() as i32,
        );

        self.assignment[lecture.raw_index()] = Some(Placement { room, day, period });
    }

    /// Rebuilds every derived index from scratch from the primary
    /// assignment. Used by the idempotent-rebuild test and available for
    /// any caller who suspects index drift.
    pub fn rebuild_indices(&self, instance: &Instance) -> Solution {
        let mut fresh = Solution::empty(instance);
        for lecture_idx in 0..instance.num_lectures() {
            let lecture = LectureId::from_index(lecture_idx);
            if let Some(Placement { room, day, period }) = self.assignment[lecture_idx] {
                fresh.set_lecture_assignment(instance, lecture, room, day, period);
            }
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Course, Curriculum, Room};

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
                Room {
                    id: "R1".into(),
                    capacity: 10,
                },
                Room {
                    id: "R2".into(),
                    capacity: 4,
                },
            ],
            vec![],
            vec!["T1".into(), "T2".into()],
            2,
            2,
            &[],
        )
    }

    fn place_toy(instance: &Instance) -> Solution {
        let mut solution = Solution::empty(instance);
        solution.set_lecture_assignment(
            instance,
            LectureId::from_index(0),
            RoomId::from_index(0),
            0,
            0,
        );
        solution.set_lecture_assignment(
            instance,
            LectureId::from_index(1),
            RoomId::from_index(0),
            1,
            0,
        );
        solution.set_lecture_assignment(
            instance,
            LectureId::from_index(2),
            RoomId::from_index(1),
            0,
            1,
        );
        solution
    }

    #[test]
    fn indices_agree_with_primary_assignment() {
        let instance = toy_instance();
        let solution = place_toy(&instance);

        assert_eq!(solution.sum_cds(CourseId::from_index(0), 0, 0), 1);
        assert_eq!(solution.sum_cds(CourseId::from_index(0), 1, 0), 1);
        assert_eq!(solution.sum_cd(CourseId::from_index(0), 0), 1);
        assert_eq!(solution.sum_cd(CourseId::from_index(0), 1), 1);
        assert_eq!(solution.sum_cr(CourseId::from_index(0), RoomId::from_index(0)), 2);
        assert_eq!(solution.sum_cr(CourseId::from_index(1), RoomId::from_index(1)), 1);
        assert_eq!(
            solution.l_rds(RoomId::from_index(1), 0, 1),
            Some(LectureId::from_index(2))
        );
    }

    #[test]
    fn rebuild_is_idempotent() {
        let instance = toy_instance();
        let solution = place_toy(&instance);
        let rebuilt = solution.rebuild_indices(&instance);

        for c in 0..instance.num_courses() {
            for d in 0..instance.num_days() {
                for s in 0..instance.periods_per_day() {
                    assert_eq!(
                        solution.sum_cds(CourseId::from_index(c), d, s),
                        rebuilt.sum_cds(CourseId::from_index(c), d, s)
                    );
                }
                assert_eq!(
                    solution.sum_cd(CourseId::from_index(c), d),
                    rebuilt.sum_cd(CourseId::from_index(c), d)
                );
            }
            for r in 0..instance.num_rooms() {
                assert_eq!(
                    solution.sum_cr(CourseId::from_index(c), RoomId::from_index(r)),
                    rebuilt.sum_cr(CourseId::from_index(c), RoomId::from_index(r))
                );
            }
        }
    }

    #[test]
    fn clearing_an_unplaced_lecture_is_a_no_op() {
        let instance = toy_instance();
        let mut solution = Solution::empty(&instance);
        solution.clear_lecture_assignment(&instance, LectureId::from_index(0));
        assert!(!solution.is_placed(LectureId::from_index(0)));
    }

    #[test]
    fn reassigning_a_placed_lecture_clears_its_old_slot() {
        let instance = toy_instance();
        let mut solution = place_toy(&instance);
        solution.set_lecture_assignment(
            &instance,
            LectureId::from_index(0),
            RoomId::from_index(1),
            1,
            1,
        );
        assert_eq!(solution.c_rds(RoomId::from_index(0), 0, 0), None);
        assert_eq!(
            solution.c_rds(RoomId::from_index(1), 1, 1),
            Some(CourseId::from_index(0))
        );
        assert_eq!(solution.sum_cd(CourseId::from_index(0), 0), 0);
    }
}
