//! The immutable problem definition: courses, rooms, curricula and their
//! precomputed lookup tables. Built once by [`crate::parser`] and shared
//! read-only by every [`crate::solution::Solution`] that searches it.

use bit_set::BitSet;

use crate::ids::{CourseId, CurriculumId, Day, LectureId, Period, RoomId, TeacherId};

#[derive(Debug)]
pub struct Course {
    pub id: String,
    pub teacher: TeacherId,
    pub n_lectures: u16,
    pub min_working_days: u8,
    pub n_students: u16,
}

#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub capacity: u16,
}

#[derive(Debug)]
pub struct Curriculum {
    pub id: String,
    pub courses: Vec<CourseId>,
}

#[derive(Debug)]
pub struct Lecture {
    pub course: CourseId,
}

/// Precomputed lookup tables over [`Instance`]'s courses, flattened into
/// bitsets addressed by hand-written (but axis-size-derived, never copied
/// between axes) strides.
#[derive(Debug)]
struct Tables {
    curricula_of_course: Vec<Vec<CurriculumId>>,
    /// bit `c1 * num_courses * num_curricula + c2 * num_curricula + q`
    share_curriculum: BitSet,
    /// bit `c1 * num_courses + c2`
    same_teacher: BitSet,
    /// bit `c * num_days * periods_per_day + d * periods_per_day + s`,
    /// true means the course IS available there.
    available: BitSet,
    course_first_lecture: Vec<LectureId>,
}

#[derive(Debug)]
pub struct Instance {
    pub name: String,
    courses: Vec<Course>,
    rooms: Vec<Room>,
    curricula: Vec<Curriculum>,
    teacher_ids: Vec<String>,
    lectures: Vec<Lecture>,
    num_days: Day,
    periods_per_day: Period,
    tables: Tables,
}

impl Instance {
    /// Builds the frozen instance and all derived lookup tables from
    /// already-index-resolved data. String <-> index resolution is the
    /// parser's job, not the instance's.
    pub fn build(
        name: String,
        courses: Vec<Course>,
        rooms: Vec<Room>,
        curricula: Vec<Curriculum>,
        teacher_ids: Vec<String>,
        num_days: Day,
        periods_per_day: Period,
        unavailable: &[(CourseId, Day, Period)],
    ) -> Instance {
        let num_courses = courses.len();
        let num_curricula = curricula.len();

        let mut curricula_of_course: Vec<Vec<CurriculumId>> = vec![Vec::new(); num_courses];
        for (q_idx, curriculum) in curricula.iter().enumerate() {
            for &course in &curriculum.courses {
                curricula_of_course[course.raw_index()].push(CurriculumId::from_index(q_idx));
            }
        }

        let mut share_curriculum = BitSet::with_capacity(num_courses * num_courses * num_curricula);
        for (q_idx, curriculum) in curricula.iter().enumerate() {
            for &c1 in &curriculum.courses {
                for &c2 in &curriculum.courses {
                    share_curriculum.insert(
                        c1.raw_index() * num_courses * num_curricula
                            + c2.raw_index() * num_curricula
                            + q_idx,
                    );
                }
            }
        }

        let mut same_teacher = BitSet::with_capacity(num_courses * num_courses);
        for (c1, course1) in courses.iter().enumerate() {
            for (c2, course2) in courses.iter().enumerate() {
                if course1.teacher == course2.teacher {
                    same_teacher.insert(c1 * num_courses + c2);
                }
            }
        }

        let periods_per_week = num_days as usize * periods_per_day as usize;
        let mut available = BitSet::with_capacity(num_courses * periods_per_week);
        for c in 0..num_courses {
            for d in 0..num_days {
                for s in 0..periods_per_day {
                    available.insert(
                        c * periods_per_week + d as usize * periods_per_day as usize + s as usize,
                    );
                }
            }
        }
        for &(course, d, s) in unavailable {
            available.remove(
                course.raw_index() * periods_per_week
                    + d as usize * periods_per_day as usize
                    + s as usize,
            );
        }

        let mut lectures = Vec::new();
        let mut course_first_lecture = Vec::with_capacity(num_courses);
        for (c, course) in courses.iter().enumerate() {
            course_first_lecture.push(LectureId::from_index(lectures.len()));
            for _ in 0..course.n_lectures {
                lectures.push(Lecture {
                    course: CourseId::from_index(c),
                });
            }
        }

        Instance {
            name,
            courses,
            rooms,
            curricula,
            teacher_ids,
            lectures,
            num_days,
            periods_per_day,
            tables: Tables {
                curricula_of_course,
                share_curriculum,
                same_teacher,
                available,
                course_first_lecture,
            },
        }
    }

    pub fn num_courses(&self) -> usize {
        self.courses.len()
    }

    pub fn num_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn num_curricula(&self) -> usize {
        self.curricula.len()
    }

    pub fn num_teachers(&self) -> usize {
        self.teacher_ids.len()
    }

    pub fn num_lectures(&self) -> usize {
        self.lectures.len()
    }

    pub fn num_days(&self) -> Day {
        self.num_days
    }

    pub fn periods_per_day(&self) -> Period {
        self.periods_per_day
    }

    pub fn course(&self, course: CourseId) -> &Course {
        &self.courses[course.raw_index()]
    }

    pub fn room(&self, room: RoomId) -> &Room {
        &self.rooms[room.raw_index()]
    }

    pub fn curriculum(&self, curriculum: CurriculumId) -> &Curriculum {
        &self.curricula[curriculum.raw_index()]
    }

    pub fn teacher_id(&self, teacher: TeacherId) -> &str {
        &self.teacher_ids[teacher.raw_index()]
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn curricula(&self) -> &[Curriculum] {
        &self.curricula
    }

    pub fn lecture_course(&self, lecture: LectureId) -> CourseId {
        self.lectures[lecture.raw_index()].course
    }

    /// The contiguous range of lecture indices belonging to `course`.
    pub fn lectures_of_course(&self, course: CourseId) -> std::ops::Range<usize> {
        let start = self.tables.course_first_lecture[course.raw_index()].raw_index();
        let end = start + self.courses[course.raw_index()].n_lectures as usize;
        start..end
    }

    pub fn curricula_of(&self, course: CourseId) -> &[CurriculumId] {
        &self.tables.curricula_of_course[course.raw_index()]
    }

    #[inline]
    pub fn share_curriculum(&self, c1: CourseId, c2: CourseId, q: CurriculumId) -> bool {
        self.tables.share_curriculum.contains(
            c1.raw_index() * self.num_courses() * self.num_curricula()
                + c2.raw_index() * self.num_curricula()
                + q.raw_index(),
        )
    }

    #[inline]
    pub fn same_teacher(&self, c1: CourseId, c2: CourseId) -> bool {
        self.tables
            .same_teacher
            .contains(c1.raw_index() * self.num_courses() + c2.raw_index())
    }

    #[inline]
    pub fn available(&self, course: CourseId, d: Day, s: Period) -> bool {
        let periods_per_week = self.num_days as usize * self.periods_per_day as usize;
        self.tables.available.contains(
            course.raw_index() * periods_per_week
                + d as usize * self.periods_per_day as usize
                + s as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_instance() -> Instance {
        // C=2 (A: 2 lectures, 10 students, mwd=2; B: 1 lecture, 5 students)
        // R=2 (R1:cap 10, R2:cap 4), D=2, S=2, no curricula, distinct teachers
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

    #[test]
    fn dimensions_match_toy_instance() {
        let instance = toy_instance();
        assert_eq!(instance.num_courses(), 2);
        assert_eq!(instance.num_rooms(), 2);
        assert_eq!(instance.num_lectures(), 3);
        assert_eq!(instance.num_days(), 2);
        assert_eq!(instance.periods_per_day(), 2);
    }

    #[test]
    fn lectures_of_course_are_contiguous() {
        let instance = toy_instance();
        assert_eq!(instance.lectures_of_course(CourseId::from_index(0)), 0..2);
        assert_eq!(instance.lectures_of_course(CourseId::from_index(1)), 2..3);
    }

    #[test]
    fn no_unavailability_means_everything_available() {
        let instance = toy_instance();
        for c in 0..2 {
            for d in 0..2 {
                for s in 0..2 {
                    assert!(instance.available(CourseId::from_index(c), d, s));
                }
            }
        }
    }

    #[test]
    fn distinct_teachers_are_not_same_teacher() {
        let instance = toy_instance();
        assert!(!instance.same_teacher(CourseId::from_index(0), CourseId::from_index(1)));
        assert!(instance.same_teacher(CourseId::from_index(0), CourseId::from_index(0)));
    }
}
