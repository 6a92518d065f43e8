//! Sanity checks for a freshly parsed [`Instance`] that never fail the
//! parse itself but flag instance data the finder is unlikely to be able
//! to satisfy, the way the teacher's constraint checks flag suspicious
//! instructor requirement combinations.

use crate::instance::Instance;

macro_rules! check_constraint {
    ($cond:expr, $($msg:tt)+) => {
        if !$cond {
            log::warn!($($msg)+);
        }
    };
}

pub fn check_instance(instance: &Instance) {
    let total_slots = instance.num_rooms() * instance.num_days() as usize * instance.periods_per_day() as usize;

    check_constraint!(
        instance.num_lectures() <= total_slots,
        "instance has {} lectures but only {} room-period slots in total",
        instance.num_lectures(),
        total_slots
    );

    for c in 0..instance.num_courses() {
        let course = crate::ids::CourseId::from_index(c);
        let available = (0..instance.num_days())
            .flat_map(|d| (0..instance.periods_per_day()).map(move |s| (d, s)))
            .filter(|&(d, s)| instance.available(course, d, s))
            .count();

        check_constraint!(
            (instance.course(course).n_lectures as usize) <= available,
            "course {} needs {} lectures but is only available in {} periods",
            instance.course(course).id,
            instance.course(course).n_lectures,
            available
        );

        let max_capacity = (0..instance.num_rooms())
            .map(|r| instance.room(crate::ids::RoomId::from_index(r)).capacity)
            .max()
            .unwrap_or(0);
        check_constraint!(
            instance.course(course).n_students <= max_capacity,
            "course {} has {} students but the largest room holds only {}",
            instance.course(course).id,
            instance.course(course).n_students,
            max_capacity
        );
    }

    for curriculum in instance.curricula() {
        check_constraint!(
            !curriculum.courses.is_empty(),
            "curriculum {} has no courses",
            curriculum.id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TeacherId;
    use crate::instance::{Course, Room};

    #[test]
    fn toy_instance_raises_no_warnings_worth_asserting_on() {
        // Smoke test: just confirm it doesn't panic on a well-formed instance.
        let instance = Instance::build(
            "T".to_string(),
            vec![Course {
                id: "A".into(),
                teacher: TeacherId::from_index(0),
                n_lectures: 2,
                min_working_days: 2,
                n_students: 10,
            }],
            vec![Room { id: "R1".into(), capacity: 10 }],
            vec![],
            vec!["T1".into()],
            2,
            2,
            &[],
        );
        check_instance(&instance);
    }
}
