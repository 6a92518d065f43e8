//! Order-independent digest of a [`crate::solution::Solution`]'s
//! assignment, cheap enough for a driver to check after every move.
//!
//! A pair of commutative 64-bit accumulators (sum and xor) over a fixed
//! mixing hash of each placed lecture's `(lecture, room, day, period)`
//! tuple. Equal fingerprints strongly suggest equal states; the move
//! protocol additionally reports the hashes of what was added and removed
//! by a move so a driver can roll the digest forward without rescanning
//! the whole timetable.

use crate::ids::{Day, LectureId, Period, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fingerprint {
    sum: u64,
    xor: u64,
}

impl Fingerprint {
    pub fn zero() -> Self {
        Fingerprint::default()
    }

    pub fn plus(self, hash: u64) -> Self {
        Fingerprint {
            sum: self.sum.wrapping_add(hash),
            xor: self.xor ^ hash,
        }
    }

    pub fn minus(self, hash: u64) -> Self {
        Fingerprint {
            sum: self.sum.wrapping_sub(hash),
            xor: self.xor ^ hash,
        }
    }

    /// Folds another partial fingerprint (e.g. a move's `fingerprint_plus`
    /// or `fingerprint_minus`) into this one.
    pub fn combine(self, other: Fingerprint) -> Self {
        Fingerprint {
            sum: self.sum.wrapping_add(other.sum),
            xor: self.xor ^ other.xor,
        }
    }

    /// The inverse of `combine`: unfolds a partial fingerprint back out.
    pub fn uncombine(self, other: Fingerprint) -> Self {
        Fingerprint {
            sum: self.sum.wrapping_sub(other.sum),
            xor: self.xor ^ other.xor,
        }
    }

    /// The two raw accumulator words, for display or serialization. Not
    /// meant to be compared field-by-field; use `==` on the `Fingerprint`
    /// itself for equality.
    pub fn words(self) -> (u64, u64) {
        (self.sum, self.xor)
    }
}

/// A fixed mixing of `(lecture, room, day, period)` into a 64-bit hash.
/// Uses the splitmix64 finalizer, applied after folding the four fields
/// into one word; any fixed mixing works since the accumulators only need
/// it to behave like an unpredictable function of its input.
pub fn placement_hash(lecture: LectureId, room: RoomId, day: Day, period: Period) -> u64 {
    let mut x = (lecture.raw_index() as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(room.raw_index() as u64)
        .wrapping_mul(0xBF58_476D_1CE4_E5B9)
        .wrapping_add(day as u64)
        .wrapping_mul(0x94D0_49BB_1331_11EB)
        .wrapping_add(period as u64);

    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    x
}

/// Computes the fingerprint of `solution` from scratch by scanning every
/// lecture's placement.
pub fn fingerprint(instance: &crate::instance::Instance, solution: &crate::solution::Solution) -> Fingerprint {
    let mut fp = Fingerprint::zero();
    for l in 0..instance.num_lectures() {
        let lecture = LectureId::from_index(l);
        if let Some(placement) = solution.placement(lecture) {
            fp = fp.plus(placement_hash(
                lecture,
                placement.room,
                placement.day,
                placement.period,
            ));
        }
    }
    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{RoomId, TeacherId};
    use crate::instance::{Course, Instance, Room};

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
    fn fingerprint_is_order_independent() {
        let instance = toy_instance();

        let mut a = crate::solution::Solution::empty(&instance);
        a.set_lecture_assignment(&instance, LectureId::from_index(0), RoomId::from_index(0), 0, 0);
        a.set_lecture_assignment(&instance, LectureId::from_index(1), RoomId::from_index(0), 1, 0);

        let mut b = crate::solution::Solution::empty(&instance);
        b.set_lecture_assignment(&instance, LectureId::from_index(1), RoomId::from_index(0), 1, 0);
        b.set_lecture_assignment(&instance, LectureId::from_index(0), RoomId::from_index(0), 0, 0);

        assert_eq!(fingerprint(&instance, &a), fingerprint(&instance, &b));
    }

    #[test]
    fn fingerprint_matches_after_rebuild() {
        let instance = toy_instance();
        let mut solution = crate::solution::Solution::empty(&instance);
        solution.set_lecture_assignment(&instance, LectureId::from_index(0), RoomId::from_index(0), 0, 0);
        solution.set_lecture_assignment(&instance, LectureId::from_index(1), RoomId::from_index(1), 1, 1);

        let rebuilt = solution.rebuild_indices(&instance);
        assert_eq!(fingerprint(&instance, &solution), fingerprint(&instance, &rebuilt));
    }

    #[test]
    fn plus_then_minus_of_same_hash_is_identity() {
        let hash = placement_hash(LectureId::from_index(3), RoomId::from_index(1), 0, 1);
        let fp = Fingerprint::zero().plus(hash).minus(hash);
        assert_eq!(fp, Fingerprint::zero());
    }

    #[test]
    fn different_states_almost_certainly_differ() {
        let instance = toy_instance();
        let mut a = crate::solution::Solution::empty(&instance);
        a.set_lecture_assignment(&instance, LectureId::from_index(0), RoomId::from_index(0), 0, 0);

        let mut b = crate::solution::Solution::empty(&instance);
        b.set_lecture_assignment(&instance, LectureId::from_index(0), RoomId::from_index(1), 0, 0);

        assert_ne!(fingerprint(&instance, &a), fingerprint(&instance, &b));
    }
}
