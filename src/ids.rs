//! Dense integer indices into an [`crate::instance::Instance`].
//!
//! Courses, rooms, curricula, teachers and lectures are all referred to by
//! string identifiers in the instance file, but internally everything is a
//! plain index so the hot-path arrays can be addressed directly.

use std::fmt;

macro_rules! index_id {
    ($name:ident, $repr:ty) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($repr);

        impl $name {
            #[inline]
            pub fn from_index(index: usize) -> Self {
                $name(index as $repr)
            }

            #[inline]
            pub fn raw_index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_id!(CourseId, u16);
index_id!(RoomId, u16);
index_id!(CurriculumId, u16);
index_id!(TeacherId, u16);
index_id!(LectureId, u32);

/// A day index in `[0, Instance::num_days)`.
pub type Day = u8;

/// A period-of-day index in `[0, Instance::periods_per_day)`.
pub type Period = u8;
