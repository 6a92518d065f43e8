//! Parser for the ITC-2007 instance file format: `Key: value` header
//! lines followed by `COURSES:` / `ROOMS:` / `CURRICULA:` /
//! `UNAVAILABILITY_CONSTRAINTS:` sections, terminated by `END.`.
//!
//! Resolves every string identifier to a dense integer index as it goes;
//! the string <-> index maps built here are thrown away once
//! [`Instance::build`] is called; nothing downstream of the parser ever
//! sees a string ID again.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::{Error, Result};
use crate::ids::{CourseId, CurriculumId, Day, Period};
use crate::instance::{Course, Curriculum, Instance, Room};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Courses,
    Rooms,
    Curricula,
    Constraints,
}

struct RawCourseRow {
    id: String,
    teacher_id: String,
    n_lectures: u16,
    min_working_days: u8,
    n_students: u16,
}

struct RawRoomRow {
    id: String,
    capacity: u16,
}

struct RawCurriculumRow {
    line: usize,
    id: String,
    course_ids: Vec<String>,
}

struct RawUnavailabilityRow {
    line: usize,
    course_id: String,
    day: u32,
    period: u32,
}

#[derive(Default)]
struct Header {
    name: Option<String>,
    n_courses: Option<usize>,
    n_rooms: Option<usize>,
    n_days: Option<u32>,
    n_periods_per_day: Option<u32>,
    n_curricula: Option<usize>,
}

pub fn parse_instance_file(path: &Path) -> Result<Instance> {
    let text = fs::read_to_string(path).map_err(|source| {
        Box::new(Error::Io {
            path: path.display().to_string(),
            source,
        })
    })?;
    parse_instance(&text)
}

pub fn parse_instance(text: &str) -> Result<Instance> {
    let mut header = Header::default();
    let mut section = Section::None;

    let mut courses = Vec::new();
    let mut rooms = Vec::new();
    let mut curricula = Vec::new();
    let mut unavailability = Vec::new();
    let mut last_line_num = 0;

    for (line_idx, raw_line) in text.lines().enumerate() {
        let line_num = line_idx + 1;
        last_line_num = line_num;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(colon) = line.find(':') {
            let key = line[..colon].trim();
            let value = line[colon + 1..].trim();
            handle_header_or_section_line(line_num, key, value, &mut header, &mut section)?;
            continue;
        }

        match section {
            Section::Courses => parse_course_row(line_num, line, &header, &mut courses)?,
            Section::Rooms => parse_room_row(line_num, line, &header, &mut rooms)?,
            Section::Curricula => parse_curriculum_row(line_num, line, &header, &mut curricula)?,
            Section::Constraints => parse_unavailability_row(line_num, line, &mut unavailability)?,
            Section::None => {}
        }
    }

    let name = header
        .name
        .ok_or_else(|| Error::parse(last_line_num, "missing Name header field"))?;
    let n_courses = header
        .n_courses
        .ok_or_else(|| Error::parse(last_line_num, "missing Courses header field"))?;
    let n_rooms = header
        .n_rooms
        .ok_or_else(|| Error::parse(last_line_num, "missing Rooms header field"))?;
    let n_days = header
        .n_days
        .ok_or_else(|| Error::parse(last_line_num, "missing Days header field"))?;
    let n_periods_per_day = header
        .n_periods_per_day
        .ok_or_else(|| Error::parse(last_line_num, "missing Periods_per_day header field"))?;
    let n_curricula = header.n_curricula.unwrap_or(0);

    if courses.len() != n_courses {
        return Err(Error::parse(
            last_line_num,
            format!(
                "instance declared {n_courses} courses but the COURSES section has {}",
                courses.len()
            ),
        ));
    }
    if rooms.len() != n_rooms {
        return Err(Error::parse(
            last_line_num,
            format!("instance declared {n_rooms} rooms but the ROOMS section has {}", rooms.len()),
        ));
    }
    if curricula.len() != n_curricula {
        return Err(Error::parse(
            last_line_num,
            format!(
                "instance declared {n_curricula} curricula but the CURRICULA section has {}",
                curricula.len()
            ),
        ));
    }

    let course_index: HashMap<&str, CourseId> = courses
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), CourseId::from_index(i)))
        .collect();

    let mut teacher_ids: Vec<String> = Vec::new();
    let mut teacher_index: HashMap<&str, usize> = HashMap::new();
    let mut teacher_of_course = Vec::with_capacity(courses.len());
    for course in &courses {
        let idx = *teacher_index.entry(course.teacher_id.as_str()).or_insert_with(|| {
            teacher_ids.push(course.teacher_id.clone());
            teacher_ids.len() - 1
        });
        teacher_of_course.push(idx);
    }

    let built_courses = courses
        .iter()
        .zip(teacher_of_course)
        .map(|(row, teacher_idx)| Course {
            id: row.id.clone(),
            teacher: crate::ids::TeacherId::from_index(teacher_idx),
            n_lectures: row.n_lectures,
            min_working_days: row.min_working_days,
            n_students: row.n_students,
        })
        .collect();

    let built_rooms = rooms
        .iter()
        .map(|row| Room {
            id: row.id.clone(),
            capacity: row.capacity,
        })
        .collect();

    let mut built_curricula = Vec::with_capacity(curricula.len());
    for row in &curricula {
        let mut course_refs = Vec::with_capacity(row.course_ids.len());
        for course_id in &row.course_ids {
            let &resolved = course_index.get(course_id.as_str()).ok_or_else(|| {
                Error::parse(row.line, format!("curriculum {} references unknown course {course_id}", row.id))
            })?;
            course_refs.push(resolved);
        }
        built_curricula.push(Curriculum {
            id: row.id.clone(),
            courses: course_refs,
        });
    }

    let mut built_unavailability = Vec::with_capacity(unavailability.len());
    for row in &unavailability {
        let &course = course_index.get(row.course_id.as_str()).ok_or_else(|| {
            Error::parse(
                row.line,
                format!("unavailability constraint references unknown course {}", row.course_id),
            )
        })?;
        if row.day >= n_days {
            return Err(Error::parse(row.line, format!("unavailability day {} out of range", row.day)));
        }
        if row.period >= n_periods_per_day {
            return Err(Error::parse(
                row.line,
                format!("unavailability period {} out of range", row.period),
            ));
        }
        built_unavailability.push((course, row.day as Day, row.period as Period));
    }

    Ok(Instance::build(
        name,
        built_courses,
        built_rooms,
        built_curricula,
        teacher_ids,
        n_days as Day,
        n_periods_per_day as Period,
        &built_unavailability,
    ))
}

fn handle_header_or_section_line(
    line_num: usize,
    key: &str,
    value: &str,
    header: &mut Header,
    section: &mut Section,
) -> Result<()> {
    match key {
        "Name" => header.name = Some(value.to_string()),
        "Courses" => header.n_courses = Some(parse_uint(line_num, value)? as usize),
        "Rooms" => header.n_rooms = Some(parse_uint(line_num, value)? as usize),
        "Days" => header.n_days = Some(parse_uint(line_num, value)?),
        "Periods_per_day" => header.n_periods_per_day = Some(parse_uint(line_num, value)?),
        "Curricula" => header.n_curricula = Some(parse_uint(line_num, value)? as usize),
        "Constraints" => {
            parse_uint(line_num, value)?;
        }
        "COURSES" if value.is_empty() => *section = Section::Courses,
        "ROOMS" if value.is_empty() => *section = Section::Rooms,
        "CURRICULA" if value.is_empty() => *section = Section::Curricula,
        "UNAVAILABILITY_CONSTRAINTS" if value.is_empty() => *section = Section::Constraints,
        _ => {}
    }
    Ok(())
}

fn parse_uint(line_num: usize, value: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| Error::parse(line_num, format!("expected a non-negative integer, found {value:?}")))
}

fn parse_course_row(line_num: usize, line: &str, header: &Header, courses: &mut Vec<RawCourseRow>) -> Result<()> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 5 {
        return Ok(());
    }
    if let Some(n) = header.n_courses {
        if courses.len() >= n {
            return Err(Error::parse(line_num, "unexpected courses count"));
        }
    }
    courses.push(RawCourseRow {
        id: tokens[0].to_string(),
        teacher_id: tokens[1].to_string(),
        n_lectures: tokens[2]
            .parse()
            .map_err(|_| Error::parse(line_num, "invalid n_lectures"))?,
        min_working_days: tokens[3]
            .parse()
            .map_err(|_| Error::parse(line_num, "invalid min_working_days"))?,
        n_students: tokens[4]
            .parse()
            .map_err(|_| Error::parse(line_num, "invalid n_students"))?,
    });
    Ok(())
}

fn parse_room_row(line_num: usize, line: &str, header: &Header, rooms: &mut Vec<RawRoomRow>) -> Result<()> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 {
        return Ok(());
    }
    if let Some(n) = header.n_rooms {
        if rooms.len() >= n {
            return Err(Error::parse(line_num, "unexpected rooms count"));
        }
    }
    rooms.push(RawRoomRow {
        id: tokens[0].to_string(),
        capacity: tokens[1].parse().map_err(|_| Error::parse(line_num, "invalid capacity"))?,
    });
    Ok(())
}

fn parse_curriculum_row(line_num: usize, line: &str, header: &Header, curricula: &mut Vec<RawCurriculumRow>) -> Result<()> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return Ok(());
    }
    if let Some(n) = header.n_curricula {
        if curricula.len() >= n {
            return Err(Error::parse(line_num, "unexpected curricula count"));
        }
    }
    let id = tokens[0].to_string();
    let n_courses: usize = tokens[1]
        .parse()
        .map_err(|_| Error::parse(line_num, "invalid curriculum course count"))?;
    let course_ids = &tokens[2..];
    if course_ids.len() != n_courses {
        return Err(Error::parse(line_num, "unexpected curricula fields count"));
    }
    curricula.push(RawCurriculumRow {
        line: line_num,
        id,
        course_ids: course_ids.iter().map(|s| s.to_string()).collect(),
    });
    Ok(())
}

fn parse_unavailability_row(line_num: usize, line: &str, unavailability: &mut Vec<RawUnavailabilityRow>) -> Result<()> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 3 {
        return Ok(());
    }
    unavailability.push(RawUnavailabilityRow {
        line: line_num,
        course_id: tokens[0].to_string(),
        day: tokens[1].parse().map_err(|_| Error::parse(line_num, "invalid day"))?,
        period: tokens[2].parse().map_err(|_| Error::parse(line_num, "invalid period"))?,
    });
    Ok(())
}
