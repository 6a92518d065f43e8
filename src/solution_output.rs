//! Renders a [`Solution`] into the ITC-2007 output format and a
//! human-readable cost report, and writes both to a directory the way the
//! teacher's `output_solution` does -- minus the hostname-keyed
//! disambiguation, since nothing here runs across multiple machines at
//! once.

use std::fmt::Write;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::costs::full_cost;
use crate::fingerprint::fingerprint;
use crate::ids::LectureId;
use crate::instance::Instance;
use crate::solution::Solution;

/// One `<CourseID> <RoomID> <day> <period>` line per placed lecture, the
/// format the ITC-2007 validator expects. Unplaced lectures (only possible
/// if the finder never ran, or gave up) are silently skipped.
pub fn render_solution_lines(instance: &Instance, solution: &Solution) -> String {
    let mut output = String::new();
    for l in 0..instance.num_lectures() {
        let lecture = LectureId::from_index(l);
        let Some(placement) = solution.placement(lecture) else {
            continue;
        };
        let course = instance.lecture_course(lecture);
        writeln!(
            output,
            "{} {} {} {}",
            instance.course(course).id,
            instance.room(placement.room).id,
            placement.day,
            placement.period
        )
        .expect("writing to a String never fails");
    }
    output
}

/// A breakdown of every objective's unweighted and weighted cost, plus the
/// solution's fingerprint, for a human to skim.
pub fn render_cost_report(instance: &Instance, solution: &Solution) -> String {
    let cost = full_cost(instance, solution);
    let (sum, xor) = fingerprint(instance, solution).words();

    let mut output = String::new();
    writeln!(output, "Instance: {}", instance.name).unwrap();
    writeln!(
        output,
        "Placed {}/{} lectures",
        solution.num_placed(),
        instance.num_lectures()
    )
    .unwrap();
    write!(output, "{cost}").unwrap();
    writeln!(output, "Fingerprint: {sum:016x}{xor:016x}").unwrap();
    output
}

/// Writes `solution.txt` (the ITC-2007 format) and `report.txt` (the cost
/// breakdown) into `output_dir`, creating it if necessary.
pub fn write_solution(output_dir: &Path, instance: &Instance, solution: &Solution) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create directory {}", output_dir.display()))?;

    let solution_path = output_dir.join("solution.txt");
    fs::write(&solution_path, render_solution_lines(instance, solution))
        .with_context(|| format!("failed to write to {}", solution_path.display()))?;

    let report_path = output_dir.join("report.txt");
    fs::write(&report_path, render_cost_report(instance, solution))
        .with_context(|| format!("failed to write to {}", report_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{RoomId, TeacherId};
    use crate::instance::{Course, Room};

    fn toy_instance() -> Instance {
        Instance::build(
            "T".to_string(),
            vec![Course {
                id: "A".into(),
                teacher: TeacherId::from_index(0),
                n_lectures: 1,
                min_working_days: 1,
                n_students: 10,
            }],
            vec![Room { id: "R1".into(), capacity: 10 }],
            vec![],
            vec!["T1".into()],
            2,
            2,
            &[],
        )
    }

    #[test]
    fn renders_one_line_per_placed_lecture() {
        let instance = toy_instance();
        let mut solution = Solution::empty(&instance);
        solution.set_lecture_assignment(&instance, LectureId::from_index(0), RoomId::from_index(0), 1, 0);

        let lines = render_solution_lines(&instance, &solution);
        assert_eq!(lines, "A R1 1 0\n");
    }

    #[test]
    fn unplaced_lectures_are_skipped() {
        let instance = toy_instance();
        let solution = Solution::empty(&instance);
        assert_eq!(render_solution_lines(&instance, &solution), "");
    }

    #[test]
    fn cost_report_mentions_the_instance_name_and_total() {
        let instance = toy_instance();
        let solution = Solution::empty(&instance);
        let report = render_cost_report(&instance, &solution);
        assert!(report.contains("Instance: T"));
        assert!(report.contains("Total: 0"));
    }
}
