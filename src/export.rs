//! Text renderings of a timetable: an aligned table for terminals and CSV
//! for download. Labels are one-based (`Course 1`, `Teacher 1`, `Slot 1`).

use crate::data::{Assignment, SolverResult, Timetable};
use std::fmt::Write as _;

pub const HEADERS: [&str; 3] = ["Course", "Teacher", "Time Slot"];
pub const NO_SOLUTION: &str = "No feasible timetable exists for this input.";

pub fn labels(assignment: &Assignment) -> [String; 3] {
    [
        format!("Course {}", assignment.course + 1),
        format!("Teacher {}", assignment.teacher + 1),
        format!("Slot {}", assignment.slot + 1),
    ]
}

/// Header plus one line per assignment. An empty timetable gives the header only.
pub fn to_csv(timetable: &Timetable) -> String {
    let mut out = HEADERS.join(",");
    out.push('\n');
    for assignment in timetable {
        out.push_str(&labels(assignment).join(","));
        out.push('\n');
    }
    out
}

pub fn render_table(timetable: &Timetable) -> String {
    let rows: Vec<[String; 3]> = timetable.iter().map(labels).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut line = |cells: [&str; 3]| {
        let _ = writeln!(
            out,
            "{:<w0$} | {:<w1$} | {:<w2$}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
    };
    line(HEADERS);
    let rule = widths.map(|w| "-".repeat(w));
    line([rule[0].as_str(), rule[1].as_str(), rule[2].as_str()]);
    for row in &rows {
        line([row[0].as_str(), row[1].as_str(), row[2].as_str()]);
    }
    out
}

pub fn render_result(result: &SolverResult) -> String {
    match result {
        SolverResult::Solved(timetable) => render_table(timetable),
        SolverResult::Infeasible => format!("{NO_SOLUTION}\n"),
    }
}
