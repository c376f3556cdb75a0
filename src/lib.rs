//! Course timetabling as a 0/1 integer program.
//!
//! Each course is placed with exactly one (teacher, slot) pair, no teacher
//! teaches two courses in the same slot, and a course only goes to a teacher
//! marked available for it. The model is handed to HiGHS through `good_lp`.

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod server;
pub mod solver;

pub use config::{Config, SolverOptions};
pub use data::{Assignment, ProblemInstance, SolverResult, Timetable};
pub use error::SolveError;
pub use solver::solve;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs::{read_dir, read_to_string};
    use std::path::Path;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Expected {
        Solved,
        Infeasible,
        Invalid,
    }

    #[derive(Debug, Deserialize)]
    struct Fixture {
        problem: ProblemInstance,
        expected: Expected,
    }

    fn run_test_file(test_file: &Path) {
        println!("Running test for file: {:?}", test_file);

        let failure_message = format!("Failed to read test file: {}", test_file.display());
        let json = read_to_string(test_file).expect(&failure_message);
        let failure_message = format!("Failed to parse test file: {}", test_file.display());
        let fixture: Fixture = serde_json::from_str(&json).expect(&failure_message);

        let result = solve(&fixture.problem, &SolverOptions::default());
        match (fixture.expected, result) {
            (Expected::Solved, Ok(SolverResult::Solved(timetable))) => {
                assert_eq!(
                    timetable.check(&fixture.problem),
                    Ok(()),
                    "{}",
                    test_file.display()
                );
                assert_eq!(timetable.len(), fixture.problem.num_courses);
            }
            (Expected::Infeasible, Ok(SolverResult::Infeasible)) => {}
            (Expected::Invalid, Err(SolveError::InvalidInput(_))) => {}
            (expected, received) => panic!(
                "{}: expected {:?}, received {:?}",
                test_file.display(),
                expected,
                received
            ),
        }
    }

    #[test]
    fn run_all_test_files() {
        let test_data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data");
        let mut entries: Vec<_> = read_dir(&test_data_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.is_file() && path.extension().map(|ext| ext == "json").unwrap_or(false)
            })
            .collect();
        assert!(!entries.is_empty(), "no fixtures in {}", test_data_dir.display());

        // Sort paths lexically by filename
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        for path in entries {
            run_test_file(&path);
        }
    }
}
