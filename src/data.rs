use crate::error::SolveError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity. All indices are zero-based.
pub type CourseId = usize;
pub type TeacherId = usize;
pub type Slot = usize;

/// The complete input for one solve.
///
/// `availability[i][j] == 1` means teacher `j` may teach course `i`. Entries
/// are kept as raw integers so that anything other than 0 or 1 is caught by
/// [`ProblemInstance::validate`] instead of being rejected by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemInstance {
    pub num_courses: usize,
    pub num_teachers: usize,
    pub num_slots: usize,
    pub availability: Vec<Vec<i64>>,
}

impl ProblemInstance {
    pub fn new(
        num_courses: usize,
        num_teachers: usize,
        num_slots: usize,
        availability: Vec<Vec<i64>>,
    ) -> Self {
        Self {
            num_courses,
            num_teachers,
            num_slots,
            availability,
        }
    }

    /// An instance where every teacher may teach every course.
    pub fn fully_available(num_courses: usize, num_teachers: usize, num_slots: usize) -> Self {
        Self::new(
            num_courses,
            num_teachers,
            num_slots,
            vec![vec![1; num_teachers]; num_courses],
        )
    }

    /// Checks dimensions, matrix shape and entry values in one pass.
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.num_courses == 0 {
            return Err(SolveError::invalid("numCourses must be at least 1"));
        }
        if self.num_teachers == 0 {
            return Err(SolveError::invalid("numTeachers must be at least 1"));
        }
        if self.num_slots == 0 {
            return Err(SolveError::invalid("numSlots must be at least 1"));
        }
        if self.availability.len() != self.num_courses {
            return Err(SolveError::invalid(format!(
                "availability has {} rows, expected {} (one per course)",
                self.availability.len(),
                self.num_courses
            )));
        }
        for (course, row) in self.availability.iter().enumerate() {
            if row.len() != self.num_teachers {
                return Err(SolveError::invalid(format!(
                    "availability row for course {} has {} entries, expected {} (one per teacher)",
                    course + 1,
                    row.len(),
                    self.num_teachers
                )));
            }
            if let Some((teacher, value)) = row.iter().find_position(|v| !matches!(**v, 0 | 1)) {
                return Err(SolveError::invalid(format!(
                    "availability for course {}, teacher {} is {}, expected 0 or 1",
                    course + 1,
                    teacher + 1,
                    value
                )));
            }
        }
        if self.variable_count().is_none() {
            return Err(SolveError::invalid(format!(
                "{} courses x {} teachers x {} slots overflows the decision variable count",
                self.num_courses, self.num_teachers, self.num_slots
            )));
        }
        Ok(())
    }

    /// [`ProblemInstance::validate`] plus a cap on the model size. Returns
    /// the number of decision variables the model will need.
    pub fn validate_within(&self, max_variables: usize) -> Result<usize, SolveError> {
        self.validate()?;
        let count = self.variable_count().unwrap_or(usize::MAX);
        if count > max_variables {
            return Err(SolveError::invalid(format!(
                "instance needs {count} decision variables, the limit is {max_variables}"
            )));
        }
        Ok(count)
    }

    /// Assumes a validated instance.
    pub fn is_available(&self, course: CourseId, teacher: TeacherId) -> bool {
        self.availability[course][teacher] == 1
    }

    /// Number of (teacher, slot) pairs, i.e. how many courses fit at most.
    pub fn capacity(&self) -> usize {
        self.num_teachers.saturating_mul(self.num_slots)
    }

    /// `None` when courses x teachers x slots overflows `usize`.
    pub fn variable_count(&self) -> Option<usize> {
        self.num_courses
            .checked_mul(self.num_teachers)?
            .checked_mul(self.num_slots)
    }
}

/// A single scheduled course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Assignment {
    pub course: CourseId,
    pub teacher: TeacherId,
    pub slot: Slot,
}

impl Assignment {
    pub fn new(course: CourseId, teacher: TeacherId, slot: Slot) -> Self {
        Self {
            course,
            teacher,
            slot,
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Course {} -> Teacher {} @ Slot {}",
            self.course + 1,
            self.teacher + 1,
            self.slot + 1
        )
    }
}

/// Assignments sorted by course, then teacher, then slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timetable {
    assignments: Vec<Assignment>,
}

impl Timetable {
    pub fn new(mut assignments: Vec<Assignment>) -> Self {
        assignments.sort();
        Self { assignments }
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.assignments.iter()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Verifies that this timetable is a complete, valid answer for
    /// `problem`: indices in range, availability respected, every course
    /// exactly once and no teacher double-booked in a slot.
    pub fn check(&self, problem: &ProblemInstance) -> Result<(), String> {
        for a in &self.assignments {
            if a.course >= problem.num_courses
                || a.teacher >= problem.num_teachers
                || a.slot >= problem.num_slots
            {
                return Err(format!("{a} is out of range"));
            }
            if !problem.is_available(a.course, a.teacher) {
                return Err(format!("{a} uses an unavailable teacher"));
            }
        }

        let per_course = self.assignments.iter().counts_by(|a| a.course);
        if let Some(course) = (0..problem.num_courses).find(|c| per_course.get(c) != Some(&1)) {
            return Err(format!(
                "course {} is assigned {} times, expected exactly once",
                course + 1,
                per_course.get(&course).copied().unwrap_or(0)
            ));
        }

        let per_teacher_slot = self
            .assignments
            .iter()
            .map(|a| ((a.teacher, a.slot), a.course))
            .into_group_map();
        if let Some(((teacher, slot), courses)) = per_teacher_slot
            .into_iter()
            .sorted()
            .find(|(_, courses)| courses.len() > 1)
        {
            return Err(format!(
                "teacher {} teaches {} courses in slot {}",
                teacher + 1,
                courses.len(),
                slot + 1
            ));
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a Timetable {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The outcome of a solve that got past validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverResult {
    /// Every course was placed.
    Solved(Timetable),
    /// No assignment satisfies all constraints.
    Infeasible,
}

impl SolverResult {
    pub fn is_solved(&self) -> bool {
        matches!(self, SolverResult::Solved(_))
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, SolverResult::Infeasible)
    }

    pub fn timetable(&self) -> Option<&Timetable> {
        match self {
            SolverResult::Solved(timetable) => Some(timetable),
            SolverResult::Infeasible => None,
        }
    }
}

impl fmt::Display for SolverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverResult::Solved(timetable) => write!(f, "Solved({} assignments)", timetable.len()),
            SolverResult::Infeasible => write!(f, "Infeasible"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(problem: &ProblemInstance, needle: &str) {
        match problem.validate() {
            Err(SolveError::InvalidInput(msg)) => {
                assert!(msg.contains(needle), "message {msg:?} should mention {needle:?}")
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_well_formed_instance() {
        let problem = ProblemInstance::new(2, 3, 1, vec![vec![1, 0, 1], vec![0, 0, 1]]);
        assert_eq!(problem.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_dimensions() {
        assert_invalid(&ProblemInstance::new(0, 1, 1, vec![]), "numCourses");
        assert_invalid(&ProblemInstance::new(1, 0, 1, vec![vec![]]), "numTeachers");
        assert_invalid(&ProblemInstance::new(1, 1, 0, vec![vec![1]]), "numSlots");
    }

    #[test]
    fn validate_rejects_shape_mismatch() {
        assert_invalid(&ProblemInstance::new(2, 1, 1, vec![vec![1]]), "rows");
        assert_invalid(
            &ProblemInstance::new(2, 2, 1, vec![vec![1, 1], vec![1]]),
            "course 2",
        );
    }

    #[test]
    fn validate_rejects_non_binary_entries() {
        assert_invalid(
            &ProblemInstance::new(1, 2, 1, vec![vec![1, 2]]),
            "teacher 2 is 2",
        );
        assert_invalid(&ProblemInstance::new(1, 1, 1, vec![vec![-1]]), "is -1");
    }

    #[test]
    fn validate_rejects_overflowing_cube() {
        let problem = ProblemInstance::new(2, 2, usize::MAX, vec![vec![1, 1]; 2]);
        assert_eq!(problem.variable_count(), None);
        assert_invalid(&problem, "overflows");
    }

    #[test]
    fn validate_within_caps_model_size() {
        let huge = ProblemInstance::new(1, 1, 100_000_000_000, vec![vec![1]]);
        assert_eq!(huge.validate(), Ok(()));
        match huge.validate_within(1_000_000) {
            Err(SolveError::InvalidInput(msg)) => {
                assert!(msg.contains("100000000000 decision variables"), "{msg}")
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }

        let small = ProblemInstance::fully_available(2, 3, 4);
        assert_eq!(small.validate_within(24), Ok(24));
        assert!(small.validate_within(23).is_err());
    }

    #[test]
    fn deserializes_camel_case_keys() {
        let json = r#"{"numCourses":1,"numTeachers":2,"numSlots":3,"availability":[[0,1]]}"#;
        let problem: ProblemInstance = serde_json::from_str(json).unwrap();
        assert_eq!(problem, ProblemInstance::new(1, 2, 3, vec![vec![0, 1]]));
        assert_eq!(problem.capacity(), 6);
        assert_eq!(problem.variable_count(), Some(6));
    }

    #[test]
    fn timetable_is_sorted_on_construction() {
        let timetable = Timetable::new(vec![
            Assignment::new(1, 0, 0),
            Assignment::new(0, 1, 1),
        ]);
        let courses: Vec<_> = timetable.iter().map(|a| a.course).collect();
        assert_eq!(courses, vec![0, 1]);
    }

    #[test]
    fn check_accepts_valid_timetable() {
        let problem = ProblemInstance::fully_available(2, 1, 2);
        let timetable = Timetable::new(vec![Assignment::new(0, 0, 0), Assignment::new(1, 0, 1)]);
        assert_eq!(timetable.check(&problem), Ok(()));
    }

    #[test]
    fn check_flags_double_booked_teacher() {
        let problem = ProblemInstance::fully_available(2, 1, 2);
        let timetable = Timetable::new(vec![Assignment::new(0, 0, 1), Assignment::new(1, 0, 1)]);
        let err = timetable.check(&problem).unwrap_err();
        assert!(err.contains("teacher 1 teaches 2 courses in slot 2"), "{err}");
    }

    #[test]
    fn check_flags_missing_and_repeated_courses() {
        let problem = ProblemInstance::fully_available(2, 2, 2);
        let missing = Timetable::new(vec![Assignment::new(0, 0, 0)]);
        assert!(missing.check(&problem).unwrap_err().contains("course 2 is assigned 0"));

        let repeated = Timetable::new(vec![
            Assignment::new(0, 0, 0),
            Assignment::new(0, 1, 0),
            Assignment::new(1, 0, 1),
        ]);
        assert!(repeated.check(&problem).unwrap_err().contains("course 1 is assigned 2"));
    }

    #[test]
    fn check_flags_unavailable_teacher() {
        let problem = ProblemInstance::new(1, 2, 1, vec![vec![1, 0]]);
        let timetable = Timetable::new(vec![Assignment::new(0, 1, 0)]);
        assert!(timetable.check(&problem).unwrap_err().contains("unavailable"));
    }

    #[test]
    fn solver_result_display() {
        assert_eq!(SolverResult::Infeasible.to_string(), "Infeasible");
        let solved = SolverResult::Solved(Timetable::new(vec![Assignment::new(0, 0, 0)]));
        assert_eq!(solved.to_string(), "Solved(1 assignments)");
        assert!(solved.is_solved());
        assert_eq!(solved.timetable().map(Timetable::len), Some(1));
    }
}
