use crate::config::SolverOptions;
use crate::data::{Assignment, CourseId, ProblemInstance, Slot, SolverResult, TeacherId, Timetable};
use crate::error::SolveError;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver, variable,
};
use itertools::iproduct;
use log::{info, trace, warn};
use std::time::Instant;

/// x_ijk = 1 if course i is taught by teacher j in slot k
///         0 otherwise
///
/// Flattened as `(i * num_teachers + j) * num_slots + k`.
struct DecisionCube {
    vars: Vec<Variable>,
    num_courses: usize,
    num_teachers: usize,
    num_slots: usize,
}

impl DecisionCube {
    fn new(problem: &mut ProblemVariables, instance: &ProblemInstance, len: usize) -> Self {
        let vars = problem.add_vector(variable().binary(), len);
        Self {
            vars,
            num_courses: instance.num_courses,
            num_teachers: instance.num_teachers,
            num_slots: instance.num_slots,
        }
    }

    fn var(&self, course: CourseId, teacher: TeacherId, slot: Slot) -> Variable {
        self.vars[(course * self.num_teachers + teacher) * self.num_slots + slot]
    }

    fn total(&self) -> Expression {
        self.vars.iter().copied().sum()
    }

    fn course_total(&self, course: CourseId) -> Expression {
        iproduct!(0..self.num_teachers, 0..self.num_slots)
            .map(|(teacher, slot)| self.var(course, teacher, slot))
            .sum()
    }

    fn teacher_slot_load(&self, teacher: TeacherId, slot: Slot) -> Expression {
        (0..self.num_courses)
            .map(|course| self.var(course, teacher, slot))
            .sum()
    }

    fn iter(&self) -> impl Iterator<Item = (Assignment, Variable)> + '_ {
        iproduct!(0..self.num_courses, 0..self.num_teachers, 0..self.num_slots)
            .map(|(course, teacher, slot)| {
                (
                    Assignment::new(course, teacher, slot),
                    self.var(course, teacher, slot),
                )
            })
    }
}

/// Solves the timetable problem using the HiGHS ILP solver.
///
/// Returns `Ok(SolverResult::Infeasible)` when no timetable exists. Errors
/// are reserved for malformed input and for solver malfunctions.
pub fn solve(
    problem: &ProblemInstance,
    options: &SolverOptions,
) -> Result<SolverResult, SolveError> {
    let variable_count = problem.validate_within(options.max_variables)?;

    if let Some(reason) = screen_infeasible(problem) {
        info!("Infeasible without solving: {reason}");
        return Ok(SolverResult::Infeasible);
    }

    let start_time = Instant::now();
    info!(
        "Setting up ILP model with {} courses, {} teachers, and {} slots...",
        problem.num_courses, problem.num_teachers, problem.num_slots
    );
    let mut variables = ProblemVariables::new();
    let cube = DecisionCube::new(&mut variables, problem, variable_count);
    trace!("Generated {} decision variables.", cube.vars.len());

    // every feasible timetable has exactly num_courses active variables, so
    // this only asks the solver for feasibility
    let objective = cube.total();

    let mut model = variables
        .minimise(objective)
        .using(default_solver)
        .set_option("threads", options.threads)
        .set_option("random_seed", options.random_seed)
        .set_option("log_to_console", options.log_to_console);

    info!("Adding 'course assigned once' constraints...");
    for course in 0..problem.num_courses {
        let assigned_once = cube.course_total(course);
        model.add_constraint(constraint!(assigned_once == 1));
    }

    info!("Adding 'one course per teacher per slot' constraints...");
    for (teacher, slot) in iproduct!(0..problem.num_teachers, 0..problem.num_slots) {
        let teacher_busy = cube.teacher_slot_load(teacher, slot);
        model.add_constraint(constraint!(teacher_busy <= 1));
    }

    info!("Adding availability constraints...");
    let mut pinned = 0usize;
    for (course, teacher) in iproduct!(0..problem.num_courses, 0..problem.num_teachers) {
        if problem.is_available(course, teacher) {
            continue;
        }
        for slot in 0..problem.num_slots {
            let unavailable = cube.var(course, teacher, slot);
            model.add_constraint(constraint!(unavailable == 0));
            pinned += 1;
        }
    }
    trace!("Pinned {pinned} variables to zero.");

    info!("Starting ILP solver...");
    let solution = match model.solve() {
        Ok(s) => s,
        Err(ResolutionError::Infeasible) => {
            info!("Solver proved infeasibility in {:.2?}", start_time.elapsed());
            return Ok(SolverResult::Infeasible);
        }
        Err(e) => return Err(SolveError::SolverFailure(e.to_string())),
    };
    info!("Solution found in {:.2?}", start_time.elapsed());

    let assignments: Vec<Assignment> = cube
        .iter()
        .filter(|(_, var)| solution.value(*var).round() >= 1.0)
        .map(|(assignment, _)| assignment)
        .collect();
    let timetable = Timetable::new(assignments);

    if let Err(reason) = timetable.check(problem) {
        warn!("Solver returned an invalid timetable: {reason}");
        return Err(SolveError::SolverFailure(format!(
            "solver returned an invalid timetable: {reason}"
        )));
    }

    Ok(SolverResult::Solved(timetable))
}

// cheap necessary conditions; anything they miss is left to the solver
fn screen_infeasible(problem: &ProblemInstance) -> Option<String> {
    if problem.num_courses > problem.capacity() {
        return Some(format!(
            "{} courses exceed the capacity of {} teacher-slot pairs",
            problem.num_courses,
            problem.capacity()
        ));
    }
    (0..problem.num_courses)
        .find(|&course| {
            (0..problem.num_teachers).all(|teacher| !problem.is_available(course, teacher))
        })
        .map(|course| format!("course {} has no available teacher", course + 1))
}
