use std::fs::read_to_string;

use log::error;
use timetable_solver::{Config, ProblemInstance, SolverResult, export, server, solve};

const USAGE: &str = "Usage: timetable_solver [solve <problem.json> [--csv]]";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Serve,
    Solve { path: String, csv: bool },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            init_logging(&Config::default());
            error!("Failed to load configuration: {e}");
            return Err(e.into());
        }
    };
    init_logging(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args)? {
        Command::Serve => server::run_server(&config).await?,
        Command::Solve { path, csv } => print!("{}", solve_file(&path, csv, &config)?),
    }
    Ok(())
}

fn init_logging(config: &Config) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
}

fn parse_args(args: &[String]) -> Result<Command, &'static str> {
    match args.first().map(String::as_str) {
        None => Ok(Command::Serve),
        Some("solve") => {
            let path = args.get(1).ok_or(USAGE)?.clone();
            let csv = args.iter().skip(2).any(|a| a == "--csv");
            Ok(Command::Solve { path, csv })
        }
        Some(_) => Err(USAGE),
    }
}

fn solve_file(path: &str, csv: bool, config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    let buf = read_to_string(path)?;
    let problem: ProblemInstance = serde_json::from_str(&buf)?;
    let result = solve(&problem, &config.solver)?;
    Ok(render(&result, csv))
}

fn render(result: &SolverResult, csv: bool) -> String {
    match (result, csv) {
        (SolverResult::Solved(timetable), true) => export::to_csv(timetable),
        _ => export::render_result(result),
    }
}
