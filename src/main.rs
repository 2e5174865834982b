use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wlog::config::{Backend, Config};
use wlog::db::Database;
use wlog::finish::{finish_workout, FinishWorkout, FinishedSet};
use wlog::models::{format_volume, CreateExerciseInput};
use wlog::sheets::{credentials, GoogleSheetsClient, SheetStore};
use wlog::WorkoutStore;

#[derive(Parser)]
#[command(name = "wlog")]
#[command(about = "Workout log over a SQLite file or a Google Sheets document")]
struct Cli {
    /// Storage backend (overrides config and WLOG_BACKEND)
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    /// SQLite database file (overrides config and WLOG_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables or worksheets
    Init,
    /// Write the default weekly schedule if no routine exists
    Seed,
    /// Manage the exercise library
    #[command(subcommand)]
    Exercises(ExerciseCommands),
    /// Manage routines
    #[command(subcommand)]
    Routines(RoutineCommands),
    /// Save a finished workout
    Log {
        /// Sets as EXERCISE_ID:WEIGHT:REPS, in the order performed
        #[arg(short, long = "set", value_parser = parse_set, required = true)]
        sets: Vec<FinishedSet>,

        /// Routine the workout followed
        #[arg(short, long)]
        routine: Option<String>,

        #[arg(short, long, default_value = "0")]
        duration: i64,

        /// Replace the routine's exercises with the ones logged
        #[arg(long, requires = "routine")]
        update_routine: bool,
    },
    /// List past workouts with their sets
    History,
    /// Delete a workout and its sets
    DeleteWorkout { id: i64 },
    /// Most recent set of an exercise
    Last { exercise_id: i64 },
    /// Consecutive training days up to today
    Streak,
    /// Shareable text for the latest workout
    Share,
}

#[derive(Subcommand)]
enum ExerciseCommands {
    List,
    Add {
        name: String,
        muscle: String,
        #[arg(long)]
        instructions: Option<String>,
        /// 1 (easiest) to 5
        #[arg(long)]
        difficulty: Option<i64>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete an exercise with its routine items and sets
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum RoutineCommands {
    List,
    Show { name: String },
    Create {
        name: String,
        /// Exercise ids in order
        exercise_ids: Vec<i64>,
    },
    /// Rename a routine and replace its exercises
    Update {
        id: i64,
        name: String,
        exercise_ids: Vec<i64>,
    },
    Delete { id: i64 },
}

/// Initialize tracing with output to stderr so stdout carries command output
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "wlog=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_set(s: &str) -> Result<FinishedSet, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [exercise_id, weight, reps] = parts.as_slice() else {
        return Err(format!("expected EXERCISE_ID:WEIGHT:REPS, got '{}'", s));
    };
    Ok(FinishedSet {
        exercise_id: exercise_id
            .parse()
            .map_err(|_| format!("invalid exercise id '{}'", exercise_id))?,
        weight: weight
            .parse()
            .map_err(|_| format!("invalid weight '{}'", weight))?,
        reps: reps.parse().map_err(|_| format!("invalid reps '{}'", reps))?,
    })
}

fn open_store(config: &Config) -> anyhow::Result<Box<dyn WorkoutStore>> {
    match config.backend {
        Backend::Sqlite => {
            let db = match &config.database_path {
                Some(path) => Database::open(path.clone()),
                None => Database::open_default(),
            }
            .context("Failed to open database")?;
            db.init().context("Failed to initialize database")?;
            Ok(Box::new(db))
        }
        Backend::Sheets => {
            let key = credentials::discover(&config.credential_dir())?;
            let client = GoogleSheetsClient::connect(key, &config.spreadsheet_name)?;
            let store = SheetStore::open(client).context("Failed to initialize spreadsheet")?;
            Ok(Box::new(store))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::load()?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(path) = cli.db {
        config.database_path = Some(path);
    }

    let mut store = open_store(&config)?;
    tracing::debug!("Using {} backend", store.backend_name());
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            println!("{} backend ready", store.backend_name());
        }
        Commands::Seed => {
            let report = store.seed_default_schedule()?;
            if json {
                print_json(&report)?;
            } else if report.skipped {
                println!("Routines already exist; nothing seeded");
            } else {
                println!(
                    "Created {} routines ({} items) and {} exercises",
                    report.routines_created, report.items_created, report.exercises_created
                );
            }
        }
        Commands::Exercises(cmd) => run_exercises(store.as_mut(), cmd, json)?,
        Commands::Routines(cmd) => run_routines(store.as_mut(), cmd, json)?,
        Commands::Log {
            sets,
            routine,
            duration,
            update_routine,
        } => {
            let input = FinishWorkout {
                session_name: routine,
                duration_minutes: duration,
                sets,
                update_routine,
            };
            if let Some(workout) = finish_workout(store.as_mut(), input)? {
                if json {
                    print_json(&workout)?;
                } else {
                    println!(
                        "Saved workout {} ({} kg)",
                        workout.id,
                        format_volume(workout.total_volume)
                    );
                }
            }
        }
        Commands::History => {
            let history = store.history()?;
            if json {
                print_json(&history)?;
            } else {
                for entry in history {
                    let w = &entry.workout;
                    println!(
                        "#{} {} {} - {} kg, {} min",
                        w.id,
                        w.timestamp,
                        w.session_name.as_deref().unwrap_or("Free workout"),
                        format_volume(w.total_volume),
                        w.duration_minutes
                    );
                    for set in entry.sets {
                        println!(
                            "    {} ({}): {}x{}",
                            set.exercise, set.muscle, set.weight, set.reps
                        );
                    }
                }
            }
        }
        Commands::DeleteWorkout { id } => {
            if !store.delete_workout(id)? {
                anyhow::bail!("Workout {} not found", id);
            }
            println!("Deleted workout {}", id);
        }
        Commands::Last { exercise_id } => match store.last_performance(exercise_id)? {
            Some(last) if json => print_json(&last)?,
            Some(last) => println!("{}x{} on {}", last.weight, last.reps, last.date),
            None => println!("No previous sets"),
        },
        Commands::Streak => {
            let streak = store.streak()?;
            if json {
                print_json(&streak)?;
            } else {
                println!("{} day streak", streak);
            }
        }
        Commands::Share => match store.last_workout_summary()? {
            Some(summary) if json => print_json(&summary)?,
            Some(summary) => println!("{}", summary.share_text()),
            None => println!("No workouts logged yet"),
        },
    }

    Ok(())
}

fn run_exercises(
    store: &mut dyn WorkoutStore,
    cmd: ExerciseCommands,
    json: bool,
) -> anyhow::Result<()> {
    match cmd {
        ExerciseCommands::List => {
            let exercises = store.list_exercises()?;
            if json {
                return print_json(&exercises);
            }
            for e in exercises {
                println!(
                    "{:>4}  {} [{}] {} (difficulty {})",
                    e.id,
                    e.name,
                    e.muscle,
                    e.category,
                    e.difficulty.get()
                );
            }
        }
        ExerciseCommands::Add {
            name,
            muscle,
            instructions,
            difficulty,
            category,
        } => {
            let exercise = store.create_exercise(CreateExerciseInput {
                name,
                muscle,
                instructions,
                difficulty,
                category,
            })?;
            if json {
                return print_json(&exercise);
            }
            println!("Added {} (id {})", exercise.name, exercise.id);
        }
        ExerciseCommands::Delete { id } => {
            if !store.delete_exercise(id)? {
                anyhow::bail!("Exercise {} not found", id);
            }
            println!("Deleted exercise {}", id);
        }
    }
    Ok(())
}

fn run_routines(
    store: &mut dyn WorkoutStore,
    cmd: RoutineCommands,
    json: bool,
) -> anyhow::Result<()> {
    match cmd {
        RoutineCommands::List => {
            let routines = store.list_routines()?;
            if json {
                return print_json(&routines);
            }
            for r in routines {
                println!("{:>4}  {} (created {})", r.id, r.name, r.created_at);
            }
        }
        RoutineCommands::Show { name } => {
            let routine = store
                .routine_by_name(&name)?
                .with_context(|| format!("Routine '{}' not found", name))?;
            let exercises = store.routine_exercises(routine.id)?;
            if json {
                return print_json(&exercises);
            }
            println!("{}", routine.name);
            for e in exercises {
                let last = store
                    .last_performance(e.exercise_id)?
                    .map(|l| format!(" - last {}x{}", l.weight, l.reps))
                    .unwrap_or_default();
                println!("  {}. {} [{}]{}", e.order + 1, e.name, e.muscle, last);
            }
        }
        RoutineCommands::Create { name, exercise_ids } => {
            let routine = store.create_routine(&name, &exercise_ids)?;
            if json {
                return print_json(&routine);
            }
            println!("Created routine {} (id {})", routine.name, routine.id);
        }
        RoutineCommands::Update {
            id,
            name,
            exercise_ids,
        } => {
            if !store.update_routine(id, &name, &exercise_ids)? {
                anyhow::bail!("Routine {} not found", id);
            }
            println!("Updated routine {}", id);
        }
        RoutineCommands::Delete { id } => {
            if !store.delete_routine(id)? {
                anyhow::bail!("Routine {} not found", id);
            }
            println!("Deleted routine {}", id);
        }
    }
    Ok(())
}
