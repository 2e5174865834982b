use chrono::NaiveDate;
use speculate2::speculate;
use wlog::db::Database;
use wlog::finish::{finish_workout, FinishWorkout, FinishedSet};
use wlog::models::*;
use wlog::sheets::{MemorySheets, SheetStore};
use wlog::WorkoutStore;

/// Everything observable after a fixed call sequence.
#[derive(Debug, PartialEq)]
struct Snapshot {
    exercise_ids: Vec<i64>,
    exercises_by_id: Vec<Exercise>,
    routines: Vec<Routine>,
    items: Vec<Vec<RoutineItem>>,
    routine_exercises: Vec<Vec<RoutineExercise>>,
    workouts: Vec<Workout>,
    last: Vec<Option<LastPerformance>>,
    streak: u32,
    summary: Option<WorkoutSummary>,
    history: Vec<HistoryEntry>,
}

fn at(s: &str) -> chrono::NaiveDateTime {
    parse_timestamp(s).expect("bad timestamp")
}

fn log(store: &mut dyn WorkoutStore, workout_id: i64, exercise_id: i64, weight: f64, reps: i64, order: i64) {
    store
        .log_set(LogSetInput { workout_id, exercise_id, weight, reps, order })
        .expect("Failed to log set");
}

fn run(store: &mut dyn WorkoutStore) -> Snapshot {
    let squat = store.create_exercise(CreateExerciseInput::new("Squat", "Legs")).expect("create");
    let bench = store.create_exercise(CreateExerciseInput {
        difficulty: Some(3),
        category: Some("Strength".into()),
        ..CreateExerciseInput::new("Bench Press", "Chest")
    }).expect("create");
    let row = store.create_exercise(CreateExerciseInput::new("Row", "Back")).expect("create");
    let curl = store.create_exercise(CreateExerciseInput::new("Curl", "Arms")).expect("create");
    assert!(store.create_exercise(CreateExerciseInput::new("squat", "Legs")).is_err());

    let upper = store.create_routine("Upper", &[bench.id, row.id, curl.id]).expect("routine");
    store.create_routine("Lower", &[squat.id]).expect("routine");
    store.update_routine(upper.id, "Upper A", &[row.id, bench.id]).expect("update");
    assert!(!store.update_routine(999, "Ghost", &[squat.id]).expect("update"));

    // Same timestamp twice: the higher id wins
    let w1 = store.create_workout_at(CreateWorkoutInput { total_volume: 500.0, session_name: Some("Lower".into()), duration_minutes: 40 }, at("2024-01-01 08:00:00")).expect("workout");
    let w2 = store.create_workout_at(CreateWorkoutInput { total_volume: 550.0, session_name: Some("Lower".into()), duration_minutes: 35 }, at("2024-01-01 08:00:00")).expect("workout");
    let w3 = store.create_workout_at(CreateWorkoutInput { total_volume: 1200.0, session_name: None, duration_minutes: 60 }, at("2024-01-02 18:00:00")).expect("workout");
    log(store, w1.id, squat.id, 100.0, 5, 0);
    log(store, w2.id, squat.id, 110.0, 5, 0);
    log(store, w3.id, bench.id, 80.0, 8, 0);
    log(store, w3.id, curl.id, 15.0, 12, 1);
    log(store, w3.id, bench.id, 80.0, 7, 2);

    finish_workout(store, FinishWorkout {
        session_name: Some("Lower".into()),
        duration_minutes: 20,
        sets: vec![
            FinishedSet { exercise_id: row.id, weight: 60.0, reps: 10 },
            FinishedSet { exercise_id: squat.id, weight: 120.0, reps: 3 },
        ],
        update_routine: true,
    }).expect("finish");
    // Finished "now": drop it so the streak stays anchored to the fixed dates
    let newest = store.list_workouts().expect("list")[0].id;
    store.delete_workout(newest).expect("delete");

    store.delete_exercise(curl.id).expect("delete");
    store.delete_routine(999).expect("delete");

    let mut exercises_by_id = store.list_exercises().expect("list");
    exercises_by_id.sort_by_key(|e| e.id);
    let routines = store.list_routines().expect("routines");
    let items = routines.iter().map(|r| store.routine_items(r.id).expect("items")).collect();
    let routine_exercises = routines.iter().map(|r| store.routine_exercises(r.id).expect("joined")).collect();
    let last = [squat.id, bench.id, row.id, curl.id]
        .iter()
        .map(|id| store.last_performance(*id).expect("last"))
        .collect();

    Snapshot {
        exercise_ids: vec![squat.id, bench.id, row.id, curl.id],
        exercises_by_id,
        routines,
        items,
        routine_exercises,
        workouts: store.list_workouts().expect("workouts"),
        last,
        streak: store.streak_on(NaiveDate::from_ymd_opt(2024, 1, 3).expect("date")).expect("streak"),
        summary: store.last_workout_summary().expect("summary"),
        history: store.history().expect("history"),
    }
}

speculate! {
    before {
        let mut db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let mut sheets = SheetStore::open(MemorySheets::new()).expect("Failed to open spreadsheet store");
    }

    describe "backend parity" {
        it "returns identical results for the same call sequence" {
            let relational = run(&mut db);
            let spreadsheet = run(&mut sheets);

            assert_eq!(relational, spreadsheet);
        }

        it "agrees on the expected values" {
            let snapshot = run(&mut sheets);
            let &[squat, bench, row, curl] = snapshot.exercise_ids.as_slice() else {
                panic!("expected four exercises");
            };

            assert_eq!(snapshot.exercise_ids, vec![1, 2, 3, 4]);
            assert_eq!(snapshot.streak, 2);
            assert_eq!(snapshot.last[0].as_ref().map(|l| l.weight), Some(110.0));
            assert_eq!(snapshot.last[1].as_ref().map(|l| (l.weight, l.reps)), Some((80.0, 8)));
            assert!(snapshot.last[2].is_none());
            assert!(snapshot.last[3].is_none());
            assert!(snapshot.exercises_by_id.iter().all(|e| e.id != curl));

            let upper: Vec<_> = snapshot.items[0].iter().map(|i| i.exercise_id).collect();
            assert_eq!(upper, vec![row, bench]);
            assert!(snapshot.items[0].iter().all(|i| i.id > 4));
            let lower: Vec<_> = snapshot.items[1].iter().map(|i| i.exercise_id).collect();
            assert_eq!(lower, vec![row, squat]);

            let summary = snapshot.summary.expect("summary");
            assert_eq!(summary.sets.len(), 2);
            assert_eq!(snapshot.history.len(), 3);
        }

        it "reads blank routine names back as absent on both stores" {
            for name in ["", "  ", "None", " Legs "] {
                let input = CreateWorkoutInput { session_name: Some(name.to_string()), ..Default::default() };
                db.create_workout_at(input.clone(), at("2024-01-01 08:00:00")).expect("workout");
                sheets.create_workout_at(input, at("2024-01-01 08:00:00")).expect("workout");
            }
            sheets.clear_cache();

            let relational: Vec<_> = db.list_workouts().expect("list").into_iter().map(|w| w.session_name).collect();
            let spreadsheet: Vec<_> = sheets.list_workouts().expect("list").into_iter().map(|w| w.session_name).collect();
            assert_eq!(relational, spreadsheet);
            assert_eq!(relational.iter().filter(|n| n.is_none()).count(), 3);
            assert!(relational.contains(&Some("Legs".to_string())));
        }

        it "lists exercises by name on sqlite and by insertion on sheets" {
            db.create_exercise(CreateExerciseInput::new("Squat", "Legs")).expect("create");
            db.create_exercise(CreateExerciseInput::new("Bench", "Chest")).expect("create");
            sheets.create_exercise(CreateExerciseInput::new("Squat", "Legs")).expect("create");
            sheets.create_exercise(CreateExerciseInput::new("Bench", "Chest")).expect("create");

            let relational: Vec<_> = db.list_exercises().expect("list").into_iter().map(|e| e.name).collect();
            let spreadsheet: Vec<_> = sheets.list_exercises().expect("list").into_iter().map(|e| e.name).collect();
            assert_eq!(relational, vec!["Bench", "Squat"]);
            assert_eq!(spreadsheet, vec!["Squat", "Bench"]);
        }
    }
}
