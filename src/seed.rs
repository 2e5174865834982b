//! Default weekly routine schedule and the starter exercise catalog.
//!
//! Seeding is planned here and written by each backend. Planning resolves every
//! template exercise against the library by case-insensitive name and stages
//! the ones that are missing, so a backend can write all new exercises, all
//! routines and all routine items as three batches.

use chrono::NaiveDate;

use crate::ids::IdBlock;
use crate::models::*;

/// One exercise definition in a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateExercise {
    pub name: &'static str,
    pub muscle: &'static str,
    pub category: &'static str,
    pub instructions: &'static str,
    pub difficulty: i64,
}

impl TemplateExercise {
    pub fn to_new(&self) -> NewExercise {
        NewExercise {
            name: self.name.to_string(),
            muscle: self.muscle.to_string(),
            instructions: self.instructions.to_string(),
            difficulty: Difficulty::new(self.difficulty),
            category: self.category.to_string(),
        }
    }
}

/// Routine name and its ordered exercises.
pub type Template = &'static [(&'static str, &'static [TemplateExercise])];

const fn ex(
    name: &'static str,
    muscle: &'static str,
    category: &'static str,
    instructions: &'static str,
    difficulty: i64,
) -> TemplateExercise {
    TemplateExercise {
        name,
        muscle,
        category,
        instructions,
        difficulty,
    }
}

pub const DEFAULT_SCHEDULE: Template = &[
    (
        "Monday: Upper Body Push",
        &[
            ex("Dumbbell Bench Press", "Chest", "Strength", "3 sets x 10-12 reps. Flat or Incline.", 2),
            ex("Dumbbell Overhead Press", "Shoulders", "Strength", "3 sets x 10 reps. Standing or Seated.", 2),
            ex("Push-Ups", "Chest", "Strength", "3 sets x Failure. Knees if needed for full range.", 1),
            ex("Overhead Tricep Extension", "Arms", "Hypertrophy", "3 sets x 12 reps. Use Dumbbell.", 2),
            ex("Plank", "Core", "Core", "3 sets x 45 seconds. Core stability.", 1),
            ex("Brisk Walk", "Cardio", "Cardio", "20 mins. Incline 5. Keep heart rate moderate.", 1),
        ],
    ),
    (
        "Tuesday: Upper Body Pull",
        &[
            ex("Lat Pulldowns", "Back", "Hypertrophy", "3 sets x 12 reps. Focus on pulling with elbows.", 1),
            ex("Single-Arm Dumbbell Row", "Back", "Hypertrophy", "3 sets x 10 reps per arm. Use bench support. Flat back.", 2),
            ex("Dumbbell Bicep Curls", "Arms", "Hypertrophy", "3 sets x 12 reps.", 1),
            ex("Dead Hangs", "Back", "Strength", "3 sets x Max time. Hang until hands slip. Grip focus.", 2),
            ex("Cycling", "Cardio", "Cardio", "20 mins. Moderate pace.", 1),
        ],
    ),
    (
        "Wednesday: Leg Strength",
        &[
            ex("Goblet Squats", "Legs", "Strength", "3 sets x 12 reps. Hold DB at chest. Squat deep.", 2),
            ex("Dumbbell Walking Lunges", "Legs", "Hypertrophy", "3 sets x 10 steps per leg.", 2),
            ex("Dumbbell Romanian Deadlift", "Legs", "Hypertrophy", "3 sets x 12 reps. Hold DBs in front. Hinge hips. Feel hamstring stretch.", 2),
            ex("Standing Calf Raises", "Legs", "Isolation", "3 sets x 15 reps. Use DBs.", 1),
            ex("Incline Walk", "Cardio", "Cardio", "15 mins. Increase incline to 8-10.", 2),
        ],
    ),
    (
        "Thursday: Active Rest",
        &[
            ex("Outdoor Walk", "Cardio", "Cardio", "45-min continuous walk outdoors.", 1),
            ex("Swimming", "Cardio", "Cardio", "Light swim to flush out soreness.", 2),
        ],
    ),
    (
        "Friday: Spartan Circuit",
        &[
            ex("Bodyweight Squats", "Legs", "Endurance", "20 reps. Part of Circuit.", 1),
            ex("Push-Ups", "Chest", "Strength", "10 reps. Part of Circuit.", 1),
            ex("Mountain Climbers", "Core", "Endurance", "20 reps (Total). Part of Circuit.", 2),
            ex("Step-Ups", "Legs", "Endurance", "10 reps per leg. Step onto bench.", 2),
            ex("Burpees", "Cardio", "Endurance", "5 reps. Smooth motion.", 3),
            ex("Cool-down Walk", "Cardio", "Cardio", "10 mins.", 1),
        ],
    ),
    (
        "Saturday: Endurance & Carries",
        &[
            ex("Farmer's Carry", "Back", "Strength", "4 sets x 40 meters. Heaviest DBs safely. Good posture.", 2),
            ex("Running", "Cardio", "Cardio", "30-45 mins. Constant pace.", 2),
        ],
    ),
];

/// Curated library written when the relational exercises table is first created.
pub const STARTER_CATALOG: &[TemplateExercise] = &[
    ex("Barbell Bench Press", "Chest", "Strength", "Lower bar to mid-chest; keep feet planted; drive bar up.", 2),
    ex("Dumbbell Incline Press", "Chest", "Hypertrophy", "Set bench to 30 degrees; press weights up; focus on the upper chest.", 2),
    ex("Chest Dips", "Chest", "Strength", "Lean forward slightly; lower body until elbows are at 90 degrees; push back up.", 2),
    ex("Cable Crossover", "Chest", "Hypertrophy", "Bring handles together in a 'hugging' motion; squeeze chest at the center.", 1),
    ex("Dumbbell Flyes", "Chest", "Hypertrophy", "Lie flat; open arms wide with slight elbow bend; hug weights back to center.", 1),
    ex("Push-Ups", "Chest", "Strength", "Maintain a straight line from head to toe; chest nearly touches the floor.", 1),
    ex("Pull-Ups", "Back", "Strength", "Wide grip; pull chest to bar; drive elbows toward your ribs.", 2),
    ex("Bent-Over Barbell Row", "Back", "Strength", "Hinge at hips; pull bar to lower stomach; squeeze shoulder blades.", 2),
    ex("Lat Pulldowns", "Back", "Hypertrophy", "Pull bar to upper chest; lean back slightly; avoid using momentum.", 1),
    ex("Seated Cable Row", "Back", "Hypertrophy", "Pull handle to waist; keep back straight; squeeze shoulder blades.", 1),
    ex("Deadlift", "Back", "Strength", "Keep bar close to shins; flat back; drive through heels to stand upright.", 3),
    ex("Single-Arm Dumbbell Row", "Back", "Hypertrophy", "One hand on bench for support; pull weight to hip; keep elbow tucked.", 1),
    ex("Back Squats", "Legs", "Strength", "Bar on traps; sit back into heels; keep chest up; hips below knees.", 3),
    ex("Leg Press", "Legs", "Hypertrophy", "Feet shoulder-width on platform; lower until knees are at 90 degrees; don't lock knees.", 2),
    ex("Romanian Deadlift", "Legs", "Hypertrophy", "Hinge hips back; feel stretch in hamstrings; keep back flat.", 2),
    ex("Bulgarian Split Squat", "Legs", "Hypertrophy", "One foot back on bench; drop back knee; keep front shin vertical.", 2),
    ex("Leg Extensions", "Legs", "Isolation", "Sit upright; kick legs out straight; squeeze quads at the top.", 1),
    ex("Seated Calf Raises", "Legs", "Isolation", "Sit with weight on knees; lift heels as high as possible; slow descent.", 1),
    ex("Military Press", "Shoulders", "Strength", "Stand tall; press bar from chin to overhead; lock out at the top.", 2),
    ex("Dumbbell Lateral Raise", "Shoulders", "Hypertrophy", "Lift weights to the side until level with shoulders; lead with elbows.", 1),
    ex("Front Raises", "Shoulders", "Isolation", "Lift dumbbells forward to eye level; keep arms straight; control the descent.", 1),
    ex("Face Pulls", "Shoulders", "Mobility", "Pull rope toward forehead; pull ends apart; focus on rear shoulders.", 1),
    ex("Dumbbell Shrugs", "Shoulders", "Hypertrophy", "Hold weights at sides; lift shoulders toward ears; don't roll shoulders.", 1),
    ex("Reverse Flyes", "Shoulders", "Hypertrophy", "Bend forward; lift weights out to the side; focus on upper back/rear delts.", 1),
    ex("Barbell Curls", "Arms", "Hypertrophy", "Palms up; curl bar to shoulders; keep elbows pinned to sides.", 1),
    ex("Hammer Curls", "Arms", "Hypertrophy", "Palms facing in; curl dumbbells; targets forearms and biceps.", 1),
    ex("Skull Crushers", "Arms", "Hypertrophy", "Lie flat; lower weight to forehead by bending elbows; extend back up.", 2),
    ex("Tricep Pushdowns", "Arms", "Isolation", "Use rope; pull down until arms are straight; squeeze triceps.", 1),
    ex("Preacher Curls", "Arms", "Isolation", "Arms rested on pad; curl weight up; prevents cheating with momentum.", 1),
    ex("Overhead Tricep Extension", "Arms", "Hypertrophy", "Hold one dumbbell with both hands; lower behind head; press up.", 1),
    ex("Plank", "Core", "Core", "Forearms on floor; body straight; squeeze glutes and core; hold.", 1),
    ex("Hanging Leg Raises", "Core", "Core", "Hang from bar; lift legs to 90 degrees; avoid swinging.", 2),
    ex("Russian Twists", "Core", "Core", "Sit with feet up; rotate torso side to side; touch floor with hands.", 1),
    ex("Ab Wheel Rollouts", "Core", "Core", "Kneel; roll wheel forward as far as possible; pull back using abs.", 3),
    ex("Cable Crunches", "Core", "Core", "Kneeling; pull rope down toward floor using abs; round the back.", 1),
    ex("Bicycle Crunches", "Core", "Core", "Opposite elbow to opposite knee; keep a steady rhythm.", 1),
];

/// Where a template slot gets its exercise id from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseRef {
    Existing(i64),
    /// Index into [`Resolution::new_exercises`].
    Staged(usize),
}

/// A template matched against the current library, before ids are assigned.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub new_exercises: Vec<NewExercise>,
    pub routines: Vec<(String, Vec<ExerciseRef>)>,
}

/// Rows ready to be written, ids assigned.
#[derive(Debug, Clone, Default)]
pub struct SeedPlan {
    pub exercises: Vec<Exercise>,
    pub routines: Vec<Routine>,
    pub items: Vec<RoutineItem>,
}

impl SeedPlan {
    pub fn report(&self) -> SeedReport {
        SeedReport {
            skipped: false,
            exercises_created: self.exercises.len(),
            routines_created: self.routines.len(),
            items_created: self.items.len(),
        }
    }
}

/// Matches each template exercise to the library, staging missing ones once.
pub fn resolve(template: Template, existing: &[Exercise]) -> Resolution {
    let mut new_exercises: Vec<NewExercise> = Vec::new();
    let mut routines = Vec::with_capacity(template.len());

    for (routine_name, exercises) in template {
        let refs = exercises
            .iter()
            .map(|def| {
                if let Some(found) = existing.iter().find(|e| same_name(&e.name, def.name)) {
                    ExerciseRef::Existing(found.id)
                } else if let Some(idx) = new_exercises.iter().position(|e| same_name(&e.name, def.name)) {
                    ExerciseRef::Staged(idx)
                } else {
                    new_exercises.push(def.to_new());
                    ExerciseRef::Staged(new_exercises.len() - 1)
                }
            })
            .collect();
        routines.push((routine_name.to_string(), refs));
    }

    Resolution {
        new_exercises,
        routines,
    }
}

impl Resolution {
    pub fn item_count(&self) -> usize {
        self.routines.iter().map(|(_, refs)| refs.len()).sum()
    }

    /// Assigns ids from the reserved blocks. Block lengths must match
    /// the staged exercise, routine and item counts.
    pub fn into_plan(
        self,
        exercise_ids: IdBlock,
        routine_ids: IdBlock,
        item_ids: IdBlock,
        created_at: NaiveDate,
    ) -> SeedPlan {
        let exercises: Vec<Exercise> = self
            .new_exercises
            .into_iter()
            .zip(exercise_ids.ids())
            .map(|(new, id)| new.with_id(id))
            .collect();

        let mut routines = Vec::with_capacity(self.routines.len());
        let mut items = Vec::new();
        let mut next_item = item_ids.start;

        for ((name, refs), routine_id) in self.routines.into_iter().zip(routine_ids.ids()) {
            let exercise_ids: Vec<i64> = refs
                .iter()
                .map(|r| match r {
                    ExerciseRef::Existing(id) => *id,
                    ExerciseRef::Staged(idx) => exercises[*idx].id,
                })
                .collect();
            items.extend(routine_items(routine_id, next_item, &exercise_ids));
            next_item += exercise_ids.len() as i64;
            routines.push(Routine {
                id: routine_id,
                name,
                created_at,
            });
        }

        SeedPlan {
            exercises,
            routines,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start: i64, len: usize) -> IdBlock {
        IdBlock { start, len }
    }

    #[test]
    fn shared_exercises_are_staged_once() {
        let resolution = resolve(DEFAULT_SCHEDULE, &[]);
        let push_ups = resolution
            .new_exercises
            .iter()
            .filter(|e| e.name == "Push-Ups")
            .count();
        assert_eq!(push_ups, 1);
        assert_eq!(resolution.routines.len(), 6);
        assert_eq!(resolution.item_count(), 26);
    }

    #[test]
    fn existing_exercises_match_case_insensitively() {
        let plank = NewExercise::from(CreateExerciseInput::new("PLANK", "Core")).with_id(42);
        let resolution = resolve(DEFAULT_SCHEDULE, &[plank]);

        assert!(resolution.new_exercises.iter().all(|e| e.name != "Plank"));
        let monday = &resolution.routines[0].1;
        assert_eq!(monday[4], ExerciseRef::Existing(42));
    }

    #[test]
    fn plan_assigns_contiguous_ids() {
        let resolution = resolve(DEFAULT_SCHEDULE, &[]);
        let staged = resolution.new_exercises.len();
        let items = resolution.item_count();
        let routines = resolution.routines.len();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let plan = resolution.into_plan(block(10, staged), block(3, routines), block(100, items), today);

        let ex_ids: Vec<i64> = plan.exercises.iter().map(|e| e.id).collect();
        assert_eq!(ex_ids, (10..10 + staged as i64).collect::<Vec<_>>());
        let item_ids: Vec<i64> = plan.items.iter().map(|i| i.id).collect();
        assert_eq!(item_ids, (100..100 + items as i64).collect::<Vec<_>>());
        assert_eq!(plan.routines[0].id, 3);
        assert_eq!(plan.routines[5].name, "Saturday: Endurance & Carries");

        let monday_orders: Vec<i64> = plan
            .items
            .iter()
            .filter(|i| i.routine_id == 3)
            .map(|i| i.order)
            .collect();
        assert_eq!(monday_orders, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn starter_catalog_names_are_unique() {
        for (i, a) in STARTER_CATALOG.iter().enumerate() {
            for b in &STARTER_CATALOG[i + 1..] {
                assert!(!same_name(a.name, b.name), "duplicate {}", a.name);
            }
        }
    }
}
