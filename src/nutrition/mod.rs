pub mod descriptor;
pub mod energy;
pub mod meal;

pub use descriptor::restore_meal;
pub use energy::{EnergyBalance, WorkoutEntry, bmr, sedentary_tdee};
pub use meal::{MacroSplit, Meal, MealLine, macro_split, net_carbs};
