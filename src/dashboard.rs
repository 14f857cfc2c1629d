//! Terminal rendering of a day: macro split, calorie bars and
//! micronutrient progress. Pure presentation over precomputed numbers.

use std::fmt::Write;

use colored::{Color, Colorize};

use crate::config::Targets;
use crate::nutrition::{macro_split, net_carbs};
use crate::types::{Nutrient, NutrientTotals};

const BAR_WIDTH: usize = 40;

const PROTEIN_COLOR: Color = Color::TrueColor { r: 0x3E, g: 0x7F, b: 0xBA };
const FAT_COLOR: Color = Color::TrueColor { r: 0xE5, g: 0x97, b: 0x28 };
const CARB_COLOR: Color = Color::TrueColor { r: 0x9C, g: 0x27, b: 0xB0 };
const INTAKE_COLOR: Color = Color::TrueColor { r: 0xEC, g: 0x40, b: 0x7A };
const BURNED_COLOR: Color = Color::TrueColor { r: 0x26, g: 0xC6, b: 0xDA };

/// Colour for a value-to-target ratio.
pub fn ratio_color(ratio: f64) -> Color {
    if ratio >= 1.5 {
        Color::TrueColor { r: 0xD5, g: 0x00, b: 0x00 }
    } else if ratio >= 1.25 {
        Color::TrueColor { r: 0xFF, g: 0x52, b: 0x52 }
    } else if ratio >= 1.0 {
        Color::TrueColor { r: 0xFF, g: 0x8A, b: 0x65 }
    } else if ratio >= 0.9 {
        Color::TrueColor { r: 0xFF, g: 0xB7, b: 0x4D }
    } else {
        Color::TrueColor { r: 0x81, g: 0xC7, b: 0x84 }
    }
}

/// Filled cells out of `width` for `fraction`, clamped to `[0, 1]`.
fn filled_cells(fraction: f64, width: usize) -> usize {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * width as f64).round() as usize
}

fn bar(fraction: f64, width: usize, color: Color) -> String {
    let filled = filled_cells(fraction, width);
    format!(
        "{}{}",
        "█".repeat(filled).color(color),
        "░".repeat(width - filled).dimmed()
    )
}

/// A ruler under a bar with `┆` at each mark and `▼` at the target.
fn ruler(marks: &[f64], target: f64, scale: f64, width: usize) -> String {
    let mut cells = vec![' '; width + 1];
    for mark in marks {
        cells[filled_cells(mark / scale, width)] = '┆';
    }
    cells[filled_cells(target / scale, width)] = '▼';
    cells.into_iter().collect()
}

pub struct Dashboard<'t> {
    totals: NutrientTotals,
    calories: f64,
    burned_kcal: f64,
    burned_error_kcal: Option<f64>,
    targets: &'t Targets,
}

impl<'t> Dashboard<'t> {
    pub fn new(
        totals: NutrientTotals,
        calories: f64,
        burned_kcal: f64,
        burned_error_kcal: Option<f64>,
        targets: &'t Targets,
    ) -> Self {
        Self {
            totals,
            calories,
            burned_kcal,
            burned_error_kcal,
            targets,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_macros(&mut out);
        out.push('\n');
        self.render_calories(&mut out);
        out.push('\n');
        self.render_micros(&mut out);
        out
    }

    fn render_macros(&self, out: &mut String) {
        let split = macro_split(&self.totals, self.calories);
        let rows = [
            (Nutrient::Protein, self.targets.protein_pct, PROTEIN_COLOR),
            (Nutrient::Fat, self.targets.fat_pct, FAT_COLOR),
            (Nutrient::Carb, self.targets.carb_pct, CARB_COLOR),
        ];
        let _ = writeln!(out, "{}", "Macros (% of calories)".bold());
        for (nutrient, target, color) in rows {
            let pct = split.get(nutrient).unwrap_or(0.0);
            let extra = if nutrient == Nutrient::Carb {
                format!(" ({:.0} net)", net_carbs(&self.totals))
            } else {
                String::new()
            };
            let _ = writeln!(
                out,
                "  {:<8} {} {:>3.0}% / {:.0}%  {:.0} g{}",
                nutrient.label(),
                bar(pct / 100.0, BAR_WIDTH, color),
                pct,
                target,
                self.totals.get(nutrient),
                extra
            );
        }
    }

    fn render_calories(&self, out: &mut String) {
        let t = self.targets;
        let scale = t.calorie_scale_kcal;
        let _ = writeln!(
            out,
            "{}",
            format!("Calories (target {:.0} kcal)", t.calories_kcal).bold()
        );

        let burned_label = match self.burned_error_kcal {
            Some(err) => format!("{:.0} ± {:.0} kcal", self.burned_kcal, err),
            None => format!("{:.0} kcal", self.burned_kcal),
        };
        let _ = writeln!(
            out,
            "  {:<8} {} {}",
            "Burned",
            bar(self.burned_kcal / scale, BAR_WIDTH, BURNED_COLOR),
            burned_label
        );
        let _ = writeln!(
            out,
            "  {:<8} {} {:.0} kcal",
            "Intake",
            bar(self.calories / scale, BAR_WIDTH, INTAKE_COLOR),
            self.calories
        );
        let _ = writeln!(
            out,
            "  {:<8} {}",
            "",
            ruler(&t.calorie_bands_kcal, t.calories_kcal, scale, BAR_WIDTH).dimmed()
        );
        let _ = writeln!(
            out,
            "  {:<8} {:.0} kcal",
            "Net",
            self.calories - self.burned_kcal
        );
    }

    fn render_micros(&self, out: &mut String) {
        let t = self.targets;
        let rows = [
            (Nutrient::Sodium, t.sodium_mg),
            (Nutrient::Fiber, t.fiber_g),
            (Nutrient::AddedSugar, t.added_sugar_g),
            (Nutrient::Potassium, t.potassium_mg),
        ];
        let _ = writeln!(out, "{}", "Micronutrients".bold());
        for (nutrient, target) in rows {
            let value = self.totals.get(nutrient);
            let ratio = value / target;
            let _ = writeln!(
                out,
                "  {:<11} {} {:.0}/{:.0}{}",
                nutrient.label(),
                bar(ratio, BAR_WIDTH / 2, ratio_color(ratio)),
                value,
                target,
                nutrient.unit()
            );
        }
    }
}

/// Plain table of the day's numbers.
pub fn totals_table(totals: &NutrientTotals, calories: f64, burned_kcal: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {:>10}", "Calories (kcal)", format!("{calories:.0}"));
    let _ = writeln!(out, "{:<16} {:>10}", "Burned (kcal)", format!("{burned_kcal:.0}"));
    let _ = writeln!(
        out,
        "{:<16} {:>10}",
        "Net (kcal)",
        format!("{:.0}", calories - burned_kcal)
    );
    for nutrient in Nutrient::ALL {
        let label = format!("{} ({})", nutrient.label(), nutrient.unit());
        let _ = writeln!(out, "{:<16} {:>10.1}", label, totals.get(nutrient));
    }
    out
}
