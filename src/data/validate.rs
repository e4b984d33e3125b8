use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::data::compendium::Compendium;
use crate::data::level_data::LevelTable;
use crate::data::occupation::Bounded;
use crate::data::proficiency::{unresolved, Category, ProficiencyRef};
use crate::rules::formula::ModifierFormula;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Checks referential integrity of a loaded compendium.
pub fn validate_compendium(compendium: &Compendium) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_unique(&mut report, "actions", compendium.actions.iter().map(|a| a.id.as_str()));
    check_unique(&mut report, "armors", compendium.armors.iter().map(|a| a.id.as_str()));
    check_unique(
        &mut report,
        "occupations",
        compendium.occupations.iter().map(|o| o.id.as_str()),
    );
    check_unique(&mut report, "races", compendium.races.iter().map(|r| r.id.as_str()));
    check_unique(&mut report, "subraces", compendium.subraces.iter().map(|s| s.id.as_str()));
    check_unique(&mut report, "traits", compendium.traits.iter().map(|t| t.id.as_str()));
    check_unique(&mut report, "weapons", compendium.weapons.iter().map(|w| w.id.as_str()));

    for occupation in &compendium.occupations {
        let context = format!("occupations/{}", occupation.id);
        check_bounds(&mut report, &context, occupation);
        check_refs(&mut report, &context, &occupation.armor_proficiencies, &compendium.armors);
        check_refs(&mut report, &context, &occupation.weapon_proficiencies, &compendium.weapons);
        check_levels(&mut report, &context, &occupation.levels, compendium);
    }

    for race in &compendium.races {
        let context = format!("races/{}", race.id);
        check_bounds(&mut report, &context, race);
        check_refs(&mut report, &context, &race.weapon_proficiencies, &compendium.weapons);
        check_formulas(&mut report, &context, &race.challenge_modifiers);
        check_levels(&mut report, &context, &race.levels, compendium);

        for subrace_id in &race.subraces {
            match compendium.subrace(subrace_id) {
                None => report.push(
                    ValidationSeverity::Warning,
                    &context,
                    format!("unknown subrace '{subrace_id}'"),
                ),
                Some(subrace) if subrace.race != race.id => report.push(
                    ValidationSeverity::Warning,
                    &context,
                    format!("subrace '{subrace_id}' belongs to race '{}'", subrace.race),
                ),
                Some(_) => {}
            }
        }
        if race.subraces.is_empty() && (race.female_names.is_empty() || race.male_names.is_empty()) {
            report.push(ValidationSeverity::Warning, &context, "missing first names");
        }
    }

    for subrace in &compendium.subraces {
        let context = format!("subraces/{}", subrace.id);
        if compendium.race(&subrace.race).is_none() {
            report.push(
                ValidationSeverity::Error,
                &context,
                format!("parent race '{}' does not exist", subrace.race),
            );
        }
        check_refs(&mut report, &context, &subrace.armor_proficiencies, &compendium.armors);
        check_refs(&mut report, &context, &subrace.weapon_proficiencies, &compendium.weapons);
        check_formulas(&mut report, &context, &subrace.challenge_modifiers);
        check_levels(&mut report, &context, &subrace.levels, compendium);
        for action_id in &subrace.actions {
            if compendium.action(action_id).is_none() {
                report.push(
                    ValidationSeverity::Warning,
                    &context,
                    format!("unknown action '{action_id}'"),
                );
            }
        }
        if subrace.female_names.is_empty() || subrace.male_names.is_empty() {
            report.push(ValidationSeverity::Warning, &context, "missing first names");
        }
    }

    report
}

fn check_unique<'a>(
    report: &mut ValidationReport,
    collection: &str,
    ids: impl Iterator<Item = &'a str>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            report.push(
                ValidationSeverity::Error,
                format!("{collection}/{id}"),
                "duplicate id",
            );
        }
    }
}

fn check_bounds(report: &mut ValidationReport, context: &str, entity: &impl Bounded) {
    if let (Some(low), Some(high)) = (entity.low_challenge(), entity.high_challenge()) {
        if low > high {
            report.push(
                ValidationSeverity::Error,
                context,
                format!("low challenge {low} exceeds high challenge {high}"),
            );
        }
    }
}

fn check_refs<T: Category>(
    report: &mut ValidationReport,
    context: &str,
    refs: &[ProficiencyRef<T>],
    items: &[T::Item],
) {
    for id in unresolved(refs, items) {
        report.push(
            ValidationSeverity::Warning,
            context,
            format!("unresolved proficiency '{id}'"),
        );
    }
}

fn check_formulas(report: &mut ValidationReport, context: &str, formulas: &[String]) {
    for description in formulas {
        if let Err(err) = ModifierFormula::parse(description) {
            report.push(
                ValidationSeverity::Error,
                context,
                format!("challenge modifier '{description}': {err}"),
            );
        }
    }
}

fn check_levels(
    report: &mut ValidationReport,
    context: &str,
    levels: &LevelTable,
    compendium: &Compendium,
) {
    for (level, entry) in levels.entries() {
        let context = format!("{context}/level {level}");
        check_formulas(report, &context, &entry.challenge_modifiers);
        check_refs(report, &context, &entry.armor_proficiencies, &compendium.armors);
        for trait_id in &entry.traits {
            if compendium.trait_entry(trait_id).is_none() {
                report.push(
                    ValidationSeverity::Warning,
                    &context,
                    format!("unknown trait '{trait_id}'"),
                );
            }
        }
    }
}
