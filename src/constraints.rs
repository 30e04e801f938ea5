// Copyright 2025 Cowboy AI, LLC.

//! Per-family parameter rules
//!
//! Each family has a table saying which parameters matter, their ranges and
//! defaults. Families only list what differs from the fallback table, and
//! lookups merge the two.

use crate::family::ProjectionFamily;
use crate::parameters::{ParameterKey, ParameterValue, ProjectionParameters};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Extra check run after range checks; returns an error message
pub type CustomValidator = fn(&ParameterValue) -> Option<String>;

/// Minimum spacing between conic standard parallels before warning
const MIN_PARALLEL_SPACING: f64 = 1.0;

/// Largest clip angle that keeps an azimuthal view on one hemisphere
const HEMISPHERE_CLIP_ANGLE: f64 = 90.0;

/// Rule for one parameter within one family
#[derive(Debug, Clone)]
pub struct ParameterConstraint {
    /// Whether the family uses the parameter at all
    pub relevant: bool,
    /// Whether leaving it unset deserves a warning
    pub required: bool,
    /// Inclusive lower bound for every component
    pub min: Option<f64>,
    /// Inclusive upper bound for every component
    pub max: Option<f64>,
    /// Editing step
    pub step: Option<f64>,
    /// Value used when unset
    pub default_value: Option<ParameterValue>,
    /// Extra check
    pub validator: Option<CustomValidator>,
    /// Hint attached to failures
    pub suggestion: Option<&'static str>,
}

impl ParameterConstraint {
    fn relevant() -> Self {
        Self {
            relevant: true,
            required: false,
            min: None,
            max: None,
            step: None,
            default_value: None,
            validator: None,
            suggestion: None,
        }
    }

    fn irrelevant(suggestion: &'static str) -> Self {
        Self {
            relevant: false,
            suggestion: Some(suggestion),
            ..Self::relevant()
        }
    }

    fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    fn default_value(mut self, value: ParameterValue) -> Self {
        self.default_value = Some(value);
        self
    }

    fn validator(mut self, validator: CustomValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Outcome of validating a single value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValidation {
    /// No error was found
    pub is_valid: bool,
    /// Why the value was rejected
    pub error: Option<String>,
    /// Accepted, but worth a look
    pub warning: Option<String>,
    /// Hint for fixing the problem
    pub suggestion: Option<String>,
}

impl ParameterValidation {
    fn ok() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    fn rejected(error: String, suggestion: Option<&str>) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
            warning: None,
            suggestion: suggestion.map(str::to_string),
        }
    }
}

/// One finding of a set validation
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterIssue {
    /// Parameter concerned
    pub key: ParameterKey,
    /// What is wrong
    pub message: String,
}

/// Outcome of validating a whole parameter set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSetValidation {
    /// No error was found; warnings do not count
    pub is_valid: bool,
    /// Rejected values
    pub errors: Vec<ParameterIssue>,
    /// Accepted values worth a look
    pub warnings: Vec<ParameterIssue>,
}

type ConstraintTable = IndexMap<ParameterKey, ParameterConstraint>;

/// Family-aware parameter rules
#[derive(Debug, Clone)]
pub struct ParameterConstraintsEngine {
    fallback: ConstraintTable,
    overrides: HashMap<ProjectionFamily, ConstraintTable>,
}

impl Default for ParameterConstraintsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterConstraintsEngine {
    /// Engine with the built-in tables
    pub fn new() -> Self {
        let mut overrides = HashMap::new();
        for family in ProjectionFamily::ALL {
            let table = family_overrides(family);
            if !table.is_empty() {
                overrides.insert(family, table);
            }
        }
        Self {
            fallback: fallback_table(),
            overrides,
        }
    }

    /// Full rule table for `family`
    pub fn get_constraints(&self, family: ProjectionFamily) -> ConstraintTable {
        let mut table = self.fallback.clone();
        if let Some(specific) = self.overrides.get(&family) {
            for (key, constraint) in specific {
                table.insert(*key, constraint.clone());
            }
        }
        table
    }

    /// Rule for one parameter
    pub fn constraint(&self, family: ProjectionFamily, key: ParameterKey) -> ParameterConstraint {
        self.overrides
            .get(&family)
            .and_then(|t| t.get(&key))
            .or_else(|| self.fallback.get(&key))
            .cloned()
            .unwrap_or_else(|| ParameterConstraint::irrelevant("unknown parameter"))
    }

    /// Whether `family` uses `key`
    pub fn is_relevant(&self, family: ProjectionFamily, key: ParameterKey) -> bool {
        self.constraint(family, key).relevant
    }

    /// Default value of `key` for `family`
    pub fn get_default(&self, family: ProjectionFamily, key: ParameterKey) -> Option<ParameterValue> {
        self.constraint(family, key).default_value
    }

    /// Keys `family` uses, in table order
    pub fn relevant_parameters(&self, family: ProjectionFamily) -> Vec<ParameterKey> {
        self.get_constraints(family)
            .into_iter()
            .filter(|(_, c)| c.relevant)
            .map(|(k, _)| k)
            .collect()
    }

    /// Check one value; an absent value always passes
    pub fn validate(
        &self,
        family: ProjectionFamily,
        key: ParameterKey,
        value: Option<&ParameterValue>,
    ) -> ParameterValidation {
        let Some(value) = value else {
            return ParameterValidation::ok();
        };
        let constraint = self.constraint(family, key);

        if !constraint.relevant {
            return ParameterValidation::rejected(
                format!("{key} is not used by {family} projections"),
                constraint.suggestion,
            );
        }

        let components = value.components();
        if components.len() != key.arity() {
            return ParameterValidation::rejected(
                format!(
                    "{key} expects {} value(s), got {}",
                    key.arity(),
                    components.len()
                ),
                constraint.suggestion,
            );
        }
        if components.iter().any(|c| !c.is_finite()) {
            return ParameterValidation::rejected(
                format!("{key} must be finite"),
                constraint.suggestion,
            );
        }
        if let Some(min) = constraint.min {
            if let Some(v) = components.iter().find(|c| **c < min) {
                return ParameterValidation::rejected(
                    format!("{key} value {v} is below the minimum {min}"),
                    constraint.suggestion,
                );
            }
        }
        if let Some(max) = constraint.max {
            if let Some(v) = components.iter().find(|c| **c > max) {
                return ParameterValidation::rejected(
                    format!("{key} value {v} is above the maximum {max}"),
                    constraint.suggestion,
                );
            }
        }
        if let Some(error) = constraint.validator.and_then(|check| check(value)) {
            return ParameterValidation::rejected(error, constraint.suggestion);
        }

        let mut result = ParameterValidation::ok();
        result.warning = value_warning(family, key, value);
        result
    }

    /// Check every set, relevant parameter plus cross-parameter rules
    ///
    /// Parameters a family does not use are skipped; they are not applied
    /// either.
    pub fn validate_set(
        &self,
        family: ProjectionFamily,
        parameters: &ProjectionParameters,
    ) -> ParameterSetValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for (key, constraint) in self.get_constraints(family) {
            if !constraint.relevant {
                continue;
            }
            match parameters.get(key) {
                Some(value) => {
                    let result = self.validate(family, key, Some(&value));
                    if let Some(message) = result.error {
                        errors.push(ParameterIssue { key, message });
                    }
                    if let Some(message) = result.warning {
                        warnings.push(ParameterIssue { key, message });
                    }
                }
                None if constraint.required => warnings.push(ParameterIssue {
                    key,
                    message: format!("{key} is not set; the projection's own default applies"),
                }),
                None => {}
            }
        }

        ParameterSetValidation {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

fn value_warning(
    family: ProjectionFamily,
    key: ParameterKey,
    value: &ParameterValue,
) -> Option<String> {
    match (family, key, value) {
        (ProjectionFamily::Conic, ParameterKey::Parallels, ParameterValue::Pair([a, b]))
            if (a - b).abs() < MIN_PARALLEL_SPACING =>
        {
            Some(format!(
                "parallels {a} and {b} are closer than {MIN_PARALLEL_SPACING}°; the cone is nearly degenerate"
            ))
        }
        (ProjectionFamily::Azimuthal, ParameterKey::ClipAngle, ParameterValue::Number(angle))
            if *angle > HEMISPHERE_CLIP_ANGLE =>
        {
            Some(format!(
                "clipAngle {angle}° shows more than a hemisphere and may distort heavily"
            ))
        }
        _ => None,
    }
}

fn rotate_range(value: &ParameterValue) -> Option<String> {
    match value {
        ParameterValue::Triple([lambda, phi, gamma]) => {
            if lambda.abs() > 360.0 || gamma.abs() > 360.0 {
                Some("rotate λ and γ must lie within [-360, 360]".to_string())
            } else if phi.abs() > 90.0 {
                Some("rotate φ must lie within [-90, 90]".to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn center_range(value: &ParameterValue) -> Option<String> {
    match value {
        ParameterValue::Pair([lon, lat]) => {
            if lon.abs() > 180.0 {
                Some("center longitude must lie within [-180, 180]".to_string())
            } else if lat.abs() > 90.0 {
                Some("center latitude must lie within [-90, 90]".to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn strictly_positive(value: &ParameterValue) -> Option<String> {
    match value {
        ParameterValue::Number(n) if *n <= 0.0 => {
            Some("scaleMultiplier must be greater than 0".to_string())
        }
        _ => None,
    }
}

fn fallback_table() -> ConstraintTable {
    IndexMap::from([
        (
            ParameterKey::Rotate,
            ParameterConstraint::relevant()
                .step(0.1)
                .default_value(ParameterValue::Triple([0.0, 0.0, 0.0]))
                .validator(rotate_range),
        ),
        (
            ParameterKey::Center,
            ParameterConstraint::irrelevant("position this family with rotate"),
        ),
        (
            ParameterKey::Parallels,
            ParameterConstraint::irrelevant("standard parallels only apply to conic projections"),
        ),
        (
            ParameterKey::ScaleMultiplier,
            ParameterConstraint::relevant()
                .range(0.0, 100.0)
                .step(0.01)
                .default_value(ParameterValue::Number(1.0))
                .validator(strictly_positive),
        ),
        (
            ParameterKey::ClipAngle,
            ParameterConstraint::irrelevant("clipAngle only applies to azimuthal projections"),
        ),
        (
            ParameterKey::Distance,
            ParameterConstraint::irrelevant("distance only applies to azimuthal projections"),
        ),
        (
            ParameterKey::Tilt,
            ParameterConstraint::irrelevant("tilt only applies to azimuthal projections"),
        ),
        (
            ParameterKey::Precision,
            ParameterConstraint::relevant()
                .range(0.0, 10.0)
                .step(0.01)
                .default_value(ParameterValue::Number(0.1)),
        ),
    ])
}

fn center_positioned() -> ConstraintTable {
    IndexMap::from([
        (
            ParameterKey::Center,
            ParameterConstraint::relevant()
                .step(0.1)
                .default_value(ParameterValue::Pair([0.0, 0.0]))
                .validator(center_range),
        ),
        (
            ParameterKey::Rotate,
            ParameterConstraint::irrelevant("position this family with center"),
        ),
    ])
}

fn family_overrides(family: ProjectionFamily) -> ConstraintTable {
    match family {
        ProjectionFamily::Cylindrical | ProjectionFamily::Pseudocylindrical => center_positioned(),
        ProjectionFamily::Conic => IndexMap::from([(
            ParameterKey::Parallels,
            ParameterConstraint::relevant()
                .required()
                .range(-90.0, 90.0)
                .step(0.5)
                .default_value(ParameterValue::Pair([30.0, 50.0])),
        )]),
        ProjectionFamily::Azimuthal => IndexMap::from([
            (
                ParameterKey::ClipAngle,
                ParameterConstraint::relevant().range(0.0, 180.0).step(1.0),
            ),
            (
                ParameterKey::Distance,
                ParameterConstraint::relevant().range(1.0, 100.0).step(0.1),
            ),
            (
                ParameterKey::Tilt,
                ParameterConstraint::relevant().range(-90.0, 90.0).step(1.0),
            ),
        ]),
        ProjectionFamily::Composite => IndexMap::from([
            (
                ParameterKey::Rotate,
                ParameterConstraint::irrelevant("composite projections position their own parts"),
            ),
            (
                ParameterKey::Center,
                ParameterConstraint::irrelevant("composite projections position their own parts"),
            ),
        ]),
        ProjectionFamily::Polyhedral | ProjectionFamily::Other => IndexMap::new(),
    }
}
