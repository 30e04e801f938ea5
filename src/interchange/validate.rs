// Copyright 2025 Cowboy AI, LLC.

//! Ingest validation of interchange documents
//!
//! Validation runs on the raw JSON value rather than on
//! [`super::ExportedConfiguration`], so a document missing a field is
//! reported field by field instead of failing on the first serde error.
//! Structural problems are errors and block an import. Unknown projections,
//! odd-looking bounds and parameter constraint findings are warnings only.

use super::document::CompositionPattern;
use crate::constraints::ParameterConstraintsEngine;
use crate::family::{InterchangeFamily, ProjectionFamily};
use crate::geometry::GeoBounds;
use crate::parameters::{ParameterKey, ProjectionParameters};
use crate::registry::ProjectionRegistry;
use crate::settings::EngineSettings;
use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Kind of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    /// Major version outside the accepted range
    VersionUnsupported,
    /// Required field absent
    MissingField,
    /// Field present with an unusable value
    InvalidValue,
    /// Projection id not in the registry
    UnknownProjection,
    /// Bounds malformed or off the globe
    InvalidBounds,
    /// Parameter outside its family's constraints
    ParameterConstraint,
}

impl IssueCode {
    /// Code as written in reports
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::VersionUnsupported => "VERSION_UNSUPPORTED",
            IssueCode::MissingField => "MISSING_FIELD",
            IssueCode::InvalidValue => "INVALID_VALUE",
            IssueCode::UnknownProjection => "UNKNOWN_PROJECTION",
            IssueCode::InvalidBounds => "INVALID_BOUNDS",
            IssueCode::ParameterConstraint => "PARAMETER_CONSTRAINT",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding, located by a dotted path such as `territories[2].layout`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Kind
    pub code: IssueCode,
    /// Location in the document
    pub path: String,
    /// Human readable detail
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.code, self.path, self.message)
    }
}

/// Every finding on a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// No errors; warnings do not count
    pub valid: bool,
    /// Findings that block an import
    pub errors: Vec<ValidationIssue>,
    /// Findings an import carries through
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether some error has this code
    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }

    /// Whether some warning has this code
    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|issue| issue.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "valid with {} warning(s)", self.warnings.len());
        }
        let errors: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&errors.join("; "))
    }
}

#[derive(Default)]
struct Findings {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Findings {
    fn error(&mut self, code: IssueCode, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            code,
            path: path.into(),
            message: message.into(),
        });
    }

    fn warning(&mut self, code: IssueCode, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            code,
            path: path.into(),
            message: message.into(),
        });
    }

    fn missing(&mut self, path: impl Into<String>) {
        let path = path.into();
        let message = format!("{path} is required");
        self.error(IssueCode::MissingField, path, message);
    }

    fn into_report(self) -> ValidationReport {
        ValidationReport {
            valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

/// Major component of a `major.minor` version string
pub(crate) fn major_version(version: &str) -> Option<u32> {
    version.trim().split('.').next()?.parse().ok()
}

/// Exactly `N` numbers
pub(crate) fn numbers<const N: usize>(value: &Value) -> Option<[f64; N]> {
    let items = value.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(out)
}

/// `[[minLon, minLat], [maxLon, maxLat]]`, if shaped that way
pub(crate) fn parse_bounds(value: &Value) -> Option<[[f64; 2]; 2]> {
    let corners = value.as_array()?;
    if corners.len() != 2 {
        return None;
    }
    Some([numbers(&corners[0])?, numbers(&corners[1])?])
}

fn present<'v>(object: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    object.get(key).filter(|v| !v.is_null())
}

/// Checks a document against the registry, the constraint tables and the
/// accepted version range
#[derive(Debug, Clone, Copy)]
pub struct DocumentValidator<'a> {
    registry: &'a ProjectionRegistry,
    constraints: &'a ParameterConstraintsEngine,
    settings: &'a EngineSettings,
}

impl<'a> DocumentValidator<'a> {
    /// Validator over the given registry, constraints and settings
    pub fn new(
        registry: &'a ProjectionRegistry,
        constraints: &'a ParameterConstraintsEngine,
        settings: &'a EngineSettings,
    ) -> Self {
        Self {
            registry,
            constraints,
            settings,
        }
    }

    /// Validate a document
    ///
    /// An unsupported major version stops validation: the report then holds
    /// that single error and nothing else.
    pub fn validate(&self, document: &Value) -> ValidationReport {
        let mut findings = Findings::default();

        let Some(root) = document.as_object() else {
            findings.error(IssueCode::InvalidValue, "$", "document must be a JSON object");
            return findings.into_report();
        };

        if let Some(unsupported) = self.check_version(root, &mut findings) {
            return ValidationReport {
                valid: false,
                errors: vec![unsupported],
                warnings: Vec::new(),
            };
        }

        Self::check_metadata(root, &mut findings);
        Self::check_pattern(root, &mut findings);
        Self::check_scale_and_canvas(root, &mut findings);

        match present(root, "territories") {
            None => findings.missing("territories"),
            Some(Value::Array(territories)) if territories.is_empty() => findings.error(
                IssueCode::InvalidValue,
                "territories",
                "at least one territory is required",
            ),
            Some(Value::Array(territories)) => {
                let mut seen = HashSet::new();
                for (i, territory) in territories.iter().enumerate() {
                    self.check_territory(i, territory, &mut seen, &mut findings);
                }
            }
            Some(_) => findings.error(
                IssueCode::InvalidValue,
                "territories",
                "territories must be an array",
            ),
        }

        findings.into_report()
    }

    /// Returns the error when the major version is unsupported
    fn check_version(
        &self,
        root: &Map<String, Value>,
        findings: &mut Findings,
    ) -> Option<ValidationIssue> {
        let version = match present(root, "version") {
            None => {
                findings.missing("version");
                return None;
            }
            Some(Value::String(version)) => version,
            Some(_) => {
                findings.error(IssueCode::InvalidValue, "version", "version must be a string");
                return None;
            }
        };

        let Some(major) = major_version(version) else {
            findings.error(
                IssueCode::InvalidValue,
                "version",
                format!("version {version:?} is not of the form major.minor"),
            );
            return None;
        };

        let newest = major_version(&self.settings.format_version)
            .unwrap_or(self.settings.min_supported_major);
        if major < self.settings.min_supported_major || major > newest {
            return Some(ValidationIssue {
                code: IssueCode::VersionUnsupported,
                path: "version".to_string(),
                message: format!(
                    "version {version} is not supported; accepted major versions are {} to {newest}",
                    self.settings.min_supported_major
                ),
            });
        }
        None
    }

    fn check_metadata(root: &Map<String, Value>, findings: &mut Findings) {
        let Some(metadata) = present(root, "metadata") else {
            findings.missing("metadata");
            findings.missing("metadata.atlasId");
            return;
        };
        let Some(metadata) = metadata.as_object() else {
            findings.error(IssueCode::InvalidValue, "metadata", "metadata must be an object");
            return;
        };

        match present(metadata, "atlasId") {
            Some(Value::String(id)) if !id.trim().is_empty() => {}
            Some(Value::String(_)) | None => findings.missing("metadata.atlasId"),
            Some(_) => findings.error(
                IssueCode::InvalidValue,
                "metadata.atlasId",
                "atlasId must be a string",
            ),
        }

        for key in ["atlasName", "createdWith", "notes"] {
            if present(metadata, key).is_some_and(|v| !v.is_string()) {
                findings.error(
                    IssueCode::InvalidValue,
                    format!("metadata.{key}"),
                    format!("{key} must be a string"),
                );
            }
        }

        if let Some(date) = present(metadata, "exportDate") {
            let parses = date
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok());
            if !parses {
                findings.error(
                    IssueCode::InvalidValue,
                    "metadata.exportDate",
                    "exportDate must be an RFC 3339 timestamp",
                );
            }
        }
    }

    fn check_pattern(root: &Map<String, Value>, findings: &mut Findings) {
        match present(root, "pattern") {
            None => findings.missing("pattern"),
            Some(Value::String(pattern)) if CompositionPattern::NAMES.contains(&pattern.as_str()) => {}
            Some(other) => findings.error(
                IssueCode::InvalidValue,
                "pattern",
                format!(
                    "pattern {other} is not one of {}",
                    CompositionPattern::NAMES.join(", ")
                ),
            ),
        }
    }

    fn check_scale_and_canvas(root: &Map<String, Value>, findings: &mut Findings) {
        match present(root, "referenceScale") {
            None => findings.missing("referenceScale"),
            Some(scale) => {
                if !scale.as_f64().is_some_and(|s| s > 0.0) {
                    findings.error(
                        IssueCode::InvalidValue,
                        "referenceScale",
                        format!("referenceScale must be a positive number, got {scale}"),
                    );
                }
            }
        }

        let Some(canvas) = present(root, "canvasDimensions") else {
            findings.missing("canvasDimensions");
            return;
        };
        let Some(canvas) = canvas.as_object() else {
            findings.error(
                IssueCode::InvalidValue,
                "canvasDimensions",
                "canvasDimensions must be an object",
            );
            return;
        };
        for side in ["width", "height"] {
            let path = format!("canvasDimensions.{side}");
            match present(canvas, side) {
                None => findings.missing(path),
                Some(value) if value.as_f64().is_some_and(|v| v > 0.0) => {}
                Some(value) => findings.error(
                    IssueCode::InvalidValue,
                    path,
                    format!("{side} must be a positive number, got {value}"),
                ),
            }
        }
    }

    fn check_territory(
        &self,
        index: usize,
        territory: &Value,
        seen: &mut HashSet<String>,
        findings: &mut Findings,
    ) {
        let base = format!("territories[{index}]");
        let Some(territory) = territory.as_object() else {
            findings.error(IssueCode::InvalidValue, base, "territory must be an object");
            return;
        };

        match present(territory, "code") {
            Some(Value::String(code)) if !code.trim().is_empty() => {
                if !seen.insert(code.clone()) {
                    findings.error(
                        IssueCode::InvalidValue,
                        format!("{base}.code"),
                        format!("duplicate territory code {code}"),
                    );
                }
            }
            Some(Value::String(_)) | None => findings.missing(format!("{base}.code")),
            Some(_) => findings.error(
                IssueCode::InvalidValue,
                format!("{base}.code"),
                "code must be a string",
            ),
        }

        if present(territory, "name").is_some_and(|v| !v.is_string()) {
            findings.error(IssueCode::InvalidValue, format!("{base}.name"), "name must be a string");
        }

        match present(territory, "role") {
            None => findings.missing(format!("{base}.role")),
            Some(Value::String(role)) if matches!(role.as_str(), "primary" | "secondary" | "member") => {}
            Some(other) => findings.error(
                IssueCode::InvalidValue,
                format!("{base}.role"),
                format!("role {other} is not one of primary, secondary, member"),
            ),
        }

        self.check_projection(&base, territory, findings);
        Self::check_layout(&base, territory, findings);

        if let Some(bounds) = present(territory, "bounds") {
            let path = format!("{base}.bounds");
            match parse_bounds(bounds) {
                None => findings.warning(
                    IssueCode::InvalidBounds,
                    path,
                    "bounds must be [[minLon, minLat], [maxLon, maxLat]]; they will be ignored",
                ),
                Some(corners) if !GeoBounds::from(corners).is_well_formed() => findings.warning(
                    IssueCode::InvalidBounds,
                    path,
                    format!(
                        "bounds {corners:?} need min below max, longitudes within ±180 and latitudes within ±90"
                    ),
                ),
                Some(_) => {}
            }
        }
    }

    fn check_projection(&self, base: &str, territory: &Map<String, Value>, findings: &mut Findings) {
        let path = format!("{base}.projection");
        let Some(projection) = present(territory, "projection") else {
            findings.missing(format!("{path}.id"));
            return;
        };
        let Some(projection) = projection.as_object() else {
            findings.error(IssueCode::InvalidValue, path, "projection must be an object");
            return;
        };

        let id = match present(projection, "id") {
            Some(Value::String(id)) if !id.trim().is_empty() => Some(id.as_str()),
            Some(Value::String(_)) | None => {
                findings.missing(format!("{path}.id"));
                None
            }
            Some(_) => {
                findings.error(IssueCode::InvalidValue, format!("{path}.id"), "id must be a string");
                None
            }
        };

        let declared = match present(projection, "family") {
            None => {
                findings.missing(format!("{path}.family"));
                None
            }
            Some(family) => match serde_json::from_value::<InterchangeFamily>(family.clone()) {
                Ok(family) => Some(ProjectionFamily::from(family)),
                Err(_) => {
                    findings.error(
                        IssueCode::InvalidValue,
                        format!("{path}.family"),
                        format!(
                            "family {family} is not one of {}",
                            InterchangeFamily::NAMES.join(", ")
                        ),
                    );
                    None
                }
            },
        };

        if let Some(id) = id {
            if !self.registry.contains(id) {
                findings.warning(
                    IssueCode::UnknownProjection,
                    format!("{path}.id"),
                    format!("projection {id} is not registered; a default of its family will be used"),
                );
            }
        }

        let Some(parameters) = present(projection, "parameters") else {
            return;
        };
        let parameters_path = format!("{path}.parameters");
        let parameters: ProjectionParameters = match serde_json::from_value(parameters.clone()) {
            Ok(parameters) => parameters,
            Err(err) => {
                findings.error(IssueCode::InvalidValue, parameters_path, err.to_string());
                return;
            }
        };

        let bad_multiplier = parameters
            .scale_multiplier
            .is_some_and(|m| !(m.is_finite() && m > 0.0));
        if bad_multiplier {
            findings.error(
                IssueCode::InvalidValue,
                format!("{parameters_path}.scaleMultiplier"),
                "scaleMultiplier must be strictly positive",
            );
        }

        let family = id.and_then(|id| self.registry.family_of(id)).or(declared);
        if let Some(family) = family {
            let result = self.constraints.validate_set(family, &parameters);
            let issues = result
                .errors
                .into_iter()
                .filter(|issue| !(bad_multiplier && issue.key == ParameterKey::ScaleMultiplier))
                .chain(result.warnings);
            for issue in issues {
                findings.warning(
                    IssueCode::ParameterConstraint,
                    format!("{parameters_path}.{}", issue.key),
                    issue.message,
                );
            }
        }
    }

    fn check_layout(base: &str, territory: &Map<String, Value>, findings: &mut Findings) {
        let path = format!("{base}.layout");
        let Some(layout) = present(territory, "layout") else {
            findings.missing(format!("{path}.translateOffset"));
            findings.missing(format!("{path}.pixelClipExtent"));
            return;
        };
        let Some(layout) = layout.as_object() else {
            findings.error(IssueCode::InvalidValue, path, "layout must be an object");
            return;
        };

        match present(layout, "translateOffset") {
            None => findings.missing(format!("{path}.translateOffset")),
            Some(offset) if numbers::<2>(offset).is_some() => {}
            Some(offset) => findings.error(
                IssueCode::InvalidValue,
                format!("{path}.translateOffset"),
                format!("translateOffset must hold 2 numbers, got {offset}"),
            ),
        }

        // The key must exist; `null` means no inset.
        match layout.get("pixelClipExtent") {
            None => findings.missing(format!("{path}.pixelClipExtent")),
            Some(Value::Null) => {}
            Some(extent) if numbers::<4>(extent).is_some() => {}
            Some(extent) => {
                let found = extent
                    .as_array()
                    .map_or_else(|| extent.to_string(), |items| format!("{} values", items.len()));
                findings.error(
                    IssueCode::InvalidValue,
                    format!("{path}.pixelClipExtent"),
                    format!("pixelClipExtent must hold 4 numbers or be null, got {found}"),
                );
            }
        }
    }
}
