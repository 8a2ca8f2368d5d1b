//! Header normalization and canonical column mapping
//!
//! Tracker spreadsheet exports use Dutch display headers with unstable
//! spelling and encoding ("Gem. HS", "Calorieën", stray `Â®` artifacts,
//! non-breaking spaces). This module cleans raw headers and resolves them
//! onto the closed set of canonical fields, reporting unresolved required
//! fields back to the caller instead of guessing. Matching is pure; the
//! caller decides how to prompt for manual overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mis-encoding artifacts stripped from headers wherever they appear.
const HEADER_ARTIFACTS: [&str; 3] = ["Â®", "®", "\u{a0}"];

/// Closed set of canonical activity fields.
///
/// Every heterogeneous source schema is mapped onto these names; there is
/// no dynamic field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Date,
    ActivityType,
    Title,
    DistanceKm,
    CaloriesKcal,
    DurationRaw,
    AvgHeartRate,
    MaxHeartRate,
    AvgCadence,
    MaxCadence,
    AvgPaceRaw,
    BestPaceRaw,
    ElevationGainM,
    ElevationLossM,
    Steps,
}

/// Static description of one canonical field: its snake_case name, the
/// display header it maps from, alias keys in priority order, and whether
/// row conversion can proceed without it.
struct FieldSpec {
    field: CanonicalField,
    name: &'static str,
    display: &'static str,
    aliases: &'static [&'static str],
    required: bool,
}

/// Declared field table. Alias keys are pre-normalized (lowercase,
/// alphanumeric only); the first matching alias wins, no scoring.
static FIELD_SPECS: [FieldSpec; 15] = [
    FieldSpec {
        field: CanonicalField::Date,
        name: "date",
        display: "Datum",
        aliases: &["datum", "date", "datumtijd"],
        required: true,
    },
    FieldSpec {
        field: CanonicalField::ActivityType,
        name: "activity_type",
        display: "Activiteittype",
        aliases: &["activiteittype", "activitytype", "activiteit", "type"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::Title,
        name: "title",
        display: "Titel",
        aliases: &["titel", "title", "naam"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::DistanceKm,
        name: "distance_km",
        display: "Afstand",
        aliases: &["afstand", "afstandkm", "distance", "distancekm"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::CaloriesKcal,
        name: "calories_kcal",
        display: "Calorieën",
        aliases: &["calorieen", "calorieën", "calories", "kcal"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::DurationRaw,
        name: "duration_raw",
        display: "Tijd",
        aliases: &["tijd", "duur", "time", "duration"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::AvgHeartRate,
        name: "avg_heart_rate_bpm",
        display: "Gem. HS",
        aliases: &["gemhs", "gemiddeldehs", "gemiddeldehartslag", "avghr", "averageheartrate"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::MaxHeartRate,
        name: "max_heart_rate_bpm",
        display: "Max. HS",
        aliases: &["maxhs", "maximalehs", "maximalehartslag", "maxhr", "maxheartrate"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::AvgCadence,
        name: "avg_cadence",
        display: "Gem. cadans",
        aliases: &["gemcadans", "gemiddeldecadans", "avgcadence"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::MaxCadence,
        name: "max_cadence",
        display: "Maximale cadans",
        aliases: &["maximalecadans", "maxcadans", "maxcadence"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::AvgPaceRaw,
        name: "avg_pace_raw",
        display: "Gemiddeld tempo",
        aliases: &["gemiddeldtempo", "gemtempo", "avgpace", "averagepace"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::BestPaceRaw,
        name: "best_pace_raw",
        display: "Beste tempo",
        aliases: &["bestetempo", "besttempo", "bestpace"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::ElevationGainM,
        name: "elevation_gain_m",
        display: "Totale stijging",
        aliases: &["totalestijging", "stijging", "totalascent", "elevationgain"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::ElevationLossM,
        name: "elevation_loss_m",
        display: "Totale daling",
        aliases: &["totaledaling", "daling", "totaldescent", "elevationloss"],
        required: false,
    },
    FieldSpec {
        field: CanonicalField::Steps,
        name: "steps",
        display: "Stappen",
        aliases: &["stappen", "steps"],
        required: false,
    },
];

impl CanonicalField {
    /// Canonical snake_case name, used in exports, CLI overrides, and
    /// missing-column reports.
    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Source display header this field maps from by default.
    pub fn display_name(&self) -> &'static str {
        self.spec().display
    }

    /// Whether row conversion is blocked while this field is unresolved.
    pub fn is_required(&self) -> bool {
        self.spec().required
    }

    /// All canonical fields in declared order.
    pub fn all() -> impl Iterator<Item = CanonicalField> {
        FIELD_SPECS.iter().map(|spec| spec.field)
    }

    /// Resolve a canonical snake_case name back to its field.
    pub fn from_name(name: &str) -> Option<CanonicalField> {
        FIELD_SPECS
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.field)
    }

    fn spec(&self) -> &'static FieldSpec {
        FIELD_SPECS
            .iter()
            .find(|spec| spec.field == *self)
            .unwrap_or(&FIELD_SPECS[0])
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strip whitespace and known mis-encoding artifacts from a raw header.
pub fn clean_header(raw: &str) -> String {
    let mut cleaned = raw.to_string();
    for artifact in HEADER_ARTIFACTS {
        cleaned = cleaned.replace(artifact, "");
    }
    cleaned.trim().to_string()
}

/// Collapse a header to its match key: cleaned, lowercased, alphanumeric
/// characters only. `"Gem. HS"` and `"gem hs"` both become `"gemhs"`.
pub fn normalize_key(raw: &str) -> String {
    clean_header(raw)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Resolved mapping from canonical fields to raw source headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    entries: BTreeMap<CanonicalField, String>,
}

impl FieldMapping {
    /// Raw header resolved for a field, if any.
    pub fn header_for(&self, field: CanonicalField) -> Option<&str> {
        self.entries.get(&field).map(String::as_str)
    }

    /// Install or replace a single field's source header. Used for
    /// user-supplied overrides when automatic matching came up short.
    pub fn with_override(mut self, field: CanonicalField, header: impl Into<String>) -> Self {
        self.entries.insert(field, header.into());
        self
    }

    /// Required fields that still have no resolved source header.
    pub fn unresolved_required(&self) -> Vec<CanonicalField> {
        CanonicalField::all()
            .filter(|f| f.is_required() && !self.entries.contains_key(f))
            .collect()
    }

    /// Number of resolved fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable text form of this mapping, folded into the session input
    /// fingerprint so a mapping change invalidates cached results.
    pub fn fingerprint(&self) -> String {
        let mut parts: Vec<String> = self
            .entries
            .iter()
            .map(|(field, header)| format!("{}={}", field.name(), header))
            .collect();
        parts.sort();
        parts.join(";")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalField, &String)> {
        self.entries.iter()
    }
}

/// Result of automatic header matching: the resolved mapping plus the
/// required fields the matcher could not place.
#[derive(Debug, Clone, Default)]
pub struct MappingOutcome {
    pub mapping: FieldMapping,
    pub unresolved: Vec<CanonicalField>,
}

impl MappingOutcome {
    /// True when every required field resolved to a source header.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Match a file's raw headers onto the canonical field set.
///
/// For each canonical field: first an exact case/punctuation-insensitive
/// match against the display-name table, then the field's alias list in
/// declared priority order. The first header matching wins; unmatched
/// required fields are reported in `unresolved`, never guessed.
pub fn build_mapping(headers: &[String]) -> MappingOutcome {
    let keyed: Vec<(String, &String)> = headers
        .iter()
        .map(|h| (normalize_key(h), h))
        .collect();

    let mut mapping = FieldMapping::default();
    for spec in &FIELD_SPECS {
        let display_key = normalize_key(spec.display);

        let exact = keyed.iter().find(|(key, _)| *key == display_key);
        let resolved = exact.or_else(|| {
            spec.aliases.iter().find_map(|alias| {
                keyed.iter().find(|(key, _)| key == alias)
            })
        });

        if let Some((_, header)) = resolved {
            mapping.entries.insert(spec.field, (*header).clone());
        }
    }

    let unresolved = mapping.unresolved_required();
    MappingOutcome { mapping, unresolved }
}
