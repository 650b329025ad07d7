use std::fmt;

use serde::{Deserialize, Serialize};

const SOURCE_PREFIX: &str = "Production ";
const SOURCE_SUFFIX: &str = " (GWh)";

/// Markers that make a normalized label non-renewable. Anything else is renewable.
const NON_RENEWABLE_MARKERS: [&str; 4] = ["nucléaire", "thermique", "nuclear", "thermal"];

/// Energy production technology ("filière") reported in the regional production files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergySource {
    Nuclear,
    Thermal,
    Hydraulic,
    Wind,
    Solar,
    Bioenergy,
}

impl EnergySource {
    pub const ALL: [EnergySource; 6] = [
        EnergySource::Nuclear,
        EnergySource::Thermal,
        EnergySource::Hydraulic,
        EnergySource::Wind,
        EnergySource::Solar,
        EnergySource::Bioenergy,
    ];

    /// Header of the wide column carrying this source, in GWh.
    pub const fn raw_column(self) -> &'static str {
        match self {
            EnergySource::Nuclear => "Production nucléaire (GWh)",
            EnergySource::Thermal => "Production thermique (GWh)",
            EnergySource::Hydraulic => "Production hydraulique (GWh)",
            EnergySource::Wind => "Production éolienne (GWh)",
            EnergySource::Solar => "Production solaire (GWh)",
            EnergySource::Bioenergy => "Production bioénergies (GWh)",
        }
    }

    /// Label written to the `filiere` column; equals `normalize_label(self.raw_column())`.
    pub const fn label(self) -> &'static str {
        match self {
            EnergySource::Nuclear => "Nucléaire",
            EnergySource::Thermal => "Thermique",
            EnergySource::Hydraulic => "Hydraulique",
            EnergySource::Wind => "Éolienne",
            EnergySource::Solar => "Solaire",
            EnergySource::Bioenergy => "Bioénergies",
        }
    }

    pub const fn category(self) -> Category {
        match self {
            EnergySource::Nuclear | EnergySource::Thermal => Category::NonRenewable,
            EnergySource::Hydraulic
            | EnergySource::Wind
            | EnergySource::Solar
            | EnergySource::Bioenergy => Category::Renewable,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = normalize_label(label);
        Self::ALL
            .into_iter()
            .find(|source| source.label() == normalized)
    }
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Renewable,
    NonRenewable,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Renewable => "Renewable",
            Category::NonRenewable => "Non-Renewable",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a raw header such as `Production éolienne (GWh)` into `Éolienne`.
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = trimmed.strip_prefix(SOURCE_PREFIX).unwrap_or(trimmed);
    let bare = without_prefix
        .strip_suffix(SOURCE_SUFFIX)
        .unwrap_or(without_prefix);
    capitalize(bare)
}

/// Category of an arbitrary normalized label. Unknown sources default to renewable.
pub fn classify_label(label: &str) -> Category {
    let lowered = label.to_lowercase();
    if NON_RENEWABLE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        Category::NonRenewable
    } else {
        Category::Renewable
    }
}

/// Category of a `filiere` label: the known sources first, then the marker rule.
pub fn category_of(label: &str) -> Category {
    EnergySource::from_label(label)
        .map(EnergySource::category)
        .unwrap_or_else(|| classify_label(label))
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_normalized_raw_columns() {
        for source in EnergySource::ALL {
            assert_eq!(normalize_label(source.raw_column()), source.label());
        }
        assert_eq!(normalize_label("Production éolienne (GWh)"), "Éolienne");
        assert_eq!(normalize_label("Production solaire (GWh)"), "Solaire");
    }

    #[test]
    fn normalization_is_idempotent() {
        for source in EnergySource::ALL {
            let once = normalize_label(source.raw_column());
            assert_eq!(normalize_label(&once), once);
        }
        assert_eq!(normalize_label("SOLAIRE"), "Solaire");
    }

    #[test]
    fn explicit_mapping_agrees_with_label_rule() {
        for source in EnergySource::ALL {
            assert_eq!(classify_label(source.label()), source.category());
        }
    }

    #[test]
    fn unknown_sources_default_to_renewable() {
        assert_eq!(classify_label("Marémotrice"), Category::Renewable);
        assert_eq!(classify_label("Hydrogène"), Category::Renewable);
        assert_eq!(classify_label("THERMIQUE fossile"), Category::NonRenewable);
        assert_eq!(classify_label("Small nuclear reactors"), Category::NonRenewable);
    }

    #[test]
    fn known_sources_use_their_mapping_and_others_fall_back() {
        assert_eq!(category_of("Nucléaire"), Category::NonRenewable);
        assert_eq!(category_of("Production hydraulique (GWh)"), Category::Renewable);
        assert_eq!(category_of("Cogénération thermique"), Category::NonRenewable);
        assert_eq!(category_of("Géothermie"), Category::Renewable);
    }

    #[test]
    fn from_label_accepts_raw_and_normalized_forms() {
        assert_eq!(EnergySource::from_label("Éolienne"), Some(EnergySource::Wind));
        assert_eq!(
            EnergySource::from_label("Production bioénergies (GWh)"),
            Some(EnergySource::Bioenergy)
        );
        assert_eq!(EnergySource::from_label("Géothermie"), None);
    }
}
