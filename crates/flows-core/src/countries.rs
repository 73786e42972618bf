//! Country-label normalization for geocoding.
//!
//! UNHCR tables use abbreviated or official-style country names
//! (`"Syrian Arab Rep."`, `"Iran (Islamic Rep. of)"`) that geocoders do not
//! resolve. [`normalize_country`] maps them onto common names, drops labels
//! that do not denote a place (`"Stateless"`, `"Various/Unknown"`), and passes
//! everything else through untouched.

use serde::Serialize;

// ── Lookup tables ─────────────────────────────────────────────────────────────

/// Labels that cannot be geocoded and always normalize to `None`.
///
/// `"Palestinian"` also appears in [`COUNTRY_ALIASES`]; exclusion wins.
pub const EXCLUDED_ENTRIES: &[&str] = &[
    "Various/Unknown",
    "Various/unknown",
    "Stateless",
    "Tibetan",
    "Palestinian",
];

/// UNHCR label → canonical geocodable name.
pub const COUNTRY_ALIASES: &[(&str, &str)] = &[
    // Long official names.
    ("Syrian Arab Rep.", "Syria"),
    ("Iran (Islamic Rep. of)", "Iran"),
    ("Dem. Rep. of the Congo", "Democratic Republic of the Congo"),
    ("Central African Rep.", "Central African Republic"),
    ("Lao People's Dem. Rep.", "Laos"),
    ("Dem. People's Rep. of Korea", "North Korea"),
    ("Rep. of Korea", "South Korea"),
    ("Rep. of Moldova", "Moldova"),
    ("Dominican Rep.", "Dominican Republic"),
    ("United Rep. of Tanzania", "Tanzania"),
    ("Czech Rep.", "Czech Republic"),
    ("Bolivia (Plurinational State of)", "Bolivia"),
    ("Venezuela (Bolivarian Republic of)", "Venezuela"),
    ("Micronesia (Federated States of)", "Micronesia"),
    // Serbia and Kosovo.
    ("Serbia and Kosovo (S/RES/1244 (1999))", "Serbia"),
    ("Serbia and Kosovo: S/RES/1244 (1999)", "Serbia"),
    // Macedonia.
    ("The former Yugoslav Rep. of Macedonia", "North Macedonia"),
    ("The former Yugoslav Republic of Macedonia", "North Macedonia"),
    ("Viet Nam", "Vietnam"),
    // Special administrative regions.
    ("China, Hong Kong SAR", "Hong Kong"),
    ("China, Macao SAR", "Macau"),
    ("United Kingdom of Great Britain and Northern Ireland", "United Kingdom"),
    // US reporting agencies.
    ("USA (EOIR)", "United States"),
    ("USA (INS/DHS)", "United States"),
    ("United States of America", "United States"),
    ("Côte d'Ivoire", "Ivory Coast"),
    ("Swaziland", "Eswatini"),
    ("Cabo Verde", "Cape Verde"),
    // Republic of the Congo, not the DRC.
    ("Congo", "Republic of the Congo"),
    ("State of Palestine", "Palestine"),
    ("Palestinian", "Palestine"),
    ("Holy See (the)", "Vatican City"),
    // Territories and dependencies.
    ("Wallis and Futuna Islands", "Wallis and Futuna"),
    ("Svalbard and Jan Mayen", "Svalbard"),
    ("Saint-Pierre-et-Miquelon", "Saint Pierre and Miquelon"),
    ("Sint Maarten (Dutch part)", "Sint Maarten"),
    ("Brunei Darussalam", "Brunei"),
    ("Timor-Leste", "East Timor"),
    ("Gambia", "The Gambia"),
];

/// Names that geocoders already resolve as written.
pub const CANONICAL_COUNTRIES: &[&str] = &[
    "Afghanistan", "Albania", "Algeria", "Andorra", "Angola",
    "Antigua and Barbuda", "Argentina", "Armenia", "Australia", "Austria",
    "Azerbaijan", "Bahamas", "Bahrain", "Bangladesh", "Barbados",
    "Belarus", "Belgium", "Belize", "Benin", "Bhutan",
    "Bosnia and Herzegovina", "Botswana", "Brazil", "Bulgaria", "Burkina Faso",
    "Burundi", "Cambodia", "Cameroon", "Canada", "Chad",
    "Chile", "China", "Colombia", "Comoros", "Costa Rica",
    "Croatia", "Cuba", "Cyprus", "Denmark", "Djibouti",
    "Dominica", "Ecuador", "Egypt", "El Salvador", "Equatorial Guinea",
    "Eritrea", "Estonia", "Ethiopia", "Fiji", "Finland",
    "France", "Gabon", "Georgia", "Germany", "Ghana",
    "Greece", "Grenada", "Guatemala", "Guinea", "Guinea-Bissau",
    "Guyana", "Haiti", "Honduras", "Hungary", "Iceland",
    "India", "Indonesia", "Iraq", "Ireland", "Israel",
    "Italy", "Jamaica", "Japan", "Jordan", "Kazakhstan",
    "Kenya", "Kiribati", "Kuwait", "Kyrgyzstan", "Latvia",
    "Lebanon", "Lesotho", "Liberia", "Libya", "Liechtenstein",
    "Lithuania", "Luxembourg", "Madagascar", "Malawi", "Malaysia",
    "Maldives", "Mali", "Malta", "Mauritania", "Mauritius",
    "Mexico", "Monaco", "Mongolia", "Montenegro", "Morocco",
    "Mozambique", "Myanmar", "Namibia", "Nauru", "Nepal",
    "Netherlands", "New Zealand", "Nicaragua", "Niger", "Nigeria",
    "Norway", "Oman", "Pakistan", "Palau", "Panama",
    "Papua New Guinea", "Paraguay", "Peru", "Philippines", "Poland",
    "Portugal", "Qatar", "Romania", "Rwanda", "Samoa",
    "San Marino", "Sao Tome and Principe", "Saudi Arabia", "Senegal", "Seychelles",
    "Sierra Leone", "Singapore", "Slovakia", "Slovenia", "Solomon Islands",
    "Somalia", "South Africa", "South Sudan", "Spain", "Sri Lanka",
    "Sudan", "Suriname", "Sweden", "Switzerland", "Tajikistan",
    "Thailand", "Togo", "Tonga", "Trinidad and Tobago", "Tunisia",
    "Turkey", "Turkmenistan", "Tuvalu", "Uganda", "Ukraine",
    "United Arab Emirates", "United Kingdom", "Uruguay", "Uzbekistan", "Vanuatu",
    "Yemen", "Zambia", "Zimbabwe",
    // Territories.
    "Aruba", "Bermuda", "Gibraltar", "Guadeloupe", "Martinique",
    "French Guiana", "French Polynesia", "New Caledonia", "Puerto Rico",
    "American Samoa", "Anguilla", "Cayman Islands", "Cook Islands",
    "Marshall Islands", "Montserrat", "Niue", "Norfolk Island",
    "Turks and Caicos Islands", "British Virgin Islands", "Bonaire",
    "Curaçao", "Western Sahara",
];

// ── Classification ────────────────────────────────────────────────────────────

/// Which branch of the normalizer a raw label falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryClass {
    /// Empty or whitespace-only.
    Blank,
    /// Listed in [`EXCLUDED_ENTRIES`].
    Excluded,
    /// Has an entry in [`COUNTRY_ALIASES`].
    Mapped,
    /// Already one of [`CANONICAL_COUNTRIES`].
    Canonical,
    /// Unknown label returned unchanged; geocoding may fail.
    Passthrough,
}

/// Classify `raw` without allocating.
pub fn classify(raw: &str) -> CountryClass {
    let name = raw.trim();
    if name.is_empty() {
        CountryClass::Blank
    } else if is_excluded(name) {
        CountryClass::Excluded
    } else if is_aliased(name) {
        CountryClass::Mapped
    } else if is_canonical(name) {
        CountryClass::Canonical
    } else {
        CountryClass::Passthrough
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalize a UNHCR country label for geocoding.
///
/// Returns `None` for blank input and for excluded labels. Aliased labels map
/// to their canonical name; anything else is returned trimmed.
///
/// # Examples
///
/// ```
/// use flows_core::countries::normalize_country;
///
/// assert_eq!(normalize_country("Syrian Arab Rep.").as_deref(), Some("Syria"));
/// assert_eq!(normalize_country("  Germany ").as_deref(), Some("Germany"));
/// assert_eq!(normalize_country("Stateless"), None);
/// assert_eq!(normalize_country("   "), None);
/// ```
pub fn normalize_country(raw: &str) -> Option<String> {
    let name = raw.trim();
    match classify(name) {
        CountryClass::Blank | CountryClass::Excluded => None,
        CountryClass::Mapped => alias_for(name).map(str::to_string),
        CountryClass::Canonical | CountryClass::Passthrough => Some(name.to_string()),
    }
}

/// `true` unless [`normalize_country`] would return `None`.
pub fn is_geocodable(raw: &str) -> bool {
    !matches!(classify(raw), CountryClass::Blank | CountryClass::Excluded)
}

/// Canonical name for an aliased label, if any.
pub fn alias_for(name: &str) -> Option<&'static str> {
    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
}

pub fn is_aliased(name: &str) -> bool {
    alias_for(name).is_some()
}

pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_ENTRIES.contains(&name)
}

pub fn is_canonical(name: &str) -> bool {
    CANONICAL_COUNTRIES.contains(&name)
}

/// All labels that have an explicit mapping.
pub fn aliased_labels() -> Vec<&'static str> {
    COUNTRY_ALIASES.iter().map(|(alias, _)| *alias).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_entries_normalize_to_none() {
        for label in EXCLUDED_ENTRIES {
            assert_eq!(normalize_country(label), None, "{label} must be excluded");
        }
    }

    #[test]
    fn test_alias_table_maps_exactly() {
        for (alias, canonical) in COUNTRY_ALIASES {
            if is_excluded(alias) {
                continue;
            }
            assert_eq!(
                normalize_country(alias).as_deref(),
                Some(*canonical),
                "alias {alias}"
            );
        }
    }

    #[test]
    fn test_canonical_names_unchanged() {
        for name in CANONICAL_COUNTRIES {
            assert_eq!(normalize_country(name).as_deref(), Some(*name));
        }
    }

    #[test]
    fn test_idempotent_for_all_known_labels() {
        let labels = COUNTRY_ALIASES
            .iter()
            .map(|(a, _)| *a)
            .chain(CANONICAL_COUNTRIES.iter().copied())
            .chain(["Atlantis", "  Viet Nam  ", "Kosovo"]);

        for label in labels {
            if let Some(once) = normalize_country(label) {
                assert_eq!(
                    normalize_country(&once).as_deref(),
                    Some(once.as_str()),
                    "normalize is not idempotent for {label}"
                );
            }
        }
    }

    #[test]
    fn test_blank_input_is_none() {
        assert_eq!(normalize_country(""), None);
        assert_eq!(normalize_country(" \t "), None);
    }

    #[test]
    fn test_input_is_trimmed() {
        assert_eq!(normalize_country("  Viet Nam ").as_deref(), Some("Vietnam"));
        assert_eq!(
            normalize_country("Wallis and Futuna Islands ").as_deref(),
            Some("Wallis and Futuna")
        );
    }

    #[test]
    fn test_unknown_label_passes_through() {
        assert_eq!(normalize_country("Kosovo").as_deref(), Some("Kosovo"));
        assert_eq!(classify("Kosovo"), CountryClass::Passthrough);
    }

    #[test]
    fn test_palestinian_exclusion_wins_over_alias() {
        assert!(alias_for("Palestinian").is_some());
        assert_eq!(classify("Palestinian"), CountryClass::Excluded);
        assert!(!is_geocodable("Palestinian"));
        assert_eq!(normalize_country("State of Palestine").as_deref(), Some("Palestine"));
    }

    #[test]
    fn test_classify_branches() {
        assert_eq!(classify(""), CountryClass::Blank);
        assert_eq!(classify("Stateless"), CountryClass::Excluded);
        assert_eq!(classify("USA (EOIR)"), CountryClass::Mapped);
        assert_eq!(classify("Germany"), CountryClass::Canonical);
    }

    #[test]
    fn test_aliased_labels_lists_every_key() {
        let labels = aliased_labels();
        assert_eq!(labels.len(), COUNTRY_ALIASES.len());
        assert!(labels.contains(&"Syrian Arab Rep."));
    }
}
