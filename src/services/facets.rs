use chrono::Datelike;

/// Resolved query facets for one aggregation run
#[derive(Debug, Clone, PartialEq)]
pub struct FacetPlan {
    /// Deduplicated ISO 3166-1 country codes, in preference order
    pub codes: Vec<String>,
    /// Inclusive `[min, max]` release-year window
    pub year_range: (i32, i32),
    /// Minimum provider rating, 0-10
    pub rating_floor: f64,
}

const MIN_YEAR: i32 = 1900;

/// Display label to ISO country code lookup for user-facing preferences
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("united states", "US"),
    ("usa", "US"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
    ("france", "FR"),
    ("germany", "DE"),
    ("italy", "IT"),
    ("spain", "ES"),
    ("japan", "JP"),
    ("south korea", "KR"),
    ("korea", "KR"),
    ("india", "IN"),
    ("canada", "CA"),
    ("australia", "AU"),
    ("brazil", "BR"),
    ("mexico", "MX"),
    ("china", "CN"),
    ("hong kong", "HK"),
    ("sweden", "SE"),
    ("norway", "NO"),
    ("denmark", "DK"),
];

/// Substituted when no preferred label resolves, so the pipeline never starves
const DEFAULT_REGION_CODES: &[&str] = &["US", "GB", "FR", "DE", "JP"];

/// Turns free-form user preferences into a bounded set of concrete facets.
///
/// Unresolved country labels are dropped, year bounds are clamped to
/// `[1900, current year]` and swapped if inverted, and the rating floor is
/// clamped to `[0, 10]`. Never fails.
pub fn plan_facets(
    country_labels: &[String],
    rating_floor: f64,
    year_range: (i32, i32),
) -> FacetPlan {
    let mut codes: Vec<String> = Vec::new();
    for label in country_labels {
        match resolve_country(label) {
            Some(code) => {
                if !codes.iter().any(|c| c == code) {
                    codes.push(code.to_string());
                }
            }
            None => {
                tracing::debug!(label = %label, "Dropping unresolved country label");
            }
        }
    }

    if codes.is_empty() {
        codes = DEFAULT_REGION_CODES.iter().map(|c| c.to_string()).collect();
    }

    let current_year = chrono::Utc::now().year();
    let (mut y_min, mut y_max) = year_range;
    if y_min > y_max {
        std::mem::swap(&mut y_min, &mut y_max);
    }
    let y_min = y_min.clamp(MIN_YEAR, current_year);
    let y_max = y_max.clamp(MIN_YEAR, current_year);

    FacetPlan {
        codes,
        year_range: (y_min, y_max),
        rating_floor: rating_floor.clamp(0.0, 10.0),
    }
}

fn resolve_country(label: &str) -> Option<&'static str> {
    let needle = label.trim().to_lowercase();
    COUNTRY_CODES
        .iter()
        .find(|(name, _)| *name == needle)
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_resolves_labels_case_insensitively() {
        let plan = plan_facets(
            &["United States".to_string(), "FRANCE".to_string()],
            7.0,
            (2000, 2020),
        );
        assert_eq!(plan.codes, vec!["US", "FR"]);
    }

    #[test]
    fn test_unresolved_labels_are_dropped_silently() {
        let plan = plan_facets(
            &["France".to_string(), "Atlantis".to_string()],
            7.0,
            (2000, 2020),
        );
        assert_eq!(plan.codes, vec!["FR"]);
    }

    #[test]
    fn test_duplicate_labels_deduplicate() {
        let plan = plan_facets(
            &["USA".to_string(), "United States".to_string()],
            7.0,
            (2000, 2020),
        );
        assert_eq!(plan.codes, vec!["US"]);
    }

    #[test]
    fn test_empty_resolution_falls_back_to_default_pool() {
        let plan = plan_facets(&["Atlantis".to_string()], 7.0, (2000, 2020));
        assert_eq!(plan.codes, DEFAULT_REGION_CODES);

        let plan = plan_facets(&[], 7.0, (2000, 2020));
        assert_eq!(plan.codes, DEFAULT_REGION_CODES);
    }

    #[test]
    fn test_inverted_year_bounds_are_swapped() {
        let plan = plan_facets(&[], 7.0, (2020, 2000));
        assert_eq!(plan.year_range, (2000, 2020));
    }

    #[test]
    fn test_year_bounds_are_clamped() {
        let current_year = chrono::Utc::now().year();
        let plan = plan_facets(&[], 7.0, (1800, current_year + 10));
        assert_eq!(plan.year_range, (1900, current_year));
    }

    #[test]
    fn test_rating_floor_is_clamped() {
        assert_eq!(plan_facets(&[], -3.0, (2000, 2020)).rating_floor, 0.0);
        assert_eq!(plan_facets(&[], 14.5, (2000, 2020)).rating_floor, 10.0);
        assert_eq!(plan_facets(&[], 6.5, (2000, 2020)).rating_floor, 6.5);
    }
}
