//! Risk formulas and suggested actions for each item kind.
//!
//! Every score is clamped to `[0, 1]`.

const YEAR: i64 = 365;

fn clamp(risk: f64) -> f64 {
    risk.clamp(0.0, 1.0)
}

fn staleness_risk(days_since_update: i64) -> f64 {
    if days_since_update > 2 * YEAR {
        0.4
    } else if days_since_update > YEAR {
        0.2
    } else {
        0.0
    }
}

/// Risk for a declared dependency.
///
/// `days_since_reference` is `None` when the last mention is unknown.
pub fn dependency_risk(
    deprecated: bool,
    usage_count: usize,
    days_since_reference: Option<i64>,
) -> f64 {
    let mut risk = 0.0;
    if deprecated {
        risk += 0.6;
    }
    if usage_count == 0 {
        risk += 0.4;
    } else if usage_count <= 2 {
        risk += 0.2;
    }
    if let Some(days) = days_since_reference.filter(|d| *d > YEAR) {
        risk += 0.3 * (days as f64 / YEAR as f64).min(3.0);
    }
    clamp(risk)
}

pub fn directory_risk(
    legacy_pattern: bool,
    days_since_update: i64,
    file_count: usize,
    size_kb: f64,
) -> f64 {
    let mut risk = 0.0;
    if legacy_pattern {
        risk += 0.5;
    }
    risk += staleness_risk(days_since_update);
    if file_count == 0 {
        risk += 0.6;
    } else if file_count <= 5 && size_kb < 100.0 {
        risk += 0.3;
    }
    clamp(risk)
}

pub fn file_risk(legacy_name: bool, marker_count: usize, days_since_update: i64) -> f64 {
    let mut risk = 0.0;
    if legacy_name {
        risk += 0.4;
    }
    risk += 0.2 * marker_count as f64;
    risk += staleness_risk(days_since_update);
    clamp(risk)
}

pub fn suggest_dependency_action(risk: f64, deprecated: bool, usage_count: usize) -> &'static str {
    match (deprecated, usage_count) {
        (true, 0) => "Remove immediately (deprecated and unused)",
        (false, 0) => "Remove (unused)",
        (true, _) => "Migrate to modern replacement",
        _ if risk > 0.7 => "Review and consider removal",
        _ => "Monitor usage",
    }
}

pub fn suggest_directory_action(risk: f64, file_count: usize, days_since_update: i64) -> &'static str {
    if file_count == 0 {
        "Remove (empty directory)"
    } else if risk > 0.7 {
        "Review for possible removal"
    } else if days_since_update > 2 * YEAR {
        "Archive if not needed"
    } else {
        "Monitor activity"
    }
}

pub fn suggest_file_action(risk: f64, marker_count: usize, days_since_update: i64) -> &'static str {
    if days_since_update > 2 * YEAR && risk > 0.6 {
        "Archive or remove"
    } else if marker_count > 0 {
        "Review and update"
    } else if risk > 0.7 {
        "Consider removal"
    } else {
        "Monitor or document purpose"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deprecated_unused_dependency_saturates() {
        assert_eq!(dependency_risk(true, 0, None), 1.0);
    }

    #[test]
    fn test_stale_reference_adds_time_risk() {
        let risk = dependency_risk(false, 1, Some(2 * 365));
        assert!((risk - 0.8).abs() < 1e-9, "risk was {risk}");
        assert!((dependency_risk(false, 5, Some(10 * 365)) - 0.9).abs() < 1e-9);
        assert_eq!(dependency_risk(false, 5, Some(200)), 0.0);
    }

    #[test]
    fn test_empty_stale_legacy_directory() {
        let risk = directory_risk(true, 3 * 365 + 10, 0, 0.0);
        assert_eq!(risk, 1.0);
        assert_eq!(directory_risk(false, 30, 3, 12.0), 0.3);
        assert_eq!(directory_risk(false, 30, 6, 12.0), 0.0);
    }

    #[test]
    fn test_file_risk_counts_markers() {
        let risk = file_risk(false, 2, 400);
        assert!((risk - 0.6).abs() < 1e-9);
        assert_eq!(file_risk(true, 5, 1000), 1.0);
    }

    #[test]
    fn test_dependency_actions() {
        assert_eq!(
            suggest_dependency_action(1.0, true, 0),
            "Remove immediately (deprecated and unused)"
        );
        assert_eq!(suggest_dependency_action(0.4, false, 0), "Remove (unused)");
        assert_eq!(
            suggest_dependency_action(0.8, true, 3),
            "Migrate to modern replacement"
        );
        assert_eq!(
            suggest_dependency_action(0.8, false, 3),
            "Review and consider removal"
        );
        assert_eq!(suggest_dependency_action(0.4, false, 3), "Monitor usage");
    }

    #[test]
    fn test_directory_and_file_actions() {
        assert_eq!(suggest_directory_action(1.0, 0, 0), "Remove (empty directory)");
        assert_eq!(suggest_directory_action(0.5, 2, 900), "Archive if not needed");
        assert_eq!(suggest_file_action(0.8, 0, 900), "Archive or remove");
        assert_eq!(suggest_file_action(0.4, 1, 10), "Review and update");
    }
}
