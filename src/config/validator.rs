use super::ResourceConfig;
use once_cell::sync::Lazy;
use regex::Regex;

/// Keys every resource configuration must define globally
pub const REQUIRED_PARAMS: &[&str] = &["PARTITION", "TIME", "JOB_NAME"];

static DAYS_HMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)-(\d{1,2}):(\d{2}):(\d{2})$").expect("Valid regex pattern"));
static HMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})$").expect("Valid regex pattern"));
static MS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("Valid regex pattern"));
static MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("Valid regex pattern"));

/// Check a SLURM time limit against the accepted grammars.
///
/// Accepted forms are `D-HH:MM:SS`, `HH:MM:SS`, `MM:SS` and bare minutes.
/// Seconds and minutes must stay below 60. Hours are only capped at 23 when a
/// day component is present, so `24:00:00` is a valid limit.
pub fn is_valid_time(value: &str) -> bool {
    let value = value.trim();
    let field = |caps: &regex::Captures<'_>, i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(u32::MAX)
    };

    if let Some(caps) = DAYS_HMS.captures(value) {
        return field(&caps, 2) < 24 && field(&caps, 3) < 60 && field(&caps, 4) < 60;
    }
    if let Some(caps) = HMS.captures(value) {
        return field(&caps, 2) < 60 && field(&caps, 3) < 60;
    }
    if let Some(caps) = MS.captures(value) {
        return field(&caps, 2) < 60;
    }
    MINUTES.is_match(value)
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Collect every problem with the configuration. An empty list means valid.
    pub fn validate(config: &ResourceConfig) -> Vec<String> {
        let mut issues = Vec::new();

        for param in REQUIRED_PARAMS {
            if !config.global_params().contains_key(param) {
                issues.push(format!("Missing required parameter: {}", param));
            }
        }

        if let Some(time) = config.global_params().get("TIME") {
            if !is_valid_time(time) {
                issues.push("Invalid time format in global parameters".to_string());
            }
        }

        for (section, params) in config.sections() {
            if let Some(time) = params.get("TIME") {
                if !is_valid_time(time) {
                    issues.push(format!("Invalid time format in {} configuration", section));
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_time_formats() {
        for value in ["1-00:00:00", "24:00:00", "60:00", "120", "2:00:00", "7-23:59:59"] {
            assert!(is_valid_time(value), "{value} should be valid");
        }
    }

    #[test]
    fn test_rejected_time_formats() {
        for value in ["invalid", "25:70:00", "1-24:00:00", "10:61", "1:2:3", "", "-5"] {
            assert!(!is_valid_time(value), "{value} should be invalid");
        }
    }

    #[test]
    fn test_validate_reports_missing_and_bad_time() {
        let config = ResourceConfig::from_text(
            "PARTITION=altair\nTIME=soon\n[PRODUCTION]\nTIME=25:70:00\n",
        );
        let issues = ConfigValidator::validate(&config);

        assert_eq!(
            issues,
            vec![
                "Missing required parameter: JOB_NAME".to_string(),
                "Invalid time format in global parameters".to_string(),
                "Invalid time format in production configuration".to_string(),
            ]
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ResourceConfig::from_text(crate::config::loader::DEFAULT_CONFIG);
        assert!(ConfigValidator::validate(&config).is_empty());
    }
}
