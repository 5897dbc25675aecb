//! Subject extraction from marksheet text and SGPA aggregation.
//!
//! Marksheet OCR output runs subject rows together, so a row like
//! credit 4, grade point 8.50, credit point 34 surfaces as the single token
//! `48.5034`. Extraction therefore re-reads each numeric token's literal
//! digit sequence as a fixed-width triple and keeps only triples whose parts
//! are arithmetically consistent. Malformed tokens are dropped without
//! comment; only the zero-records case is visible to callers.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{SgpaSummary, SubjectRecord};

/// Accepted when `|credit * grade_point - credit_point|` is under this bound.
/// Absorbs rounding and OCR noise in the grade-point column.
const CONSISTENCY_TOLERANCE: f64 = 0.5;

fn number_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\d+|\d+").expect("static regex"))
}

fn subject_triple_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // One credit digit, a grade point with exactly two decimals, and a
    // two-digit credit point. The decimal point must sit at this offset;
    // the token's numeric value is irrelevant.
    RE.get_or_init(|| Regex::new(r"^(\d)(\d{1,2}\.\d{2})(\d{2})$").expect("static regex"))
}

/// Extract subject records from raw document text, in order of appearance.
///
/// Duplicates are kept; tokens that do not form a consistent triple are
/// silently discarded. No tokens at all is an empty list, not an error.
pub fn extract_subjects(text: &str) -> Vec<SubjectRecord> {
    let mut subjects = Vec::new();

    for token in number_token_re().find_iter(text) {
        let Some(caps) = subject_triple_re().captures(token.as_str()) else {
            continue;
        };

        let (Ok(credit), Ok(grade_point), Ok(credit_point)) = (
            caps[1].parse::<u32>(),
            caps[2].parse::<f64>(),
            caps[3].parse::<f64>(),
        ) else {
            continue;
        };

        if (credit as f64 * grade_point - credit_point).abs() < CONSISTENCY_TOLERANCE {
            subjects.push(SubjectRecord {
                credit,
                grade_point,
                credit_point,
            });
        }
    }

    subjects
}

/// Aggregate accepted records into an SGPA summary.
///
/// Returns `None` for an empty set — the caller reports "no subjects
/// detected" instead of dividing by zero.
pub fn compute_sgpa(subjects: &[SubjectRecord]) -> Option<SgpaSummary> {
    if subjects.is_empty() {
        return None;
    }

    let total_credits: u32 = subjects.iter().map(|s| s.credit).sum();
    let total_credit_points: f64 = subjects.iter().map(|s| s.credit_point).sum();

    Some(SgpaSummary {
        total_credits,
        total_credit_points,
        value: round2(total_credit_points / total_credits as f64),
    })
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistent_triple_is_accepted() {
        // credit 4, grade point 8.50, credit point 34; 4 * 8.50 = 34.0
        let subjects = extract_subjects("Subject A 48.5034 end");
        assert_eq!(
            subjects,
            vec![SubjectRecord {
                credit: 4,
                grade_point: 8.50,
                credit_point: 34.0
            }]
        );
    }

    #[test]
    fn inconsistent_triple_is_rejected() {
        // 89.5075: 8 * 9.50 = 76.0, |76.0 - 75| = 1.0 >= 0.5
        assert!(extract_subjects("89.5075").is_empty());
        // 48.0080: 4 * 8.00 = 32 vs 80
        assert!(extract_subjects("48.0080").is_empty());
    }

    #[test]
    fn plain_integers_are_ignored() {
        // "88550" has no decimal point at the required offset
        assert!(extract_subjects("roll 88550 total 100").is_empty());
    }

    #[test]
    fn all_accepted_records_satisfy_the_invariant() {
        let text = "48.5034 39.0027 72.1515 89.5075 noise 17.2007";
        for s in extract_subjects(text) {
            assert!(
                (s.credit as f64 * s.grade_point - s.credit_point).abs() < 0.5,
                "invariant violated for {:?}",
                s
            );
        }
    }

    #[test]
    fn order_and_duplicates_preserved() {
        let subjects = extract_subjects("39.0027 48.5034 39.0027");
        assert_eq!(subjects.len(), 3);
        assert_eq!(subjects[0].credit, 3);
        assert_eq!(subjects[1].credit, 4);
        assert_eq!(subjects[0], subjects[2]);
    }

    #[test]
    fn no_tokens_is_empty_not_error() {
        assert!(extract_subjects("no digits here at all").is_empty());
        assert!(extract_subjects("").is_empty());
    }

    #[test]
    fn sgpa_example_from_two_subjects() {
        let subjects = vec![
            SubjectRecord {
                credit: 4,
                grade_point: 8.5,
                credit_point: 34.0,
            },
            SubjectRecord {
                credit: 3,
                grade_point: 9.0,
                credit_point: 27.0,
            },
        ];
        let summary = compute_sgpa(&subjects).unwrap();
        assert_eq!(summary.total_credits, 7);
        assert_eq!(summary.total_credit_points, 61.0);
        assert_eq!(summary.value, 8.71);
    }

    #[test]
    fn empty_set_refused() {
        assert!(compute_sgpa(&[]).is_none());
    }
}
