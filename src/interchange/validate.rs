//! Per-row validation of parsed standard import rows. Errors block the row;
//! warnings are soft quality signals.

use std::collections::HashMap;

use super::{MAX_BEST_PRACTICES, MAX_PROCESS_OPPORTUNITIES, MAX_UOM_SLOTS};

#[derive(Debug, Default)]
pub struct RowValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl RowValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn field<'a>(row: &'a HashMap<String, String>, key: &str) -> &'a str {
    row.get(key).map(|v| v.trim()).unwrap_or("")
}

fn is_blank(row: &HashMap<String, String>, key: &str) -> bool {
    field(row, key).is_empty()
}

/// `display_row` is the 1-indexed physical CSV line (header = 1, first data
/// row = 2).
pub fn validate_standard_row(row: &HashMap<String, String>, display_row: usize) -> RowValidation {
    let mut result = RowValidation::default();

    for key in [
        "organizationName",
        "facilityName",
        "departmentName",
        "areaName",
        "standardName",
        "notes",
    ] {
        if is_blank(row, key) {
            result
                .errors
                .push(format!("Row {display_row}: {key} is required"));
        }
    }

    let mut uom_count = 0usize;
    for n in 1..=MAX_UOM_SLOTS {
        let name = field(row, &format!("uom{n}_name"));
        let description = field(row, &format!("uom{n}_description"));
        let sam_value = field(row, &format!("uom{n}_samValue"));

        if name.is_empty() && description.is_empty() && sam_value.is_empty() {
            continue;
        }

        if name.is_empty() {
            result
                .errors
                .push(format!("Row {display_row}: UOM {n} is missing name"));
        }
        if description.is_empty() {
            result
                .errors
                .push(format!("Row {display_row}: UOM {n} is missing description"));
        }
        if sam_value.is_empty() {
            result
                .errors
                .push(format!("Row {display_row}: UOM {n} is missing samValue"));
        } else {
            match sam_value.parse::<f64>() {
                Ok(v) if v.is_finite() && v > 0.0 => {}
                _ => result.errors.push(format!(
                    "Row {display_row}: UOM {n} samValue must be a positive number"
                )),
            }
        }
        uom_count += 1;
    }

    let best_practice_count = (1..=MAX_BEST_PRACTICES)
        .filter(|n| !is_blank(row, &format!("bestPractice{n}")))
        .count();
    let process_opportunity_count = (1..=MAX_PROCESS_OPPORTUNITIES)
        .filter(|n| !is_blank(row, &format!("processOpportunity{n}")))
        .count();

    if uom_count == 0 {
        result
            .warnings
            .push(format!("Row {display_row}: no UOM entries defined"));
    }
    if best_practice_count == 0 {
        result
            .warnings
            .push(format!("Row {display_row}: no best practices listed"));
    }
    if process_opportunity_count == 0 {
        result
            .warnings
            .push(format!("Row {display_row}: no process opportunities listed"));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_row() -> HashMap<String, String> {
        let mut row = HashMap::new();
        for (key, value) in [
            ("organizationName", "Acme"),
            ("facilityName", "Dallas DC"),
            ("departmentName", "Outbound"),
            ("areaName", "Pack Line 1"),
            ("standardName", "Case Pack"),
            ("notes", "baseline"),
        ] {
            row.insert(key.to_string(), value.to_string());
        }
        row
    }

    #[test]
    fn complete_row_is_valid_with_soft_warnings() {
        crate::tests::test_util::setup();
        let result = validate_standard_row(&base_row(), 2);
        assert!(result.is_valid());
        // no UOMs, best practices, or process opportunities on the bare row
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn missing_hierarchy_field_and_partial_uom_both_error() {
        let mut row = base_row();
        row.remove("organizationName");
        row.insert("uom3_name".to_string(), "Case".to_string());
        row.insert("uom3_samValue".to_string(), "0.5".to_string());

        let result = validate_standard_row(&row, 2);
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("organizationName")));
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("UOM 3") && e.contains("description")));
    }

    #[test]
    fn sam_value_bounds() {
        for bad in ["0", "-1", "abc", "inf", "NaN"] {
            let mut row = base_row();
            row.insert("uom1_name".to_string(), "Case".to_string());
            row.insert("uom1_description".to_string(), "case".to_string());
            row.insert("uom1_samValue".to_string(), bad.to_string());
            let result = validate_standard_row(&row, 2);
            assert!(!result.is_valid(), "samValue {bad:?} should be rejected");
        }

        let mut row = base_row();
        row.insert("uom1_name".to_string(), "Case".to_string());
        row.insert("uom1_description".to_string(), "case".to_string());
        row.insert("uom1_samValue".to_string(), "0.001".to_string());
        assert!(validate_standard_row(&row, 2).is_valid());
    }

    #[test]
    fn errors_carry_the_display_row() {
        let mut row = base_row();
        row.remove("notes");
        let result = validate_standard_row(&row, 7);
        assert!(result.errors.iter().all(|e| e.starts_with("Row 7:")));
    }

    #[test]
    fn whitespace_only_counts_as_blank() {
        let mut row = base_row();
        row.insert("standardName".to_string(), "   ".to_string());
        assert!(!validate_standard_row(&row, 2).is_valid());
    }
}
