//! Conversion of a validated raw row into structured import data.

use std::collections::HashMap;

use super::{MAX_BEST_PRACTICES, MAX_PROCESS_OPPORTUNITIES, MAX_UOM_SLOTS};

#[derive(Debug, Clone, PartialEq)]
pub struct UomEntryData {
    pub uom: String,
    pub description: String,
    pub sam_value: f64,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StandardImportData {
    pub organization_name: String,
    pub organization_code: String,
    pub facility_name: String,
    pub facility_ref: String,
    pub facility_city: String,
    pub department_name: String,
    pub area_name: String,
    pub standard_name: String,
    pub notes: String,
    pub uom_entries: Vec<UomEntryData>,
    pub best_practices: Vec<String>,
    pub process_opportunities: Vec<String>,
}

fn field(row: &HashMap<String, String>, key: &str) -> String {
    row.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Tags split on `;` or `,`, trimmed, empty entries dropped.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split([';', ','])
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// UOM slots are kept only when name, description, and samValue are all
/// non-blank and the samValue parses; slots come out in ascending slot-number
/// order, best practices and process opportunities in numeric suffix order.
pub fn transform_row_to_standard_data(row: &HashMap<String, String>) -> StandardImportData {
    let mut uom_entries = Vec::new();
    for n in 1..=MAX_UOM_SLOTS {
        let uom = field(row, &format!("uom{n}_name"));
        let description = field(row, &format!("uom{n}_description"));
        let sam_raw = field(row, &format!("uom{n}_samValue"));
        if uom.is_empty() || description.is_empty() || sam_raw.is_empty() {
            continue;
        }
        let Ok(sam_value) = sam_raw.parse::<f64>() else {
            continue;
        };
        uom_entries.push(UomEntryData {
            uom,
            description,
            sam_value,
            tags: split_tags(&field(row, &format!("uom{n}_tags"))),
        });
    }

    let best_practices = (1..=MAX_BEST_PRACTICES)
        .map(|n| field(row, &format!("bestPractice{n}")))
        .filter(|v| !v.is_empty())
        .collect();
    let process_opportunities = (1..=MAX_PROCESS_OPPORTUNITIES)
        .map(|n| field(row, &format!("processOpportunity{n}")))
        .filter(|v| !v.is_empty())
        .collect();

    StandardImportData {
        organization_name: field(row, "organizationName"),
        organization_code: field(row, "organizationCode"),
        facility_name: field(row, "facilityName"),
        facility_ref: field(row, "facilityRef"),
        facility_city: field(row, "facilityCity"),
        department_name: field(row, "departmentName"),
        area_name: field(row, "areaName"),
        standard_name: field(row, "standardName"),
        notes: field(row, "notes"),
        uom_entries,
        best_practices,
        process_opportunities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn keeps_only_complete_uom_slots_in_slot_order() {
        let row = row(&[
            ("standardName", " Case Pack "),
            ("uom5_name", "Label"),
            ("uom5_description", "Applied label"),
            ("uom5_samValue", "0.05"),
            ("uom2_name", "Case"),
            ("uom2_description", "Sealed case"),
            ("uom2_samValue", "0.45"),
            ("uom2_tags", "pack; carton ,,"),
            // incomplete slot: no samValue
            ("uom3_name", "Pallet"),
            ("uom3_description", "Wrapped pallet"),
        ]);

        let data = transform_row_to_standard_data(&row);
        assert_eq!(data.standard_name, "Case Pack");
        assert_eq!(data.uom_entries.len(), 2);
        assert_eq!(data.uom_entries[0].uom, "Case");
        assert_eq!(data.uom_entries[0].tags, vec!["pack", "carton"]);
        assert_eq!(data.uom_entries[1].uom, "Label");
        assert!((data.uom_entries[1].sam_value - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn best_practices_preserve_suffix_order() {
        let row = row(&[
            ("bestPractice3", "third"),
            ("bestPractice1", "first"),
            ("processOpportunity2", "po"),
        ]);
        let data = transform_row_to_standard_data(&row);
        assert_eq!(data.best_practices, vec!["first", "third"]);
        assert_eq!(data.process_opportunities, vec!["po"]);
    }

    #[test]
    fn split_tags_handles_both_separators() {
        assert_eq!(split_tags("a;b,c ; ,"), vec!["a", "b", "c"]);
        assert!(split_tags("").is_empty());
    }
}
