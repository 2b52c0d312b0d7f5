//! Import template generation: the full header row plus one sample data row.

use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::codec::format_csv_line;
use super::{
    HIERARCHY_COLUMNS, MAX_BEST_PRACTICES, MAX_PROCESS_OPPORTUNITIES, MAX_UOM_SLOTS,
};

pub fn template_headers() -> Vec<String> {
    let mut headers: Vec<String> = HIERARCHY_COLUMNS.iter().map(|c| c.to_string()).collect();
    for n in 1..=MAX_UOM_SLOTS {
        headers.push(format!("uom{n}_name"));
        headers.push(format!("uom{n}_description"));
        headers.push(format!("uom{n}_samValue"));
        headers.push(format!("uom{n}_tags"));
    }
    for n in 1..=MAX_BEST_PRACTICES {
        headers.push(format!("bestPractice{n}"));
    }
    for n in 1..=MAX_PROCESS_OPPORTUNITIES {
        headers.push(format!("processOpportunity{n}"));
    }
    headers
}

/// Deterministic template: header row plus one populated sample row.
pub fn generate_csv_template() -> String {
    let headers = template_headers();

    let mut sample = vec![String::new(); headers.len()];
    let hierarchy_sample = [
        "Acme Logistics",
        "ACME",
        "Dallas DC",
        "DAL-01",
        "Dallas",
        "Outbound",
        "Pack Line 1",
        "Case Pack",
        "Baseline standard for case packing",
    ];
    for (i, value) in hierarchy_sample.iter().enumerate() {
        sample[i] = value.to_string();
    }

    let uom_sample = [
        ("Case", "Sealed shipping case", "0.45", "pack;carton"),
        ("Label", "Applied shipping label", "0.05", "pack"),
    ];
    for (slot, (name, description, sam, tags)) in uom_sample.iter().enumerate() {
        let base = HIERARCHY_COLUMNS.len() + slot * 4;
        sample[base] = name.to_string();
        sample[base + 1] = description.to_string();
        sample[base + 2] = sam.to_string();
        sample[base + 3] = tags.to_string();
    }

    let bp_base = HIERARCHY_COLUMNS.len() + MAX_UOM_SLOTS * 4;
    sample[bp_base] = "Two-hand pickup".to_string();
    sample[bp_base + 1] = "Stage cases before sealing".to_string();
    sample[bp_base + MAX_BEST_PRACTICES] = "Reduce walk distance to label printer".to_string();

    format!(
        "{}\n{}\n",
        format_csv_line(&headers),
        format_csv_line(&sample)
    )
}

pub async fn download_template() -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"standards-import-template.csv\"".to_string(),
            ),
        ],
        generate_csv_template(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::codec::parse_csv_content;

    #[test]
    fn template_has_full_column_set() {
        let headers = template_headers();
        assert_eq!(
            headers.len(),
            HIERARCHY_COLUMNS.len()
                + MAX_UOM_SLOTS * 4
                + MAX_BEST_PRACTICES
                + MAX_PROCESS_OPPORTUNITIES
        );
        assert_eq!(headers[0], "organizationName");
        assert!(headers.contains(&"uom75_tags".to_string()));
        assert!(headers.contains(&"bestPractice20".to_string()));
        assert!(headers.contains(&"processOpportunity20".to_string()));
    }

    #[test]
    fn template_is_deterministic_and_parseable() {
        let a = generate_csv_template();
        assert_eq!(a, generate_csv_template());

        let rows = parse_csv_content(&a).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["organizationName"], "Acme Logistics");
        assert_eq!(rows[0]["uom1_samValue"], "0.45");
        assert_eq!(rows[0]["uom3_name"], "");
    }
}
