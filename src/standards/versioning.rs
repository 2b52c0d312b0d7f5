//! Standard version creation.
//!
//! A version family is the set of rows sharing a `base_standard_id` (plus the
//! root itself). Creating a new version flips the family's current flag and
//! inserts the replacement inside one transaction, so concurrent calls cannot
//! both claim the same version number or leave zero/two current rows.

use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::models::{Standard, UomEntry};
use crate::shared::schema::{standards, uom_entries};

use super::UomEntryInput;

#[derive(Debug, Error)]
pub enum VersioningError {
    #[error("Original standard not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] diesel::result::Error),
}

/// Partial overrides for the new version; anything left `None` is copied from
/// the original, including its UOM entries.
#[derive(Debug, Default, Deserialize)]
pub struct NewVersionInput {
    pub name: Option<String>,
    pub facility_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub area_id: Option<Uuid>,
    pub best_practices: Option<Vec<String>>,
    pub process_opportunities: Option<Vec<String>>,
    pub uom_entries: Option<Vec<UomEntryInput>>,
    pub version_notes: Option<String>,
    pub created_by: Option<String>,
}

/// Any family member normalizes to the family root.
pub fn family_base_id(standard: &Standard) -> Uuid {
    standard.base_standard_id.unwrap_or(standard.id)
}

/// Next version number for a family with the given existing versions; an
/// empty family counts as version 1.
pub fn next_version(existing: &[i32]) -> i32 {
    existing.iter().copied().max().unwrap_or(1) + 1
}

pub fn create_new_version(
    conn: &mut PgConnection,
    standard_id: Uuid,
    input: &NewVersionInput,
) -> Result<Standard, VersioningError> {
    conn.transaction(|conn| {
        let original: Standard = standards::table
            .find(standard_id)
            .first(conn)
            .optional()?
            .ok_or(VersioningError::NotFound)?;

        let base_id = family_base_id(&original);

        let versions: Vec<i32> = standards::table
            .filter(
                standards::id
                    .eq(base_id)
                    .or(standards::base_standard_id.eq(base_id)),
            )
            .select(standards::version)
            .load(conn)?;
        let version = next_version(&versions);

        // Expected to hit exactly one row, but set-based for safety.
        diesel::update(
            standards::table
                .filter(
                    standards::id
                        .eq(base_id)
                        .or(standards::base_standard_id.eq(base_id)),
                )
                .filter(standards::is_current_version.eq(true)),
        )
        .set(standards::is_current_version.eq(false))
        .execute(conn)?;

        let now = Utc::now();
        let new_standard = Standard {
            id: Uuid::new_v4(),
            name: input.name.clone().unwrap_or_else(|| original.name.clone()),
            facility_id: input.facility_id.unwrap_or(original.facility_id),
            department_id: input.department_id.unwrap_or(original.department_id),
            area_id: input.area_id.unwrap_or(original.area_id),
            version,
            base_standard_id: Some(base_id),
            is_current_version: true,
            is_active: true,
            best_practices: input
                .best_practices
                .clone()
                .unwrap_or_else(|| original.best_practices.clone()),
            process_opportunities: input
                .process_opportunities
                .clone()
                .unwrap_or_else(|| original.process_opportunities.clone()),
            version_notes: input
                .version_notes
                .clone()
                .or_else(|| original.version_notes.clone()),
            created_by: input
                .created_by
                .clone()
                .or_else(|| original.created_by.clone()),
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(standards::table)
            .values(&new_standard)
            .execute(conn)?;

        match &input.uom_entries {
            Some(replacement) => {
                for entry in replacement {
                    let uom = UomEntry {
                        id: Uuid::new_v4(),
                        uom: entry.uom.clone(),
                        description: entry.description.clone(),
                        sam_value: entry.sam_value,
                        tags: entry.tags.clone(),
                        standard_id: new_standard.id,
                        created_at: now,
                    };
                    diesel::insert_into(uom_entries::table)
                        .values(&uom)
                        .execute(conn)?;
                }
            }
            None => {
                // Copy the original's UOM entries verbatim.
                let original_uoms: Vec<UomEntry> = uom_entries::table
                    .filter(uom_entries::standard_id.eq(original.id))
                    .order(uom_entries::created_at.asc())
                    .load(conn)?;
                for entry in original_uoms {
                    let uom = UomEntry {
                        id: Uuid::new_v4(),
                        standard_id: new_standard.id,
                        created_at: now,
                        ..entry
                    };
                    diesel::insert_into(uom_entries::table)
                        .values(&uom)
                        .execute(conn)?;
                }
            }
        }

        log::info!(
            "Created version {version} of standard family {base_id} (from {standard_id})"
        );
        Ok(new_standard)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn standard(id: Uuid, base: Option<Uuid>, version: i32) -> Standard {
        let now = Utc::now();
        Standard {
            id,
            name: "Case Pack".to_string(),
            facility_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            area_id: Uuid::new_v4(),
            version,
            base_standard_id: base,
            is_current_version: true,
            is_active: true,
            best_practices: vec![],
            process_opportunities: vec![],
            version_notes: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn next_version_is_family_max_plus_one() {
        assert_eq!(next_version(&[1, 2, 3]), 4);
        assert_eq!(next_version(&[3, 1, 2]), 4);
        assert_eq!(next_version(&[1]), 2);
    }

    #[test]
    fn empty_family_counts_as_version_one() {
        assert_eq!(next_version(&[]), 2);
    }

    #[test]
    fn root_and_descendant_normalize_to_the_same_base() {
        let root_id = Uuid::new_v4();
        let root = standard(root_id, None, 1);
        let child = standard(Uuid::new_v4(), Some(root_id), 3);
        assert_eq!(family_base_id(&root), root_id);
        assert_eq!(family_base_id(&child), root_id);
    }
}
