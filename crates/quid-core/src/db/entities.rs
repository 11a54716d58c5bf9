//! Tax entity storage.

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Entity, EntityType, NewEntity};

impl Database {
    pub fn create_entity(&self, entity: &NewEntity) -> Result<Entity> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO entities (name, entity_type, ni_number, utr, vat_number, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entity.name,
                entity.entity_type.as_str(),
                entity.ni_number,
                entity.utr,
                entity.vat_number,
                entity.user_id,
            ],
        )?;
        self.get_entity(conn.last_insert_rowid())
    }

    pub fn get_entity(&self, id: i64) -> Result<Entity> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, entity_type, ni_number, utr, vat_number, user_id, created_at
             FROM entities WHERE id = ?1",
            params![id],
            row_to_entity,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("entity {}", id)),
            other => other.into(),
        })
    }

    pub fn list_entities(&self) -> Result<Vec<Entity>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, entity_type, ni_number, utr, vat_number, user_id, created_at
             FROM entities ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], row_to_entity)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

fn row_to_entity(row: &rusqlite::Row) -> rusqlite::Result<Entity> {
    let entity_type: String = row.get(2)?;
    let created_at: String = row.get(7)?;
    Ok(Entity {
        id: row.get(0)?,
        name: row.get(1)?,
        entity_type: entity_type.parse().unwrap_or(EntityType::Individual),
        ni_number: row.get(3)?,
        utr: row.get(4)?,
        vat_number: row.get(5)?,
        user_id: row.get(6)?,
        created_at: parse_datetime(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaxRegime;

    #[test]
    fn test_create_and_list_entities() {
        let db = Database::in_memory().unwrap();
        let company = db
            .create_entity(&NewEntity {
                name: "Acme Widgets Ltd".into(),
                entity_type: EntityType::LimitedCompany,
                ni_number: None,
                utr: Some("1234567890".into()),
                vat_number: Some("GB123456789".into()),
                user_id: Some("alice".into()),
            })
            .unwrap();
        assert_eq!(company.entity_type, EntityType::LimitedCompany);
        assert_eq!(
            TaxRegime::for_entity_type(company.entity_type),
            TaxRegime::CompaniesHouse
        );

        let all = db.list_entities().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Acme Widgets Ltd");
    }

    #[test]
    fn test_get_entity_not_found() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(db.get_entity(42), Err(Error::NotFound(_))));
    }
}
