//! Entity management commands

use anyhow::{bail, Result};
use quid_core::db::Database;
use quid_core::models::{EntityType, NewEntity, TaxRegime};

pub fn cmd_entities_list(db: &Database) -> Result<()> {
    let entities = db.list_entities()?;
    if entities.is_empty() {
        println!("No entities found");
        println!("Add one with: quid entities add \"Acme Ltd\" --type limited_company");
        return Ok(());
    }

    println!();
    println!(
        "   {:<6} {:<30} {:<18} {:<16} {}",
        "ID", "Name", "Type", "Regime", "VAT"
    );
    println!("   {}", "─".repeat(80));
    for entity in &entities {
        println!(
            "   {:<6} {:<30} {:<18} {:<16} {}",
            entity.id,
            entity.name,
            entity.entity_type,
            TaxRegime::for_entity_type(entity.entity_type),
            entity.vat_number.as_deref().unwrap_or("-")
        );
    }
    println!();

    Ok(())
}

pub fn cmd_entities_add(
    db: &Database,
    name: &str,
    entity_type: &str,
    utr: Option<&str>,
    vat: Option<&str>,
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Entity name must not be empty");
    }
    let entity_type: EntityType = entity_type.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let entity = db.create_entity(&NewEntity {
        name: name.trim().to_string(),
        entity_type,
        ni_number: None,
        utr: utr.map(String::from),
        vat_number: vat.map(String::from),
        user_id: None,
    })?;

    println!(
        "✅ Entity {} created: {} ({}, files under {})",
        entity.id,
        entity.name,
        entity.entity_type,
        TaxRegime::for_entity_type(entity.entity_type)
    );
    Ok(())
}
