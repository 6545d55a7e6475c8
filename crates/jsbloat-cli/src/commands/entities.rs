use crate::{OutputFormat, csv_field};
use anyhow::{Context, Result};
use jsbloat_core::entity::{ClassifiedEntity, Entity, EntityClassifier};
use jsbloat_entities::{CatalogClassifier, EntityCatalog, EntityDefinition};
use serde::Serialize;
use std::path::Path;

/// Load the builtin catalog, with entries from `overrides` taking precedence
pub fn load_catalog(overrides: Option<&Path>) -> Result<EntityCatalog> {
    let catalog = EntityCatalog::builtin();
    match overrides {
        Some(path) => {
            let extra = EntityCatalog::from_file(path)
                .with_context(|| format!("reading entity catalog {}", path.display()))?;
            Ok(catalog.with_overrides(extra))
        }
        None => Ok(catalog),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Classification {
    url: String,
    entity: Entity,
}

fn classify_all(catalog: EntityCatalog, urls: &[String]) -> Vec<Classification> {
    let classifier = CatalogClassifier::new(catalog);
    urls.iter()
        .map(|url| Classification {
            url: url.clone(),
            entity: Entity::from(classifier.classify(url)),
        })
        .collect()
}

/// List the catalog, or classify `urls` against it when any are given
pub fn execute(entities: Option<&Path>, urls: &[String], format: OutputFormat) -> Result<()> {
    let catalog = load_catalog(entities)?;

    if urls.is_empty() {
        let definitions: Vec<_> = catalog.definitions().cloned().collect();
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&definitions)?),
            OutputFormat::Table => output_catalog_table(&definitions),
            OutputFormat::Pretty => output_catalog_pretty(&definitions),
        }
        return Ok(());
    }

    tracing::debug!("Classifying {} URLs", urls.len());
    let classifications = classify_all(catalog, urls);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&classifications)?),
        OutputFormat::Table => {
            println!("url,entity,homepage,unrecognized");
            for c in &classifications {
                let (homepage, unrecognized) = match &c.entity {
                    Entity::Known(e) => (e.homepage.as_deref().unwrap_or(""), e.is_unrecognized),
                    Entity::Unattributed => ("", false),
                };
                println!(
                    "{},{},{},{}",
                    csv_field(&c.url),
                    csv_field(c.entity.display_name()),
                    csv_field(homepage),
                    unrecognized
                );
            }
        }
        OutputFormat::Pretty => output_classifications_pretty(&classifications),
    }

    Ok(())
}

fn output_catalog_pretty(definitions: &[EntityDefinition]) {
    use console::style;

    println!("\n{}", style("Entity Catalog").bold().cyan());
    println!("{}", style("==============").cyan());
    println!("\n  {} entities\n", definitions.len());

    for definition in definitions {
        let category = definition.category.as_deref().unwrap_or("-");
        println!(
            "  {} {}",
            style(&definition.name).bold(),
            style(format!("[{}]", category)).dim()
        );
        println!("    {}", definition.domains.join(", "));
    }

    println!();
}

fn output_catalog_table(definitions: &[EntityDefinition]) {
    println!("name,category,homepage,domains");
    for d in definitions {
        println!(
            "{},{},{},{}",
            csv_field(&d.name),
            csv_field(d.category.as_deref().unwrap_or("")),
            csv_field(d.homepage.as_deref().unwrap_or("")),
            csv_field(&d.domains.join(" "))
        );
    }
}

fn describe(entity: &ClassifiedEntity) -> String {
    if entity.is_unrecognized {
        format!("{} (not in catalog)", entity.name)
    } else {
        entity.name.clone()
    }
}

fn output_classifications_pretty(classifications: &[Classification]) {
    use console::style;

    println!("\n{}", style("URL Entities").bold().cyan());
    println!("{}", style("============").cyan());
    println!();

    for c in classifications {
        let entity = match &c.entity {
            Entity::Known(e) => style(describe(e)).green(),
            Entity::Unattributed => style("Unattributed".to_string()).yellow(),
        };
        println!("  {} -> {}", c.url, entity);
    }

    println!();
}
