//! Read features for a list of entities

use anyhow::{bail, Context, Result};
use comfy_table::{Cell, Color};
use featurekv_core::{to_naive_utc, EntityKey, EntityValue, FeatureRow, FeatureValue, FeatureViewSchema, OnlineStore};
use featurekv_online::RepoConfig;
use serde::Serialize;
use std::collections::BTreeMap;

use super::create_store;
use crate::config::resolve_view;
use crate::output::{create_table, print_output, print_warning, value_cell, OutputFormat};

/// One output row; `found` is false for entities with no stored features
#[derive(Debug, Serialize)]
struct ReadRow {
    entity: String,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_timestamp: Option<String>,
    features: BTreeMap<String, FeatureValue>,
}

pub async fn run(
    config: &RepoConfig,
    view_name: &str,
    entities: &[String],
    features: Option<&[String]>,
    output_format: OutputFormat,
) -> Result<()> {
    let entity_keys = entities
        .iter()
        .map(|s| parse_entity(s))
        .collect::<Result<Vec<_>>>()?;

    let view = resolve_view(config, view_name);
    let requested: Vec<String> = match features {
        Some(names) if !names.is_empty() => names.to_vec(),
        _ => view.feature_names(),
    };
    if requested.is_empty() {
        bail!(
            "No features to read: '{}' is not declared in the config, pass --features",
            view_name
        );
    }

    let store = create_store(config)?;
    let rows = store
        .online_read(&config.project, &view, &entity_keys, Some(&requested[..]))
        .await
        .with_context(|| format!("Read from '{}' failed", view_name))?;

    let missing = rows.iter().filter(|r| r.is_none()).count();

    match output_format {
        OutputFormat::Table => {
            print_table(&entity_keys, &rows, &requested);
            if missing > 0 {
                print_warning(&format!(
                    "{} of {} entities not found",
                    missing,
                    entity_keys.len()
                ));
            }
        }
        format => {
            let report: Vec<ReadRow> = entity_keys
                .iter()
                .zip(&rows)
                .map(|(key, row)| to_read_row(key, row.as_ref()))
                .collect();
            print_output(&report, format)?;
        }
    }

    Ok(())
}

fn to_read_row(key: &EntityKey, row: Option<&FeatureRow>) -> ReadRow {
    match row {
        Some(row) => ReadRow {
            entity: key.to_string(),
            found: true,
            event_timestamp: Some(row.event_timestamp.to_rfc3339()),
            features: row.features.clone().into_iter().collect(),
        },
        None => ReadRow {
            entity: key.to_string(),
            found: false,
            event_timestamp: None,
            features: BTreeMap::new(),
        },
    }
}

fn print_table(keys: &[EntityKey], rows: &[Option<FeatureRow>], requested: &[String]) {
    let mut table = create_table();
    let mut header = vec![Cell::new("entity"), Cell::new("event_timestamp (UTC)")];
    header.extend(requested.iter().map(Cell::new));
    table.set_header(header);

    for (key, row) in keys.iter().zip(rows) {
        let mut cells = vec![Cell::new(key.to_string())];
        match row {
            Some(row) => {
                cells.push(Cell::new(to_naive_utc(row.event_timestamp)));
                for name in requested {
                    let value = row.get_feature(name).cloned().unwrap_or_default();
                    cells.push(value_cell(&value));
                }
            }
            None => cells.push(Cell::new("not found").fg(Color::Yellow)),
        }
        table.add_row(cells);
    }

    println!("{table}");
}

/// Parses `name=value[,name=value...]` into an entity key
///
/// Values that parse as integers become `Int64`; wrap a value in double quotes
/// to keep it a string (`zip="02134"`).
fn parse_entity(spec: &str) -> Result<EntityKey> {
    let mut key = EntityKey {
        join_keys: Vec::new(),
        entity_values: Vec::new(),
    };

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, raw)) = part.split_once('=') else {
            bail!("Invalid entity '{}': expected name=value", part);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid entity '{}': empty join key name", part);
        }
        key.join_keys.push(name.to_string());
        key.entity_values.push(parse_entity_value(raw.trim()));
    }

    if key.is_empty() {
        bail!("Invalid entity '{}': no join keys", spec);
    }
    Ok(key)
}

fn parse_entity_value(raw: &str) -> EntityValue {
    if let Some(quoted) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return EntityValue::String(quoted.to_string());
    }
    match raw.parse::<i64>() {
        Ok(v) => EntityValue::Int64(v),
        Err(_) => EntityValue::String(raw.to_string()),
    }
}
