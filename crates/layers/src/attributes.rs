//! Field presentation rules driven by the deployment config.

use std::cmp::Ordering;

use formats::feature_info::FeatureRecord;

use crate::config::DeploymentConfig;

/// Whether any configured hidden name occurs inside `field`, ignoring case.
pub fn should_hide_field(config: &DeploymentConfig, field: &str) -> bool {
    let field = field.to_lowercase();
    config
        .hidden_fields
        .iter()
        .any(|hidden| field.contains(&hidden.to_lowercase()))
}

fn mapped_name<'a>(config: &'a DeploymentConfig, field: &str) -> Option<&'a str> {
    config
        .field_mapping
        .iter()
        .find(|(k, _)| k.to_lowercase() == field.to_lowercase())
        .map(|(_, v)| v.as_str())
}

pub fn display_name(config: &DeploymentConfig, field: &str) -> String {
    mapped_name(config, field)
        .map(str::to_string)
        .unwrap_or_else(|| format_field_name(field))
}

/// `land_type` -> `Land Type`, `farmerName` -> `Farmer Name`.
pub fn format_field_name(field: &str) -> String {
    let mut spaced = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        if c == '_' {
            spaced.push(' ');
        } else if c.is_uppercase() {
            spaced.push(' ');
            spaced.extend(c.to_lowercase());
        } else {
            spaced.push(c);
        }
    }
    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Mapped fields first, then the rest; alphabetical within each group.
pub fn compare_fields(config: &DeploymentConfig, a: &str, b: &str) -> Ordering {
    let a_mapped = mapped_name(config, a).is_some();
    let b_mapped = mapped_name(config, b).is_some();
    b_mapped
        .cmp(&a_mapped)
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// `(display name, value)` rows for one record, skipping hidden fields and
/// null or empty values.
pub fn display_rows(config: &DeploymentConfig, record: &FeatureRecord) -> Vec<(String, String)> {
    let mut fields: Vec<_> = record
        .fields
        .iter()
        .filter(|(name, value)| !value.is_blank() && !should_hide_field(config, name))
        .collect();
    fields.sort_by(|(a, _), (b, _)| compare_fields(config, a, b));
    fields
        .into_iter()
        .map(|(name, value)| (display_name(config, name), value.to_string()))
        .collect()
}
