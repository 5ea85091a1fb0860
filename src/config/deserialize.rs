// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Accepts ports written as YAML integers or strings.

use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum PortEntry {
    Number(i64),
    Text(String),
}

/// Keep the port as text so validation reports non-numeric values uniformly.
pub fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entry: Option<PortEntry> = Option::deserialize(deserializer)?;
    Ok(entry.map(|e| match e {
        PortEntry::Number(n) => n.to_string(),
        PortEntry::Text(s) => s,
    }))
}
