//! JSON rendering of compiled fragments.

use anyhow::Result;
use mik_search::{ConditionTree, Include, Value};
use serde_json::{Value as Json, json};
use time::format_description::well_known::Rfc3339;

/// `{"template", "binds", "includes", "scope"}` for a tree.
pub fn compiled(tree: &ConditionTree) -> Result<Json> {
    let fragment = tree.sanitize();
    let binds = fragment
        .binds
        .iter()
        .map(bind_to_json)
        .collect::<Result<Vec<_>>>()?;

    Ok(json!({
        "entity": tree.entity(),
        "template": fragment.template,
        "binds": binds,
        "includes": includes_to_json(&tree.includes()),
        "scope": tree.scope(),
    }))
}

/// `{"entity", "conditions", "relationships"}` for a tree's vocabulary.
pub fn names(tree: &ConditionTree) -> Json {
    json!({
        "entity": tree.entity(),
        "conditions": tree.condition_names(),
        "relationships": tree.relationship_names(),
    })
}

fn bind_to_json(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::String(s) => Json::String(s.clone()),
        Value::Timestamp(ts) => Json::String(ts.format(&Rfc3339)?),
        Value::Array(items) => Json::Array(items.iter().map(bind_to_json).collect::<Result<_>>()?),
    })
}

fn includes_to_json(includes: &[Include]) -> Json {
    Json::Array(
        includes
            .iter()
            .map(|include| {
                if include.nested.is_empty() {
                    return Json::String(include.name.clone());
                }
                let mut nested = serde_json::Map::new();
                nested.insert(include.name.clone(), includes_to_json(&include.nested));
                Json::Object(nested)
            })
            .collect(),
    )
}
