use crate::{commands::RequestArgs, error::CliError};
use grid::params::nest_form_pairs;
use serde_json::{Map, Value as JsonValue};

/// Builds draw request parameters for `table` from a JSON file and/or
/// form-style `key=value` pairs. Pairs override the file.
pub fn load_request(args: &RequestArgs, table: &str) -> Result<JsonValue, CliError> {
    let mut params = match &args.request {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            match serde_json::from_str(&json)? {
                JsonValue::Object(map) => map,
                _ => return Err(CliError::InvalidRequest),
            }
        }
        None => Map::new(),
    };

    let pairs = args
        .params
        .iter()
        .map(|param| {
            param
                .split_once('=')
                .ok_or_else(|| CliError::InvalidParam(param.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if let JsonValue::Object(form) = nest_form_pairs(pairs) {
        merge(&mut params, form);
    }

    params
        .entry("_dt")
        .or_insert_with(|| JsonValue::String(table.to_string()));
    if args.init {
        params.insert("_init".to_string(), JsonValue::Bool(true));
    }
    Ok(JsonValue::Object(params))
}

fn merge(target: &mut Map<String, JsonValue>, source: Map<String, JsonValue>) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(JsonValue::Object(existing)), JsonValue::Object(nested)) => merge(existing, nested),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(params: &[&str]) -> RequestArgs {
        RequestArgs {
            request: None,
            params: params.iter().map(|p| p.to_string()).collect(),
            init: false,
        }
    }

    #[test]
    fn test_form_pairs_are_nested() {
        let params = load_request(
            &args(&["draw=2", "columns[1][search][value]=foo", "order[0][column]=1"]),
            "books",
        )
        .unwrap();
        assert_eq!(params["_dt"], json!("books"));
        assert_eq!(params["draw"], json!("2"));
        assert_eq!(params["columns"]["1"]["search"]["value"], json!("foo"));
        assert_eq!(params["order"]["0"]["column"], json!("1"));
    }

    #[test]
    fn test_value_may_contain_equals_sign() {
        let params = load_request(&args(&["search[value]=a=b"]), "dt").unwrap();
        assert_eq!(params["search"]["value"], json!("a=b"));
    }

    #[test]
    fn test_param_without_value_is_rejected() {
        assert!(matches!(
            load_request(&args(&["draw"]), "dt"),
            Err(CliError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_merge_keeps_sibling_keys() {
        let mut target = json!({"columns": {"0": {"search": {"value": "a"}}}})
            .as_object()
            .cloned()
            .unwrap();
        let source = json!({"columns": {"1": {"search": {"value": "b"}}}})
            .as_object()
            .cloned()
            .unwrap();
        merge(&mut target, source);
        assert_eq!(target["columns"]["0"]["search"]["value"], json!("a"));
        assert_eq!(target["columns"]["1"]["search"]["value"], json!("b"));
    }
}
