use serde_json::{Map, Value};
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(records) = expect_optional_object(root, "records")? {
        validate_optional_string_field(records, "records.spreadsheet", "spreadsheet")?;
        validate_u64_field(records, "records.cache_ttl_secs", "cache_ttl_secs", 1, 86_400 * 7)?;
        validate_u64_field(records, "records.reference_count", "reference_count", 0, 20)?;
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_optional_string_field(generation, "generation.model", "model")?;
        validate_optional_string_field(generation, "generation.api_key", "api_key")?;
        validate_optional_string_field(generation, "generation.base_url", "base_url")?;
        validate_u64_field(generation, "generation.timeout_secs", "timeout_secs", 1, 3_600)?;
        validate_f64_field(generation, "generation.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(generation, "generation.hashtag_count", "hashtag_count", 0, 30)?;
        validate_u64_field(
            generation,
            "generation.min_keyword_count",
            "min_keyword_count",
            1,
            50,
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_optional_string_field(embedding, "embedding.model", "model")?;
        validate_optional_string_field(embedding, "embedding.api_key", "api_key")?;
        validate_u64_field(embedding, "embedding.batch_size", "batch_size", 1, 100)?;
    }

    if let Some(knowledge) = expect_optional_object(root, "knowledge")? {
        validate_string_array_field(knowledge, "knowledge.spreadsheets", "spreadsheets")?;
        validate_optional_string_field(knowledge, "knowledge.model", "model")?;
        validate_u64_field(knowledge, "knowledge.top_k", "top_k", 1, 50)?;
    }

    if let Some(sheets) = expect_optional_object(root, "sheets")? {
        validate_optional_string_field(sheets, "sheets.access_token", "access_token")?;
        validate_optional_string_field(sheets, "sheets.drive_base_url", "drive_base_url")?;
        validate_optional_string_field(sheets, "sheets.sheets_base_url", "sheets_base_url")?;
        validate_u64_field(sheets, "sheets.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(min..=max).contains(&number) {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    match section.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(config_type_error(path, "string")),
    }
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn out_of_range<T: std::fmt::Display>(path: &str, min: T, max: T) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': must be between {} and {}",
        path, min, max
    ))
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
