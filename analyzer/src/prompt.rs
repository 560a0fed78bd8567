//! Prompt construction for field-similarity analysis.

use serde_json::Value;

use crate::error::Result;

/// System prompt appended to the analyzer's own instructions.
pub const SYSTEM_PROMPT: &str = "You are a database expert analyzing field relationships. \
Always respond with valid JSON only.";

const INSTRUCTIONS: &str = r#"I have database schemas from multiple tables. Please analyze all fields across all tables and identify:

1. **Identical fields**: Fields that appear in multiple tables with the exact same name and type
2. **Similar fields**: Fields that likely represent the same data but have different names (e.g., "user_id" vs "userId" vs "uid")
3. **Type patterns**: Common field types and their usage patterns

Please output your analysis as a JSON object with this structure:

```json
{
  "identical_fields": [
    {
      "field_name": "id",
      "field_type": "INTEGER",
      "tables": ["table1", "table2", "table3"],
      "count": 3
    }
  ],
  "similar_fields": [
    {
      "group_description": "User identifiers",
      "fields": [
        {"table": "users", "field_name": "user_id", "field_type": "INTEGER"},
        {"table": "orders", "field_name": "userId", "field_type": "INTEGER"},
        {"table": "sessions", "field_name": "uid", "field_type": "INTEGER"}
      ],
      "similarity_reason": "All represent user foreign keys with similar naming"
    }
  ],
  "type_patterns": [
    {
      "field_type": "INTEGER",
      "common_names": ["id", "count", "timestamp"],
      "total_occurrences": 150
    }
  ],
  "summary": {
    "total_tables": 0,
    "total_fields": 0,
    "unique_field_names": 0,
    "unique_field_types": 0
  }
}
```

Here are the database schemas to analyze:

"#;

const CLOSING: &str = "Please provide your analysis as valid JSON only, without any \
markdown formatting or explanations outside the JSON.";

/// Builds the analysis prompt for a schema map.
///
/// The schemas are embedded pretty-printed inside a fenced `json` block,
/// between the fixed instructions and the closing request for a bare JSON
/// reply.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sqlscope_analyzer::build_prompt;
///
/// let prompt = build_prompt(&json!({"users": {"table_name": "users"}})).unwrap();
/// assert!(prompt.contains("\"table_name\": \"users\""));
/// assert!(prompt.ends_with("outside the JSON."));
/// ```
pub fn build_prompt(schemas: &Value) -> Result<String> {
    let body = serde_json::to_string_pretty(schemas)?;

    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + body.len() + CLOSING.len() + 16);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("```json\n");
    prompt.push_str(&body);
    prompt.push_str("\n```\n\n");
    prompt.push_str(CLOSING);
    Ok(prompt)
}
