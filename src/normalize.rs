//! 正規化で使う値の取り出し・型変換

use serde_json::{Map, Value};

/// 文字列または数値のIDを文字列にする
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 整数に変換（変換できなければ 0）
pub fn coerce_i64(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub fn str_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

/// `{ "data": [...] }` 形式の配列を取り出す（無ければ空）
pub fn data_list(edge: Option<&Value>) -> Vec<Value> {
    edge.and_then(|e| e.get("data"))
        .and_then(|d| d.as_array())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_string() {
        assert_eq!(id_string(&json!("abc")), Some("abc".to_string()));
        assert_eq!(id_string(&json!(123)), Some("123".to_string()));
        assert_eq!(id_string(&json!("")), None);
        assert_eq!(id_string(&json!(null)), None);
        assert_eq!(id_string(&json!({"id": 1})), None);
    }

    #[test]
    fn test_coerce_i64() {
        assert_eq!(coerce_i64(Some(&json!(5))), 5);
        assert_eq!(coerce_i64(Some(&json!("5"))), 5);
        assert_eq!(coerce_i64(Some(&json!(" 12 "))), 12);
        assert_eq!(coerce_i64(Some(&json!(3.9))), 3);
        assert_eq!(coerce_i64(Some(&json!("many"))), 0);
        assert_eq!(coerce_i64(Some(&json!(null))), 0);
        assert_eq!(coerce_i64(None), 0);
    }

    #[test]
    fn test_data_list() {
        let edge = json!({"data": [{"type": "LIKE"}]});
        assert_eq!(data_list(Some(&edge)).len(), 1);
        assert!(data_list(Some(&json!({"data": "x"}))).is_empty());
        assert!(data_list(None).is_empty());
    }
}
