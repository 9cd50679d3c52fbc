//! 工具入参提取
//!
//! 缺省标记是显式的：字段省略或为 null 即「未提供」，空白字符串一并视为缺省。
//! 数值字段容忍字符串形式的数字（LLM 偶尔会把数字加引号）。

use serde_json::Value;

/// 提取可缺省的字符串字段；省略 / null / 空白 → None
pub fn opt_str(args: &Value, key: &str) -> Option<String> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// 提取可缺省的无符号整数字段；省略 / null / 空白 → Ok(None)，存在但不是数字 → Err
pub fn opt_u32(args: &Value, key: &str) -> Result<Option<u32>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| format!("'{}' must be a non-negative integer", key)),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| format!("'{}' must be a non-negative integer", key)),
        Some(_) => Err(format!("'{}' must be a non-negative integer", key)),
    }
}

/// 提取可缺省的有符号整数字段；规则同 opt_u32
pub fn opt_i32(args: &Value, key: &str) -> Result<Option<i32>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| format!("'{}' must be an integer", key)),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| format!("'{}' must be an integer", key)),
        Some(_) => Err(format!("'{}' must be an integer", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_forms() {
        let args = json!({"a": null, "b": "", "c": "  "});
        assert_eq!(opt_str(&args, "a"), None);
        assert_eq!(opt_str(&args, "b"), None);
        assert_eq!(opt_str(&args, "c"), None);
        assert_eq!(opt_str(&args, "missing"), None);
        assert_eq!(opt_u32(&args, "a").unwrap(), None);
        assert_eq!(opt_u32(&args, "missing").unwrap(), None);
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        let args = json!({"n": 7, "s": "11", "bad": "eleven"});
        assert_eq!(opt_u32(&args, "n").unwrap(), Some(7));
        assert_eq!(opt_u32(&args, "s").unwrap(), Some(11));
        assert!(opt_u32(&args, "bad").is_err());
        assert_eq!(opt_i32(&args, "n").unwrap(), Some(7));
    }
}
