//! 年龄计算工具
//!
//! 入参为出生日期的三个分量（day / month / year），任一缺省时按 day → month → year
//! 的固定顺序提示用户补齐缺的那个，绝不在缺省时尝试解析日期。
//! 三者齐备后走日历校验：不存在的日期（如 2 月 30 日）或未来日期以错误返回，
//! 由循环转为 Observation；合法则按周年规则计算整年年龄。

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate};
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

use crate::tools::input::{opt_i32, opt_u32};
use crate::tools::Tool;

/// age_calculator 的参数契约（仅用于 schema 生成；实际提取走 input 辅助函数）
#[allow(dead_code)]
#[derive(Debug, Deserialize, JsonSchema)]
struct AgeArgs {
    /// 出生日（1-31）；用户未提供时省略或传 null
    day: Option<u32>,
    /// 出生月（1-12）；用户未提供时省略或传 null
    month: Option<u32>,
    /// 出生年（四位）；用户未提供时省略或传 null
    year: Option<i32>,
}

/// 年龄计算工具；today 可注入以便测试
pub struct AgeCalculatorTool {
    today: Option<NaiveDate>,
}

impl AgeCalculatorTool {
    pub fn new() -> Self {
        Self { today: None }
    }

    /// 固定「今天」（测试用）
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }
}

impl Default for AgeCalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

/// 周年规则：今年还没过生日则减一
fn whole_years(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    years
}

/// 近似整月数（原实现的 months/days 补充信息）
fn whole_months(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut months =
        (today.year() - born.year()) * 12 + today.month() as i32 - born.month() as i32;
    if today.day() < born.day() {
        months -= 1;
    }
    months
}

#[async_trait]
impl Tool for AgeCalculatorTool {
    fn name(&self) -> &str {
        "age_calculator"
    }

    fn description(&self) -> &str {
        "Use this tool when the user provides a date of birth and asks for their age. \
         Args is a JSON object with three fields: 'day' (1-31), 'month' (1-12) and \
         'year' (four digits). All three are required to compute the age; for any part \
         the user has not provided, omit the field or pass null and the tool will ask \
         for exactly that part (checked in the order day, month, year). Never invent \
         a value the user did not give."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schema_for!(AgeArgs)).unwrap_or_default()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let day = opt_u32(&args, "day")?;
        let month = opt_u32(&args, "month")?;
        let year = opt_i32(&args, "year")?;

        // 缺省检查先于任何日期解析，顺序固定：day → month → year
        let Some(day) = day else {
            return Ok("Provide the day of the date of birth (1-31).".to_string());
        };
        let Some(month) = month else {
            return Ok("Provide the month of the date of birth (1-12).".to_string());
        };
        let Some(year) = year else {
            return Ok("Provide the year of the date of birth (e.g. 1998).".to_string());
        };

        let born = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            format!(
                "Invalid date of birth: {:04}-{:02}-{:02} is not a calendar date.",
                year, month, day
            )
        })?;

        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        if born > today {
            return Err("Date of birth appears to be in the future. Please check and resend."
                .to_string());
        }

        let years = whole_years(born, today);
        let months = whole_months(born, today);
        let days = (today - born).num_days();
        Ok(format!(
            "You are {} years old. (~{} months, {} days).",
            years, months, days
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn tool() -> AgeCalculatorTool {
        AgeCalculatorTool::new().with_today(fixed_today())
    }

    #[tokio::test]
    async fn test_anniversary_rule_property() {
        // (born, expected years as of 2024-06-15)
        let cases = [
            ((1998, 2, 11), 26),  // 生日已过
            ((1998, 6, 15), 26),  // 正好生日当天
            ((1998, 6, 16), 25),  // 生日还差一天
            ((1998, 12, 31), 25), // 生日在下半年
            ((2000, 2, 29), 24),  // 闰日出生
            ((2024, 6, 15), 0),   // 今天出生
        ];
        for ((y, m, d), expected) in cases {
            let born = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            assert_eq!(
                whole_years(born, fixed_today()),
                expected,
                "born {:?}",
                born
            );
            let obs = tool()
                .execute(json!({"day": d, "month": m, "year": y}))
                .await
                .unwrap();
            assert!(obs.contains(&format!("You are {} years old.", expected)));
        }
    }

    #[tokio::test]
    async fn test_missing_precedence_day_month_year() {
        // 全缺：先问 day
        let obs = tool().execute(json!({})).await.unwrap();
        assert!(obs.contains("day"));
        // day 在，month / year 缺：问 month
        let obs = tool().execute(json!({"day": 11})).await.unwrap();
        assert!(obs.contains("month"));
        // 只缺 year：问 year
        let obs = tool()
            .execute(json!({"day": 11, "month": 2}))
            .await
            .unwrap();
        assert!(obs.contains("year"));
        // null 与省略等价
        let obs = tool()
            .execute(json!({"day": null, "month": 2, "year": 1998}))
            .await
            .unwrap();
        assert!(obs.contains("day"));
    }

    #[tokio::test]
    async fn test_missing_field_never_parses_date() {
        // month 缺省时即便 day 非法也不应报日期错误，而是提示补 month
        let obs = tool()
            .execute(json!({"day": 99, "year": 1998}))
            .await
            .unwrap();
        assert!(obs.contains("month"));
    }

    #[tokio::test]
    async fn test_invalid_date_rejected() {
        let err = tool()
            .execute(json!({"day": 30, "month": 2, "year": 1998}))
            .await
            .unwrap_err();
        assert!(err.contains("not a calendar date"));
    }

    #[tokio::test]
    async fn test_future_date_rejected() {
        let err = tool()
            .execute(json!({"day": 1, "month": 1, "year": 2099}))
            .await
            .unwrap_err();
        assert!(err.contains("future"));
    }
}
