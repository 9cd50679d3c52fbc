//! 天气查询工具
//!
//! 调用外部预报服务（WeatherAPI 线格式），把多日预报整理成紧凑摘要，
//! 将摘要作为侧产物入库为一次性索引（作用域 `weather/<location>_<days>`），
//! 并以两行机读形态返回 Observation：`PATH=<索引路径>` + `QUESTION=<原始问题>`。
//! 这两行是与 retrieval_qa 的交接契约：编排层的规则会引导模型立即转调 retrieval_qa。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

use crate::llm::EmbeddingProvider;
use crate::rag::{ingest_documents, Document, IngestOptions};
use crate::tools::input::{opt_str, opt_u32};
use crate::tools::Tool;

/// weather_tool 的参数契约（仅用于 schema 生成）
#[allow(dead_code)]
#[derive(Debug, Deserialize, JsonSchema)]
struct WeatherArgs {
    /// 城市或地名；用户未提供时省略或传 null
    location: Option<String>,
    /// 预报天数（1 起）；用户未提供时省略或传 null
    days: Option<u32>,
    /// 用户的原始天气问题，原样透传
    query: Option<String>,
}

// ---- 预报服务响应（WeatherAPI 线格式的子集） ----

#[derive(Debug, Deserialize)]
struct ApiCondition {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    temp_c: Option<f64>,
    condition: Option<ApiCondition>,
}

#[derive(Debug, Deserialize)]
struct ApiDay {
    maxtemp_c: Option<f64>,
    mintemp_c: Option<f64>,
    avgtemp_c: Option<f64>,
    daily_chance_of_rain: Option<f64>,
    condition: Option<ApiCondition>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastDay {
    date: Option<String>,
    day: Option<ApiDay>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiForecast {
    #[serde(default)]
    forecastday: Vec<ApiForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    name: Option<String>,
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    location: Option<ApiLocation>,
    current: Option<ApiCurrent>,
    forecast: Option<ApiForecast>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

/// 天气工具：预报服务地址与 key、嵌入提供方、索引落盘参数
pub struct WeatherTool {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_days: u32,
    embedder: Arc<dyn EmbeddingProvider>,
    ingest_opts: IngestOptions,
}

impl WeatherTool {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
        max_days: u32,
        embedder: Arc<dyn EmbeddingProvider>,
        ingest_opts: IngestOptions,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            max_days,
            embedder,
            ingest_opts,
        }
    }

    /// 位置标识：小写、空格转下划线，用于索引作用域目录名
    fn location_slug(location: &str) -> String {
        location.trim().to_lowercase().replace(' ', "_")
    }

    /// 整理紧凑多日摘要：解析到的位置、当前天气、逐日的天况 / 高低温 / 均温 / 降雨概率
    fn format_forecast(&self, requested: &str, days: u32, data: &ForecastResponse) -> String {
        let resolved = match &data.location {
            Some(loc) => {
                let name = loc.name.as_deref().unwrap_or(requested);
                match loc.region.as_deref().filter(|r| !r.trim().is_empty()) {
                    Some(region) => format!("{}, {}", name, region.trim()),
                    None => name.to_string(),
                }
            }
            None => requested.to_string(),
        };

        let empty = ApiForecast::default();
        let fcast = data.forecast.as_ref().unwrap_or(&empty);
        if fcast.forecastday.is_empty() {
            return format!("No forecast data returned for {} (days={}).", resolved, days);
        }

        let shown = (days as usize).min(fcast.forecastday.len());
        let mut lines = vec![format!("Weather for {} ({} day(s)):", resolved, shown)];

        if let Some(current) = &data.current {
            let cond = current
                .condition
                .as_ref()
                .and_then(|c| c.text.as_deref())
                .map(str::trim)
                .filter(|c| !c.is_empty());
            if cond.is_some() || current.temp_c.is_some() {
                lines.push("Current:".to_string());
                if let Some(cond) = cond {
                    lines.push(format!("- Condition: {}", cond));
                }
                if let Some(t) = current.temp_c {
                    lines.push(format!("- Temp: {}°C", t));
                }
            }
        }

        lines.push("Forecast:".to_string());
        for d in fcast.forecastday.iter().take(days as usize) {
            lines.push(format!("- {}:", d.date.as_deref().unwrap_or("?")));
            let Some(day) = &d.day else { continue };
            if let Some(cond) = day
                .condition
                .as_ref()
                .and_then(|c| c.text.as_deref())
                .map(str::trim)
                .filter(|c| !c.is_empty())
            {
                lines.push(format!("  Condition: {}", cond));
            }
            if let (Some(max), Some(min)) = (day.maxtemp_c, day.mintemp_c) {
                lines.push(format!("  High/Low: {}°C / {}°C", max, min));
            }
            if let Some(avg) = day.avgtemp_c {
                lines.push(format!("  Avg: {}°C", avg));
            }
            if let Some(rain) = day.daily_chance_of_rain {
                lines.push(format!("  Rain chance: {}%", rain));
            }
        }

        lines.join("\n")
    }

    /// 把摘要追加到预报工件日志（JSONL）；失败只告警，不影响主流程
    fn append_artifact(&self, resolved_summary: &str, days: u32) {
        let dir = self.ingest_opts.storage_root.join("weather");
        let record = serde_json::json!({
            "timestamp_utc": Utc::now().to_rfc3339(),
            "days_requested": days,
            "text": resolved_summary,
        });
        let result = std::fs::create_dir_all(&dir).and_then(|_| {
            use std::io::Write;
            let mut f = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("forecasts.jsonl"))?;
            writeln!(f, "{}", record)
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to append forecast artifact");
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather_tool"
    }

    fn description(&self) -> &str {
        "Use this tool whenever the user wants the weather for a location. Args is a \
         JSON object with three fields: 'location' (city or country name), 'days' \
         (number of forecast days) and 'query' (the user's exact question, always \
         included). If the user did not provide 'location' or 'days', omit that field \
         or pass null and the tool will ask for it. On success the observation is two \
         lines, 'PATH=<index path>' and 'QUESTION=<query>'; pass that text verbatim \
         to the retrieval_qa tool."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schema_for!(WeatherArgs)).unwrap_or_default()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        // Action Input 偶尔是字符串化的 JSON，先还原为对象
        let args = match args {
            Value::String(s) => serde_json::from_str::<Value>(&s)
                .map_err(|_| "weather_tool expects a JSON object as Action Input".to_string())?,
            other => other,
        };

        let location = opt_str(&args, "location");
        let days = opt_u32(&args, "days")?;
        let query = opt_str(&args, "query");

        let Some(location) = location else {
            return Ok("Provide location".to_string());
        };
        let Some(days) = days else {
            return Ok("Provide number of days".to_string());
        };
        if days == 0 || days > self.max_days {
            return Err(format!(
                "'days' must be between 1 and {}, got {}",
                self.max_days, days
            ));
        }
        let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Err("WEATHER_API_KEY is not set".to_string());
        };

        let url = format!("{}/forecast.json", self.base_url.trim_end_matches('/'));
        let days_param = days.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("key", key),
                ("q", location.as_str()),
                ("days", days_param.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await
            .map_err(|e| format!("Network error contacting weather service: {}", e))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(format!(
                "Weather service error ({}): {}",
                status.as_u16(),
                message
            ));
        }

        let data = resp
            .json::<ForecastResponse>()
            .await
            .map_err(|_| "Invalid response from weather service (not JSON)".to_string())?;

        let summary = self.format_forecast(&location, days, &data);
        self.append_artifact(&summary, days);

        // 侧产物入库：每次调用都是作用域为 <location>_<days> 的全新一次性索引
        let slug = Self::location_slug(&location);
        let scoped = IngestOptions {
            storage_root: self
                .ingest_opts
                .storage_root
                .join("weather")
                .join(format!("{}_{}", slug, days)),
            ..self.ingest_opts.clone()
        };
        let doc = Document::new(summary, format!("weather:{}_{}", slug, days));
        let handle = ingest_documents(vec![doc], &*self.embedder, &scoped)
            .await
            .map_err(|e| format!("Failed to index forecast: {}", e))?;

        let question =
            query.unwrap_or_else(|| format!("weather in {} for next {} days", location, days));
        Ok(format!("PATH={}\nQUESTION={}", handle.path.display(), question))
    }
}
