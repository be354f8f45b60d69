use crate::config::AppSettings;
use crate::utils::error::{AppError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// 從 TOML 檔案載入設定
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<AppSettings> {
    let content = std::fs::read_to_string(&path).map_err(|e| AppError::ConfigError {
        message: format!("Cannot read {}: {}", path.as_ref().display(), e),
    })?;
    from_toml_str(&content)
}

/// 從 TOML 字串解析設定，缺少的欄位使用預設值
pub fn from_toml_str(content: &str) -> Result<AppSettings> {
    let processed_content = substitute_env_vars(content);

    toml::from_str(&processed_content).map_err(|e| AppError::InvalidConfigValueError {
        field: "toml_parsing".to_string(),
        value: String::new(),
        reason: format!("TOML parsing error: {}", e),
    })
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder pattern"))
}

/// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保持原樣
fn substitute_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}
