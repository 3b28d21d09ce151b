//! Runtime Configuration
//!
//! A page may set `window.__SCHEDULE_CONFIG__` to a JSON-shaped object.
//! Without it the `SCHEDULE_*` variables captured at build time apply.

use schedule_core::AppConfig;
use wasm_bindgen::JsValue;

const GLOBAL_CONFIG_KEY: &str = "__SCHEDULE_CONFIG__";

pub fn load_config() -> Result<AppConfig, String> {
    if let Some(value) = page_config() {
        let config: AppConfig = serde_wasm_bindgen::from_value(value)
            .map_err(|e| format!("invalid {}: {}", GLOBAL_CONFIG_KEY, e))?;
        config.validate().map_err(|e| e.to_string())?;
        return Ok(config);
    }
    AppConfig::from_lookup(build_env).map_err(|e| e.to_string())
}

fn page_config() -> Option<JsValue> {
    let window = web_sys::window()?;
    let value = js_sys::Reflect::get(&window, &JsValue::from_str(GLOBAL_CONFIG_KEY)).ok()?;
    if value.is_undefined() || value.is_null() {
        None
    } else {
        Some(value)
    }
}

fn build_env(key: &str) -> Option<String> {
    let value = match key {
        "SCHEDULE_USER_ID" => option_env!("SCHEDULE_USER_ID"),
        "SCHEDULE_STORE" => option_env!("SCHEDULE_STORE"),
        "SCHEDULE_FIRESTORE_PROJECT" => option_env!("SCHEDULE_FIRESTORE_PROJECT"),
        "SCHEDULE_FIRESTORE_API_KEY" => option_env!("SCHEDULE_FIRESTORE_API_KEY"),
        "SCHEDULE_FIRESTORE_COLLECTION" => option_env!("SCHEDULE_FIRESTORE_COLLECTION"),
        "SCHEDULE_GEMINI_API_KEY" => option_env!("SCHEDULE_GEMINI_API_KEY"),
        "SCHEDULE_GEMINI_MODEL" => option_env!("SCHEDULE_GEMINI_MODEL"),
        "SCHEDULE_DELETE_POLICY" => option_env!("SCHEDULE_DELETE_POLICY"),
        "SCHEDULE_LOG_CAPACITY" => option_env!("SCHEDULE_LOG_CAPACITY"),
        _ => None,
    };
    value.map(str::to_string)
}
