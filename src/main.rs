//! Schedule Frontend Entry Point

mod app;
mod commands;
mod components;
mod config;
mod context;
mod store;

use app::App;
use leptos::prelude::*;
use rolling_logger::{init_logger, LogBuffer, LoggerConfig, LoggerError, Sink};
use tracing::Level;
use wasm_bindgen::JsValue;

fn main() {
    console_error_panic_hook::set_once();

    let config = config::load_config();
    let capacity = config.as_ref().map(|c| c.log_capacity).unwrap_or(500);
    let logs = start_logging(capacity);

    match config {
        Ok(config) => {
            tracing::info!(user_id = %config.user_id, "starting schedule app");
            mount_to_body(move || view! { <App config=config logs=logs /> });
        }
        Err(message) => {
            tracing::error!("configuration error: {}", message);
            mount_to_body(move || {
                view! {
                    <div class="config-error">
                        <h1>"設定エラー"</h1>
                        <p>{message}</p>
                    </div>
                }
            });
        }
    }
}

/// Route `tracing` into the ring buffer and the browser console
fn start_logging(capacity: usize) -> LogBuffer {
    let level = if cfg!(debug_assertions) { Level::DEBUG } else { Level::INFO };
    let sink: Sink = Box::new(|level, line| {
        let line = JsValue::from_str(line);
        match level {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    });

    match init_logger(LoggerConfig { capacity, level }, Some(sink)) {
        Ok(buffer) => buffer,
        Err(LoggerError::AlreadyInitialized) => {
            web_sys::console::warn_1(&"[LOG] subscriber already installed, log panel stays empty".into());
            LogBuffer::new(capacity)
        }
    }
}
