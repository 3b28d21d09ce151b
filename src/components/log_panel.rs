//! Log Panel Component
//!
//! Collapsible view of the in-memory log buffer. Lines are read when the
//! panel opens or on request, not streamed.

use leptos::prelude::*;
use rolling_logger::LogLine;
use tracing::Level;

use crate::context::AppContext;

fn level_class(level: Level) -> &'static str {
    match level {
        Level::ERROR => "log-line error",
        Level::WARN => "log-line warn",
        Level::DEBUG | Level::TRACE => "log-line debug",
        _ => "log-line",
    }
}

#[component]
pub fn LogPanel() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let (open, set_open) = signal(false);
    let (lines, set_lines) = signal(Vec::<LogLine>::new());

    let reload = move || set_lines.set(ctx.logs.with_value(|logs| logs.snapshot()));
    let toggle = move |_| {
        if !open.get_untracked() {
            reload();
        }
        set_open.update(|v| *v = !*v);
    };
    let clear = move |_| {
        ctx.logs.with_value(|logs| logs.clear());
        set_lines.set(Vec::new());
    };

    view! {
        <section class="log-panel" class:open=move || open.get()>
            <button class="log-toggle" on:click=toggle>
                {move || if open.get() { "ログを閉じる" } else { "ログ" }}
            </button>
            <Show when=move || open.get()>
                <div class="log-toolbar">
                    <button on:click=move |_| reload()>"再読み込み"</button>
                    <button on:click=clear>"クリア"</button>
                    <span class="log-count">
                        {move || format!("{} / {}", lines.get().len(), ctx.logs.with_value(|logs| logs.capacity()))}
                    </span>
                </div>
                <div class="log-lines">
                    {move || lines.get().into_iter().map(|line| {
                        view! { <div class=level_class(line.level)>{line.to_string()}</div> }
                    }).collect_view()}
                </div>
            </Show>
        </section>
    }
}
