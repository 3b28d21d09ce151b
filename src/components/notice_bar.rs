//! Notice Bar Component

use leptos::prelude::*;

use crate::context::{AppContext, NoticeKind};

/// Dismissible message strip; errors never block the timeline
#[component]
pub fn NoticeBar() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    view! {
        {move || ctx.notice.get().map(|notice| {
            let class = match notice.kind {
                NoticeKind::Info => "notice-bar info",
                NoticeKind::Error => "notice-bar error",
            };
            view! {
                <div class=class role="status">
                    <span class="notice-message">{notice.message}</span>
                    <button class="notice-dismiss" on:click=move |_| ctx.dismiss_notice()>"×"</button>
                </div>
            }
        })}
    }
}
