//! Schedule Card Component
//!
//! One schedule item: completion checkbox with a short delay before the
//! toggle is stored, swipe right to toggle, swipe left to delete,
//! relative or absolute time, and quick edit entry points. Behaviour
//! switches come from `ViewOptions`.

use chrono::{DateTime, Local, Utc};
use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::{
    make_on_swipe_mousedown, make_on_swipe_mousemove, make_on_swipe_mouseup, make_on_touchend,
    make_on_touchmove, make_on_touchstart, SwipeHandlers,
};
use schedule_core::gesture::resolve_intent;
use schedule_core::time_format::{format_absolute, format_relative, is_overdue};
use schedule_core::{CompletionEffect, CompletionMachine, ItemId, ScheduleItem, SwipeIntent, SwipeTracker};

use crate::commands;
use crate::components::DeleteScheduleButton;
use crate::context::{AppContext, EditField};
use crate::store::{store_snapshot, store_toggle_expanded, use_app_store, AppStateStoreFields};

/// Used when the window width cannot be read
const FALLBACK_VIEWPORT_WIDTH: f64 = 375.0;

fn viewport_width() -> f64 {
    web_sys::window()
        .and_then(|win| win.inner_width().ok())
        .and_then(|width| width.as_f64())
        .unwrap_or(FALLBACK_VIEWPORT_WIDTH)
}

fn time_label(date: Option<DateTime<Utc>>, now: DateTime<Utc>, relative: bool) -> String {
    if relative {
        return format_relative(date, now).label();
    }
    let absolute = format_absolute(date, &Local);
    match absolute.time_label() {
        Some(time) => format!("{} {}", absolute.date_label(), time),
        None => absolute.date_label().to_string(),
    }
}

/// Store the toggle; on failure the checkmark falls back to the stored state
fn store_completed(ctx: AppContext, item: Signal<ScheduleItem>, completed: bool, shown: RwSignal<bool>) {
    let service = ctx.service();
    let id = item.with_untracked(|i| i.id.clone());
    spawn_local(async move {
        if let Err(e) = commands::set_schedule_completed(&service, &id, completed).await {
            shown.set(item.with_untracked(|i| i.is_completed));
            ctx.notify_error(format!("完了状態を更新できませんでした: {}", e));
        }
    });
}

fn delete_item(ctx: AppContext, snapshot: Vec<ScheduleItem>, id: ItemId) {
    let service = ctx.service();
    spawn_local(async move {
        match commands::delete_schedule(&service, &snapshot, &id).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(item_id = %id, "delete skipped"),
            Err(e) => ctx.notify_error(format!("削除できませんでした: {}", e)),
        }
    });
}

#[component]
pub fn ScheduleCard(#[prop(into)] item: Signal<ScheduleItem>, #[prop(into)] has_children: Signal<bool>) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let store = use_app_store();
    let view_options = ctx.view_options();
    let delete_policy = view_options.delete_policy;

    // Rows are keyed by id, so the id never changes for this card
    let id = item.with_untracked(|i| i.id.clone());
    let persisted = move || item.with(|i| i.is_completed);
    let persisted_untracked = move || item.with_untracked(|i| i.is_completed);
    let can_delete = Signal::derive(move || delete_policy.allows(persisted()));

    // Completion
    let machine = StoredValue::new(CompletionMachine::new());
    let timer: StoredValue<Option<Timeout>, LocalStorage> = StoredValue::new_local(None);
    let shown_completed = RwSignal::new(persisted_untracked());
    let busy = RwSignal::new(false);

    // Follow the stored state unless a completion is pending
    Effect::new(move |_| {
        let stored = persisted();
        if !busy.get_untracked() {
            shown_completed.set(stored);
        }
    });

    let run_effect = move |effect: CompletionEffect| match effect {
        CompletionEffect::None => {}
        CompletionEffect::StartDelay { ticket, delay_ms } => {
            shown_completed.set(true);
            busy.set(true);
            let pending = Timeout::new(delay_ms, move || {
                let effect = machine
                    .try_update_value(|m| m.elapsed(ticket))
                    .unwrap_or(CompletionEffect::None);
                if let CompletionEffect::Emit { completed } = effect {
                    busy.set(false);
                    store_completed(ctx, item, completed, shown_completed);
                }
            });
            timer.set_value(Some(pending));
        }
        CompletionEffect::Emit { completed } => {
            shown_completed.set(completed);
            busy.set(false);
            store_completed(ctx, item, completed, shown_completed);
        }
        CompletionEffect::CancelDelay => {
            timer.set_value(None);
            shown_completed.set(persisted_untracked());
            busy.set(false);
        }
    };

    let on_check = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let effect = machine
            .try_update_value(|m| m.press(persisted_untracked()))
            .unwrap_or(CompletionEffect::None);
        run_effect(effect);
    };

    // Swipe
    let tracker = StoredValue::new(SwipeTracker::new());
    let (offset, set_offset) = signal(0.0_f64);
    let allow_swipe = view_options.allow_swipe;

    let swipe_handlers = {
        let id = id.clone();
        SwipeHandlers {
            on_start: Callback::new(move |x: f64| {
                if allow_swipe && !busy.get_untracked() {
                    let width = viewport_width();
                    tracker.update_value(|t| t.begin(x, width));
                }
            }),
            on_move: Callback::new(move |x: f64| {
                let (position, lock) = tracker
                    .try_update_value(|t| {
                        let position = t.update(x);
                        (position, t.is_active() && t.locks_scroll())
                    })
                    .unwrap_or((0.0, false));
                set_offset.set(position);
                lock
            }),
            on_end: Callback::new(move |_| {
                let intent = tracker.try_update_value(|t| t.release()).unwrap_or(SwipeIntent::None);
                set_offset.set(0.0);
                let completed = persisted_untracked();
                match resolve_intent(intent, completed, delete_policy) {
                    SwipeIntent::ToggleComplete => {
                        if busy.get_untracked() {
                            return;
                        }
                        shown_completed.set(!completed);
                        store_completed(ctx, item, !completed, shown_completed);
                    }
                    SwipeIntent::Delete => {
                        if commands::confirm("この予定を削除しますか？") {
                            delete_item(ctx, store_snapshot(&store), id.clone());
                        }
                    }
                    SwipeIntent::None => {}
                }
            }),
        }
    };

    on_cleanup(move || {
        machine.try_update_value(|m| m.unmount());
        timer.try_update_value(|t| t.take());
        tracker.try_update_value(|t| t.abort());
    });

    // Display
    let card_class = move || {
        let mut c = String::from("schedule-card");
        if shown_completed.get() {
            c.push_str(" completed");
        }
        if busy.get() {
            c.push_str(" completing");
        }
        if is_overdue(item.with(|i| i.scheduled_date), persisted(), store.now().get()) {
            c.push_str(" overdue");
        }
        if offset.get() != 0.0 {
            c.push_str(" swiping");
        }
        c
    };
    let card_style = move || format!("transform: translateX({}px);", offset.get());
    let time_text = move || {
        time_label(
            item.with(|i| i.scheduled_date),
            store.now().get(),
            store.show_relative_time().get(),
        )
    };

    let expanded = {
        let id = id.clone();
        move || store.expansion().with(|e| e.is_expanded(&id))
    };
    let toggle_expanded = {
        let id = id.clone();
        move |ev: web_sys::MouseEvent| {
            ev.stop_propagation();
            store_toggle_expanded(&store, &id);
        }
    };

    let edit_title = move |_| ctx.open_edit(item.get_untracked(), EditField::Title);
    let edit_date = move |_| ctx.open_edit(item.get_untracked(), EditField::Date);
    let add_subtask = {
        let id = id.clone();
        move |ev: web_sys::MouseEvent| {
            ev.stop_propagation();
            ctx.open_add(Some(id.clone()));
        }
    };
    let on_delete = {
        let id = id.clone();
        Callback::new(move |_: ()| delete_item(ctx, store_snapshot(&store), id.clone()))
    };
    let title = Signal::derive(move || item.with(|i| i.title.clone()));

    view! {
        <div class="swipe-container">
            <div class="swipe-action swipe-action-complete" class:visible=move || { offset.get() > 0.0 }>
                {move || if persisted() { "未完了に戻す" } else { "完了" }}
            </div>
            <Show when=move || can_delete.get()>
                <div class="swipe-action swipe-action-delete" class:visible=move || { offset.get() < 0.0 }>
                    "削除"
                </div>
            </Show>
            <div
                class=card_class
                style=card_style
                on:touchstart=make_on_touchstart(swipe_handlers)
                on:touchmove=make_on_touchmove(swipe_handlers)
                on:touchend=make_on_touchend(swipe_handlers)
                on:touchcancel=make_on_touchend(swipe_handlers)
                on:mousedown=make_on_swipe_mousedown(swipe_handlers)
                on:mousemove=make_on_swipe_mousemove(swipe_handlers)
                on:mouseup=make_on_swipe_mouseup(swipe_handlers)
                on:mouseleave=make_on_swipe_mouseup(swipe_handlers)
            >
                <Show
                    when=move || has_children.get()
                    fallback=|| view! { <span class="collapse-placeholder"></span> }
                >
                    <button class="collapse-btn" on:click=toggle_expanded.clone()>
                        {
                            let expanded = expanded.clone();
                            move || if expanded() { "▼" } else { "▶" }
                        }
                    </button>
                </Show>

                <button
                    class="check-btn"
                    class:checked=move || shown_completed.get()
                    disabled=move || busy.get()
                    title=move || if persisted() { "未完了に戻す" } else { "完了にする" }
                    on:click=on_check
                >
                    {move || if shown_completed.get() { "✓" } else { "" }}
                </button>

                <div class="card-body">
                    <div class="card-title" on:click=edit_title>
                        {move || title.get()}
                        {move || item.with(|i| i.is_from_image).then(|| view! {
                            <span class="image-badge" title="画像から作成">"📷"</span>
                        })}
                    </div>
                    <div class="card-meta">
                        <span class="card-time" on:click=edit_date>{time_text}</span>
                        {move || item.with(|i| i.estimated_duration).map(|minutes| view! {
                            <span class="card-duration">{format!("{}分", minutes)}</span>
                        })}
                        {move || item.with(|i| i.location.clone()).map(|location| view! {
                            <span class="card-location">{format!("📍 {}", location)}</span>
                        })}
                    </div>
                </div>

                <div class="card-actions">
                    <Show when=move || !persisted()>
                        <button class="add-subtask-btn" title="サブタスクを追加" on:click=add_subtask.clone()>"+"</button>
                    </Show>
                    <DeleteScheduleButton item_title=title allowed=can_delete on_confirm=on_delete />
                </div>
            </div>
        </div>
    }
}
