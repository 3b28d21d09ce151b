//! Schedule Tree View Component
//!
//! Renders the snapshot as an indented tree with drag-and-drop
//! re-parenting. The pointer's position over a row picks the drop zone:
//! top third inserts before, middle third nests, bottom third inserts after.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::*;
use schedule_core::{DropZone, ItemId, TreeRow};

use crate::commands;
use crate::components::ScheduleCard;
use crate::context::AppContext;
use crate::store::{store_snapshot, store_timeline_rows, use_app_store, AppStateStoreFields};

const INDENT_PX: usize = 24;

#[component]
pub fn ScheduleTreeView() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let store = use_app_store();
    let allow_drag = ctx.view.with_value(|v| v.allow_drag);

    let dnd = create_dnd_signals::<ItemId>();

    bind_global_mouseup(dnd, move |dragged: ItemId, hover: DropHover<ItemId>| {
        let zone = DropZone::from_offset(hover.offset_y, hover.height);
        let snapshot = store_snapshot(&store);
        let service = ctx.service();
        spawn_local(async move {
            match commands::move_schedule(&service, &snapshot, &dragged, &hover.target, zone).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!(item_id = %dragged, "drop ignored"),
                Err(e) => ctx.notify_error(format!("移動できませんでした: {}", e)),
            }
        });
    });

    let rows = Memo::new(move |_| store_timeline_rows(&store));
    let is_empty = move || !store.loading().get() && rows.with(|r| r.is_empty());

    view! {
        <div class="tree-view" class:dragging-active=move || dnd.dragging().is_some()>
            <Show when=move || store.loading().get()>
                <p class="loading">"読み込み中..."</p>
            </Show>
            <Show when=is_empty>
                <p class="empty-state">"予定がありません"</p>
            </Show>

            // Rows keep their card while the item changes in place, so a
            // pending completion or swipe is not reset by a new snapshot
            <For
                each=move || rows.get()
                key=TreeRow::key
                children=move |row| {
                    let id = row.item.id.clone();
                    let live = {
                        let id = id.clone();
                        Memo::new(move |prev: Option<&TreeRow>| {
                            rows.with(|rows| rows.iter().find(|r| r.item.id == id).cloned())
                                .or_else(|| prev.cloned())
                                .unwrap_or_else(|| row.clone())
                        })
                    };
                    let item = Memo::new(move |_| live.with(|r| r.item.clone()));
                    let has_children = Signal::derive(move || live.with(|r| r.has_children));
                    let draggable = move || allow_drag && !item.with(|i| i.is_completed);

                    let on_mousemove = make_on_item_mousemove(dnd, id.clone());
                    let on_mouseleave = make_on_mouseleave(dnd, id.clone());

                    let row_class = {
                        let id = id.clone();
                        move || {
                            let mut c = String::from("schedule-row");
                            if dnd.dragging().as_ref() == Some(&id) {
                                c.push_str(" dragging");
                            }
                            match dnd.hover_over(&id).map(|h| DropZone::from_offset(h.offset_y, h.height)) {
                                Some(DropZone::Before) => c.push_str(" drop-before"),
                                Some(DropZone::Child) => c.push_str(" drop-child"),
                                Some(DropZone::After) => c.push_str(" drop-after"),
                                None => {}
                            }
                            c
                        }
                    };
                    let row_style = move || format!("margin-left: {}px;", live.with(|r| r.depth) * INDENT_PX);

                    view! {
                        <div
                            class=row_class
                            style=row_style
                            on:mousemove=on_mousemove
                            on:mouseleave=on_mouseleave
                        >
                            <Show when=draggable>
                                <span
                                    class="drag-handle"
                                    title="ドラッグして移動"
                                    on:mousedown=make_on_mousedown(dnd, id.clone())
                                >
                                    "⋮⋮"
                                </span>
                            </Show>
                            <ScheduleCard item=item has_children=has_children />
                        </div>
                    }
                }
            />
        </div>
    }
}
