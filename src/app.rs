//! Schedule Frontend App
//!
//! Builds the service from configuration, provides context and store, and
//! runs the background loops: snapshot subscription, polling for stores
//! without push, and the clock tick for relative times.

use std::rc::Rc;

use chrono::{FixedOffset, Local, Offset, Utc};
use futures::future::{AbortHandle, Abortable};
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;
use rolling_logger::LogBuffer;
use schedule_core::{
    AppConfig, FirestoreStore, GeminiParser, LiteralParser, MemoryStore, ScheduleParser, ScheduleService,
    ScheduleStore, StoreConfig, UserId,
};

use crate::commands;
use crate::components::{AddScheduleModal, LogPanel, NoticeBar, QuickEditDialog, ScheduleTreeView, TimelineHeader};
use crate::context::AppContext;
use crate::store::{store_set_items, AppState, AppStateStoreFields};

/// Offset naive parser dates are read in
fn local_offset() -> FixedOffset {
    Local::now().offset().fix()
}

fn secs_to_ms(secs: u32) -> u32 {
    secs.saturating_mul(1000)
}

fn build_service(config: &AppConfig) -> ScheduleService {
    let store: Rc<dyn ScheduleStore> = match &config.store {
        StoreConfig::Memory => Rc::new(MemoryStore::new()),
        StoreConfig::Firestore(firestore) => Rc::new(FirestoreStore::new(firestore.clone())),
    };
    let parser: Rc<dyn ScheduleParser> = match &config.parser.gemini {
        Some(gemini) => Rc::new(GeminiParser::new(gemini.clone(), local_offset())),
        None => {
            tracing::info!("no parser API key, text is stored as typed");
            Rc::new(LiteralParser)
        }
    };
    ScheduleService::new(store, parser, UserId::new(config.user_id.clone()))
        .with_delete_policy(config.view.delete_policy)
}

#[component]
pub fn App(config: AppConfig, logs: LogBuffer) -> impl IntoView {
    let view_options = config.view.clone();
    let polls = matches!(config.store, StoreConfig::Firestore(_));

    let ctx = AppContext::new(build_service(&config), view_options.clone(), logs);
    provide_context(ctx);
    let store = Store::new(AppState::new(&view_options));
    provide_context(store);

    // Snapshots
    let (snapshot_abort, snapshot_registration) = AbortHandle::new_pair();
    let service = ctx.service();
    spawn_local(async move {
        let run = async move {
            let mut subscription = match service.subscribe().await {
                Ok(subscription) => subscription,
                Err(e) => {
                    store.loading().set(false);
                    ctx.notify_error(format!("予定を読み込めませんでした: {}", e));
                    return;
                }
            };
            while let Some(items) = subscription.next().await {
                tracing::debug!(count = items.len(), "snapshot received");
                store_set_items(&store, items);
            }
            tracing::info!("schedule subscription closed");
        };
        let _ = Abortable::new(run, snapshot_registration).await;
    });

    // Polling
    let (poll_abort, poll_registration) = AbortHandle::new_pair();
    if polls {
        let service = ctx.service();
        let interval_ms = secs_to_ms(view_options.poll_interval_secs);
        spawn_local(async move {
            let run = async move {
                loop {
                    TimeoutFuture::new(interval_ms).await;
                    if let Err(e) = commands::refresh_schedules(&service).await {
                        tracing::warn!("poll failed: {}", e);
                    }
                }
            };
            let _ = Abortable::new(run, poll_registration).await;
        });
    }

    // Clock for relative labels
    let (tick_abort, tick_registration) = AbortHandle::new_pair();
    let tick_ms = secs_to_ms(view_options.refresh_interval_secs);
    spawn_local(async move {
        let run = async move {
            loop {
                TimeoutFuture::new(tick_ms).await;
                store.now().set(Utc::now());
            }
        };
        let _ = Abortable::new(run, tick_registration).await;
    });

    on_cleanup(move || {
        snapshot_abort.abort();
        poll_abort.abort();
        tick_abort.abort();
    });

    view! {
        <div class="app-layout">
            <TimelineHeader />
            <NoticeBar />
            <main class="timeline">
                <ScheduleTreeView />
            </main>
            <button class="fab" title="新しい予定を追加" on:click=move |_| ctx.open_add(None)>
                "+"
            </button>
            <AddScheduleModal />
            <QuickEditDialog />
            <LogPanel />
        </div>
    }
}
