//! Wiring of the core into the browser: yewdux store handle and task spawning.
//!
//! # Design
//! - The yewdux `Dispatch<AppStore>` is the browser's [`StoreHandle`]; components subscribe
//!   to it as usual.
//! - Pollers returned by `mount` are spawned with `spawn_local` and end when their handle
//!   is stopped.

use std::rc::Rc;

use gloo::console;
use patchflow_api_models::UserRole;
use patchflow_config::ClientConfig;
use wasm_bindgen_futures::spawn_local;
use yewdux::dispatch::Dispatch;

use crate::core::api::ApiClient;
use crate::core::store::{AppStore, StoreHandle};
use crate::features::lists::controller::ViewController;
use crate::features::lists::dispatcher::ListDispatcher;
use crate::services::http::GlooTransport;
use crate::services::timer::GlooSleeper;

impl StoreHandle for Dispatch<AppStore> {
    fn snapshot(&self) -> Rc<AppStore> {
        self.get()
    }

    fn reduce<F: FnOnce(&mut AppStore)>(&self, f: F) {
        self.reduce_mut(f);
    }
}

/// Browser controller type.
pub type BrowserController = ViewController<GlooTransport, Dispatch<AppStore>>;

/// Shared API client for the browser, carrying the session token from the store.
#[must_use]
pub fn browser_api(config: &ClientConfig) -> Rc<ApiClient<GlooTransport>> {
    let token = Dispatch::<AppStore>::new()
        .get()
        .session
        .access_token
        .clone();
    Rc::new(ApiClient::with_token(
        GlooTransport::new(config.api_base_url.clone()),
        token,
    ))
}

/// Controller for `role`'s view bound to the global store.
#[must_use]
pub fn browser_controller(
    role: UserRole,
    api: Rc<ApiClient<GlooTransport>>,
    config: &ClientConfig,
) -> Rc<BrowserController> {
    let dispatcher = ListDispatcher::new(api, Dispatch::<AppStore>::new(), config.page_size);
    Rc::new(ViewController::new(
        role,
        Rc::new(dispatcher),
        config.poll_interval,
    ))
}

/// Mount `controller` and spawn its pollers.
pub fn mount(controller: &Rc<BrowserController>) {
    let controller = Rc::clone(controller);
    spawn_local(async move {
        for task in controller.mount(GlooSleeper).await {
            spawn_local(async move {
                let checks = task.run().await;
                console::debug!("freshness poller stopped after", checks, "checks");
            });
        }
    });
}
