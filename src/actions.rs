//! User-triggered flows that talk to the server.
//!
//! Each flow validates locally first and only then calls the [`ChatApi`].
//! Session effects are carried out through a [`SessionDriver`], which the
//! binary backs with the WebSocket [`crate::transport::TransportManager`].

use tracing::{info, warn};

use crate::app::App;
use crate::auth;
use crate::channels::{self, SearchQuery};
use crate::client::ChatApi;
use crate::models::{Identity, Member};
use crate::profile;
use crate::session::{SessionEffect, SessionInput, TransportEvent};

pub const LOAD_CHANNELS_FAILED: &str = "Failed to load channels.";
pub const CREATE_FAILED: &str = "Failed to create channel (the name may already exist).";
pub const CREATED: &str = "Channel created.";
pub const SEARCH_FAILED: &str = "Channel not found.";
pub const JOINED: &str = "Joined the channel.";
pub const DELETE_FAILED: &str = "Failed to delete channel.";
pub const DELETED: &str = "Channel deleted.";
pub const NOT_OWNER: &str = "Only channels you own can be deleted.";

/// Where transport effects land.
pub trait SessionDriver {
    fn connect(&mut self, generation: u64, channel_id: u64);
    fn disconnect(&mut self, generation: u64);
    fn send(&mut self, generation: u64, content: String);
}

pub async fn run_effects<A: ChatApi, D: SessionDriver>(
    api: &A,
    app: &mut App,
    driver: &mut D,
    effects: Vec<SessionEffect>,
) {
    for effect in effects {
        match effect {
            SessionEffect::Connect {
                generation,
                channel_id,
            } => driver.connect(generation, channel_id),
            SessionEffect::Disconnect { generation } => driver.disconnect(generation),
            SessionEffect::Send {
                generation,
                content,
            } => driver.send(generation, content),
            SessionEffect::FetchMembers { channel_id } => {
                let members = match api.channel_members(channel_id).await {
                    Ok(members) => Some(members),
                    Err(err) => {
                        warn!(channel_id, "member fetch failed: {err}");
                        None
                    }
                };
                app.session.apply(SessionInput::Roster {
                    channel_id,
                    members,
                });
            }
            SessionEffect::Notify(message) => app.set_sidebar_error(message),
        }
    }
}

pub async fn handle_transport_event<A: ChatApi, D: SessionDriver>(
    api: &A,
    app: &mut App,
    driver: &mut D,
    event: TransportEvent,
) {
    let effects = app.session.apply(SessionInput::Transport(event));
    run_effects(api, app, driver, effects).await;
}

pub async fn select_channel<A: ChatApi, D: SessionDriver>(
    api: &A,
    app: &mut App,
    driver: &mut D,
    channel: Option<u64>,
) {
    let effects = app.select_channel(channel);
    run_effects(api, app, driver, effects).await;
}

/// Startup identity: the dev identity when bypassing, else whoever the
/// stored session belongs to.
pub async fn resolve_identity<A: ChatApi>(api: &A, bypass: bool) -> Option<Identity> {
    if bypass {
        info!("authentication bypassed with development identity");
        return Some(Identity::dev());
    }
    match api.me().await {
        Ok(record) => record.to_identity(),
        Err(err) => {
            info!("no active session: {err}");
            None
        }
    }
}

// ---- Auth flow ----

/// Signs in with the form's credentials. Returns the identity on success.
pub async fn submit_login<A: ChatApi>(api: &A, app: &mut App) -> Option<Identity> {
    let form = &mut app.auth;
    form.error.clear();
    form.message.clear();
    form.loading = true;
    let request = form.login_request();
    let result = api.login(&request).await;
    form.loading = false;

    match result {
        Ok(payload) => match payload.user.as_ref().and_then(|u| u.to_identity()) {
            Some(identity) => {
                form.on_login_succeeded();
                Some(identity)
            }
            None => {
                form.error = auth::LOGIN_FAILED.to_string();
                None
            }
        },
        Err(err) => {
            form.error = err.user_message(auth::LOGIN_FAILED);
            None
        }
    }
}

/// Creates an account and hands its email back to the sign-in form.
pub async fn submit_register<A: ChatApi>(api: &A, app: &mut App) {
    let form = &mut app.auth;
    form.error.clear();
    form.message.clear();

    let request = match form.register_request() {
        Ok(request) => request,
        Err(message) => {
            form.error = message.to_string();
            return;
        }
    };

    form.loading = true;
    let result = api.register(&request).await;
    form.loading = false;

    match result {
        Ok(_) => {
            info!("account registered");
            form.on_registered(&request.email);
        }
        Err(err) => form.error = err.user_message(auth::REGISTER_FAILED),
    }
}

/// Signs out; the identity is dropped whether or not the server answers.
pub async fn logout<A: ChatApi, D: SessionDriver>(api: &A, app: &mut App, driver: &mut D) {
    if let Err(err) = api.logout().await {
        warn!("logout request failed: {err}");
    }
    let effects = app.logout();
    run_effects(api, app, driver, effects).await;
}

// ---- Chat shell ----

pub async fn load_channels<A: ChatApi, D: SessionDriver>(
    api: &A,
    app: &mut App,
    driver: &mut D,
) {
    let me = app.user_name().to_string();
    let (owned, joined) = tokio::join!(api.list_owned_channels(), api.list_joined_channels());
    match (owned, joined) {
        (Ok(owned), Ok(joined)) => {
            app.channels.merge_fetched(
                channels::owned_from_records(owned, &me),
                channels::joined_from_records(joined),
            );
            info!(count = app.channels.len(), "channels loaded");
            match app.active_channel_id() {
                None => {
                    select_channel(api, app, driver, Some(crate::models::HOME_CHANNEL_ID)).await
                }
                // rows may have moved; keep the cursor on the active channel
                current => {
                    app.select_channel(current);
                }
            }
        }
        (Err(err), _) | (_, Err(err)) => {
            warn!("channel load failed: {err}");
            app.set_sidebar_error(LOAD_CHANNELS_FAILED);
        }
    }
}

pub async fn create_channel<A: ChatApi, D: SessionDriver>(
    api: &A,
    app: &mut App,
    driver: &mut D,
) {
    let name = match channels::validate_channel_name(app.new_channel_name.as_str()) {
        Ok(name) => name,
        Err(message) => {
            app.set_sidebar_error(message);
            return;
        }
    };
    app.clear_sidebar_banners();

    let me = app.user_name().to_string();
    match api.create_channel(&name).await {
        Ok(record) => {
            let mut channel = record.into_channel(Some(me.as_str()));
            channel.owner_name = Some(me.clone());
            let channel_id = channel.id;
            app.channels.insert_if_absent(channel);
            select_channel(api, app, driver, Some(channel_id)).await;
            app.session.apply(SessionInput::SeedRoster(vec![Member {
                id: 0,
                name: me,
            }]));
            app.new_channel_name.clear();
            app.close_prompt();
            app.set_sidebar_message(CREATED);
        }
        Err(err) => {
            warn!("create channel failed: {err}");
            app.set_sidebar_error(CREATE_FAILED);
        }
    }
}

pub async fn search_and_join<A: ChatApi, D: SessionDriver>(
    api: &A,
    app: &mut App,
    driver: &mut D,
) {
    let query = match SearchQuery::parse(app.search_query.as_str()) {
        Ok(query) => query,
        Err(message) => {
            app.set_sidebar_error(message);
            return;
        }
    };
    app.clear_sidebar_banners();

    let found = match api.search_channel(&query.as_query()).await {
        Ok(record) => record.into_channel(Some(query.owner.as_str())),
        Err(err) => {
            warn!("channel search failed: {err}");
            app.set_sidebar_error(SEARCH_FAILED);
            return;
        }
    };
    if let Err(err) = api.join_channel(found.id).await {
        warn!(channel_id = found.id, "join failed: {err}");
        app.set_sidebar_error(SEARCH_FAILED);
        return;
    }

    let channel_id = found.id;
    app.channels.insert_if_absent(found);
    let mut effects = app.select_channel(Some(channel_id));
    effects.push(SessionEffect::FetchMembers { channel_id });
    run_effects(api, app, driver, effects).await;
    app.close_prompt();
    app.set_sidebar_message(JOINED);
}

pub async fn delete_channel<A: ChatApi, D: SessionDriver>(
    api: &A,
    app: &mut App,
    driver: &mut D,
    channel_id: u64,
) {
    app.clear_sidebar_banners();
    let owned = app
        .channels
        .get(channel_id)
        .is_some_and(|c| c.is_owned_by(app.user_name()));
    if !owned {
        app.set_sidebar_error(NOT_OWNER);
        return;
    }

    match api.delete_channel(channel_id).await {
        Ok(()) => {
            app.channels.remove(channel_id);
            if app.active_channel_id() == Some(channel_id) {
                let fallback = channels::fallback_after_delete(&app.channels);
                select_channel(api, app, driver, fallback).await;
            } else {
                // keep the cursor on the same channel after the rows shift
                let current = app.active_channel_id();
                app.select_channel(current);
            }
            app.set_sidebar_message(DELETED);
        }
        Err(err) => {
            warn!(channel_id, "delete channel failed: {err}");
            app.set_sidebar_error(DELETE_FAILED);
        }
    }
}

// ---- Profile overlay ----

pub async fn open_profile<A: ChatApi>(api: &A, app: &mut App) {
    app.open_profile();
    let result = api.me().await;
    let Some(overlay) = app.profile.as_mut() else {
        return;
    };
    overlay.loading = false;
    match result {
        Ok(record) => overlay.load(&record),
        Err(err) => {
            warn!("profile load failed: {err}");
            overlay.error = profile::LOAD_FAILED.to_string();
        }
    }
}

/// Saves the overlay. Returns true when the server accepted the update; the
/// shell then follows the saved name and email.
pub async fn save_profile<A: ChatApi>(api: &A, app: &mut App) -> bool {
    let Some(overlay) = app.profile.as_mut() else {
        return false;
    };
    let update = match overlay.prepare_save() {
        Ok(update) => update,
        Err(message) => {
            overlay.message.clear();
            overlay.error = message.to_string();
            return false;
        }
    };
    overlay.clear_banners();
    overlay.loading = true;
    let result = api.update_me(&update).await;
    let Some(overlay) = app.profile.as_mut() else {
        return false;
    };
    overlay.loading = false;
    match result {
        Ok(payload) => {
            overlay.apply_saved(&update, &payload);
            let saved = Identity {
                name: overlay.name.as_str().to_string(),
                email: overlay.email.as_str().to_string(),
            };
            app.adopt_identity(saved);
            info!("profile updated");
            true
        }
        Err(err) => {
            warn!("profile update failed: {err}");
            overlay.error = profile::UPDATE_FAILED.to_string();
            false
        }
    }
}

/// Deletes the account after the overlay's confirmation step. Returns true
/// when the user has been signed out.
pub async fn delete_account<A: ChatApi, D: SessionDriver>(
    api: &A,
    app: &mut App,
    driver: &mut D,
) -> bool {
    let Some(overlay) = app.profile.as_mut() else {
        return false;
    };
    if !overlay.confirm_delete() {
        return false;
    }
    overlay.clear_banners();
    overlay.loading = true;
    let result = api.delete_me().await;
    if let Some(overlay) = app.profile.as_mut() {
        overlay.loading = false;
    }
    match result {
        Ok(()) => {
            info!("account deleted");
            logout(api, app, driver).await;
            true
        }
        Err(err) => {
            warn!("account deletion failed: {err}");
            if let Some(overlay) = app.profile.as_mut() {
                overlay.error = profile::DELETE_FAILED.to_string();
            }
            false
        }
    }
}

/// Sends the chat input if the transport is open.
pub async fn send_chat<A: ChatApi, D: SessionDriver>(api: &A, app: &mut App, driver: &mut D) {
    let effects = app.submit_chat_input();
    run_effects(api, app, driver, effects).await;
}
