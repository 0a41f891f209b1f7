//! Tests for the server-facing flows, run against a recording fake API

#[cfg(test)]
mod fakes {
    use std::cell::RefCell;

    use neonchat::actions::SessionDriver;
    use neonchat::client::{ApiError, ChatApi};
    use neonchat::models::*;

    pub fn user(name: &str) -> UserRecord {
        UserRecord {
            id: 1,
            name: Some(name.to_string()),
            email: Some(format!("{}@example.com", name)),
        }
    }

    pub fn record(id: u64, name: &str, owner: &str) -> ChannelRecord {
        ChannelRecord {
            id,
            name: name.to_string(),
            owner_id: 0,
            owner: Some(user(owner)),
            owner_name: None,
        }
    }

    fn server_error(message: &str) -> ApiError {
        ApiError::Server {
            status: 400,
            message: Some(message.to_string()),
        }
    }

    /// Records every call; answers from the configured fixtures.
    #[derive(Default)]
    pub struct FakeApi {
        pub calls: RefCell<Vec<String>>,
        pub me: Option<UserRecord>,
        pub login_user: Option<UserRecord>,
        pub login_error: Option<String>,
        pub owned: Vec<ChannelRecord>,
        pub joined: Vec<ChannelRecord>,
        pub list_fails: bool,
        pub search_result: Option<ChannelRecord>,
        pub members: Vec<Member>,
        pub created_id: u64,
    }

    impl FakeApi {
        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn log(&self, call: impl Into<String>) {
            self.calls.borrow_mut().push(call.into());
        }
    }

    impl ChatApi for FakeApi {
        async fn me(&self) -> Result<UserRecord, ApiError> {
            self.log("me");
            self.me.clone().ok_or_else(|| server_error("unauthorized"))
        }

        async fn update_me(&self, update: &ProfileUpdate) -> Result<AuthPayload, ApiError> {
            self.log(format!("update_me:{}", update.name));
            Ok(AuthPayload::default())
        }

        async fn delete_me(&self) -> Result<(), ApiError> {
            self.log("delete_me");
            Ok(())
        }

        async fn login(&self, request: &LoginRequest) -> Result<AuthPayload, ApiError> {
            let who = request.email.clone().or(request.name.clone()).unwrap_or_default();
            self.log(format!("login:{}", who));
            if let Some(message) = &self.login_error {
                return Err(server_error(message));
            }
            Ok(AuthPayload {
                user: self.login_user.clone(),
            })
        }

        async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload, ApiError> {
            self.log(format!("register:{}", request.email));
            Ok(AuthPayload::default())
        }

        async fn logout(&self) -> Result<(), ApiError> {
            self.log("logout");
            Ok(())
        }

        async fn list_owned_channels(&self) -> Result<Vec<ChannelRecord>, ApiError> {
            self.log("list_owned");
            if self.list_fails {
                return Err(server_error("boom"));
            }
            Ok(self.owned.clone())
        }

        async fn list_joined_channels(&self) -> Result<Vec<ChannelRecord>, ApiError> {
            self.log("list_joined");
            Ok(self.joined.clone())
        }

        async fn create_channel(&self, name: &str) -> Result<ChannelRecord, ApiError> {
            self.log(format!("create_channel:{}", name));
            Ok(ChannelRecord {
                id: self.created_id,
                name: name.to_string(),
                owner_id: 1,
                owner: None,
                owner_name: None,
            })
        }

        async fn delete_channel(&self, channel_id: u64) -> Result<(), ApiError> {
            self.log(format!("delete_channel:{}", channel_id));
            Ok(())
        }

        async fn search_channel(&self, query: &str) -> Result<ChannelRecord, ApiError> {
            self.log(format!("search:{}", query));
            self.search_result
                .clone()
                .ok_or_else(|| server_error("not found"))
        }

        async fn join_channel(&self, channel_id: u64) -> Result<ChannelRecord, ApiError> {
            self.log(format!("join:{}", channel_id));
            self.search_result
                .clone()
                .ok_or_else(|| server_error("not found"))
        }

        async fn channel_members(&self, channel_id: u64) -> Result<Vec<Member>, ApiError> {
            self.log(format!("members:{}", channel_id));
            Ok(self.members.clone())
        }
    }

    /// Records transport effects instead of opening sockets.
    #[derive(Default)]
    pub struct RecordingDriver {
        pub log: Vec<String>,
    }

    impl SessionDriver for RecordingDriver {
        fn connect(&mut self, generation: u64, channel_id: u64) {
            self.log.push(format!("connect:{}:{}", generation, channel_id));
        }

        fn disconnect(&mut self, generation: u64) {
            self.log.push(format!("disconnect:{}", generation));
        }

        fn send(&mut self, generation: u64, content: String) {
            self.log.push(format!("send:{}:{}", generation, content));
        }
    }
}

#[cfg(test)]
mod helpers {
    use neonchat::app::App;
    use neonchat::models::Identity;

    pub fn signed_in(name: &str) -> App {
        let mut app = App::new();
        app.enter_chat(Identity {
            name: name.to_string(),
            email: format!("{}@example.com", name),
        });
        app
    }
}

#[cfg(test)]
mod local_validation {
    use super::fakes::*;
    use super::helpers::signed_in;
    use neonchat::actions;
    use neonchat::auth::{AuthMode, PASSWORDS_DO_NOT_MATCH};
    use neonchat::channels::{BAD_SEARCH_QUERY, EMPTY_CHANNEL_NAME};
    use neonchat::profile::NOTHING_CHANGED;

    #[tokio::test]
    async fn blank_channel_name_sends_nothing() {
        let api = FakeApi::default();
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.new_channel_name.set("   ");
        actions::create_channel(&api, &mut app, &mut driver).await;
        assert!(api.calls().is_empty());
        assert_eq!(app.sidebar_error, EMPTY_CHANNEL_NAME);
    }

    #[tokio::test]
    async fn search_without_at_sends_nothing() {
        let api = FakeApi::default();
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.search_query.set("general");
        actions::search_and_join(&api, &mut app, &mut driver).await;
        assert!(api.calls().is_empty());
        assert_eq!(app.sidebar_error, BAD_SEARCH_QUERY);
    }

    #[tokio::test]
    async fn mismatched_registration_sends_nothing() {
        let api = FakeApi::default();
        let mut app = neonchat::app::App::new();
        app.auth.set_mode(AuthMode::Register);
        app.auth.email.set("ann@example.com");
        app.auth.new_password.set("one");
        app.auth.confirm_password.set("two");
        actions::submit_register(&api, &mut app).await;
        assert!(api.calls().is_empty());
        assert_eq!(app.auth.error, PASSWORDS_DO_NOT_MATCH);
    }

    #[tokio::test]
    async fn unchanged_profile_sends_nothing() {
        let api = FakeApi {
            me: Some(user("me")),
            ..FakeApi::default()
        };
        let mut app = signed_in("me");
        actions::open_profile(&api, &mut app).await;
        assert!(!actions::save_profile(&api, &mut app).await);
        assert_eq!(api.calls(), vec!["me"]);
        assert_eq!(app.profile.as_ref().unwrap().error, NOTHING_CHANGED);
    }
}

#[cfg(test)]
mod auth_flow {
    use super::fakes::*;
    use neonchat::actions;
    use neonchat::app::App;
    use neonchat::auth::{AuthMode, LOGIN_FAILED, REGISTERED_HINT};
    use neonchat::models::Identity;

    #[tokio::test]
    async fn bypass_skips_the_server() {
        let api = FakeApi::default();
        let identity = actions::resolve_identity(&api, true).await;
        assert_eq!(identity, Some(Identity::dev()));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn existing_session_resolves_identity() {
        let api = FakeApi {
            me: Some(user("ann")),
            ..FakeApi::default()
        };
        let identity = actions::resolve_identity(&api, false).await.unwrap();
        assert_eq!(identity.name, "ann");
    }

    #[tokio::test]
    async fn no_session_resolves_nothing() {
        let api = FakeApi::default();
        assert_eq!(actions::resolve_identity(&api, false).await, None);
    }

    #[tokio::test]
    async fn login_sends_identifier_and_returns_identity() {
        let api = FakeApi {
            login_user: Some(user("ann")),
            ..FakeApi::default()
        };
        let mut app = App::new();
        app.auth.identifier.set("ann");
        app.auth.password.set("pw");
        let identity = actions::submit_login(&api, &mut app).await.unwrap();
        assert_eq!(identity.name, "ann");
        assert_eq!(api.calls(), vec!["login:ann"]);
        assert!(app.auth.password.is_empty());
    }

    #[tokio::test]
    async fn login_without_user_is_a_failure() {
        let api = FakeApi::default();
        let mut app = App::new();
        app.auth.identifier.set("ann@example.com");
        assert_eq!(actions::submit_login(&api, &mut app).await, None);
        assert_eq!(app.auth.error, LOGIN_FAILED);
    }

    #[tokio::test]
    async fn login_error_shows_server_message() {
        let api = FakeApi {
            login_error: Some("invalid credentials".into()),
            ..FakeApi::default()
        };
        let mut app = App::new();
        app.auth.identifier.set("ann");
        assert_eq!(actions::submit_login(&api, &mut app).await, None);
        assert_eq!(app.auth.error, "invalid credentials");
        assert!(!app.auth.loading);
    }

    #[tokio::test]
    async fn registration_returns_to_login() {
        let api = FakeApi::default();
        let mut app = App::new();
        app.auth.set_mode(AuthMode::Register);
        app.auth.full_name.set("Ann");
        app.auth.email.set("ann@example.com");
        app.auth.new_password.set("pw");
        app.auth.confirm_password.set("pw");
        actions::submit_register(&api, &mut app).await;
        assert_eq!(api.calls(), vec!["register:ann@example.com"]);
        assert_eq!(app.auth.mode, AuthMode::Login);
        assert_eq!(app.auth.identifier.as_str(), "ann@example.com");
        assert_eq!(app.auth.message, REGISTERED_HINT);
    }
}

#[cfg(test)]
mod channel_flows {
    use super::fakes::*;
    use super::helpers::signed_in;
    use neonchat::actions;
    use neonchat::models::{Channel, Member};
    use neonchat::session::{TransportEvent, TransportEventKind};

    #[tokio::test]
    async fn load_merges_owned_and_joined() {
        let api = FakeApi {
            owned: vec![record(1, "general", "me")],
            joined: vec![record(2, "random", "bob"), record(1, "general", "me")],
            ..FakeApi::default()
        };
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        actions::load_channels(&api, &mut app, &mut driver).await;
        assert_eq!(app.channels.len(), 2);
        let labels: Vec<String> = app.channels.iter().map(|c| c.label("me")).collect();
        assert_eq!(labels, vec!["#general", "bob@random"]);
        assert!(driver.log.is_empty());
    }

    #[tokio::test]
    async fn reload_keeps_cursor_on_active_channel() {
        let first = FakeApi {
            owned: vec![record(1, "general", "me")],
            joined: vec![record(2, "random", "bob")],
            ..FakeApi::default()
        };
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        actions::load_channels(&first, &mut app, &mut driver).await;
        actions::select_channel(&first, &mut app, &mut driver, Some(2)).await;
        assert_eq!(app.sidebar_selection(), 2);

        let reload = FakeApi {
            owned: vec![record(3, "fresh", "me"), record(1, "general", "me")],
            joined: vec![record(2, "random", "bob")],
            ..FakeApi::default()
        };
        actions::load_channels(&reload, &mut app, &mut driver).await;
        assert_eq!(app.channels.position(2), Some(2));
        assert_eq!(app.sidebar_selection(), 2);
        assert_eq!(app.active_channel_id(), Some(2));
        assert_eq!(driver.log, vec!["connect:1:2"]);
    }

    #[tokio::test]
    async fn load_failure_sets_banner() {
        let api = FakeApi {
            list_fails: true,
            ..FakeApi::default()
        };
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        actions::load_channels(&api, &mut app, &mut driver).await;
        assert_eq!(app.sidebar_error, actions::LOAD_CHANNELS_FAILED);
        assert!(app.channels.is_empty());
    }

    #[tokio::test]
    async fn create_selects_new_channel_and_seeds_roster() {
        let api = FakeApi {
            created_id: 42,
            ..FakeApi::default()
        };
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.open_prompt(neonchat::app::Prompt::NewChannel);
        app.new_channel_name.set("  lobby ");
        actions::create_channel(&api, &mut app, &mut driver).await;

        assert_eq!(api.calls(), vec!["create_channel:lobby"]);
        let channel = app.channels.get(42).unwrap();
        assert_eq!(channel.label("me"), "#lobby");
        assert_eq!(app.active_channel_id(), Some(42));
        assert_eq!(driver.log, vec!["connect:1:42"]);
        assert_eq!(
            app.session.members(),
            &[Member {
                id: 0,
                name: "me".into()
            }]
        );
        assert!(app.prompt.is_none());
        assert!(app.new_channel_name.is_empty());
        assert_eq!(app.sidebar_message, actions::CREATED);
    }

    #[tokio::test]
    async fn search_joins_and_fetches_members() {
        let api = FakeApi {
            search_result: Some(record(7, "random", "bob")),
            members: vec![Member {
                id: 2,
                name: "bob".into(),
            }],
            ..FakeApi::default()
        };
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.search_query.set("bob@random");
        actions::search_and_join(&api, &mut app, &mut driver).await;

        assert_eq!(
            api.calls(),
            vec!["search:bob@random", "join:7", "members:7"]
        );
        assert_eq!(app.active_channel_title(), "#random");
        assert_eq!(app.channels.get(7).unwrap().label("me"), "bob@random");
        assert_eq!(app.session.members().len(), 1);
        assert_eq!(app.sidebar_message, actions::JOINED);
    }

    #[tokio::test]
    async fn failed_search_sets_banner() {
        let api = FakeApi::default();
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.search_query.set("bob@nothing");
        actions::search_and_join(&api, &mut app, &mut driver).await;
        assert_eq!(api.calls(), vec!["search:bob@nothing"]);
        assert_eq!(app.sidebar_error, actions::SEARCH_FAILED);
        assert!(driver.log.is_empty());
    }

    fn owned(id: u64, name: &str) -> Channel {
        Channel {
            id,
            name: name.to_string(),
            owner_id: 1,
            owner_name: Some("me".into()),
        }
    }

    #[tokio::test]
    async fn deleting_active_channel_falls_back() {
        let api = FakeApi::default();
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.channels.insert_if_absent(owned(1, "a"));
        app.channels.insert_if_absent(owned(2, "b"));
        actions::select_channel(&api, &mut app, &mut driver, Some(2)).await;
        actions::delete_channel(&api, &mut app, &mut driver, 2).await;

        assert_eq!(api.calls(), vec!["delete_channel:2"]);
        assert!(app.channels.get(2).is_none());
        assert_eq!(app.active_channel_id(), Some(1));
        assert_eq!(driver.log, vec!["connect:1:2", "disconnect:1", "connect:2:1"]);
        assert_eq!(app.sidebar_message, actions::DELETED);
    }

    #[tokio::test]
    async fn deleting_a_joined_channel_is_refused() {
        let api = FakeApi::default();
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.channels.insert_if_absent(Channel {
            id: 3,
            name: "theirs".into(),
            owner_id: 2,
            owner_name: Some("bob".into()),
        });
        actions::delete_channel(&api, &mut app, &mut driver, 3).await;
        assert!(api.calls().is_empty());
        assert_eq!(app.sidebar_error, actions::NOT_OWNER);
        assert!(app.channels.contains(3));
    }

    #[tokio::test]
    async fn open_transport_fetches_members_then_sends() {
        let api = FakeApi {
            members: vec![Member {
                id: 1,
                name: "me".into(),
            }],
            ..FakeApi::default()
        };
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.channels.insert_if_absent(owned(4, "dev"));
        actions::select_channel(&api, &mut app, &mut driver, Some(4)).await;
        let generation = app.session.generation().unwrap();
        actions::handle_transport_event(
            &api,
            &mut app,
            &mut driver,
            TransportEvent::new(generation, TransportEventKind::Opened),
        )
        .await;
        assert_eq!(api.calls(), vec!["members:4"]);
        assert_eq!(app.session.members().len(), 1);

        app.chat_input.set(" hi ");
        actions::send_chat(&api, &mut app, &mut driver).await;
        assert_eq!(driver.log.last().map(String::as_str), Some("send:1:hi"));
        assert!(app.chat_input.is_empty());
    }

    #[tokio::test]
    async fn closed_transport_sets_banner() {
        let api = FakeApi::default();
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.channels.insert_if_absent(owned(4, "dev"));
        actions::select_channel(&api, &mut app, &mut driver, Some(4)).await;
        let generation = app.session.generation().unwrap();
        actions::handle_transport_event(
            &api,
            &mut app,
            &mut driver,
            TransportEvent::new(generation, TransportEventKind::Failed("refused".into())),
        )
        .await;
        assert_eq!(app.sidebar_error, neonchat::session::CONNECTION_FAILED);
    }
}

#[cfg(test)]
mod account_flows {
    use super::fakes::*;
    use super::helpers::signed_in;
    use neonchat::actions;
    use neonchat::app::AppScreen;

    #[tokio::test]
    async fn logout_releases_transport() {
        let api = FakeApi::default();
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        app.channels.insert_if_absent(neonchat::models::Channel {
            id: 4,
            name: "dev".into(),
            owner_id: 1,
            owner_name: Some("me".into()),
        });
        actions::select_channel(&api, &mut app, &mut driver, Some(4)).await;
        actions::logout(&api, &mut app, &mut driver).await;
        assert_eq!(api.calls(), vec!["logout"]);
        assert_eq!(driver.log, vec!["connect:1:4", "disconnect:1"]);
        assert!(matches!(app.screen, AppScreen::Auth));
    }

    #[tokio::test]
    async fn account_delete_needs_confirmation() {
        let api = FakeApi {
            me: Some(user("me")),
            ..FakeApi::default()
        };
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        actions::open_profile(&api, &mut app).await;

        assert!(!actions::delete_account(&api, &mut app, &mut driver).await);
        assert_eq!(api.calls(), vec!["me"]);

        assert!(actions::delete_account(&api, &mut app, &mut driver).await);
        assert_eq!(api.calls(), vec!["me", "delete_me", "logout"]);
        assert!(matches!(app.screen, AppScreen::Auth));
        assert!(app.profile.is_none());
    }

    #[tokio::test]
    async fn profile_save_sends_update() {
        let api = FakeApi {
            me: Some(user("me")),
            ..FakeApi::default()
        };
        let mut app = signed_in("me");
        actions::open_profile(&api, &mut app).await;
        app.profile.as_mut().unwrap().name.set("new name");
        assert!(actions::save_profile(&api, &mut app).await);
        assert_eq!(api.calls(), vec!["me", "update_me:new name"]);
        assert_eq!(app.profile.as_ref().unwrap().message, neonchat::profile::UPDATED);
    }

    #[tokio::test]
    async fn rename_carries_over_to_shell_and_owned_channels() {
        let api = FakeApi {
            me: Some(user("me")),
            owned: vec![record(1, "general", "me")],
            joined: vec![record(2, "random", "bob")],
            ..FakeApi::default()
        };
        let mut driver = RecordingDriver::default();
        let mut app = signed_in("me");
        actions::load_channels(&api, &mut app, &mut driver).await;
        actions::open_profile(&api, &mut app).await;
        app.profile.as_mut().unwrap().name.set("  renamed ");

        assert!(actions::save_profile(&api, &mut app).await);
        assert_eq!(app.user_name(), "renamed");
        assert!(app.channels.get(1).unwrap().is_owned_by("renamed"));
        assert!(!app.channels.get(2).unwrap().is_owned_by("renamed"));
    }
}
