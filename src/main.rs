use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use neonchat::actions;
use neonchat::app::{App, AppScreen, Panel, Prompt};
use neonchat::auth::{self, AuthMode};
use neonchat::client::ApiClient;
use neonchat::config;
use neonchat::input::TextInput;
use neonchat::logging;
use neonchat::models::{Identity, HOME_CHANNEL_ID};
use neonchat::session::TransportEvent;
use neonchat::transport::TransportManager;
use neonchat::ui;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// What the event loop should do after a key press.
enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|a| a == "--logout") {
        auth::clear_stored_session()?;
        println!("Stored session cleared from OS credential store.");
        return Ok(());
    }

    if let Err(e) = logging::init() {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let mut config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            config::print_setup_guide();
            return Ok(());
        }
    };
    if let Some(base) = flag_value(&args, "--api") {
        config.api_base_url = base;
    }

    let api = match ApiClient::new(config.api_base()) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            config::print_setup_guide();
            return Ok(());
        }
    };

    let bypass = config.bypass_enabled();
    if !bypass {
        match auth::load_session() {
            Ok(Some(token)) => api.seed_session(&token),
            Ok(None) => {}
            Err(e) => warn!("could not read stored session: {e}"),
        }
    }

    let (mut transports, events_rx) =
        TransportManager::new(config.api_base(), config.ws_origin(), api.cookie_jar());
    info!(api = %config.api_base(), bypass, "client configured");

    // Restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &api, &mut transports, events_rx, bypass).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    if let Err(ref e) = result {
        eprintln!("Error: {}", e);
    }

    result
}

async fn run_app(
    terminal: &mut Tui,
    api: &ApiClient,
    transports: &mut TransportManager,
    mut events_rx: UnboundedReceiver<TransportEvent>,
    bypass: bool,
) -> Result<()> {
    let mut app = App::new();

    app.screen = AppScreen::Loading {
        message: "Checking your session...".to_string(),
    };
    terminal.draw(|f| ui::draw(f, &app))?;

    match actions::resolve_identity(api, bypass).await {
        Some(identity) => {
            app.screen = AppScreen::Loading {
                message: "Loading your channels...".to_string(),
            };
            terminal.draw(|f| ui::draw(f, &app))?;
            enter_chat(api, &mut app, transports, identity).await;
        }
        None => app.show_auth(),
    }

    // Main event loop
    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Ctrl+C always quits
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        break;
                    }

                    let flow = match app.screen {
                        AppScreen::Loading { .. } => Flow::Continue,
                        AppScreen::Auth => {
                            handle_auth_key(api, &mut app, transports, key).await
                        }
                        AppScreen::Chat => {
                            handle_chat_key(api, &mut app, transports, key).await
                        }
                    };
                    if let Flow::Quit = flow {
                        break;
                    }
                }
            }
        }

        while let Ok(event) = events_rx.try_recv() {
            actions::handle_transport_event(api, &mut app, transports, event).await;
        }
    }

    let effects = app.session.reset();
    actions::run_effects(api, &mut app, transports, effects).await;
    Ok(())
}

async fn enter_chat(
    api: &ApiClient,
    app: &mut App,
    transports: &mut TransportManager,
    identity: Identity,
) {
    info!(user = %identity.display_name(), "entering chat");
    app.enter_chat(identity);
    actions::load_channels(api, app, transports).await;
}

// ---- Auth screen ----

async fn handle_auth_key(
    api: &ApiClient,
    app: &mut App,
    transports: &mut TransportManager,
    key: KeyEvent,
) -> Flow {
    if app.auth.loading {
        return Flow::Continue;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('r') {
            app.auth.toggle_mode();
        }
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Esc => return Flow::Quit,
        KeyCode::Tab | KeyCode::Down => app.auth.next_field(),
        KeyCode::BackTab | KeyCode::Up => app.auth.prev_field(),
        KeyCode::Enter if !app.auth.is_last_field() => app.auth.next_field(),
        KeyCode::Enter => match app.auth.mode {
            AuthMode::Login => {
                if let Some(identity) = actions::submit_login(api, app).await {
                    remember_session(api);
                    enter_chat(api, app, transports, identity).await;
                }
            }
            AuthMode::Register => actions::submit_register(api, app).await,
        },
        _ => edit_input(app.auth.focused_input_mut(), key.code),
    }
    Flow::Continue
}

/// Persists the cookie the server just set.
fn remember_session(api: &ApiClient) {
    if let Some(token) = api.session_token() {
        if let Err(e) = auth::store_session(&token) {
            warn!("could not persist session: {e}");
        }
    }
}

fn forget_session(api: &ApiClient) {
    if let Err(e) = auth::clear_stored_session() {
        warn!("could not clear stored session: {e}");
    }
    api.clear_session();
}

// ---- Chat shell ----

async fn handle_chat_key(
    api: &ApiClient,
    app: &mut App,
    transports: &mut TransportManager,
    key: KeyEvent,
) -> Flow {
    if app.profile.is_some() {
        handle_profile_key(api, app, transports, key).await;
        return Flow::Continue;
    }
    if let Some(prompt) = app.prompt {
        handle_prompt_key(api, app, transports, prompt, key).await;
        return Flow::Continue;
    }

    match app.active_panel {
        Panel::Sidebar => match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.sidebar_up(),
            KeyCode::Down | KeyCode::Char('j') => app.sidebar_down(),
            KeyCode::Enter => {
                app.clear_sidebar_banners();
                let effects = app.open_sidebar_selection();
                actions::run_effects(api, app, transports, effects).await;
            }
            KeyCode::Char('d') => {
                let id = app.sidebar_selection();
                if id != HOME_CHANNEL_ID {
                    actions::delete_channel(api, app, transports, id).await;
                }
            }
            _ => return handle_shell_key(api, app, transports, key).await,
        },
        Panel::Messages => match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.scroll_messages_up(),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_messages_down(),
            _ => return handle_shell_key(api, app, transports, key).await,
        },
        Panel::Input => match key.code {
            KeyCode::Esc => app.active_panel = Panel::Sidebar,
            KeyCode::Tab => app.next_panel(),
            KeyCode::BackTab => app.prev_panel(),
            KeyCode::Enter => actions::send_chat(api, app, transports).await,
            code => edit_input(&mut app.chat_input, code),
        },
    }
    Flow::Continue
}

/// Shortcuts shared by the sidebar and message panels.
async fn handle_shell_key(
    api: &ApiClient,
    app: &mut App,
    transports: &mut TransportManager,
    key: KeyEvent,
) -> Flow {
    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Tab => app.next_panel(),
        KeyCode::BackTab => app.prev_panel(),
        KeyCode::Char('c') => {
            app.clear_sidebar_banners();
            app.open_prompt(Prompt::NewChannel);
        }
        KeyCode::Char('/') => {
            app.clear_sidebar_banners();
            app.open_prompt(Prompt::Search);
        }
        KeyCode::Char('p') => actions::open_profile(api, app).await,
        KeyCode::Char('h') => {
            actions::select_channel(api, app, transports, Some(HOME_CHANNEL_ID)).await
        }
        KeyCode::Char('e') if app.is_home() => {
            let effects = app.open_most_recent();
            actions::run_effects(api, app, transports, effects).await;
        }
        KeyCode::Char('r') => actions::load_channels(api, app, transports).await,
        _ => {}
    }
    Flow::Continue
}

async fn handle_prompt_key(
    api: &ApiClient,
    app: &mut App,
    transports: &mut TransportManager,
    prompt: Prompt,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => app.close_prompt(),
        KeyCode::Enter => match prompt {
            Prompt::NewChannel => actions::create_channel(api, app, transports).await,
            Prompt::Search => actions::search_and_join(api, app, transports).await,
        },
        code => {
            if let Some(input) = app.prompt_input_mut() {
                edit_input(input, code);
            }
        }
    }
}

async fn handle_profile_key(
    api: &ApiClient,
    app: &mut App,
    transports: &mut TransportManager,
    key: KeyEvent,
) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('l') => {
                actions::logout(api, app, transports).await;
                forget_session(api);
            }
            KeyCode::Char('d') => {
                if actions::delete_account(api, app, transports).await {
                    forget_session(api);
                }
            }
            _ => {}
        }
        return;
    }

    if key.code == KeyCode::Esc {
        app.close_profile();
        return;
    }
    let Some(overlay) = app.profile.as_mut() else {
        return;
    };
    if overlay.loading {
        return;
    }
    overlay.cancel_delete();
    match key.code {
        KeyCode::Tab | KeyCode::Down => overlay.next_field(),
        KeyCode::BackTab | KeyCode::Up => overlay.prev_field(),
        KeyCode::Enter => {
            // the server reissues the session cookie on every save
            if actions::save_profile(api, app).await {
                remember_session(api);
            }
        }
        code => edit_input(overlay.focused_input_mut(), code),
    }
}

fn edit_input(input: &mut TextInput, code: KeyCode) {
    match code {
        KeyCode::Char(c) => input.insert_char(c),
        KeyCode::Backspace => input.delete_char(),
        KeyCode::Left => input.move_cursor_left(),
        KeyCode::Right => input.move_cursor_right(),
        _ => {}
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn print_help() {
    println!("neonchat - Terminal client for the Neon chat server");
    println!();
    println!("USAGE: neonchat [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --api <url>  Use this server base URL for this run");
    println!("  --logout     Clear the stored session");
    println!("  --help, -h   Show this help");
    println!();
    println!("CONFIGURATION:");
    println!("  {}/config.toml", config_location());
    println!(
        "  Environment: {}, {}, {}",
        config::ENV_API_BASE_URL,
        config::ENV_ORIGIN,
        config::ENV_DEV_BYPASS_AUTH
    );
    println!("  Logs: {} (filter with NEONCHAT_LOG)", logging::log_directory().display());
    println!();
    println!("KEYBOARD SHORTCUTS:");
    println!("  Tab / Shift+Tab  Switch panels (Channels → Messages → Input)");
    println!("  Up/Down or j/k   Navigate channels / scroll messages");
    println!("  Enter            Open channel / send message / submit form");
    println!("  c                Create a channel");
    println!("  /                Join a channel with owner@channel");
    println!("  d                Delete the owned channel under the cursor");
    println!("  h                Go to Home");
    println!("  e                Enter the most recent channel (from Home)");
    println!("  p                Profile (Ctrl+L log out, Ctrl+D delete account)");
    println!("  r                Reload channels");
    println!("  Ctrl+R           Switch between sign-in and create account");
    println!("  Esc              Back / close / cancel");
    println!("  q                Quit");
    println!("  Ctrl+C           Force quit");
}

fn config_location() -> String {
    config::config_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "<config dir>/neonchat".to_string())
}
