//! Redirect listener to session controller, end to end over a real socket

use anyhow::Result;
use guacview::clipboard::Clipboard;
use guacview::constants::{DEFAULT_CLIENT_URL_TEMPLATE, LAUNCHING_BODY};
use guacview::display::DisplaySurface;
use guacview::events::{AppEvent, UiHandle};
use guacview::redirect::RedirectListener;
use guacview::session::SessionController;
use guacview_keybinds::test_utils::MemorySettings;
use guacview_keybinds::{KeyOverrideManager, KeyRegistry, OverrideState, RecoveryFile};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingSurface {
    visited: Vec<String>,
    fullscreen: bool,
}

impl DisplaySurface for RecordingSurface {
    fn navigate_to(&mut self, url: &str) -> Result<()> {
        self.visited.push(url.to_string());
        Ok(())
    }

    fn run_script(&mut self, _code: &str) -> Result<()> {
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }
}

struct NoClipboard;

impl Clipboard for NoClipboard {
    fn read_text(&mut self) -> Option<String> {
        None
    }
}

fn get(addr: SocketAddr, path: &str) -> String {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .proxy(None)
        .timeout_global(Some(Duration::from_secs(5)))
        .build()
        .into();
    let mut response = agent
        .get(&format!("http://{addr}{path}"))
        .call()
        .unwrap();
    response.body_mut().read_to_string().unwrap()
}

#[test]
fn test_token_reaches_surface_through_ui_queue() {
    let dir = TempDir::new().unwrap();
    let settings = MemorySettings::with_gnome_defaults();
    let manager = KeyOverrideManager::new(
        settings.clone(),
        KeyRegistry::gnome(),
        RecoveryFile::new(dir.path().join("gnome-keybindings.json")),
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let ui = UiHandle::new(tx);
    let mut session =
        SessionController::new(manager, RecordingSurface::default(), NoClipboard, ui.clone());

    let listener = RedirectListener::bind(
        SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        DEFAULT_CLIENT_URL_TEMPLATE,
        session.handoff(),
    )
    .unwrap();
    let addr = listener.local_addr().unwrap();
    listener.spawn().unwrap();

    session.start("https://login.example/");
    session.on_fullscreen_toggle();
    assert_eq!(session.override_state(), OverrideState::Active);

    get(addr, "/");
    assert_eq!(get(addr, "/?token=abc123"), LAUNCHING_BODY);

    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(session.handle(event).is_continue());
    assert!(rx.try_recv().is_err());

    ui.post(AppEvent::Shutdown);
    session.run(&rx);

    assert_eq!(
        session.surface().visited,
        [
            "https://login.example/",
            "https://desktop-qriscloud.rc.nectar.org.au/#/client/abc123",
        ]
    );
    assert_eq!(session.override_state(), OverrideState::Inactive);
    assert_eq!(
        settings.value("org.gnome.mutter", "overlay-key").as_deref(),
        Some("'Super_L'")
    );
}
