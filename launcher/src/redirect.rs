//! Local redirect listener for the session token
//!
//! The gateway's login flow finishes by redirecting the user's browser to
//! `http://localhost:<port>/?token=...`. This module serves that request on a
//! background thread, builds the client deep link from the token, and passes
//! it to a hand-off callback. The callback must not touch the display surface
//! directly; it only queues work for the UI thread.
//!
//! Every token-bearing request is forwarded. Requests without a token get a
//! placeholder page and change nothing.

use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use log::{error, info};
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::config::client_url;
use crate::constants::{LAUNCHING_BODY, TOKEN_PARAM, WAITING_BODY};

/// Callback receiving the constructed client URL
pub type Handoff = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Clone)]
struct RedirectState {
    client_url_template: Arc<str>,
    handoff: Handoff,
}

/// Bound, not yet running, redirect listener
pub struct RedirectListener {
    listener: TcpListener,
    state: RedirectState,
}

impl RedirectListener {
    /// Bind the listening socket
    ///
    /// Binding happens here rather than on the server thread so a port
    /// conflict is reported to the caller before anything else starts.
    pub fn bind(
        addr: SocketAddr,
        client_url_template: &str,
        handoff: Handoff,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            state: RedirectState {
                client_url_template: Arc::from(client_url_template),
                handoff,
            },
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/", get(redirect))
            .with_state(self.state.clone())
    }

    /// Serve on a detached background thread for the rest of the process
    ///
    /// There is no stop method; the thread ends when the process exits.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        let addr = self.local_addr()?;
        let router = self.router();
        let listener = self.listener;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        std::thread::Builder::new()
            .name("redirect-listener".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(listener) {
                        Ok(listener) => listener,
                        Err(e) => {
                            error!("Failed to register redirect listener: {e}");
                            return;
                        }
                    };
                    info!("Redirect listener on http://{addr}/");
                    if let Err(e) = axum::serve(listener, router).await {
                        error!("Redirect listener stopped: {e}");
                    }
                });
            })
    }
}

/// `GET /`: hand off a non-empty `token`, otherwise keep waiting
///
/// The hand-off is queued before the response is written, so a browser that
/// disconnects early does not lose the token.
async fn redirect(
    State(state): State<RedirectState>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    match params.get(TOKEN_PARAM).filter(|token| !token.is_empty()) {
        Some(token) => {
            let url = client_url(&state.client_url_template, token);
            info!("Session token received, client URL: {url}");
            (state.handoff)(url);
            Html(LAUNCHING_BODY)
        }
        None => Html(WAITING_BODY),
    }
}
