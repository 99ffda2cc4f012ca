// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browser WebSocket channel (§4.4): sends a full `init` snapshot on
//! connect, then streams `delta`/`sync`/`output` until the socket closes.

use super::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use nf_protocol::{BrowserToDashboard, DashboardToBrowser, Envelope};

pub async fn upgrade(ws: WebSocketUpgrade, State(app): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle(socket, app))
}

async fn handle(socket: WebSocket, app: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut subscriber = app.store.subscribe(crate::env::subscriber_queue_depth());

    let init = DashboardToBrowser::Init { version: app.store.version(), full_state: app.store.full_state() };
    let Ok(envelope) = Envelope::wrap(&init) else { return };
    if sink.send(Message::Text(envelope.to_text())).await.is_err() {
        return;
    }

    let subscriber_id = subscriber.id;
    let writer = async {
        while let Some(msg) = subscriber.rx.recv().await {
            let Ok(envelope) = Envelope::wrap(&msg) else { continue };
            if sink.send(Message::Text(envelope.to_text())).await.is_err() {
                break;
            }
        }
    };

    let reader = async {
        while let Some(Ok(Message::Text(text))) = stream.next().await {
            let Ok(envelope) = Envelope::from_text(&text) else { continue };
            if let Ok(BrowserToDashboard::GetState) = envelope.unwrap::<BrowserToDashboard>() {
                let msg = DashboardToBrowser::FullState { version: app.store.version(), full_state: app.store.full_state() };
                app.store.send_to_subscriber(subscriber_id, msg);
            }
        }
    };

    tokio::select! {
        _ = writer => {},
        _ = reader => {},
    }
}

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
