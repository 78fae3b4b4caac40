use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web_actors::ws;
use tracing::{info, warn};
use uuid::Uuid;

use super::hub::{NoticeFrame, SessionHub};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// One websocket subscriber to a session's notices. Inbound text frames
/// are ignored; the socket is push-only.
pub struct WsSession {
    session_code: String,
    player_id: String,
    hub: Arc<SessionHub>,
    token: Option<Uuid>,
    last_heartbeat: Instant,
}

impl WsSession {
    pub fn new(session_code: String, player_id: String, hub: Arc<SessionHub>) -> Self {
        Self {
            session_code,
            player_id,
            hub,
            token: None,
            last_heartbeat: Instant::now(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    session_code = %actor.session_code,
                    player_id = %actor.player_id,
                    "Websocket heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let recipient = ctx.address().recipient::<NoticeFrame>();
        self.token = Some(self.hub.register(&self.session_code, recipient));
        self.start_heartbeat(ctx);
        info!(
            session_code = %self.session_code,
            player_id = %self.player_id,
            "Websocket subscribed"
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(token) = self.token.take() {
            self.hub.unregister(&self.session_code, token);
        }
        info!(
            session_code = %self.session_code,
            player_id = %self.player_id,
            "Websocket closed"
        );
    }
}

impl Handler<NoticeFrame> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: NoticeFrame, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) | Ok(ws::Message::Text(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, session_code = %self.session_code, "Websocket protocol error");
                ctx.stop();
            }
        }
    }
}
