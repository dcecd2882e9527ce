//! 实时私信通道
//!
//! 客户端以 `/ws?token=<会话令牌>` 建立连接，之后通过 JSON 帧 `{ "event": ..., "data": ... }`
//! 加入房间并发送私信。每个连接一个发送任务、一个接收任务，发送端的所有写操作
//! 经过命令队列串行化。

use application::{services::SendPrivateMessageRequest, ChatMessageDto, MessageBroadcast};
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use domain::{RoomName, UserId};
use futures_util::{SinkExt, StreamExt};
use infrastructure::ConnectionId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{
    error::ApiError,
    payloads::{ApiQuery, WsQuery},
    state::AppState,
};

/// 客户端发来的事件
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        room: String,
    },
    PrivateMessage {
        sender_id: UserId,
        receiver_id: UserId,
        message: String,
    },
}

/// 服务端推送的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Joined { room: RoomName },
    NewMessage(ChatMessageDto),
    Error { code: String, message: String },
}

impl ServerEvent {
    fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_owned(),
            message: message.into(),
        }
    }
}

impl From<ApiError> for ServerEvent {
    fn from(error: ApiError) -> Self {
        Self::error(error.code(), error.message())
    }
}

impl From<&MessageBroadcast> for ServerEvent {
    fn from(broadcast: &MessageBroadcast) -> Self {
        Self::NewMessage(ChatMessageDto::from(&broadcast.message))
    }
}

/// 升级前校验令牌，失败时直接返回 401
pub async fn websocket_upgrade(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing token"))?;
    let user_id = state.auth_service.authenticate(&token).map_err(|err| {
        tracing::warn!(error = %err, "WebSocket 令牌校验失败");
        ApiError::from(err)
    })?;

    Ok(ws.on_upgrade(move |socket| async move {
        WebSocketConnection::open(socket, state, user_id).await.run().await
    }))
}

/// 发送任务的写操作命令
#[derive(Debug)]
enum WsCommand {
    Event(ServerEvent),
    Pong(Vec<u8>),
}

pub struct WebSocketConnection {
    socket: WebSocket,
    state: AppState,
    user_id: UserId,
    connection_id: ConnectionId,
    broadcasts: mpsc::Receiver<MessageBroadcast>,
}

impl WebSocketConnection {
    async fn open(socket: WebSocket, state: AppState, user_id: UserId) -> Self {
        let (connection_id, broadcasts) = state.hub.connect(user_id).await;
        tracing::info!(user_id = %user_id, connection = %connection_id, "WebSocket 连接已建立");
        Self {
            socket,
            state,
            user_id,
            connection_id,
            broadcasts,
        }
    }

    pub async fn run(self) {
        let Self {
            socket,
            state,
            user_id,
            connection_id,
            mut broadcasts,
        } = self;
        let (mut sender, mut incoming) = socket.split();
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

        let mut send_task = tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    Some(cmd) = cmd_rx.recv() => match cmd {
                        WsCommand::Event(event) => encode(&event),
                        WsCommand::Pong(data) => Some(WsMessage::Pong(data.into())),
                    },
                    Some(broadcast) = broadcasts.recv() => encode(&ServerEvent::from(&broadcast)),
                    else => break,
                };
                let Some(frame) = frame else { continue };
                if sender.send(frame).await.is_err() {
                    tracing::debug!(connection = %connection_id, "客户端已断开，停止发送");
                    break;
                }
            }
        });

        let recv_state = state.clone();
        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(message)) = incoming.next().await {
                let reply = match message {
                    WsMessage::Text(text) => {
                        handle_text(&recv_state, connection_id, user_id, text.as_str()).await
                    }
                    WsMessage::Ping(data) => Some(WsCommand::Pong(data.to_vec())),
                    WsMessage::Close(_) => break,
                    WsMessage::Pong(_) | WsMessage::Binary(_) => None,
                };
                if let Some(reply) = reply {
                    if cmd_tx.send(reply).await.is_err() {
                        break;
                    }
                }
            }
        });

        // 任一方向结束即关闭连接，另一个任务随之中止
        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }

        state.hub.disconnect(connection_id).await;
        tracing::info!(user_id = %user_id, connection = %connection_id, "WebSocket 连接已断开");
    }
}

fn encode(event: &ServerEvent) -> Option<WsMessage> {
    match serde_json::to_string(event) {
        Ok(json) => Some(WsMessage::Text(json.into())),
        Err(err) => {
            tracing::warn!(error = %err, "事件序列化失败");
            None
        }
    }
}

async fn handle_text(
    state: &AppState,
    connection_id: ConnectionId,
    user_id: UserId,
    text: &str,
) -> Option<WsCommand> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(err) => {
            return Some(WsCommand::Event(ServerEvent::error(
                "VALIDATION_ERROR",
                format!("malformed event: {err}"),
            )))
        }
    };

    match event {
        ClientEvent::Join { room } => {
            let reply = join(state, connection_id, user_id, &room).await;
            Some(WsCommand::Event(reply))
        }
        ClientEvent::PrivateMessage {
            sender_id,
            receiver_id,
            message,
        } => {
            if sender_id != user_id {
                return Some(WsCommand::Event(ServerEvent::error(
                    "UNAUTHORIZED",
                    "sender_id does not match the authenticated user",
                )));
            }
            let request = SendPrivateMessageRequest {
                sender_id,
                receiver_id,
                content: message,
            };
            // 成功时 new_message 由房间广播推送，这里只回报错误
            match state.chat_service.send_private_message(request).await {
                Ok(_) => None,
                Err(err) => Some(WsCommand::Event(ApiError::from(err).into())),
            }
        }
    }
}

async fn join(
    state: &AppState,
    connection_id: ConnectionId,
    user_id: UserId,
    room: &str,
) -> ServerEvent {
    let room: RoomName = match room.parse() {
        Ok(room) => room,
        Err(err) => return ApiError::from(err).into(),
    };
    if !room.includes(user_id) {
        return ServerEvent::error("FORBIDDEN", "not a participant of this room");
    }
    match state.hub.join(connection_id, room).await {
        Ok(_) => ServerEvent::Joined { room },
        Err(err) => ServerEvent::error("NOT_FOUND", err.to_string()),
    }
}
