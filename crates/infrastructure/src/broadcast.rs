//! 进程内房间广播
//!
//! 每个 WebSocket 连接注册后得到一个有界队列，加入房间后才会收到该房间的消息。
//! 广播时在锁内复制当前成员的发送端，释放锁后逐个 `try_send`；
//! 队列已满或连接已关闭时丢弃该条事件，历史记录以存储为准。

use std::collections::{HashMap, HashSet};
use std::fmt;

use application::{BroadcastError, MessageBroadcast, MessageBroadcaster};
use async_trait::async_trait;
use domain::{RoomName, UserId};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
}

struct Connection {
    user_id: UserId,
    sender: mpsc::Sender<MessageBroadcast>,
    rooms: HashSet<RoomName>,
}

#[derive(Default)]
struct HubState {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
}

pub struct InMemoryRoomHub {
    state: RwLock<HubState>,
    capacity: usize,
}

impl InMemoryRoomHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RwLock::new(HubState::default()),
            capacity: capacity.max(1),
        }
    }

    /// 注册连接，返回连接 ID 和接收该连接事件的队列
    pub async fn connect(
        &self,
        user_id: UserId,
    ) -> (ConnectionId, mpsc::Receiver<MessageBroadcast>) {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = ConnectionId::new();
        self.state.write().await.connections.insert(
            id,
            Connection {
                user_id,
                sender,
                rooms: HashSet::new(),
            },
        );
        tracing::debug!(connection = %id, user_id = %user_id, "连接已注册");
        (id, receiver)
    }

    /// 加入房间；重复加入无副作用，返回是否为首次加入
    pub async fn join(&self, connection: ConnectionId, room: RoomName) -> Result<bool, HubError> {
        let mut state = self.state.write().await;
        let entry = state
            .connections
            .get_mut(&connection)
            .ok_or(HubError::UnknownConnection(connection))?;
        if !entry.rooms.insert(room) {
            return Ok(false);
        }
        let user_id = entry.user_id;
        state.rooms.entry(room).or_default().insert(connection);
        tracing::debug!(connection = %connection, user_id = %user_id, room = %room, "加入房间");
        Ok(true)
    }

    /// 注销连接并从所有房间移除
    pub async fn disconnect(&self, connection: ConnectionId) {
        let mut state = self.state.write().await;
        let Some(entry) = state.connections.remove(&connection) else {
            return;
        };
        for room in entry.rooms {
            if let Some(members) = state.rooms.get_mut(&room) {
                members.remove(&connection);
                if members.is_empty() {
                    state.rooms.remove(&room);
                }
            }
        }
        tracing::debug!(connection = %connection, user_id = %entry.user_id, "连接已注销");
    }

    pub async fn member_count(&self, room: &RoomName) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(room)
            .map_or(0, HashSet::len)
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }
}

#[async_trait]
impl MessageBroadcaster for InMemoryRoomHub {
    async fn broadcast(&self, payload: MessageBroadcast) -> Result<usize, BroadcastError> {
        let targets: Vec<(ConnectionId, mpsc::Sender<MessageBroadcast>)> = {
            let state = self.state.read().await;
            state
                .rooms
                .get(&payload.room)
                .into_iter()
                .flatten()
                .filter_map(|id| {
                    state
                        .connections
                        .get(id)
                        .map(|conn| (*id, conn.sender.clone()))
                })
                .collect()
        };

        let mut delivered = 0;
        for (connection, sender) in targets {
            match sender.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(connection = %connection, room = %payload.room, "发送队列已满，丢弃实时消息");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(connection = %connection, room = %payload.room, "连接已关闭");
                }
            }
        }
        Ok(delivered)
    }
}
