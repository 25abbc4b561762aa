//! 会话注册表
//!
//! 每个会话一条 [`JobState`]，读取时返回快照（克隆）。
//! 不同会话的条目互不影响，可以被多个任务同时读写。

use std::time::Duration;

use chrono::Local;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::SessionError;
use crate::models::JobState;

/// 会话存储抽象
pub trait SessionStore: Send + Sync {
    /// 读取快照
    fn get(&self, session_id: &Uuid) -> Option<JobState>;

    /// 插入或覆盖
    fn put(&self, state: JobState);

    /// 原地修改一条会话并返回修改后的快照
    ///
    /// `apply` 返回错误时条目保持原样。
    fn update(
        &self,
        session_id: &Uuid,
        apply: &mut dyn FnMut(&mut JobState) -> Result<(), SessionError>,
    ) -> Result<JobState, SessionError>;

    fn remove(&self, session_id: &Uuid) -> Option<JobState>;

    /// 删除已结束且最后更新时间早于 `ttl` 的会话，返回删除数量
    fn evict_expired(&self, ttl: Duration) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 基于 DashMap 的内存实现
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<Uuid, JobState>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &Uuid) -> Option<JobState> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    fn put(&self, state: JobState) {
        self.sessions.insert(state.session_id, state);
    }

    fn update(
        &self,
        session_id: &Uuid,
        apply: &mut dyn FnMut(&mut JobState) -> Result<(), SessionError>,
    ) -> Result<JobState, SessionError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::NotFound {
                session_id: *session_id,
            })?;

        // 先在副本上修改，成功后再写回
        let mut next = entry.value().clone();
        apply(&mut next)?;
        *entry.value_mut() = next.clone();
        Ok(next)
    }

    fn remove(&self, session_id: &Uuid) -> Option<JobState> {
        self.sessions.remove(session_id).map(|(_, state)| state)
    }

    fn evict_expired(&self, ttl: Duration) -> usize {
        let ttl = match chrono::Duration::from_std(ttl) {
            Ok(ttl) => ttl,
            Err(_) => return 0,
        };
        let cutoff = Local::now() - ttl;

        let before = self.sessions.len();
        self.sessions
            .retain(|_, state| !(state.is_terminal() && state.updated_at <= cutoff));
        let evicted = before.saturating_sub(self.sessions.len());

        if evicted > 0 {
            debug!("清理过期会话: {} 个", evicted);
        }
        evicted
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
