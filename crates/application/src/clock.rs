use chrono::Utc;
use domain::Timestamp;

/// 服务端时间来源；消息、帖子与评论的时间戳都由这里分配
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// 取 UTC 墙钟时间
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}
