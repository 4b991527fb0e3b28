// ==========================================
// 多厂区 MES 聚合系统 - 标识与时钟
// ==========================================
// 职责: 新建记录所需的 id 生成与当前时间，均可注入替换
// ==========================================

use crate::domain::ReturnHistory;
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

// ==========================================
// IdGenerator
// ==========================================
pub trait IdGenerator: Send + Sync {
    /// 记录主键
    fn next_id(&self) -> String;

    /// 业务编号（带前缀，如 RET-）
    fn next_business_id(&self, prefix: &str) -> String;
}

/// UUID v4 生成器
#[derive(Debug, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn next_business_id(&self, prefix: &str) -> String {
        let simple = Uuid::new_v4().simple().to_string();
        format!("{}-{}", prefix, simple[..8].to_uppercase())
    }
}

/// 单调递增生成器（测试用）
#[derive(Debug)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }

    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        format!("id-{:06}", self.next())
    }

    fn next_business_id(&self, prefix: &str) -> String {
        format!("{}-{:03}", prefix, self.next())
    }
}

// ==========================================
// Clock
// ==========================================
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// 本地时间
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// 固定时钟（测试用，可手动推进）
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

// ==========================================
// Creatable - 可由聚合层新建的记录
// ==========================================
pub trait Creatable {
    /// 写入新 id / 业务编号 / 时间戳（状态保持调用方提供的值）
    fn stamp_new(&mut self, ids: &dyn IdGenerator, now: NaiveDateTime);
}

impl Creatable for ReturnHistory {
    fn stamp_new(&mut self, ids: &dyn IdGenerator, now: NaiveDateTime) {
        self.id = ids.next_id();
        self.return_id = ids.next_business_id("RET");
        self.return_date = Some(now);
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }
}
