//! Time and id sources injected into the engagement service

use std::sync::atomic::{AtomicU32, Ordering};

use bson::oid::ObjectId;
use chrono::{DateTime, SubsecRound, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time at millisecond precision, the resolution of a stored
/// BSON datetime
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of fresh comment ids
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> ObjectId;
}

/// Random ObjectIds from the bson crate
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectIdGenerator;

impl IdGenerator for ObjectIdGenerator {
    fn next_id(&self) -> ObjectId {
        ObjectId::new()
    }
}

/// Predictable ids: 000...001, 000...002, ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU32,
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> ObjectId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut bytes = [0u8; 12];
        bytes[8..].copy_from_slice(&n.to_be_bytes());
        ObjectId::from_bytes(bytes)
    }
}
