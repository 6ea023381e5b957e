use std::{
    collections::VecDeque,
    error::Error,
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
    sync::{Mutex, PoisonError},
};

use derive_more::{Display as DeriveDisplay, Error as DeriveError};
use once_cell::sync;
use serde::{Deserialize, Serialize};
use snowflake::SnowflakeIdGenerator;
use thiserror::Error;

/// `res-1` のような接頭辞付きの数値IDを定義する
macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Copy,
            Clone,
            Debug,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            derive_more::From,
            derive_more::Deref,
            serde_with::SerializeDisplay,
            serde_with::DeserializeFromStr,
        )]
        pub struct $name(u64);

        impl $name {
            pub const PREFIX: &'static str = $prefix;
        }

        impl $crate::domain::Id for $name {
            type Inner = u64;
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.strip_prefix(concat!($prefix, "-"))
                    .and_then(|n| n.parse::<u64>().ok())
                    .map(Self)
                    .ok_or_else(|| $crate::domain::IdParseError {
                        prefix: $prefix,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

pub(crate) use prefixed_id;

pub mod core;
pub mod dashboard;

pub trait Id:
    Copy
    + Eq
    + Deref<Target = Self::Inner>
    + From<Self::Inner>
    + Display
    + Debug
    + Serialize
    + for<'de> Deserialize<'de>
{
    type Inner: FromStr;
}

pub trait Event: Clone + Eq + Debug + Serialize + for<'a> Deserialize<'a> {
    type Id;
}

pub trait Entity {
    type Id: Id;

    const ENTITY_NAME: &'static str;

    fn id(&self) -> Self::Id;
}

/// 変更をイベントとして記録する集約
pub trait Aggregation {
    type Event: Event;
    type Error: Error;

    fn validate(&self, event: &Self::Event) -> Result<(), Self::Error>;
    fn apply(&mut self, event: Self::Event);
    fn events(&self) -> &EventQueue<Self::Event>;
    fn events_mut(&mut self) -> &mut EventQueue<Self::Event>;
    fn pop(&mut self) -> Option<Self::Event> {
        self.events_mut().pop()
    }
    fn pop_all(&mut self) -> Vec<Self::Event> {
        let mut events = Vec::new();
        while let Some(e) = self.pop() {
            events.push(e);
        }
        events
    }
    fn clear(&mut self) {
        self.events_mut().clear()
    }
    fn peek(&self) -> Option<&Self::Event> {
        self.events().peek()
    }
    fn iter(&self) -> EventQueueIter<'_, Self::Event> {
        self.events().iter()
    }
}

/// キーと値のスロットにスナップショットを保存するストレージ
pub trait Storage {
    /// キーの値を取得する
    fn get(&self, key: &str) -> Result<Option<String>, DataAccessError>;
    /// キーの値を上書きする
    fn set(&mut self, key: &str, value: String) -> Result<(), DataAccessError>;
}

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("Data read error: {0}")]
    ReadError(BoxError),
    #[error("Data write error: {0}")]
    WriteError(BoxError),
    #[error("Serialization error: {0}")]
    SerializationError(BoxError),
}

/// IDの文字列表現が不正
#[derive(DeriveError, DeriveDisplay, Debug, Clone, PartialEq, Eq)]
#[display(fmt = "Invalid {} id: {:?}", prefix, value)]
pub struct IdParseError {
    pub prefix: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventQueue<T> {
    queue: VecDeque<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
    pub fn peek(&self) -> Option<&T> {
        self.queue.front()
    }
    pub fn push(&mut self, value: T) {
        self.queue.push_back(value)
    }
    pub fn pop(&mut self) -> Option<T> {
        self.queue.pop_front()
    }
    pub fn clear(&mut self) {
        self.queue.clear()
    }
    pub fn len(&self) -> usize {
        self.queue.len()
    }
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
    pub fn iter(&self) -> EventQueueIter<'_, T> {
        self.queue.iter()
    }
}

impl<T> IntoIterator for EventQueue<T> {
    type Item = T;
    type IntoIter = EventQueueIntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.queue.into_iter()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub type EventQueueIntoIter<T> = std::collections::vec_deque::IntoIter<T>;
pub type EventQueueIter<'a, T> = std::collections::vec_deque::Iter<'a, T>;

pub struct IdGenerator(SnowflakeIdGenerator);

impl IdGenerator {
    pub fn new(gen: SnowflakeIdGenerator) -> Self {
        Self(gen)
    }

    pub fn generate<T>(&mut self) -> T
    where
        T: From<u64>,
    {
        T::from(self.0.generate() as u64)
    }
}

impl From<SnowflakeIdGenerator> for IdGenerator {
    fn from(value: SnowflakeIdGenerator) -> Self {
        Self::new(value)
    }
}

pub static ID_GENERATOR: sync::Lazy<Mutex<IdGenerator>> =
    sync::Lazy::new(|| Mutex::new(SnowflakeIdGenerator::new(1, 1).into()));

/// プロセス共通のジェネレータから新しいIDを払い出す
pub fn generate_id<T>() -> T
where
    T: From<u64>,
{
    ID_GENERATOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    prefixed_id!(SampleId, "smp");

    #[test]
    fn test_prefixed_id_display_and_parse() {
        let id = SampleId::from(42);
        assert_eq!(id.to_string(), "smp-42");
        assert_eq!("smp-42".parse::<SampleId>().unwrap(), id);
        assert_eq!(*id, 42);
    }

    #[test]
    fn test_prefixed_id_rejects_other_prefix() {
        let err = "res-42".parse::<SampleId>().unwrap_err();
        assert_eq!(err.prefix, "smp");
        assert_eq!(err.to_string(), "Invalid smp id: \"res-42\"");
        assert!("smp-".parse::<SampleId>().is_err());
    }

    #[test]
    fn test_prefixed_id_serde() {
        let json = serde_json::to_string(&SampleId::from(7)).unwrap();
        assert_eq!(json, "\"smp-7\"");
        assert_eq!(serde_json::from_str::<SampleId>(&json).unwrap(), SampleId::from(7));
    }

    #[test]
    fn test_generate_id_is_unique() {
        let ids = (0..1000).map(|_| generate_id::<u64>()).collect::<Vec<_>>();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }
}
