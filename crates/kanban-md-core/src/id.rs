use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{convert::Infallible, fmt, str::FromStr};
use uuid::Uuid;

/// Source of fresh identifiers for columns and tasks.
///
/// Ids only live for one in-memory session; they are never written to the
/// Markdown document.
pub trait IdGenerator {
    /// Produce an identifier that has not been handed out before.
    fn next_id(&mut self) -> String;
}

impl<G: IdGenerator + ?Sized> IdGenerator for &mut G {
    fn next_id(&mut self) -> String {
        (**self).next_id()
    }
}

/// Default generator backed by UUID v7.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        // v7 keeps ids roughly ordered by creation time, which reads well in logs.
        Uuid::now_v7().to_string()
    }
}

/// Deterministic generator producing `<prefix>-1`, `<prefix>-2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    /// Create a counter starting at 1.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        pub struct $name(String);

        impl $name {
            /// Draw a fresh identifier from `ids`.
            pub fn generate(ids: &mut impl IdGenerator) -> Self {
                Self(ids.next_id())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                s.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                String::deserialize(d).map(Self)
            }
        }
    };
}

string_id!(
    /// Identifier of a column, unique within one board.
    ColumnId
);

string_id!(
    /// Identifier of a task, unique within one board.
    TaskId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_use_uuid_v7() {
        let raw = UuidIds.next_id();
        let parsed = Uuid::parse_str(&raw).unwrap_or_else(|err| panic!("must parse uuid: {err}"));
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn uuid_ids_are_unique() {
        let mut ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn sequential_ids_count_up_from_one() {
        let mut ids = SequentialIds::new("t");
        assert_eq!(ids.next_id(), "t-1");
        assert_eq!(ids.next_id(), "t-2");
        assert_eq!(TaskId::generate(&mut ids).as_str(), "t-3");
    }

    #[test]
    fn generator_can_be_passed_by_reference() {
        let mut ids = SequentialIds::new("c");
        let first = ColumnId::generate(&mut &mut ids);
        let second = ColumnId::generate(&mut ids);
        assert_eq!(first.as_str(), "c-1");
        assert_eq!(second.as_str(), "c-2");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = TaskId::from("abc");
        let json = serde_json::to_string(&id).unwrap_or_else(|err| panic!("must serialize: {err}"));
        assert_eq!(json, "\"abc\"");
        let back: TaskId =
            serde_json::from_str(&json).unwrap_or_else(|err| panic!("must deserialize: {err}"));
        assert_eq!(back, id);
    }
}
