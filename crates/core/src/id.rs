// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run and spawn identifiers.
//!
//! Both id kinds are fixed-capacity inline buffers so they stay `Copy` and
//! can key hash maps through `Borrow<str>`.

/// Maximum byte length for an inline ID.
///
/// Run ids are `run_<unix-seconds>_<8-char nanoid>` (23 bytes today, 24 after
/// year 2286); spawn ids are `spn-<19-char nanoid>` (23 bytes).
pub const ID_MAX_LEN: usize = 32;

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// Fixed-size inline ID buffer. Always ≤ 32 ASCII bytes, `Copy`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdBuf {
    len: u8,
    buf: [u8; ID_MAX_LEN],
}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash only the active bytes so it matches str::hash,
        // which is required for Borrow<str> HashMap lookups.
        self.as_str().hash(state);
    }
}

impl IdBuf {
    pub fn new(s: &str) -> Self {
        debug_assert!(
            s.len() <= ID_MAX_LEN,
            "ID exceeds {} bytes ({} bytes): {:?}",
            ID_MAX_LEN,
            s.len(),
            s,
        );
        let len = s.len().min(ID_MAX_LEN);
        let mut buf = [0u8; ID_MAX_LEN];
        buf[..len].copy_from_slice(&s.as_bytes()[..len]);
        Self { len: len as u8, buf }
    }

    pub fn as_str(&self) -> &str {
        // Invariant: only constructed from &str, always valid UTF-8.
        match std::str::from_utf8(&self.buf[..self.len as usize]) {
            Ok(s) => s,
            Err(_) => unreachable!("IdBuf constructed from non-UTF-8"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::borrow::Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl std::fmt::Display for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for IdBuf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for IdBuf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Cow accepts both borrowed and owned input (serde_json::Value
        // deserialization cannot lend borrowed strings).
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        if s.len() > ID_MAX_LEN {
            return Err(serde::de::Error::custom(format!("ID exceeds {} bytes: {:?}", ID_MAX_LEN, s)));
        }
        Ok(IdBuf::new(&s))
    }
}

macro_rules! id_common {
    ($name:ident) => {
        impl $name {
            /// Create an ID from an existing string (parsing/deserialization).
            pub fn from_string(id: impl AsRef<str>) -> Self {
                Self(IdBuf::new(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0.as_str() == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

/// Unique identifier for a run: `run_<unix-seconds>_<random>`.
///
/// The timestamp segment makes ids roughly sortable by submission time when
/// listed lexically; uniqueness comes from the random tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RunId(pub IdBuf);

impl RunId {
    pub const PREFIX: &'static str = "run_";

    /// Mint a new run id from the given unix-seconds timestamp.
    pub fn generate(unix_secs: u64) -> Self {
        Self(IdBuf::new(&format!("{}{}_{}", Self::PREFIX, unix_secs, nanoid::nanoid!(8))))
    }

    /// True when the string has the `run_<time>_<rand>` shape.
    pub fn is_well_formed(s: &str) -> bool {
        let Some(rest) = s.strip_prefix(Self::PREFIX) else {
            return false;
        };
        let mut parts = rest.splitn(2, '_');
        let time_ok = parts.next().is_some_and(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()));
        let rand_ok = parts.next().is_some_and(|r| !r.is_empty());
        time_ok && rand_ok && s.len() <= ID_MAX_LEN
    }
}

id_common!(RunId);

/// Unique identifier for one `factory.spawn` call within a run: `spn-<random>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SpawnId(pub IdBuf);

impl SpawnId {
    pub const PREFIX: &'static str = "spn-";

    /// Mint a new random spawn id.
    pub fn generate() -> Self {
        Self(IdBuf::new(&format!("{}{}", Self::PREFIX, nanoid::nanoid!(19))))
    }
}

id_common!(SpawnId);

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
