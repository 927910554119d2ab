//! Shared per-server state handed to every handler.
//!
//! The [`Globals`] map replaces the loose "define some globals and every
//! handler can see them" pattern with an explicit, typed structure: values
//! are stored under a name, retrieved by name *and* type, and shared by
//! reference with every handler invocation.
//!
//! # Concurrency
//!
//! porch does **not** serialize handler access to this map. The map itself
//! is frozen once [`Server::start`](crate::Server::start) begins serving —
//! but the values inside it are whatever you put there. If two concurrent
//! handlers must mutate the same value, store something with interior
//! mutability and its own synchronization (`AtomicUsize`, `Mutex<T>`, …):
//!
//! ```rust
//! use std::sync::atomic::AtomicUsize;
//! use porch::Globals;
//!
//! let globals = Globals::new()
//!     .set("hits", AtomicUsize::new(0))
//!     .set("motd", String::from("hello"));
//! ```

use std::any::Any;
use std::collections::HashMap;

/// A typed name-to-value map shared with every handler.
#[derive(Default)]
pub struct Globals {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `name`, replacing any previous value.
    /// Returns `self` so definitions chain naturally.
    pub fn set(mut self, name: impl Into<String>, value: impl Any + Send + Sync) -> Self {
        self.values.insert(name.into(), Box::new(value));
        self
    }

    /// Retrieves the value stored under `name`, if it exists *and* is a `T`.
    ///
    /// ```rust
    /// # use porch::Globals;
    /// let globals = Globals::new().set("answer", 42u32);
    /// assert_eq!(globals.get::<u32>("answer"), Some(&42));
    /// assert_eq!(globals.get::<String>("answer"), None); // wrong type
    /// assert_eq!(globals.get::<u32>("question"), None);  // missing key
    /// ```
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.values.get(name)?.downcast_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn typed_lookup() {
        let globals = Globals::new().set("count", 3usize).set("name", "porch");
        assert_eq!(globals.get::<usize>("count"), Some(&3));
        assert_eq!(globals.get::<&str>("name"), Some(&"porch"));
    }

    #[test]
    fn missing_key_or_wrong_type_is_none() {
        let globals = Globals::new().set("count", 3usize);
        assert!(globals.get::<usize>("missing").is_none());
        assert!(globals.get::<String>("count").is_none());
    }

    #[test]
    fn set_overwrites() {
        let globals = Globals::new().set("k", 1u8).set("k", 2u8);
        assert_eq!(globals.get::<u8>("k"), Some(&2));
    }

    #[test]
    fn interior_mutability_through_shared_ref() {
        let globals = Globals::new().set("hits", AtomicUsize::new(0));
        let hits = globals.get::<AtomicUsize>("hits").unwrap();
        hits.fetch_add(1, Ordering::SeqCst);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
