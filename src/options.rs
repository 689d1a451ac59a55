//! Host storage contracts consumed next to the documentation model.
//!
//! The host keeps site-wide options in an option store and per-user settings in user meta. Only
//! the contracts are modelled here, with in-memory stores for tests and embedding. Reads and
//! writes of site options are sliced to a declared set of keys, the same known-key filtering that
//! leaf entities apply to their raw records.

use serde_json::{Map, Value};
use std::{cell::RefCell, collections::HashMap};

use crate::{error::LeafDocError, model::parse_bool, record::RawRecord};

/// User meta key of the developer tools setting.
pub const USER_OPTION_DEVELOPER_TOOLS: &str = "amp_dev_tools_enabled";

pub type UserId = u64;

pub trait OptionStore {
    fn get_options(&self) -> Result<Map<String, Value>, LeafDocError>;
    fn update_options(&self, options: Map<String, Value>) -> Result<(), LeafDocError>;
}

pub trait UserMetaStore {
    fn get(&self, user: UserId, key: &str) -> Result<Option<Value>, LeafDocError>;
    fn set(&self, user: UserId, key: &str, value: Value) -> Result<(), LeafDocError>;
}

/// Capability predicate of the host.
pub trait Capabilities {
    fn can_manage(&self, user: UserId) -> bool;
}

impl<F> Capabilities for F
where
    F: Fn(UserId) -> bool,
{
    fn can_manage(&self, user: UserId) -> bool {
        self(user)
    }
}

#[derive(Debug, Default)]
pub struct MemoryOptionStore(RefCell<Map<String, Value>>);

impl MemoryOptionStore {
    pub fn new(options: Map<String, Value>) -> Self {
        MemoryOptionStore(RefCell::new(options))
    }
}

impl OptionStore for MemoryOptionStore {
    fn get_options(&self) -> Result<Map<String, Value>, LeafDocError> {
        Ok(self.0.borrow().clone())
    }

    /// Merges `options` over the stored values.
    fn update_options(&self, options: Map<String, Value>) -> Result<(), LeafDocError> {
        let mut stored = self.0.borrow_mut();
        for (key, value) in options {
            stored.insert(key, value);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserMetaStore(RefCell<HashMap<(UserId, String), Value>>);

impl UserMetaStore for MemoryUserMetaStore {
    fn get(&self, user: UserId, key: &str) -> Result<Option<Value>, LeafDocError> {
        Ok(self.0.borrow().get(&(user, key.to_string())).cloned())
    }

    fn set(&self, user: UserId, key: &str, value: Value) -> Result<(), LeafDocError> {
        self.0.borrow_mut().insert((user, key.to_string()), value);
        Ok(())
    }
}

/// The stored options restricted to `known_keys`.
pub fn slice_options<'a, S, I>(store: &S, known_keys: I) -> Result<RawRecord, LeafDocError>
where
    S: OptionStore + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    Ok(RawRecord::from(store.get_options()?).restrict(known_keys))
}

/// Write the `known_keys` subset of `params`, then read the sliced options back.
pub fn update_known_options<'a, S, I>(
    store: &S,
    params: &RawRecord,
    known_keys: I,
) -> Result<RawRecord, LeafDocError>
where
    S: OptionStore + ?Sized,
    I: IntoIterator<Item = &'a str> + Clone,
{
    let accepted = params.restrict(known_keys.clone());
    let ignored = params.unknown_keys(known_keys.clone());
    if !ignored.is_empty() {
        tracing::debug!("[update_known_options] ignoring undeclared options: {:?}", ignored);
    }
    store.update_options(accepted.into_map())?;
    slice_options(store, known_keys)
}

/// Per-user settings backed by a [UserMetaStore] and gated by [Capabilities].
pub struct UserOptions<'a, M: ?Sized, C: ?Sized> {
    meta: &'a M,
    caps: &'a C,
}

impl<'a, M, C> UserOptions<'a, M, C>
where
    M: UserMetaStore + ?Sized,
    C: Capabilities + ?Sized,
{
    pub fn new(meta: &'a M, caps: &'a C) -> Self {
        UserOptions { meta, caps }
    }

    /// Whether developer tools are enabled for `user`.
    ///
    /// A user without a stored value is initialized to whether they can manage the site, and that
    /// value is stored.
    pub fn developer_tools_enabled(&self, user: UserId) -> Result<bool, LeafDocError> {
        match self.meta.get(user, USER_OPTION_DEVELOPER_TOOLS)? {
            Some(value) => Ok(parse_bool(&value).unwrap_or_else(|| {
                tracing::debug!(
                    "[UserOptions] unreadable {} for user {}: {}; treating as disabled",
                    USER_OPTION_DEVELOPER_TOOLS,
                    user,
                    value
                );
                false
            })),
            None => {
                let enabled = self.caps.can_manage(user);
                tracing::debug!(
                    "[UserOptions] initializing {} for user {} to {}",
                    USER_OPTION_DEVELOPER_TOOLS,
                    user,
                    enabled
                );
                self.meta
                    .set(user, USER_OPTION_DEVELOPER_TOOLS, Value::Bool(enabled))?;
                Ok(enabled)
            }
        }
    }

    /// Enabling requires the manage capability; disabling is always allowed.
    pub fn set_developer_tools(&self, user: UserId, enabled: bool) -> Result<(), LeafDocError> {
        if enabled && !self.caps.can_manage(user) {
            return Err(LeafDocError::PermissionDenied);
        }
        self.meta
            .set(user, USER_OPTION_DEVELOPER_TOOLS, Value::Bool(enabled))
    }
}
