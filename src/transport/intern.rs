use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// One canonical `Arc<str>` per distinct address or filter name.
/// Crate-private: visible to the other modules here, not to callers.
static NAME_INTERN: Lazy<DashMap<String, Arc<str>>> = Lazy::new(DashMap::new);

/// Returns the interned `Arc<str>` for the given name, creating it on the
/// first call. The entry API makes the insert atomic: concurrent callers
/// for one name always land on the same allocation.
#[inline(always)]
pub(crate) fn intern_name<S: AsRef<str>>(name: S) -> Arc<str> {
    let key = name.as_ref();
    if let Some(existing) = NAME_INTERN.get(key) {
        return existing.clone();
    }
    NAME_INTERN
        .entry(key.to_string())
        .or_insert_with(|| Arc::from(key))
        .clone()
}
