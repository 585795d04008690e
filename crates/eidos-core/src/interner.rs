use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

/// Canonical integer ID for an interned identifier string.
///
/// IDs are process-wide and never recycled; comparing two IDs is equivalent
/// to comparing the underlying strings.
pub type EidosStringId = u32;

/// Pre-registered IDs for the intrinsic constants. The global interner
/// registers these strings first, in this order, at warmup.
pub mod ids {
    use super::EidosStringId;

    pub const T: EidosStringId = 0;
    pub const F: EidosStringId = 1;
    pub const NULL: EidosStringId = 2;
    pub const PI: EidosStringId = 3;
    pub const E: EidosStringId = 4;
    pub const INF: EidosStringId = 5;
    pub const NAN: EidosStringId = 6;
}

const PREREGISTERED: &[&str] = &["T", "F", "NULL", "PI", "E", "INF", "NAN"];

/// String interner mapping identifier text to stable integer IDs.
///
/// The forward map is a `DashMap` so lookups from the lexer take no global
/// lock; the reverse table only locks when a brand-new string is registered.
pub struct StringInterner {
    ids: DashMap<String, EidosStringId>,
    strings: RwLock<Vec<Arc<String>>>,
}

impl StringInterner {
    pub fn new() -> Self {
        let interner = Self {
            ids: DashMap::with_capacity(256),
            strings: RwLock::new(Vec::with_capacity(256)),
        };

        for name in PREREGISTERED {
            interner.intern(name);
        }

        interner
    }

    /// Return the ID for `name`, registering it if it has never been seen.
    pub fn intern(&self, name: &str) -> EidosStringId {
        if let Some(entry) = self.ids.get(name) {
            return *entry.value();
        }

        let mut strings = self.strings.write().expect("interner lock poisoned");

        // Re-check under the write lock; another caller may have won the race.
        if let Some(entry) = self.ids.get(name) {
            return *entry.value();
        }

        let id = strings.len() as EidosStringId;
        strings.push(Arc::new(name.to_string()));
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Look up an ID without registering; `None` if the string is unknown.
    pub fn get(&self, name: &str) -> Option<EidosStringId> {
        self.ids.get(name).map(|entry| *entry.value())
    }

    /// The string registered for `id`. IDs only come from `intern`, so a
    /// miss is an internal error.
    pub fn string_for_id(&self, id: EidosStringId) -> Arc<String> {
        let strings = self.strings.read().expect("interner lock poisoned");
        Arc::clone(&strings[id as usize])
    }

    pub fn len(&self) -> usize {
        self.strings.read().expect("interner lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

static INTERNER: Lazy<StringInterner> = Lazy::new(StringInterner::new);

/// The process-wide interner. Initialized on first use; the intrinsic
/// constant names always occupy the IDs in [`ids`].
pub fn global_interner() -> &'static StringInterner {
    &INTERNER
}

/// Intern `name` in the process-wide interner.
pub fn global_id_for_string(name: &str) -> EidosStringId {
    INTERNER.intern(name)
}

/// Reverse lookup in the process-wide interner.
pub fn string_for_global_id(id: EidosStringId) -> Arc<String> {
    INTERNER.string_for_id(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let interner = StringInterner::new();

        let a = interner.intern("mutationRate");
        let b = interner.intern("mutationRate");
        assert_eq!(a, b);

        let c = interner.intern("recombinationRate");
        assert_ne!(a, c);

        assert_eq!(&*interner.string_for_id(a), "mutationRate");
        assert_eq!(&*interner.string_for_id(c), "recombinationRate");
    }

    #[test]
    fn test_intrinsic_constant_ids() {
        assert_eq!(global_id_for_string("T"), ids::T);
        assert_eq!(global_id_for_string("F"), ids::F);
        assert_eq!(global_id_for_string("NULL"), ids::NULL);
        assert_eq!(global_id_for_string("PI"), ids::PI);
        assert_eq!(global_id_for_string("E"), ids::E);
        assert_eq!(global_id_for_string("INF"), ids::INF);
        assert_eq!(global_id_for_string("NAN"), ids::NAN);
    }

    #[test]
    fn test_get_does_not_register() {
        let interner = StringInterner::new();
        assert!(interner.get("neverSeen").is_none());
        let id = interner.intern("neverSeen");
        assert_eq!(interner.get("neverSeen"), Some(id));
    }
}
