use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

/// Errors that can occur during identity operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Missing field: {0}")]
    EmptyField(&'static str),

    #[error("Username already taken: {0}")]
    NameCollision(String),
}

/// Maps usernames to the stable ids stored in committed transactions
///
/// An identity's id is the name it was first seen under. Every name ever bound
/// to an identity keeps resolving to it, because retired names still appear in
/// committed history. Renaming adds a binding and changes the display name;
/// blocks are never rewritten.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    /// Every known name, current or retired, to its identity id
    names: DashMap<String, String>,

    /// Identity id to its current display name
    display: DashMap<String, String>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `name` to an identity id, registering a new identity if unknown
    pub fn resolve_or_register(&self, name: &str) -> String {
        let id = self
            .names
            .entry(name.to_string())
            .or_insert_with(|| name.to_string())
            .value()
            .clone();

        self.display
            .entry(id.clone())
            .or_insert_with(|| name.to_string());

        id
    }

    /// Resolves `name` without registering it
    ///
    /// Unknown names resolve to themselves, which no committed transaction
    /// references.
    pub fn lookup(&self, name: &str) -> String {
        self.names
            .get(name)
            .map(|id| id.value().clone())
            .unwrap_or_else(|| name.to_string())
    }

    /// Current display name of the identity `id`
    pub fn display_name(&self, id: &str) -> Option<String> {
        self.display.get(id).map(|name| name.value().clone())
    }

    /// Binds `new_name` to the identity currently reachable as `old_name`
    ///
    /// Returns the identity id. An unknown `old_name` is registered once the
    /// rename succeeds; a refused rename leaves the registry untouched.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<String, IdentityError> {
        if old_name.is_empty() {
            return Err(IdentityError::EmptyField("lastUsername"));
        }
        if new_name.is_empty() {
            return Err(IdentityError::EmptyField("username"));
        }
        if old_name == new_name {
            return Err(IdentityError::NameCollision(new_name.to_string()));
        }

        let id = self.lookup(old_name);

        match self.names.entry(new_name.to_string()) {
            Entry::Occupied(_) => return Err(IdentityError::NameCollision(new_name.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(id.clone());
            }
        }

        // The shard lock for `new_name` is released before touching `old_name`.
        self.resolve_or_register(old_name);
        self.display.insert(id.clone(), new_name.to_string());

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sight_registers_identity() {
        let registry = IdentityRegistry::new();
        assert!(!registry.names.contains_key("alice"));

        assert_eq!(registry.resolve_or_register("alice"), "alice");
        assert!(registry.names.contains_key("alice"));
        assert_eq!(registry.display_name("alice").as_deref(), Some("alice"));
    }

    #[test]
    fn test_lookup_does_not_register() {
        let registry = IdentityRegistry::new();

        assert_eq!(registry.lookup("ghost"), "ghost");
        assert!(!registry.names.contains_key("ghost"));
    }

    #[test]
    fn test_rename_keeps_id() {
        let registry = IdentityRegistry::new();
        registry.resolve_or_register("alice");

        let id = registry.rename("alice", "alicia").unwrap();

        assert_eq!(id, "alice");
        assert_eq!(registry.lookup("alicia"), "alice");
        assert_eq!(registry.lookup("alice"), "alice");
        assert_eq!(registry.resolve_or_register("alicia"), "alice");
        assert_eq!(registry.display_name("alice").as_deref(), Some("alicia"));
    }

    #[test]
    fn test_rename_chain_follows_identity() {
        let registry = IdentityRegistry::new();
        registry.resolve_or_register("alice");

        registry.rename("alice", "alicia").unwrap();
        registry.rename("alicia", "ally").unwrap();

        assert_eq!(registry.lookup("ally"), "alice");
        assert_eq!(registry.display_name("alice").as_deref(), Some("ally"));
    }

    #[test]
    fn test_rename_rejects_known_name() {
        let registry = IdentityRegistry::new();
        registry.resolve_or_register("alice");
        registry.resolve_or_register("bob");

        assert_eq!(
            registry.rename("alice", "bob"),
            Err(IdentityError::NameCollision("bob".to_string()))
        );
        assert_eq!(
            registry.rename("alice", "alice"),
            Err(IdentityError::NameCollision("alice".to_string()))
        );

        // A retired name stays taken
        registry.rename("alice", "alicia").unwrap();
        assert_eq!(
            registry.rename("bob", "alice"),
            Err(IdentityError::NameCollision("alice".to_string()))
        );
        assert_eq!(registry.lookup("bob"), "bob");
    }

    #[test]
    fn test_rename_rejects_empty_names() {
        let registry = IdentityRegistry::new();

        assert_eq!(
            registry.rename("", "bob"),
            Err(IdentityError::EmptyField("lastUsername"))
        );
        assert_eq!(
            registry.rename("alice", ""),
            Err(IdentityError::EmptyField("username"))
        );
        assert!(!registry.names.contains_key("alice"));
    }

    #[test]
    fn test_refused_rename_leaves_registry_untouched() {
        let registry = IdentityRegistry::new();
        registry.resolve_or_register("bob");

        assert_eq!(
            registry.rename("carol", "bob"),
            Err(IdentityError::NameCollision("bob".to_string()))
        );
        assert!(!registry.names.contains_key("carol"));
        assert_eq!(registry.display_name("carol"), None);
        assert_eq!(registry.names.len(), 1);

        // The name was never claimed, so it is still free to take
        assert_eq!(registry.rename("dave", "carol").unwrap(), "dave");
        assert_eq!(registry.lookup("carol"), "dave");

        assert_eq!(
            registry.rename("erin", "erin"),
            Err(IdentityError::NameCollision("erin".to_string()))
        );
        assert!(!registry.names.contains_key("erin"));
    }

    #[test]
    fn test_rename_unknown_registers_it() {
        let registry = IdentityRegistry::new();

        assert_eq!(registry.rename("carol", "caroline").unwrap(), "carol");
        assert!(registry.names.contains_key("carol"));
        assert_eq!(registry.resolve_or_register("caroline"), "carol");
    }
}
