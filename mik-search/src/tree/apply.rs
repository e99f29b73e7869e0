//! Bulk assignment.

use super::ConditionTree;
use crate::error::ConditionError;
use crate::params::Params;
use crate::value::Value;
use crate::vocabulary::Vocabulary;
use tracing::{debug, warn};

impl ConditionTree {
    /// Apply a mapping of names to values, recursing into relationships.
    ///
    /// On a protected tree, names the entity's protection policy rejects are
    /// dropped silently and any raw scope (a string where a mapping is
    /// expected) fails with [`ConditionError::InjectionRisk`], even under a
    /// relationship the policy drops. Unknown names fail in both modes. Empty strings unset their condition.
    ///
    /// The assignment is atomic: if any pair fails, the tree is unchanged.
    pub fn apply(&mut self, params: impl Into<Params>) -> Result<(), ConditionError> {
        let mut staged = self.clone();
        staged.apply_params(params.into(), false)?;
        *self = staged;
        Ok(())
    }

    fn apply_params(&mut self, params: Params, untrusted: bool) -> Result<(), ConditionError> {
        let untrusted = untrusted || self.protected;
        match params {
            Params::Map(pairs) => pairs
                .into_iter()
                .try_for_each(|(name, value)| self.apply_pair(&name, value, untrusted)),
            Params::Value(Value::Null) => Ok(()),
            Params::Value(Value::String(scope)) => {
                if untrusted {
                    return Err(self.injection_risk());
                }
                self.set_scope(scope)
            },
            Params::Value(other) => Err(ConditionError::invalid(
                "scope",
                format!("expected a mapping or a scope, got {}", other.type_name()),
            )),
        }
    }

    fn apply_pair(&mut self, name: &str, value: Params, untrusted: bool) -> Result<(), ConditionError> {
        if let Some(target) = self.vocabulary.relationship(name) {
            if untrusted && !self.vocabulary.policy().permits(name) {
                self.screen(self.catalog.vocabulary(&target.entity)?, &value)?;
                debug!(entity = %self.entity(), key = name, "protected relationship dropped");
                return Ok(());
            }
            return self.relation(name)?.apply_params(value, untrusted);
        }

        let key = self.resolve(name)?;
        if untrusted && !self.vocabulary.policy().permits(key.name()) {
            debug!(entity = %self.entity(), key = name, "protected condition dropped");
            return Ok(());
        }

        match value {
            Params::Map(_) => Err(ConditionError::invalid(
                key.name(),
                "expected a value, got a mapping",
            )),
            Params::Value(Value::String(s)) if s.is_empty() => {
                self.unset(&key);
                Ok(())
            },
            Params::Value(v) => self.assign(key, v),
        }
    }

    /// Walk input for a relationship the policy drops. Nothing is assigned,
    /// but raw scopes and unknown names fail as they would anywhere else.
    fn screen(&self, vocabulary: &Vocabulary, params: &Params) -> Result<(), ConditionError> {
        match params {
            Params::Map(pairs) => pairs.iter().try_for_each(|(name, value)| {
                if let Some(target) = vocabulary.relationship(name) {
                    return self.screen(self.catalog.vocabulary(&target.entity)?, value);
                }
                match vocabulary.resolve(name) {
                    Some(_) => Ok(()),
                    None => Err(ConditionError::UnknownCondition {
                        entity: vocabulary.entity().to_string(),
                        name: name.clone(),
                    }),
                }
            }),
            Params::Value(Value::String(_)) => {
                warn!(entity = %vocabulary.entity(), "raw SQL scope rejected on protected conditions");
                Err(ConditionError::InjectionRisk {
                    entity: vocabulary.entity().to_string(),
                })
            },
            Params::Value(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::Catalog;
    use crate::error::ConditionError;
    use crate::params::{Params, parse_params};
    use crate::registry::Registry;
    use crate::schema::{EntityDef, SemanticType, StaticSchema};
    use crate::value::Value;
    use std::sync::Arc;

    fn catalog() -> Arc<Catalog> {
        let schema = StaticSchema::new()
            .entity(
                EntityDef::new("Account")
                    .column("id", SemanticType::Integer)
                    .column("name", SemanticType::Text)
                    .relationship("users", "User")
                    .protected(&["id"]),
            )
            .entity(
                EntityDef::new("User")
                    .column("first_name", SemanticType::Text)
                    .column("admin", SemanticType::Boolean)
                    .accessible(&["first_name_contains"]),
            );
        Arc::new(Catalog::from_schema(Registry::standard().unwrap(), schema).unwrap())
    }

    #[test]
    fn test_apply_nested() {
        let mut tree = catalog().conditions("Account").unwrap();
        tree.apply(parse_params(r#"{"id": 1, "users": {"admin": "true"}}"#).unwrap())
            .unwrap();
        assert_eq!(tree.get("id_equals").unwrap(), Some(&Value::Int(1)));
        assert_eq!(
            tree.child("users").unwrap().get("admin").unwrap(),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_protected_drops_forbidden_keys() {
        let mut tree = catalog().protected_conditions("Account").unwrap();
        tree.apply(Params::map([
            ("id", Params::from(1)),
            ("name_like", Params::from("Bin")),
            (
                "users",
                Params::map([
                    ("admin", Params::from(true)),
                    ("first_name_has", Params::from("Ben")),
                ]),
            ),
        ]))
        .unwrap();

        assert_eq!(tree.get("id").unwrap(), None);
        assert_eq!(tree.get("name_contains").unwrap(), Some(&Value::from("Bin")));
        let users = tree.child("users").unwrap();
        assert_eq!(users.get("admin").unwrap(), None);
        assert_eq!(users.get("first_name_contains").unwrap(), Some(&Value::from("Ben")));
    }

    #[test]
    fn test_unknown_key_fails_in_both_modes() {
        let catalog = catalog();
        for mut tree in [
            catalog.conditions("Account").unwrap(),
            catalog.protected_conditions("Account").unwrap(),
        ] {
            let err = tree.apply(Params::map([("unknown_key", 1)])).unwrap_err();
            assert_eq!(
                err,
                ConditionError::UnknownCondition {
                    entity: "Account".into(),
                    name: "unknown_key".into()
                }
            );
        }
    }

    #[test]
    fn test_scope_through_apply() {
        let catalog = catalog();
        let mut tree = catalog.conditions("Account").unwrap();
        tree.apply("accounts.id > 0").unwrap();
        assert_eq!(tree.scope(), Some("accounts.id > 0"));

        tree.apply(Params::map([("users", "users.active")])).unwrap();
        assert_eq!(tree.child("users").unwrap().scope(), Some("users.active"));

        let mut protected = catalog.protected_conditions("Account").unwrap();
        assert!(matches!(
            protected.apply("1 = 1").unwrap_err(),
            ConditionError::InjectionRisk { .. }
        ));
        assert!(matches!(
            protected
                .apply(Params::map([("users", "1 = 1")]))
                .unwrap_err(),
            ConditionError::InjectionRisk { .. }
        ));
    }

    #[test]
    fn test_scope_under_denied_relationship_is_rejected() {
        let schema = StaticSchema::new()
            .entity(
                EntityDef::new("Account")
                    .column("name", SemanticType::Text)
                    .relationship("users", "User")
                    .protected(&["users"]),
            )
            .entity(
                EntityDef::new("User")
                    .column("first_name", SemanticType::Text)
                    .relationship("orders", "Order"),
            )
            .entity(EntityDef::new("Order").column("total", SemanticType::Integer));
        let catalog = Arc::new(Catalog::from_schema(Registry::standard().unwrap(), schema).unwrap());
        let mut tree = catalog.protected_conditions("Account").unwrap();

        let err = tree
            .apply(Params::map([("users", "1=1) OR (1=1")]))
            .unwrap_err();
        assert_eq!(err, ConditionError::InjectionRisk { entity: "User".into() });

        let nested = Params::map([("users", Params::map([("orders", "1=1")]))]);
        assert!(matches!(
            tree.apply(nested).unwrap_err(),
            ConditionError::InjectionRisk { .. }
        ));

        let unknown = Params::map([("users", Params::map([("zzz", 1)]))]);
        assert!(matches!(
            tree.apply(unknown).unwrap_err(),
            ConditionError::UnknownCondition { .. }
        ));

        // Structured values under the denied relationship are still dropped,
        // without being coerced.
        tree.apply(Params::map([(
            "users",
            Params::map([
                ("first_name", Params::from("Ben")),
                ("first_name_kw", Params::from("the")),
                ("orders", Params::map([("total_gt", "lots")])),
            ]),
        )]))
        .unwrap();
        assert!(tree.child("users").is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_untrusted_apply_reaches_trusted_children() {
        let catalog = catalog();
        let mut tree = catalog.conditions("Account").unwrap();
        tree.relation("users").unwrap();
        tree.set_protected(true);

        // The child was created unprotected, but input arriving through a
        // protected parent is still untrusted.
        let err = tree.apply(Params::map([("users", "1 = 1")])).unwrap_err();
        assert!(matches!(err, ConditionError::InjectionRisk { .. }));
    }

    #[test]
    fn test_apply_is_atomic() {
        let mut tree = catalog().conditions("Account").unwrap();
        tree.set("name_contains", "keep").unwrap();

        let err = tree
            .apply(Params::map([
                ("name_contains", Params::from("replaced")),
                ("id_gt", Params::from("not a number")),
            ]))
            .unwrap_err();
        assert!(matches!(err, ConditionError::InvalidValue { .. }));
        assert_eq!(tree.get("name_contains").unwrap(), Some(&Value::from("keep")));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_empty_string_unsets() {
        let mut tree = catalog().conditions("Account").unwrap();
        tree.set("name_contains", "x").unwrap();
        tree.apply(Params::map([("name_contains", "")])).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_mapping_for_condition_is_invalid() {
        let mut tree = catalog().conditions("Account").unwrap();
        let err = tree
            .apply(Params::map([("id_gt", Params::map([("x", 1)]))]))
            .unwrap_err();
        assert!(matches!(err, ConditionError::InvalidValue { ref name, .. } if name == "id_greater_than"));
    }

    #[test]
    fn test_value_round_trips_through_apply() {
        let catalog = catalog();
        let mut tree = catalog.conditions("Account").unwrap();
        tree.set("name_bw", "Bi").unwrap();
        tree.relation("users").unwrap().set("first_name", "Ben").unwrap();

        let mut copy = catalog.conditions("Account").unwrap();
        copy.apply(tree.value()).unwrap();
        assert_eq!(copy.sanitize(), tree.sanitize());
    }
}
