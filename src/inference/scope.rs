use tracing::debug;

use crate::shape::{Identity, Introspector};

/// Where a freshly built definition goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Hoisted into the enclosing message's nested types.
    Nested,
    /// Emitted on its own next to the root.
    TopLevel,
}

/// Decided once per identity, on first encounter; the registry guarantees
/// there is no second encounter that builds.
pub fn decide<I: Introspector>(introspector: &I, enclosing: &Identity, candidate: &Identity) -> Placement {
    let placement = if introspector.is_declared_inside(enclosing, candidate) {
        Placement::Nested
    } else {
        Placement::TopLevel
    };
    debug!(%enclosing, %candidate, ?placement, "placing type");
    placement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Property, TypeKind};

    /// Knows one enclosure: `Team.Member` inside `Team`.
    struct Enclosures;

    impl Introspector for Enclosures {
        fn describe(&self, _: &Identity) -> Option<TypeKind> {
            Some(TypeKind::Record)
        }

        fn properties<'a>(&'a self, _: &Identity) -> impl Iterator<Item = Property> + 'a {
            std::iter::empty()
        }

        fn is_declared_inside(&self, enclosing: &Identity, candidate: &Identity) -> bool {
            enclosing.canonical() == "Team" && candidate.canonical() == "Team.Member"
        }
    }

    #[test]
    fn declared_inside_is_nested() {
        assert_eq!(decide(&Enclosures, &"Team".into(), &"Team.Member".into()), Placement::Nested);
    }

    #[test]
    fn anything_else_is_top_level() {
        assert_eq!(decide(&Enclosures, &"Roster".into(), &"Team.Member".into()), Placement::TopLevel);
        assert_eq!(decide(&Enclosures, &"Team.Member".into(), &"Team".into()), Placement::TopLevel);
    }
}
