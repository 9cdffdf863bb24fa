//! Visibility and ownership predicates.

use crate::model::{AccessLevel, RecordId, fields};
use crate::store::Filter;

/// Builds the read-visibility predicate for a caller.
///
/// Always matches public images. An identified caller also matches images
/// whose access list contains them and images they wrote. The result is a
/// pure disjunction; it gates reads only and must be AND-combined with an
/// `_id` or ownership clause before scoping any write.
#[must_use]
pub fn build_visibility(caller: Option<&RecordId>) -> Filter {
    let mut clauses = vec![Filter::eq(fields::ACCESS_LEVEL, AccessLevel::Public.as_str())];
    if let Some(caller) = caller {
        clauses.push(Filter::contains(fields::ACCESS_LIST, caller));
        clauses.push(Filter::eq(fields::AUTHOR, caller));
    }
    Filter::Or(clauses)
}

/// Scope for writes only the author may perform.
#[must_use]
pub fn ownership(image: &RecordId, caller: &RecordId) -> Filter {
    Filter::And(vec![
        Filter::eq(fields::ID, image),
        Filter::eq(fields::AUTHOR, caller),
    ])
}

/// A single image, if the caller may see it.
#[must_use]
pub fn visible_image(image: &RecordId, caller: Option<&RecordId>) -> Filter {
    Filter::And(vec![Filter::eq(fields::ID, image), build_visibility(caller)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Image;
    use crate::store::encode;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    const POOL: usize = 5;

    fn pool() -> Vec<RecordId> {
        (0..POOL).map(|_| RecordId::generate()).collect()
    }

    fn image(author: RecordId, level: AccessLevel, acl: BTreeSet<RecordId>) -> Image {
        Image {
            id: RecordId::generate(),
            author_id: author,
            access_level: level,
            access_list: acl,
            likes: BTreeSet::new(),
            caption: String::new(),
            uploaded_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn test_anonymous_sees_only_public() {
        let users = pool();
        let public = encode(&image(users[0], AccessLevel::Public, BTreeSet::new())).unwrap();
        let private = encode(&image(users[0], AccessLevel::Private, BTreeSet::from([users[1]])))
            .unwrap();

        let anonymous = build_visibility(None);
        assert!(anonymous.matches(&public));
        assert!(!anonymous.matches(&private));
    }

    #[test]
    fn test_ownership_ignores_visibility() {
        let users = pool();
        let img = image(users[0], AccessLevel::Public, BTreeSet::new());
        let doc = encode(&img).unwrap();

        assert!(ownership(&img.id, &users[0]).matches(&doc));
        assert!(!ownership(&img.id, &users[1]).matches(&doc));
        assert!(visible_image(&img.id, Some(&users[1])).matches(&doc));
        assert!(!visible_image(&RecordId::generate(), Some(&users[0])).matches(&doc));
    }

    proptest! {
        #[test]
        fn prop_visibility_matches_access_model(
            private in any::<bool>(),
            author in 0..POOL,
            acl in proptest::collection::btree_set(0..POOL, 0..POOL),
            caller in proptest::option::of(0..POOL),
        ) {
            let users = pool();
            let level = if private { AccessLevel::Private } else { AccessLevel::Public };
            let img = image(users[author], level, acl.iter().map(|&i| users[i]).collect());
            let caller = caller.map(|i| users[i]);

            let expected = !private
                || caller.is_some_and(|c| c == users[author] || img.access_list.contains(&c));

            let doc = encode(&img).unwrap();
            prop_assert_eq!(build_visibility(caller.as_ref()).matches(&doc), expected);
            prop_assert_eq!(img.is_visible_to(caller.as_ref()), expected);
        }
    }
}
