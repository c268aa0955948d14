use std::mem;

use super::{Ealloc, Entity};
use crate::test_util;

#[test]
fn test_option_entity_is_niche_optimized() {
    assert_eq!(mem::size_of::<Option<Entity>>(), mem::size_of::<Entity>());
    assert_eq!(Entity::from_raw(0), None);
}

#[test]
fn test_ealloc_monotonic() {
    test_util::init();

    let mut ealloc = Ealloc::new();
    let first = ealloc.allocate();
    let rest = ealloc.allocate_many(4);

    assert_eq!(first.id(), 1);
    assert_eq!(rest.iter().map(|entity| entity.id()).collect::<Vec<_>>(), vec![2, 3, 4, 5]);
    assert_eq!(ealloc.allocated(), 5);
    assert!(ealloc.is_allocated(rest[3]));
    assert!(!ealloc.is_allocated(Entity::from_raw(6).expect("nonzero")));
}

#[test]
fn test_display_and_debug() {
    let entity = Entity::from_raw(7).expect("nonzero");
    assert_eq!(format!("{entity}"), "#7");
    assert_eq!(format!("{entity:?}"), "Entity(7)");
}
