// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use shape_grammars::arena::Arena;
use shape_grammars::arena::HandleSet;
use shape_grammars::arena::SupplementalArena;

#[test]
fn can_allocate_in_arena() {
    let mut arena = Arena::new();
    let hello1 = arena.add("hello".to_string());
    let hello2 = arena.add("hello".to_string());
    let there = arena.add("there".to_string());
    assert_ne!(hello1, hello2);
    assert_ne!(hello1, there);
    assert_ne!(hello2, there);
    assert_eq!(arena.get(hello1), arena.get(hello2));
    assert_ne!(arena.get(hello1), arena.get(there));
    assert_eq!(arena.len(), 3);
}

#[test]
fn can_remove_from_arena_without_recycling_handles() {
    let mut arena = Arena::new();
    let a = arena.add(1);
    let b = arena.add(2);
    assert_eq!(arena.remove(a), Some(1));
    assert_eq!(arena.remove(a), None);
    assert!(!arena.contains(a));
    assert!(arena.contains(b));
    let c = arena.add(3);
    assert_ne!(a, c);
    assert_eq!(arena.iter_handles().collect::<Vec<_>>(), vec![b, c]);
    assert_eq!(arena.len(), 2);
}

#[test]
fn can_allocate_in_supplemental_arena() {
    let mut arena = Arena::<u32>::new();
    let h1 = arena.add(1);
    let h2 = arena.add(2);
    let h3 = arena.add(3);
    let mut supplemental = SupplementalArena::<u32, String>::new();
    assert_eq!(supplemental.get(h1), None);
    assert_eq!(supplemental.get(h2), None);
    assert_eq!(supplemental.get(h3), None);
    assert_eq!(&mut supplemental[h1], ""); // &mut to force "get or create" behavior
    supplemental[h2].push_str("hiya");
    assert_eq!(supplemental.get(h2).map(String::as_str), Some("hiya"));
}

#[test]
fn can_store_handles_in_sets() {
    let mut arena = Arena::new();
    let a = arena.add('a');
    let b = arena.add('b');
    let c = arena.add('c');
    let mut set = HandleSet::new();
    set.add(a);
    set.add(c);
    assert!(set.contains(a));
    assert!(!set.contains(b));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![a, c]);
    set.remove(a);
    assert!(!set.contains(a));
    set.clear();
    assert_eq!(set.iter().count(), 0);
}
