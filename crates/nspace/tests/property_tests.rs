#![forbid(unsafe_code)]

//! Property tests: naming bookkeeping and fork chains.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use nspace::{Link, NamedEntity, Namespace, Node, NodeRef};
use nspace_reactive::Observable;
use proptest::prelude::*;

struct Item {
    named: NamedEntity,
    parent: Link,
}

impl Node for Item {
    fn link(&self, key: &str) -> Option<Link> {
        (key == "parent").then(|| self.parent.clone())
    }

    fn named(&self) -> Option<&NamedEntity> {
        Some(&self.named)
    }
}

fn item(root: &Namespace) -> Rc<Item> {
    Rc::new_cyclic(|me: &Weak<Item>| Item {
        named: NamedEntity::new(me.clone()).with_root(root.clone()),
        parent: Observable::new(None),
    })
}

const NAMES: [&str; 4] = ["", "a", "b", "c"];

proptest! {
    /// After any sequence of renames, every name maps to the entity that
    /// claimed it last, unless that entity moved away again.
    #[test]
    fn renames_match_model(ops in proptest::collection::vec((0usize..4, 0usize..NAMES.len()), 0..40)) {
        let root = Namespace::new();
        let items: Vec<Rc<Item>> = (0..4).map(|_| item(&root)).collect();
        let mut names = vec![String::new(); items.len()];
        let mut owners: HashMap<String, Option<usize>> = HashMap::new();

        for (who, name) in ops {
            let name = NAMES[name];
            let old = std::mem::replace(&mut names[who], name.to_owned());
            if !old.is_empty() && owners.get(&old) == Some(&Some(who)) {
                owners.insert(old, None);
            }
            if !name.is_empty() {
                owners.insert(name.to_owned(), Some(who));
            }
            items[who].named.set_name(name).unwrap();
        }

        for (name, owner) in &owners {
            let found = root.lookup(name).unwrap();
            let expected = owner.map(|i| NodeRef::new(&items[i]));
            prop_assert_eq!(found, expected);
        }
        for (i, it) in items.iter().enumerate() {
            prop_assert_eq!(it.named.name(), names[i].clone());
        }
    }

    /// A lookup in a fork chain returns the binding of the nearest namespace
    /// that saw the name.
    #[test]
    fn fork_chain_resolves_nearest(depth in 1usize..8, bound_at in proptest::collection::vec(any::<bool>(), 8)) {
        let root = Namespace::new();
        let target = item(&root);
        let mut chain = vec![root.clone()];
        for _ in 0..depth {
            let next = chain.last().unwrap().fork();
            chain.push(next);
        }

        let mut nearest = None;
        for (level, ns) in chain.iter().enumerate() {
            if bound_at[level] {
                ns.bind("x", &target);
                nearest = Some(level);
            }
        }

        let leaf = chain.last().unwrap();
        match nearest {
            Some(_) => prop_assert!(leaf.get_as::<Item>("x").unwrap().is_some()),
            None => prop_assert!(leaf.get("x").is_err()),
        }
        prop_assert!(leaf.descends_from(&root));
    }
}
