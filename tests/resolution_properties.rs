//! Property tests over generated dependency chains

use std::sync::Arc;

use proptest::prelude::*;
use wirebox_di::*;

struct Link {
    depth: usize,
}

fn link_name(index: usize) -> String {
    format!("Chain\\Link{}", index)
}

/// `Link0` takes an untyped `seed`; every later link takes the previous one.
fn chain_registry(length: usize) -> Arc<ClassRegistry> {
    let mut registry = ClassRegistry::new();
    registry
        .register(
            ClassDefinition::new(link_name(0))
                .constructor(vec![Parameter::named("seed")], |args| {
                    Ok(Link {
                        depth: args.i64(0)? as usize,
                    })
                }),
        )
        .unwrap();

    for index in 1..length {
        registry
            .register(ClassDefinition::new(link_name(index)).constructor(
                vec![Parameter::typed("previous", link_name(index - 1))],
                |args| {
                    let previous = args.object::<Link>(0)?;
                    Ok(Link {
                        depth: previous.depth + 1,
                    })
                },
            ))
            .unwrap();
    }
    Arc::new(registry)
}

fn chain_container(length: usize) -> Container {
    let container = Container::new(chain_registry(length));
    for index in 0..length {
        container.bind(&link_name(index), None).unwrap();
    }
    container
}

proptest! {
    #[test]
    fn test_chain_resolves_to_full_depth(length in 1usize..24, seed in 0i64..1000) {
        let container = chain_container(length);
        container.bind("seed", Value::from(seed)).unwrap();

        let last = container.get_as::<Link>(&link_name(length - 1)).unwrap();
        prop_assert_eq!(last.depth, seed as usize + length - 1);
    }

    #[test]
    fn test_missing_seed_trail_covers_every_link(length in 1usize..24) {
        let container = chain_container(length);

        match container.get(&link_name(length - 1)) {
            Err(DIError::NotFound { identifier, trail }) => {
                prop_assert_eq!(identifier, "seed");
                let expected: Vec<String> = (0..length)
                    .map(|index| format!("{}::new()", link_name(index)))
                    .collect();
                prop_assert_eq!(trail.frames(), expected.as_slice());
            }
            other => prop_assert!(false, "unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_singleton_link_is_shared_by_dependents(length in 2usize..12, shared in 0usize..11) {
        let shared = shared % (length - 1);
        let container = chain_container(length);
        container.bind("seed", Value::from(0)).unwrap();
        container.service(&link_name(shared)).unwrap().singleton();

        let first = container.get(&link_name(shared)).unwrap();
        let _ = container.get(&link_name(length - 1)).unwrap();
        let again = container.get(&link_name(shared)).unwrap();
        prop_assert_eq!(first, again);
    }

    #[test]
    fn test_cycle_detection_reports_chain(length in 2usize..10) {
        // Close the chain: Link0 asks for the last link
        let mut registry = ClassRegistry::new();
        for index in 0..length {
            let previous = link_name((index + length - 1) % length);
            registry
                .register(ClassDefinition::new(link_name(index)).constructor(
                    vec![Parameter::typed("previous", previous)],
                    |_| Ok(Link { depth: 0 }),
                ))
                .unwrap();
        }
        let container = Container::new(Arc::new(registry));
        for index in 0..length {
            container.bind(&link_name(index), None).unwrap();
        }

        let err = container.get(&link_name(0)).unwrap_err();
        match err {
            DIError::CyclicDependency { chain } => {
                let mut expected: Vec<String> = (0..length).rev().map(link_name).collect();
                expected.rotate_right(1);
                expected.push(link_name(0));
                prop_assert_eq!(chain, expected.join(" -> "));
            }
            other => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
