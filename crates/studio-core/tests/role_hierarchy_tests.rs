#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use studio_core::{Role, RoleHierarchy};

const COMMANDS: [&str; 10] = [
    "help", "ls", "cd", "pwd", "run", "assign", "showuser", "quit", "jobs", "render",
];

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Artist),
        Just(Role::Supe),
        Just(Role::Pipe),
        Just(Role::Rnd),
        Just(Role::Master),
    ]
}

/// Arbitrary declared config: any subset of roles, each with any subset of
/// commands, role names in random case
fn arb_declared() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::vec(
        (
            arb_role(),
            any::<bool>(),
            prop::collection::vec(prop::sample::select(COMMANDS.to_vec()), 0..6),
        ),
        0..6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(role, upper, commands)| {
                let name = if upper {
                    role.as_str().to_uppercase()
                } else {
                    role.as_str().to_string()
                };
                (name, commands.into_iter().map(String::from).collect())
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_higher_role_permits_superset(
        declared in arb_declared(),
        low in arb_role(),
        high in arb_role(),
    ) {
        prop_assume!(low < high);
        let hierarchy = RoleHierarchy::load(declared).unwrap();
        for command in COMMANDS {
            if hierarchy.permits(low, command) {
                prop_assert!(hierarchy.permits(high, command));
            }
        }
    }

    #[test]
    fn prop_declared_commands_are_permitted(declared in arb_declared()) {
        let hierarchy = RoleHierarchy::load(declared.clone()).unwrap();
        for (name, commands) in declared {
            let role: Role = name.parse().unwrap();
            for command in commands {
                prop_assert!(hierarchy.permits(role, &command));
            }
        }
    }

    #[test]
    fn prop_lowest_permitting_is_minimal(declared in arb_declared(), command in prop::sample::select(COMMANDS.to_vec())) {
        let hierarchy = RoleHierarchy::load(declared).unwrap();
        let lowest = hierarchy.lowest_permitting(command).unwrap();
        prop_assert!(hierarchy.permits(lowest, command));
        for role in Role::ALL.into_iter().filter(|r| *r < lowest) {
            prop_assert!(!hierarchy.permits(role, command));
        }
    }

    #[test]
    fn prop_satisfies_matches_order(active in arb_role(), required in arb_role()) {
        let hierarchy = RoleHierarchy::unrestricted();
        prop_assert_eq!(hierarchy.satisfies(active, required), active >= required);
    }
}

#[test]
fn test_effective_sets_are_nested() {
    let hierarchy = RoleHierarchy::load(vec![
        ("artist".to_string(), vec!["ls".to_string()]),
        ("pipe".to_string(), vec!["publish".to_string()]),
        ("rnd".to_string(), vec!["run".to_string()]),
    ])
    .unwrap();

    let sets: Vec<_> = [Role::Artist, Role::Supe, Role::Pipe, Role::Rnd]
        .iter()
        .map(|r| hierarchy.effective(*r).unwrap().clone())
        .collect();
    for pair in sets.windows(2) {
        assert!(pair[0].is_subset(&pair[1]));
    }
    assert_eq!(sets[1].len(), 1);
    assert_eq!(sets[3].len(), 3);
}

#[test]
fn test_command_names_are_case_insensitive() {
    let hierarchy =
        RoleHierarchy::load(vec![("Artist".to_string(), vec!["LS".to_string()])]).unwrap();
    assert!(hierarchy.permits(Role::Artist, "ls"));
    assert!(hierarchy.permits(Role::Supe, "Ls"));
}
