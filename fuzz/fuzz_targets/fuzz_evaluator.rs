//! Fuzz target for rule evaluation.
//!
//! Builds a handful of groups and chains plus a held role set from raw
//! bytes and checks that evaluation:
//! - never proposes a role the user already holds
//! - is idempotent in one step once every proposed role is granted
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_evaluator -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use rolekeeper_core::{RoleId, RoleSet};
use rolekeeper_rules::{evaluate, Chain, Group, Rule};

// Small id space so rules overlap often.
fn role(byte: u8) -> RoleId {
    RoleId::new(u64::from(byte % 16) + 1)
}

fn build(data: &[u8]) -> Option<(RoleSet, Vec<Rule>)> {
    let (&held_len, rest) = data.split_first()?;
    let held_len = usize::from(held_len % 8).min(rest.len());
    let (held, mut rest) = rest.split_at(held_len);
    let held: RoleSet = held.iter().copied().map(role).collect();

    let mut rules = Vec::new();
    while let Some((&header, tail)) = rest.split_first() {
        let len = usize::from(header % 6) + 1;
        if tail.len() < len {
            break;
        }
        let (body, tail) = tail.split_at(len);
        rest = tail;

        let roles: Vec<RoleId> = body.iter().copied().map(role).collect();
        let name = format!("rule-{}", rules.len());
        if header & 0x80 == 0 {
            let (group_role, members) = roles.split_first()?;
            rules.push(Rule::Group(Group {
                name,
                group_role: *group_role,
                member_roles: members.to_vec(),
            }));
        } else {
            rules.push(Rule::Chain(Chain { name, roles }));
        }
    }
    Some((held, rules))
}

fuzz_target!(|data: &[u8]| {
    let Some((held, rules)) = build(data) else {
        return;
    };

    // Evaluation only adds.
    let grants = evaluate(&held, &rules);
    for grant in &grants {
        assert!(!held.contains(grant.role));
    }

    // Granting everything emitted leaves nothing to grant, even when rules
    // feed into each other.
    let mut current = held;
    current.extend(grants.into_iter().map(|g| g.role));
    assert!(evaluate(&current, &rules).is_empty());
});
