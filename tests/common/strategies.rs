#![allow(dead_code)]

use proptest::prelude::*;
use user_migration_core::models::LegacyUser;

/// How a generated source user is expected to fare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Migrated,
    MissingEmail,
    Duplicate,
}

pub fn fate_strategy() -> impl Strategy<Value = Fate> {
    prop_oneof![
        3 => Just(Fate::Migrated),
        1 => Just(Fate::MissingEmail),
        1 => Just(Fate::Duplicate),
    ]
}

/// Source population plus the destination emails that already exist
pub fn population_strategy() -> impl Strategy<Value = (Vec<LegacyUser>, Vec<String>, usize)> {
    prop::collection::vec(fate_strategy(), 0..40).prop_map(|fates| {
        let mut users = Vec::with_capacity(fates.len());
        let mut existing = Vec::new();
        let mut failing = 0;

        for (index, fate) in fates.iter().enumerate() {
            let id = index as i64 + 1;
            let email = format!("person{id}@example.com");
            match fate {
                Fate::Migrated => users.push(LegacyUser::new(id, format!("person{id}"), Some(&email))),
                Fate::MissingEmail => {
                    failing += 1;
                    users.push(LegacyUser::new(id, format!("person{id}"), Some("  ")));
                }
                Fate::Duplicate => {
                    failing += 1;
                    existing.push(email.to_uppercase());
                    users.push(LegacyUser::new(id, format!("person{id}"), Some(&email)));
                }
            }
        }

        (users, existing, failing)
    })
}

/// Operations applied to a progress batch
#[derive(Debug, Clone, Copy)]
pub enum BatchOp {
    Accomplish,
    Incidence,
    Finish,
    Stop,
    Resume,
}

pub fn batch_op_strategy() -> impl Strategy<Value = BatchOp> {
    prop_oneof![
        Just(BatchOp::Accomplish),
        Just(BatchOp::Incidence),
        Just(BatchOp::Finish),
        Just(BatchOp::Stop),
        Just(BatchOp::Resume),
    ]
}
