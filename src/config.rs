/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Configuration of a [`VoteSet`](crate::voting::vote_set::VoteSet).
//!
//! The configuration can be defined using the builder pattern, for example:
//!
//! ```
//! use quorum_rs::config::{EquivocationPolicy, VoteSetConfig};
//!
//! let config = VoteSetConfig::builder()
//!     .equivocation_policy(EquivocationPolicy::Strict)
//!     .log_events(true)
//!     .build();
//! ```
//!
//! Both setters are optional. [`VoteSetConfig::default`] is the permissive policy with logging turned off.

use typed_builder::TypedBuilder;

/// What a vote set does when a validator that already has a counted vote casts a vote that lands in a
/// different bucket (e.g., approves one block and rejects, or approves two different blocks).
///
/// In both cases the conflict is recorded as an
/// [`Equivocation`](crate::voting::vote_set::Equivocation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EquivocationPolicy {
    /// Count the conflicting vote in its own bucket. Deduplication happens per bucket only.
    #[default]
    Permissive,

    /// Refuse the conflicting vote. Each validator has at most one counted vote per vote set.
    Strict,
}

/// Parameters of a [`VoteSet`](crate::voting::vote_set::VoteSet) that do not affect which tuple it
/// accepts votes for.
#[derive(Clone, Debug, TypedBuilder)]
pub struct VoteSetConfig {
    #[builder(default)]
    pub equivocation_policy: EquivocationPolicy,

    /// If `true`, the vote set logs its [events](crate::events) through the [`log`] crate.
    #[builder(default = false)]
    pub log_events: bool,
}

impl Default for VoteSetConfig {
    fn default() -> Self {
        VoteSetConfig::builder().build()
    }
}
