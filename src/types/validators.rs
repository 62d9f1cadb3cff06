/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that store the identities of the validators allowed to vote at a given height.

use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
    slice,
};

use super::{
    crypto_primitives::{address_of, VerifyingKey},
    data_types::Address,
};

/// Stores the addresses of the validators that may vote at a given height.
///
/// ## Ordering of validators
///
/// `ValidatorSet` keeps validators in the order they were given to [`new`](Self::new). The order is only
/// used for iteration and display, and never affects [`quorum`](Self::quorum) arithmetic.
///
/// ## Quorum
///
/// Every validator has the same weight. For `n` validators, a quorum is `floor(2n/3) + 1` of them, which
/// is `2f + 1` when `n = 3f + 1` validators tolerate `f` faulty ones.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ValidatorSet {
    validators: Vec<Address>,
    positions: HashMap<Address, usize>,
}

impl ValidatorSet {
    /// Create a validator set from `validators`, keeping their order.
    ///
    /// Fails if `validators` is empty or lists the same address twice.
    pub fn new(validators: Vec<Address>) -> Result<ValidatorSet, ValidatorSetError> {
        if validators.is_empty() {
            return Err(ValidatorSetError::NoValidators);
        }

        let mut positions = HashMap::with_capacity(validators.len());
        for (pos, validator) in validators.iter().enumerate() {
            if positions.insert(*validator, pos).is_some() {
                return Err(ValidatorSetError::DuplicateValidator {
                    validator: *validator,
                });
            }
        }

        Ok(Self {
            validators,
            positions,
        })
    }

    /// Create a validator set from the [addresses](address_of) of `verifying_keys`.
    pub fn from_verifying_keys<'a>(
        verifying_keys: impl IntoIterator<Item = &'a VerifyingKey>,
    ) -> Result<ValidatorSet, ValidatorSetError> {
        Self::new(verifying_keys.into_iter().map(address_of).collect())
    }

    /// Check whether the validator set contains `validator`.
    pub fn contains(&self, validator: &Address) -> bool {
        self.positions.contains_key(validator)
    }

    /// Get the index of `validator` in insertion order, if it is in the validator set.
    pub fn position(&self, validator: &Address) -> Option<usize> {
        self.positions.get(validator).copied()
    }

    /// Get an iterator through the validators' addresses in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, Address> {
        self.validators.iter()
    }

    /// Get the number of validators in the validator set.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Always `false`: [`new`](Self::new) refuses to build an empty validator set.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Minimum number of distinct validators (inclusive) whose matching votes form a supermajority.
    pub fn quorum(&self) -> usize {
        quorum(self.len())
    }

    /// Maximum number of faulty validators the set tolerates while still reaching a quorum.
    pub fn max_faulty(&self) -> usize {
        self.len() - self.quorum()
    }
}

impl<'a> IntoIterator for &'a ValidatorSet {
    type Item = &'a Address;
    type IntoIter = slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for ValidatorSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, validator) in self.validators.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", validator)?;
        }
        write!(f, "]")
    }
}

/// Compute the supermajority threshold, `floor(2n/3) + 1`, for `n` equally weighted validators.
pub const fn quorum(n: usize) -> usize {
    n * 2 / 3 + 1
}

/// Enumerates the ways building a [`ValidatorSet`] can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorSetError {
    /// No validators were given. A vote set over nobody can never decide anything.
    NoValidators,

    /// The same validator was listed more than once.
    DuplicateValidator { validator: Address },
}

impl Display for ValidatorSetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorSetError::NoValidators => write!(f, "validator set must not be empty"),
            ValidatorSetError::DuplicateValidator { validator } => {
                write!(f, "validator {} listed more than once", validator)
            }
        }
    }
}

impl std::error::Error for ValidatorSetError {}
