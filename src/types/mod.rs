/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types and utilities that are shared by the vote encoder, the vote set, and the certificates it
//! produces.

pub mod codec;

pub mod crypto_primitives;

pub mod data_types;

pub mod validators;
