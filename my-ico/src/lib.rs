// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! This module provides a client for the MyToken ICO: wallet access, typed calls to the
//! NFT and token contracts, claim eligibility, the page state, and the deployment of the
//! token contract.

pub mod app;
pub mod config;
pub mod contracts;
pub mod deploy;
pub mod eligibility;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod reconciler;
pub mod view;
pub mod wallet;

/// Helper types for tests.
#[cfg(any(test, feature = "test"))]
pub mod test_utils;
