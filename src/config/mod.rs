// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod core;
pub mod loader;

pub use core::DiscoveryConfig;
pub use loader::ConfigLoader;
