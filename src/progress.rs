// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Progress Reporting
 * Pluggable sink for long-running discovery scans
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::AssetDiscoveryResult;

/// Progress sink invoked from the orchestrator thread.
///
/// Implementations must be cheap and non-blocking; every merge fires
/// `on_progress`.
pub trait ProgressCallback: Send + Sync {
    /// Discovery is starting with these seeds and derived keywords
    fn on_start(&self, seeds: &[String], keywords: &[String]);

    /// Counts after a merge: total known hosts, verified-live hosts
    fn on_progress(&self, total_domains: usize, live_domains: usize);

    /// The scan finished with this result
    fn on_end(&self, result: &AssetDiscoveryResult);
}

/// Sink that swallows every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn on_start(&self, _seeds: &[String], _keywords: &[String]) {}
    fn on_progress(&self, _total_domains: usize, _live_domains: usize) {}
    fn on_end(&self, _result: &AssetDiscoveryResult) {}
}
