// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Engine Module
 * Suite orchestration over the probe registry
 *
 * © 2026 Bountyy Oy
 */

pub mod suite_runner;

pub use suite_runner::{SuiteRunner, SuiteRunnerOptions};
