// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Registry Module
 * Probe registry and descriptor metadata
 * © 2026 Bountyy Oy
 */

pub mod probe_registry;

pub use probe_registry::{ProbeDescriptor, ProbeFactory, ProbeInfo, ProbeRegistry, ProbeSet};
