// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Validation Module
 * Target syntax checks and permission policies
 *
 * @copyright 2026 Bountyy Oy
 */

pub mod target_policy;

pub use target_policy::{
    internal_ip_reason,
    validate_target_syntax,
    AllowAllPolicy,
    DenyListPolicy,
    PolicyDecision,
    TargetPolicy,
};
