// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Configuration: typed settings plus a file loader with environment overrides.

pub mod core;
pub mod loader;

pub use self::core::ScannerConfig;
pub use self::loader::{ConfigFormat, ConfigLoader};
