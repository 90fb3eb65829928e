// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! The configured log level caps the `log` facade when a framer comes up.
//!
//! Kept to a single test: the maximum level is process-wide.

use knot_proto::driver::{NullDriver, PhyKind};
use knot_proto::{NetConfig, NetworkFramer};

#[test]
fn test_framer_applies_configured_level() {
    let _ = env_logger::builder().is_test(true).try_init();

    let config =
        NetConfig::from_toml_str("phy = \"serial\"\nrole = \"device\"\nlog_level = \"warn\"\n")
            .unwrap();
    NetworkFramer::new(NullDriver::new(PhyKind::Serial), &config).unwrap();
    assert_eq!(log::max_level(), log::LevelFilter::Warn);

    let mut config = NetConfig::gateway(PhyKind::Serial);
    config.log_level = "trace".into();
    NetworkFramer::new(NullDriver::new(PhyKind::Serial), &config).unwrap();
    assert_eq!(log::max_level(), log::LevelFilter::Trace);

    // A config the framer refuses leaves the level alone
    config.max_devices = 0;
    config.log_level = "off".into();
    assert!(NetworkFramer::new(NullDriver::new(PhyKind::Serial), &config).is_err());
    assert_eq!(log::max_level(), log::LevelFilter::Trace);
}
