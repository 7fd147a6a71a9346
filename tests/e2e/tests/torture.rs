//! smbtorture runs against a live server

use anyhow::Result;
use cifs_harness::command::SystemRunner;
use cifs_harness::interrupt::Interrupt;
use cifs_harness::params::default_params;
use cifs_harness::torture::{Smbtorture, TortureSuite};
use cifs_harness_e2e::LiveTarget;

#[test]
fn test_configured_suite_passes() -> Result<()> {
    let Some(target) = LiveTarget::from_env()? else {
        return Ok(());
    };
    let Some(suite_path) = LiveTarget::torture_info() else {
        eprintln!("No torture suite configured; skipping");
        return Ok(());
    };

    let suite = TortureSuite::from_file(&suite_path)?;
    let torture = Smbtorture::new(SystemRunner, &target.config().harness.smbtorture);

    let mut report = Vec::new();
    let outcomes = torture.run_suite(
        &default_params(target.config()),
        &suite,
        &mut report,
        &Interrupt::new(),
    )?;

    assert_eq!(outcomes.len(), suite.len());
    assert!(outcomes.iter().all(|o| o.passed));
    assert_eq!(
        String::from_utf8(report)?.matches("[OK]").count(),
        suite.len()
    );
    Ok(())
}
