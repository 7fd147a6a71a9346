//! Mount lifecycle against a live server

use anyhow::Result;
use cifs_harness::command::SystemRunner;
use cifs_harness::interrupt::Interrupt;
use cifs_harness::mount::{MountSession, MountState};
use cifs_harness::params::{combo_count, default_params, params_for_combo, MountParams};
use cifs_harness::scenario::MountScenario;
use cifs_harness::scratch;
use cifs_harness::HarnessError;
use cifs_harness_e2e::*;
use std::fs;
use test_case::test_case;

#[test]
fn test_mount_write_unmount() -> Result<()> {
    let Some(target) = LiveTarget::from_env()? else {
        return Ok(());
    };

    let space = target.scratch();
    let root = space.create_root()?;
    let mount_point = root.create_mount_point()?;

    let mut session = MountSession::with_tools(
        SystemRunner,
        target.config().harness.mount_tools(),
        &mount_point,
    );
    session.mount_with_options(
        &default_params(target.config()),
        &target.config().harness.mount_options,
    )?;
    assert_eq!(session.state(), MountState::Mounted);
    assert!(is_mount_point(&mount_point));

    let data = random_bytes(256 * 1024);
    let file = scratch::create_file(&mount_point)?;
    fs::write(&file, &data)?;
    assert_file_content(&file, &data);
    scratch::remove_entry(&file)?;
    assert_not_exists(&file);

    session.unmount()?;
    assert!(!is_mount_point(&mount_point));

    scratch::remove_entry(&mount_point)?;
    space.remove_root(&root)?;
    assert_dir_empty(target.scratch_base());
    Ok(())
}

#[test_case("vers=2.1" ; "smb 2.1")]
#[test_case("vers=3.0" ; "smb 3.0")]
fn test_scenario_with_dialect(options: &str) -> Result<()> {
    let Some(target) = LiveTarget::from_env()? else {
        return Ok(());
    };

    let scenario = MountScenario::new(SystemRunner, target.scratch()).with_options(options);
    scenario.run(&default_params(target.config()), &Interrupt::new())?;
    assert_dir_empty(target.scratch_base());
    Ok(())
}

#[test]
fn test_every_combination_mounts() -> Result<()> {
    let Some(target) = LiveTarget::from_env()? else {
        return Ok(());
    };

    let config = target.config();
    let scenario = MountScenario::from_settings(SystemRunner, &config.harness);
    let scenario_base = config
        .harness
        .scratch_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);

    let runs = scenario.run_all(config, &Interrupt::new())?;
    assert_eq!(runs, combo_count(config) * config.exported_sharenames().len());
    assert!(!scenario_base.join(std::process::id().to_string()).exists());
    Ok(())
}

#[test]
fn test_wrong_password_fails_to_mount() -> Result<()> {
    let Some(target) = LiveTarget::from_env()? else {
        return Ok(());
    };

    let config = target.config();
    let good = params_for_combo(config, &config.exported_sharenames()[0], 0usize)?;
    let bad = MountParams {
        password: format!("{}-wrong", good.password),
        ..good
    };

    let space = target.scratch();
    let root = space.create_root()?;
    let mount_point = root.create_mount_point()?;
    let mut session = MountSession::new(SystemRunner, &mount_point);

    let err = session.mount(&bad).unwrap_err();
    assert!(matches!(err, HarnessError::Mount { .. }), "{:?}", err);
    assert!(!err.to_string().contains(&bad.password));
    assert_eq!(session.state(), MountState::Unmounted);
    assert!(!is_mount_point(&mount_point));

    // Nothing to unmount; remove the mount point, then the root
    session.unmount()?;
    drop(session);
    scratch::remove_entry(&mount_point)?;
    space.remove_root(&root)?;
    assert_dir_empty(target.scratch_base());
    Ok(())
}
