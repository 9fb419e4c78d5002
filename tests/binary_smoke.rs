// use macro form directly; no import needed
use assert_fs::prelude::*;
use std::process::{Command, Output};

fn media_tidy(config_dir: &assert_fs::TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("media_tidy"));
    // Keep the user's real config out of the picture.
    cmd.env("MEDIA_TIDY_CONFIG", config_dir.path().join("none.xml"));
    cmd
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn binary_print_config_succeeds() {
    let temp = assert_fs::TempDir::new().unwrap();
    let out = media_tidy(&temp).arg("--print-config").output().expect("spawn binary");
    assert!(out.status.success(), "binary should succeed with --print-config");
    assert!(stdout(&out).contains("none.xml"));
}

#[test]
fn consolidate_dry_run_then_execute() {
    let temp = assert_fs::TempDir::new().unwrap();
    let src = temp.child("src");
    let target = temp.child("target");
    src.child("a/song.flac").write_str("1").unwrap();
    src.child("b/song.flac").write_str("2").unwrap();

    let dry = media_tidy(&temp)
        .args(["consolidate", "-n"])
        .arg(target.path())
        .arg(src.path())
        .output()
        .unwrap();
    assert!(dry.status.success(), "{}", stderr(&dry));
    let text = stdout(&dry);
    assert!(text.starts_with("DRY RUN - no files will be moved"), "{text}");
    assert!(text.contains("Would move: "), "{text}");
    assert!(text.contains("song_1.flac (renamed)"), "{text}");
    assert!(text.contains("2 files would be moved (1 renamed to avoid duplicates)"), "{text}");
    assert!(!target.path().exists());

    let run = media_tidy(&temp).arg("consolidate").arg(target.path()).arg(src.path()).output().unwrap();
    assert!(run.status.success(), "{}", stderr(&run));
    let text = stdout(&run);
    assert!(text.contains("Moved: "), "{text}");
    assert!(text.contains("2 files moved (1 renamed to avoid duplicates)"), "{text}");
    target.child("song.flac").assert("1");
    target.child("song_1.flac").assert("2");
}

#[test]
fn overlap_fails_with_nonzero_exit() {
    let temp = assert_fs::TempDir::new().unwrap();
    let src = temp.child("src");
    src.child("f.txt").write_str("f").unwrap();

    let out = media_tidy(&temp)
        .arg("consolidate")
        .arg(src.child("inner").path())
        .arg(src.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("path overlap detected"), "{}", stderr(&out));
    src.child("f.txt").assert("f");
}

#[test]
fn split_dry_run_lists_directories() {
    let temp = assert_fs::TempDir::new().unwrap();
    let dir = temp.child("flat");
    dir.child("one.bin").write_binary(&[0u8; 3000]).unwrap();
    dir.child("two.bin").write_binary(&[0u8; 3000]).unwrap();

    let out = media_tidy(&temp)
        .args(["split", "--split-size", "4KB", "--dry-run"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Directory 1: 1 files (2.93 KB)"), "{text}");
    assert!(text.contains("Directory 2: 1 files"), "{text}");
    assert!(!dir.child("1").path().exists());
}

#[test]
fn invalid_split_size_is_rejected_before_any_work() {
    let temp = assert_fs::TempDir::new().unwrap();
    let out = media_tidy(&temp)
        .args(["split", "--split-size", "eight"])
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(stderr(&out).contains("invalid size"), "{}", stderr(&out));
}

#[test]
fn prune_empty_deletes_by_name() {
    let temp = assert_fs::TempDir::new().unwrap();
    let root = temp.child("root");
    root.child("empty").create_dir_all().unwrap();
    root.child("kept/file").write_str("x").unwrap();

    let out = media_tidy(&temp).args(["prune-empty", "--root"]).arg(root.path()).output().unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Deleted: empty"), "{text}");
    assert!(text.contains("1 empty directory deleted"), "{text}");
    assert!(!root.child("empty").path().exists());
    assert!(root.child("kept").path().exists());
}

#[test]
fn prune_empty_dry_run_announces_itself() {
    let temp = assert_fs::TempDir::new().unwrap();
    let root = temp.child("root");
    root.child("empty").create_dir_all().unwrap();

    let out = media_tidy(&temp).args(["prune-empty", "-n", "--root"]).arg(root.path()).output().unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.starts_with("DRY RUN - no directories will be deleted"), "{text}");
    assert!(text.contains("Would delete: empty"), "{text}");
    assert!(root.child("empty").path().exists());
}

#[cfg(unix)]
#[test]
fn failed_move_reports_progress_and_exits_one() {
    use std::os::unix::fs::PermissionsExt;

    // Permission bits do not stop root.
    if unsafe { libc::geteuid() } == 0 {
        return;
    }
    let temp = assert_fs::TempDir::new().unwrap();
    let src = temp.child("src");
    let target = temp.child("target");
    src.child("a.txt").write_str("a").unwrap();
    src.child("b.txt").write_str("b").unwrap();
    target.create_dir_all().unwrap();
    std::fs::set_permissions(target.path(), std::fs::Permissions::from_mode(0o555)).unwrap();

    let out = media_tidy(&temp)
        .args(["consolidate", "--force-copy"])
        .arg(target.path())
        .arg(src.path())
        .output()
        .unwrap();
    std::fs::set_permissions(target.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    let failed = format!(
        "FAILED: {} -> {}",
        src.child("a.txt").path().display(),
        target.child("a.txt").path().display()
    );
    assert!(err.contains(&failed), "{err}");
    assert!(err.contains("Error: "), "{err}");
    assert!(err.contains("Stopping. 0/2 files moved successfully."), "{err}");
    assert!(err.contains("Re-run to continue with remaining files."), "{err}");
    src.child("a.txt").assert("a");
    src.child("b.txt").assert("b");
    assert!(!target.child("a.txt").path().exists());
}

#[test]
fn delete_moved_removes_verified_copies() {
    let temp = assert_fs::TempDir::new().unwrap();
    let from = temp.child("from");
    let to = temp.child("to");
    from.child("done.mp4").write_str("same").unwrap();
    to.child("done.mp4").write_str("same").unwrap();
    from.child("pending.mp4").write_str("p").unwrap();

    let out = media_tidy(&temp)
        .arg("delete-moved")
        .arg("--from-dir")
        .arg(from.path())
        .arg("--to-dir")
        .arg(to.path())
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("Deleted: "));
    assert!(!from.child("done.mp4").path().exists());
    from.child("pending.mp4").assert("p");
    to.child("done.mp4").assert("same");
}
