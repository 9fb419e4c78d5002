//! Split runs against real directories: packing, resume numbering and idempotence.

use std::fs;
use std::path::Path;
use tempfile::tempdir;

use media_tidy::workflow::{SplitOptions, split};
use media_tidy::{Progress, Relocator, parse_size};

const KB: usize = 1024;

fn write_sized(dir: &Path, name: &str, len: usize) {
    fs::write(dir.join(name), vec![0u8; len]).unwrap();
}

fn names(dir: &Path) -> Vec<String> {
    let mut v: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    v.sort();
    v
}

fn opts(root: &Path, size: &str) -> SplitOptions {
    SplitOptions {
        root: root.to_path_buf(),
        capacity: parse_size(size).unwrap(),
        dry_run: false,
        fill_existing: false,
        relocator: Relocator::default(),
    }
}

#[test]
fn first_fit_decreasing_layout_on_disk() {
    let td = tempdir().unwrap();
    let root = td.path();
    // 5/3/3/1 units with an 8-unit cap.
    write_sized(root, "e01.mkv", 5 * KB);
    write_sized(root, "e02.mkv", 3 * KB);
    write_sized(root, "e03.mkv", 3 * KB);
    write_sized(root, "e04.mkv", KB);

    let summary = split(&opts(root, "8KB"), |_| {}).unwrap();

    assert_eq!(summary.files, 4);
    assert_eq!(summary.directories, 2);
    assert_eq!(names(&root.join("1")), ["e01.mkv", "e02.mkv"]);
    assert_eq!(names(&root.join("2")), ["e03.mkv", "e04.mkv"]);
}

#[test]
fn oversize_file_gets_its_own_directory() {
    let td = tempdir().unwrap();
    let root = td.path();
    write_sized(root, "movie.iso", 20 * KB);
    write_sized(root, "a.txt", KB);
    write_sized(root, "b.txt", KB);

    let mut warned = Vec::new();
    split(&opts(root, "10KB"), |p| {
        if let Progress::Oversize { item, capacity } = p {
            warned.push((item.name.to_string_lossy().into_owned(), capacity));
        }
    })
    .unwrap();

    assert_eq!(warned, [("movie.iso".to_string(), 10 * 1024)]);
    assert_eq!(names(&root.join("1")), ["movie.iso"]);
    assert_eq!(names(&root.join("2")), ["a.txt", "b.txt"]);
}

#[test]
fn repeated_runs_are_idempotent_and_resume_numbering() {
    let td = tempdir().unwrap();
    let root = td.path();
    fs::create_dir(root.join("7")).unwrap();
    fs::create_dir(root.join("notes")).unwrap();
    write_sized(root, "x.bin", KB);

    split(&opts(root, "4KB"), |_| {}).unwrap();
    assert_eq!(names(&root.join("8")), ["x.bin"]);

    let before = names(root);
    let again = split(&opts(root, "4KB"), |_| {}).unwrap();
    assert!(again.nothing_to_do());
    assert_eq!(names(root), before);
    assert!(root.join("7").read_dir().unwrap().next().is_none(), "earlier bins are left alone");
}

#[test]
fn dry_run_reports_without_touching_disk() {
    let td = tempdir().unwrap();
    let root = td.path();
    write_sized(root, "a", 3 * KB);
    write_sized(root, "b", 3 * KB);

    let mut planned = 0;
    let summary = split(
        &SplitOptions {
            dry_run: true,
            ..opts(root, "4KB")
        },
        |p| {
            if let Progress::Planned(_) = p {
                planned += 1;
            }
        },
    )
    .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.directories, 2);
    assert_eq!(planned, 2);
    assert_eq!(names(root), ["a", "b"]);
}
