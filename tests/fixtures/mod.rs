use std::path::PathBuf;

pub fn get_test_fixture_path(fixture_name: Option<&str>) -> PathBuf {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("configs");
    match fixture_name {
        Some(name) => base.join(name),
        None => base,
    }
}
