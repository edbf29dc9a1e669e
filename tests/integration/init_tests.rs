//! Integration tests for the init command

use crate::common::{assertions, CliTestRunner};

#[test]
fn test_init_command_success() {
    let runner = CliTestRunner::new_empty().unwrap();

    runner.expect_success(&["init"]);

    let fixture = runner.fixture();
    assertions::assert_dir_exists(&fixture.workspace.recon_dir);
    assertions::assert_dir_exists(&fixture.workspace.results_dir);

    let config_path = fixture.workspace.config_path();
    assertions::assert_file_exists_and_not_empty(&config_path);
    assertions::assert_json_contains_keys(
        &config_path,
        &["version", "created", "default_page_size", "case_insensitive", "null_markers", "eviction"],
    )
    .unwrap();

    let gitignore_path = fixture.workspace.root.join(".gitignore");
    assertions::assert_file_exists_and_not_empty(&gitignore_path);
}

#[test]
fn test_init_command_is_idempotent() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["init"]);
    runner.expect_success(&["init"]);

    let gitignore = std::fs::read_to_string(runner.fixture().root().join(".gitignore")).unwrap();
    assert_eq!(gitignore.matches(".tabrecon/results/").count(), 1);
}

#[test]
fn test_init_keeps_config_without_force() {
    let runner = CliTestRunner::new().unwrap();
    let config_path = runner.fixture().workspace.config_path();
    std::fs::write(&config_path, r#"{"default_page_size": 7}"#).unwrap();

    runner.expect_success(&["init"]);
    let config = runner.fixture().workspace.load_config().unwrap();
    assert_eq!(config.default_page_size, 7);
}

#[test]
fn test_init_command_with_force() {
    let runner = CliTestRunner::new().unwrap();
    let config_path = runner.fixture().workspace.config_path();
    std::fs::write(&config_path, r#"{"default_page_size": 7}"#).unwrap();

    runner.expect_success(&["init", "--force"]);

    let config = runner.fixture().workspace.load_config().unwrap();
    assert_eq!(config.default_page_size, 100);
}

#[test]
fn test_init_preserves_existing_gitignore() {
    let runner = CliTestRunner::new_empty().unwrap();
    let gitignore_path = runner.fixture().root().join(".gitignore");
    std::fs::write(&gitignore_path, "target/\n*.log").unwrap();

    runner.expect_success(&["init"]);

    let content = std::fs::read_to_string(&gitignore_path).unwrap();
    assert!(content.starts_with("target/\n*.log\n"));
    assert!(content.contains(".tabrecon/results/"));
}
