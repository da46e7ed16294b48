use std::io;

use kiln::error::Error;

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let kiln_err: Error = io_err.into();

    match kiln_err {
        Error::Io(_) => (),
        _ => panic!("Expected Io variant"),
    }
}

#[test]
fn test_error_display() {
    let err = Error::Config("invalid config".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid config.");

    let err = Error::PluginExecution { plugin: "husky".to_string(), message: "boom".to_string() };
    assert_eq!(err.to_string(), "Plugin 'husky' failed: boom.");

    let err = Error::NoPluginsResolved { requested: vec!["husky".to_string(), "pinia".to_string()] };
    assert_eq!(err.to_string(), "None of the requested plugins could be resolved: husky, pinia.");
}

#[test]
fn test_commit_error_counts_pending_paths() {
    let err = Error::Commit {
        path: "src/main.ts".to_string(),
        message: "permission denied".to_string(),
        pending: vec!["src/main.ts".to_string(), "package.json".to_string()],
    };
    assert_eq!(
        err.to_string(),
        "Failed to write 'src/main.ts': permission denied (2 path(s) not written)."
    );
}
