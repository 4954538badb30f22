//! Route resolution against a file-backed compiled route cache.

mod common;

use std::fs;
use std::sync::Arc;

use route_resolver::config::Environment;
use route_resolver::routing::{
    clean_path_info, DispatchResult, FileRouteCache, RouteParams, RouteResolver, ServerVars,
};

use common::collector_definitions;

fn resolver(cache: &FileRouteCache, environment: Environment) -> RouteResolver {
    RouteResolver::new(collector_definitions(), environment, Arc::new(cache.clone()))
}

fn found(handler: &str, params: &[(&str, &str)]) -> DispatchResult {
    DispatchResult::Found {
        handler: handler.to_string(),
        params: RouteParams::from_pairs(params.iter().copied()),
    }
}

fn assert_routes(resolver: &RouteResolver) {
    let dispatcher = resolver.dispatcher().unwrap();
    assert_eq!(dispatcher.dispatch("GET", "/"), found("home", &[]));
    assert_eq!(
        dispatcher.dispatch("POST", "/table/structure/unique"),
        found("table.structure.unique", &[])
    );
    assert_eq!(
        dispatcher.dispatch("GET", "/server/engines/InnoDB/Status"),
        found("server.engines.show", &[("engine", "InnoDB"), ("page", "Status")])
    );
    assert_eq!(dispatcher.dispatch("PUT", "/export"), found("export", &[]));
    assert_eq!(dispatcher.dispatch("GET", "/missing"), DispatchResult::NotFound);
}

#[test]
fn test_absent_cache_file_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileRouteCache::new(dir.path().join("routes.cache.json"));

    assert_routes(&resolver(&cache, Environment::Production));
    assert!(cache.path().exists());
}

#[test]
fn test_valid_cache_file_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileRouteCache::new(dir.path().join("routes.cache.json"));
    resolver(&cache, Environment::Production).dispatcher().unwrap();
    let before = fs::read(cache.path()).unwrap();

    assert_routes(&resolver(&cache, Environment::Production));
    assert_eq!(fs::read(cache.path()).unwrap(), before);
}

#[test]
fn test_garbage_cache_file_is_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileRouteCache::new(dir.path().join("routes.cache.json"));
    fs::write(cache.path(), "<?php return 'not a route table';").unwrap();

    assert_routes(&resolver(&cache, Environment::Production));

    let content = fs::read_to_string(cache.path()).unwrap();
    let envelope: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(envelope["format_version"], 1);
}

#[test]
fn test_truncated_cache_file_is_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileRouteCache::new(dir.path().join("routes.cache.json"));
    resolver(&cache, Environment::Production).dispatcher().unwrap();
    let full = fs::read(cache.path()).unwrap();
    fs::write(cache.path(), &full[..full.len() / 3]).unwrap();

    assert_routes(&resolver(&cache, Environment::Production));
    assert_eq!(fs::read(cache.path()).unwrap(), full);
}

#[test]
fn test_deleted_cache_file_is_recreated() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileRouteCache::new(dir.path().join("routes.cache.json"));
    resolver(&cache, Environment::Production).dispatcher().unwrap();
    fs::remove_file(cache.path()).unwrap();

    assert_routes(&resolver(&cache, Environment::Production));
    assert!(cache.path().exists());
}

#[test]
fn test_development_mode_never_writes_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileRouteCache::new(dir.path().join("routes.cache.json"));

    assert_routes(&resolver(&cache, Environment::Development));
    assert!(!cache.path().exists());
}

#[test]
fn test_development_mode_ignores_garbage_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileRouteCache::new(dir.path().join("routes.cache.json"));
    fs::write(cache.path(), "garbage").unwrap();

    assert_routes(&resolver(&cache, Environment::Development));
    assert_eq!(fs::read_to_string(cache.path()).unwrap(), "garbage");
}

#[test]
fn test_unwritable_cache_directory_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let cache = FileRouteCache::new(blocker.join("routes.cache.json"));

    assert_routes(&resolver(&cache, Environment::Production));
}

#[test]
fn test_clean_path_info_table() {
    let cases = [
        (
            "/phpmyadmin/index.php/; cookieinj=value/",
            "/phpmyadmin/index.php/;%20cookieinj=value///",
            "/; cookieinj=value/",
            "/phpmyadmin/index.php",
        ),
        (
            "",
            "/phpmyadmin/index.php/;%20cookieinj=value///",
            "/; cookieinj=value/",
            "/phpmyadmin/index.php",
        ),
        ("", "//example.com/../phpmyadmin/index.php", "", "/phpmyadmin/index.php"),
        ("", "//example.com/../../.././phpmyadmin/index.php", "", "/phpmyadmin/index.php"),
        ("", "/page.php/malicouspathinfo?malicouspathinfo", "malicouspathinfo", "/page.php"),
        ("/phpmyadmin/./index.php", "/phpmyadmin/./index.php", "", "/phpmyadmin/index.php"),
        ("/phpmyadmin/index.php", "/phpmyadmin/index.php", "", "/phpmyadmin/index.php"),
        ("", "/phpmyadmin/index.php", "", "/phpmyadmin/index.php"),
    ];

    for (script_self, request_uri, path_info, expected) in cases {
        let vars = ServerVars::new(script_self, request_uri, path_info);
        assert_eq!(clean_path_info(&vars), expected, "{vars:?}");
    }
}
