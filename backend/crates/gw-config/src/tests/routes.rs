use crate::Config;
use crate::tests::setup_config_dir;

use googletest::assert_that;
use googletest::prelude::{anything, contains_substring, eq, err, len, none, ok, some};
use serial_test::serial;

const ROUTES: &str = r#"
    [[routes]]
    id = "orders"
    path = "/orders"

    [routes.auth]
    key_location = "{claim:org_id}"
    roles_claim = "realm_access.roles"
    required_roles = ["orders:read"]

    [routes.rate_limit]
    limit = 5
    window_secs = 1
    key_location = "{header:X-Api-Key}"

    [[routes]]
    id = "public"
    path = "/public"

    [routes.rate_limit]
    limit = 100
    window_secs = 60
    key_location = "IPs:2;10.0.0.1;10.0.0.2"

    [[routes]]
    id = "reports"
    path = "/reports"

    [routes.auth]
    key_location = "reporting-key"
"#;

fn load(contents: &str) -> Config {
    let dir = setup_config_dir();
    dir.write_config(contents);
    Config::load().unwrap()
}

#[test]
#[serial]
fn given_routes_when_load_then_auth_and_rate_limit_parsed() {
    // When
    let config = load(ROUTES);

    // Then
    assert_that!(config.routes, len(eq(3)));
    assert_that!(config.validate(), ok(anything()));

    let orders = &config.routes[0];
    assert_eq!(orders.id, "orders");
    let auth = orders.auth.as_ref().unwrap();
    assert_eq!(auth.key_location, "{claim:org_id}");
    assert_eq!(auth.roles_claim, "realm_access.roles");
    assert_eq!(auth.required_roles, vec!["orders:read"]);
    let rate_limit = orders.rate_limit.as_ref().unwrap();
    assert_eq!((rate_limit.limit, rate_limit.window_secs), (5, 1));
    assert_eq!(rate_limit.key_location, "{header:X-Api-Key}");
}

#[test]
#[serial]
fn given_route_without_sections_when_load_then_optional_parts_absent() {
    let config = load(ROUTES);

    let public = &config.routes[1];
    assert!(public.auth.is_none());
    assert!(public.rate_limit.is_some());

    let reports = &config.routes[2];
    assert!(reports.rate_limit.is_none());
    let auth = reports.auth.as_ref().unwrap();
    assert_eq!(auth.roles_claim, crate::DEFAULT_ROLES_CLAIM);
    assert!(auth.required_roles.is_empty());
}

#[test]
#[serial]
fn given_route_missing_id_when_load_then_toml_error() {
    let dir = setup_config_dir();
    dir.write_config("[[routes]]\npath = \"/x\"\n");

    let result = Config::load();

    assert_that!(result, err(anything()));
    assert_that!(format!("{}", result.unwrap_err()), contains_substring("config.toml"));
}

#[test]
#[serial]
fn given_duplicate_route_ids_when_validate_then_error() {
    let config = load(
        r#"
            [[routes]]
            id = "a"
            path = "/a"

            [[routes]]
            id = "a"
            path = "/b"
        "#,
    );

    let result = config.validate();

    assert_that!(result, err(anything()));
    assert_that!(format!("{}", result.unwrap_err()), contains_substring("duplicate"));
}

#[test]
#[serial]
fn given_same_path_with_trailing_slash_when_validate_then_error() {
    let config = load(
        r#"
            [[routes]]
            id = "a"
            path = "/orders"

            [[routes]]
            id = "b"
            path = "/orders/"
        "#,
    );

    let result = config.validate();

    assert_that!(format!("{}", result.unwrap_err()), contains_substring("already guarded"));
}

#[test]
#[serial]
fn given_path_with_wildcard_when_validate_then_error() {
    let config = load("[[routes]]\nid = \"a\"\npath = \"/orders/{*rest}\"\n");

    let result = config.validate();

    assert_that!(format!("{}", result.unwrap_err()), contains_substring("literal prefix"));
}

#[test]
#[serial]
fn given_health_probe_path_when_validate_then_error() {
    let config = load("[[routes]]\nid = \"a\"\npath = \"/ready/\"\n");

    let result = config.validate();

    assert_that!(format!("{}", result.unwrap_err()), contains_substring("reserved"));
}

#[test]
#[serial]
fn given_trailing_slashes_when_normalized_then_trimmed() {
    let config = load("[[routes]]\nid = \"a\"\npath = \"/orders//\"\n\n[[routes]]\nid = \"b\"\npath = \"/\"\n");

    assert_that!(config.routes[0].normalized_path(), eq("/orders"));
    assert_that!(config.routes[1].normalized_path(), eq("/"));
}

#[test]
#[serial]
fn given_path_without_leading_slash_when_validate_then_error() {
    let config = load("[[routes]]\nid = \"a\"\npath = \"orders\"\n");

    let result = config.validate();

    assert_that!(format!("{}", result.unwrap_err()), contains_substring("must start with '/'"));
}

#[test]
#[serial]
fn given_rate_limit_out_of_range_when_validate_then_error() {
    for (limit, window, needle) in [
        (0, 1, "rate_limit.limit"),
        (100_001, 1, "rate_limit.limit"),
        (5, 0, "rate_limit.window_secs"),
        (5, 86_401, "rate_limit.window_secs"),
    ] {
        let config = load(&format!(
            "[[routes]]\nid = \"a\"\npath = \"/a\"\n[routes.rate_limit]\nlimit = {limit}\nwindow_secs = {window}\nkey_location = \"global\"\n"
        ));

        let result = config.validate();

        assert_that!(format!("{}", result.unwrap_err()), contains_substring(needle));
    }
}

#[test]
#[serial]
fn given_blank_key_locations_when_validate_then_error() {
    let auth = load("[[routes]]\nid = \"a\"\npath = \"/a\"\n[routes.auth]\nkey_location = \" \"\n");
    let rate_limit = load(
        "[[routes]]\nid = \"a\"\npath = \"/a\"\n[routes.rate_limit]\nlimit = 1\nwindow_secs = 1\nkey_location = \"\"\n",
    );

    assert_that!(
        format!("{}", auth.validate().unwrap_err()),
        contains_substring("auth.key_location")
    );
    assert_that!(
        format!("{}", rate_limit.validate().unwrap_err()),
        contains_substring("rate_limit.key_location")
    );
}

#[test]
#[serial]
fn given_route_when_inspected_then_optional_sections_match() {
    let config = load(ROUTES);

    assert_that!(config.routes[0].auth.as_ref().map(|a| a.key_location.clone()), some(eq("{claim:org_id}")));
    assert_that!(config.routes[1].auth.as_ref().map(|a| a.key_location.clone()), none());
}
