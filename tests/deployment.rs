use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn compose() -> Value {
    let text = fs::read_to_string(root().join("docker-compose.yml")).unwrap();
    serde_yaml::from_str(&text).unwrap()
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_sequence()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn compose_defines_app_and_db_services() {
    let compose = compose();
    let services = compose["services"].as_mapping().unwrap();
    assert_eq!(services.len(), 2);

    let app = &compose["services"]["app"];
    assert_eq!(app["build"]["context"], ".");
    assert_eq!(strings(&app["ports"]), vec!["8000:8000"]);
    assert_eq!(strings(&app["env_file"]), vec![".env"]);
    assert_eq!(strings(&app["depends_on"]), vec!["db"]);
    assert_eq!(
        strings(&app["volumes"]),
        vec!["my_media:/vol/web/media", "my_static:/vol/web/static"]
    );

    let db = &compose["services"]["db"];
    assert!(db["image"].as_str().unwrap().starts_with("postgres"));
    assert_eq!(strings(&db["env_file"]), vec![".env"]);
    assert_eq!(strings(&db["volumes"]), vec!["my_db:$PGDATA"]);
}

#[test]
fn compose_declares_named_volumes() {
    let compose = compose();
    let volumes: Vec<&str> = compose["volumes"]
        .as_mapping()
        .unwrap()
        .keys()
        .map(|k| k.as_str().unwrap())
        .collect();
    assert_eq!(volumes, vec!["my_db", "my_media", "my_static"]);
}

#[test]
fn startup_chain_runs_steps_in_order() {
    let compose = compose();
    let command = compose["services"]["app"]["command"].as_str().unwrap();
    assert!(command.starts_with("sh -c "));

    let steps: Vec<&str> = command
        .trim_start_matches("sh -c ")
        .trim_matches('"')
        .split("&&")
        .map(str::trim)
        .collect();
    assert_eq!(
        steps,
        vec![
            "airport wait-for-db",
            "airport migrate",
            "airport collectstatic",
            "airport serve --bind 0.0.0.0:8000",
        ]
    );
}

#[test]
fn image_runs_as_unprivileged_user_with_writable_volumes() {
    let dockerfile = fs::read_to_string(root().join("Dockerfile")).unwrap();

    let stages = dockerfile.lines().filter(|l| l.starts_with("FROM ")).count();
    assert_eq!(stages, 2);
    assert!(dockerfile.contains("WORKDIR /app"));
    assert!(dockerfile.contains("mkdir -p /vol/web/media"));
    assert!(dockerfile.contains("mkdir -p /vol/web/static"));
    assert!(dockerfile.contains("--disabled-password"));
    assert!(dockerfile.contains("--no-create-home"));
    assert!(dockerfile.contains("chown -R my_user:my_user /vol/web"));
    assert!(dockerfile.contains("chmod -R 755 /vol/web"));

    // Permissions are fixed before dropping root.
    let chmod = dockerfile.find("chmod -R 755").unwrap();
    let user = dockerfile.find("USER my_user").unwrap();
    assert!(chmod < user);
}

#[test]
fn dockerfile_copy_sources_exist() {
    let root = root();
    let dockerfile = fs::read_to_string(root.join("Dockerfile")).unwrap();

    let mut missing = Vec::new();
    for line in dockerfile.lines().map(str::trim) {
        if !line.starts_with("COPY ") || line.contains("--from=") {
            continue;
        }
        let tokens: Vec<&str> = line["COPY ".len()..].split_whitespace().collect();
        for src in &tokens[..tokens.len() - 1] {
            if !root.join(Path::new(src)).exists() {
                missing.push(src.to_string());
            }
        }
    }
    assert!(missing.is_empty(), "missing COPY sources: {missing:?}");
}

#[test]
fn env_sample_lists_deployment_variables() {
    let sample = fs::read_to_string(root().join(".env.sample")).unwrap();
    for key in [
        "POSTGRES_DB",
        "POSTGRES_USER",
        "POSTGRES_PASSWORD",
        "POSTGRES_HOST",
        "SECRET_KEY",
        "PGDATA",
    ] {
        assert!(
            sample.lines().any(|l| l.starts_with(&format!("{key}="))),
            "{key} missing from .env.sample"
        );
    }
}
