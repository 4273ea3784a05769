//! End-to-end wiring of an application through the public API:
//! discovered classes, providers, configuration and resolution together.

use std::sync::Arc;

use parking_lot::Mutex;
use wirebox_config::{ConfigManager, ConfigManagerTrait};
use wirebox_di::*;

// Application types

struct Settings {
    app_name: String,
    debug: bool,
}

struct ConsoleLogger {
    lines: Mutex<Vec<String>>,
}

struct Repository {
    logger: Arc<ConsoleLogger>,
    table: String,
}

struct UserService {
    repository: Arc<Repository>,
    settings: Arc<Settings>,
}

inventory::submit! {
    ClassRegistration::with_priority("App\\Logger", || ClassDefinition::new("App\\Logger"), 10)
}

inventory::submit! {
    ClassRegistration::new("App\\ConsoleLogger", || {
        ClassDefinition::new("App\\ConsoleLogger")
            .extends("App\\Logger")
            .constructor(vec![], |_| {
                Ok(ConsoleLogger {
                    lines: Mutex::new(Vec::new()),
                })
            })
            .method::<ConsoleLogger, _>("log", vec![Parameter::named("line")], |this, args| {
                this.lines.lock().push(args.string(0)?);
                Ok(Value::null())
            })
    })
}

inventory::submit! {
    ClassRegistration::new("App\\Settings", || {
        ClassDefinition::new("App\\Settings").constructor(
            vec![
                Parameter::named("app_name"),
                Parameter::named("debug").with_default(false),
            ],
            |args| {
                Ok(Settings {
                    app_name: args.string(0)?,
                    debug: args.bool(1)?,
                })
            },
        )
    })
}

inventory::submit! {
    ClassRegistration::new("App\\Repository", || {
        ClassDefinition::new("App\\Repository").constructor(
            vec![
                Parameter::typed("logger", "App\\Logger"),
                Parameter::named("table").with_default("users"),
            ],
            |args| {
                Ok(Repository {
                    logger: args.object(0)?,
                    table: args.string(1)?,
                })
            },
        )
    })
}

inventory::submit! {
    ClassRegistration::new("App\\UserService", || {
        ClassDefinition::new("App\\UserService")
            .constructor(
                vec![
                    Parameter::typed("repository", "App\\Repository"),
                    Parameter::typed("settings", "App\\Settings"),
                ],
                |args| {
                    Ok(UserService {
                        repository: args.object(0)?,
                        settings: args.object(1)?,
                    })
                },
            )
            .method::<UserService, _>(
                "greet",
                vec![Parameter::named("user"), Parameter::named("punctuation").with_default("!")],
                |this, args| {
                    let line = format!(
                        "{} welcomes {}{}",
                        this.settings.app_name,
                        args.str(0)?,
                        args.str(1)?
                    );
                    this.repository.logger.lines.lock().push(line.clone());
                    Ok(Value::from(line))
                },
            )
    })
}

struct LoggingProvider;

impl ServiceProvider for LoggingProvider {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn priority(&self) -> u32 {
        10
    }

    fn register(&self, container: &Container) -> DIResult<()> {
        container
            .singleton("App\\Logger", Some("App\\ConsoleLogger"))?
            .after_construct("log", vec![Value::from("logger ready")])?;
        Ok(())
    }
}

struct UserProvider;

impl ServiceProvider for UserProvider {
    fn name(&self) -> &'static str {
        "users"
    }

    fn register(&self, container: &Container) -> DIResult<()> {
        container.singleton("App\\Settings", None)?;
        container.bind("App\\Repository", None)?;
        container.singleton("App\\UserService", None)?;
        Ok(())
    }

    fn validate(&self, container: &Container) -> DIResult<()> {
        if !container.has("App\\Logger")? {
            return Err(DIError::not_found("App\\Logger"));
        }
        Ok(())
    }
}

fn application(bindings: &[(&str, Value)]) -> Container {
    let registry = ClassRegistry::discover().unwrap();
    let container = Container::new(Arc::new(registry));
    for (identifier, value) in bindings {
        container.bind(identifier, value.clone()).unwrap();
    }

    let mut providers = ServiceProviderRegistry::new();
    providers.add(UserProvider).add(LoggingProvider);
    providers.register_all(&container).unwrap();
    container
}

#[test]
fn test_discovered_classes_are_registered() {
    let names = list_discovered_classes();
    for class in [
        "App\\Logger",
        "App\\ConsoleLogger",
        "App\\Settings",
        "App\\Repository",
        "App\\UserService",
    ] {
        assert!(names.contains(&class), "missing {}", class);
    }
    assert_eq!(discovered_class_count(), names.len());
}

#[test]
fn test_application_graph_resolves() {
    let container = application(&[("app_name", Value::from("Wirebox"))]);

    let users = container.get_as::<UserService>("App\\UserService").unwrap();
    assert_eq!(users.settings.app_name, "Wirebox");
    assert!(!users.settings.debug);
    assert_eq!(users.repository.table, "users");

    // The logger is a singleton shared through the interface binding
    let logger = container.get_as::<ConsoleLogger>("App\\Logger").unwrap();
    assert!(Arc::ptr_eq(&logger, &users.repository.logger));
    assert_eq!(*logger.lines.lock(), vec!["logger ready".to_string()]);
}

#[test]
fn test_deferred_method_call() {
    let container = application(&[("app_name", Value::from("Wirebox"))]);

    let greet = container
        .closure_for("App\\UserService", "greet", [("user", Value::from("Ada"))])
        .unwrap();
    assert_eq!(
        greet.call().unwrap().as_str(),
        Some("Wirebox welcomes Ada!")
    );

    let logger = container.get_as::<ConsoleLogger>("App\\Logger").unwrap();
    assert_eq!(
        *logger.lines.lock(),
        vec!["logger ready".to_string(), "Wirebox welcomes Ada!".to_string()]
    );
}

#[test]
fn test_missing_setting_is_traced_to_its_consumers() {
    let container = application(&[]);

    let err = container.get("App\\UserService").unwrap_err();
    assert_eq!(
        err.to_string(),
        "No entry was found for [app_name] identifier. \
         Requested on [App\\Settings::new()]. \
         Requested on [App\\UserService::new()]."
    );
}

#[test]
fn test_provider_validation_failure() {
    let registry = ClassRegistry::discover().unwrap();
    let container = Container::new(Arc::new(registry));

    let mut providers = ServiceProviderRegistry::new();
    providers.add(UserProvider);
    assert!(providers.register_all(&container).unwrap_err().is_not_found());
}

#[test]
fn test_configuration_file_and_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[bindings]
app_name = "From File"

[[services]]
class = "App\\Logger"
alias = "App\\ConsoleLogger"
singleton = true

[[services]]
class = "App\\Settings"
"#,
    )
    .unwrap();
    std::env::set_var("WIREBOXE2E_BINDINGS__DEBUG", "true");

    let mut manager = ConfigManager::with_path(path).with_env_prefix("WIREBOXE2E");
    let config = manager.load_config().unwrap();
    assert_eq!(config.bindings.get("debug"), Some(&serde_json::json!(true)));

    let container = Container::from_config(Arc::new(ClassRegistry::discover().unwrap()), &config)
        .unwrap();
    let settings = container.get_as::<Settings>("App\\Settings").unwrap();
    assert_eq!(settings.app_name, "From File");
    assert!(settings.debug);

    let first = container.get("App\\Logger").unwrap();
    let second = container.get("App\\Logger").unwrap();
    assert_eq!(first, second);

    std::env::remove_var("WIREBOXE2E_BINDINGS__DEBUG");
}
