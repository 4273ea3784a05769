//! # Wirebox Container Usage Guide
//!
//! ## Describing Classes
//!
//! The container instantiates only classes it knows about. Each class is a
//! [`ClassDefinition`](crate::ClassDefinition): a name, the classes it
//! extends, a constructor with declared parameters and optional methods.
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox_di::{ClassDefinition, ClassRegistry, Container, Parameter, Value};
//!
//! struct FileLogger { path: String }
//!
//! let registry = ClassRegistry::new()
//!     // No constructor: an interface that can be bound to but not built
//!     .with(ClassDefinition::new("App\\Logger"))
//!     .unwrap()
//!     .with(
//!         ClassDefinition::new("App\\FileLogger")
//!             .extends("App\\Logger")
//!             .constructor(
//!                 vec![Parameter::named("path").with_default("/tmp/app.log")],
//!                 |args| Ok(FileLogger { path: args.string(0)? }),
//!             ),
//!     )
//!     .unwrap();
//!
//! let container = Container::new(Arc::new(registry));
//!
//! // Bind the interface to an implementation
//! container.bind("App\\Logger", Value::class("App\\FileLogger")).unwrap();
//!
//! let logger = container.get_as::<FileLogger>("App\\Logger").unwrap();
//! assert_eq!(logger.path, "/tmp/app.log");
//! ```
//!
//! ## How Parameters Are Resolved
//!
//! For each constructor parameter, in order:
//!
//! 1. An explicit argument set on the service, looked up by the parameter's
//!    declared class and then by its name.
//! 2. The container entry named after the declared class, or after the
//!    parameter name when it has no class.
//! 3. The parameter default, if the parameter is optional. Otherwise the
//!    not found error is returned with ` Requested on [Class::new()].`
//!    appended.
//!
//! Untyped parameters resolved by bare name share entries: two classes with
//! a `path` parameter both receive the container's `path` entry. Turn this
//! off with [`Container::with_name_fallback`](crate::Container::with_name_fallback)
//! or `name_fallback = false` in configuration.
//!
//! ## Singletons and Hooks
//!
//! ```rust,ignore
//! container
//!     .singleton("App\\Mailer", None)?
//!     .set_argument("host", Value::from("smtp.example.com"))
//!     .after_construct("connect", vec![])?;
//!
//! let a = container.get("App\\Mailer")?;
//! let b = container.get("App\\Mailer")?;
//! assert_eq!(a, b);
//! ```
//!
//! `after_construct` hooks only run on freshly built instances, so a
//! singleton runs them once.
//!
//! ## Deferred Calls
//!
//! ```rust,ignore
//! let send = container.closure_for(
//!     "App\\Mailer",
//!     "send",
//!     [("to", Value::from("ops@example.com"))],
//! )?;
//!
//! // Later
//! send.call()?;
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! name_fallback = true
//! detect_cycles = true
//!
//! [bindings]
//! "mail.host" = "smtp.example.com"
//!
//! [[services]]
//! class = "App\\Logger"
//! alias = "App\\FileLogger"
//! singleton = true
//! ```
//!
//! ```rust,ignore
//! use wirebox_config::ConfigManager;
//!
//! let mut manager = ConfigManager::with_path("wirebox.toml".into());
//! let container = Container::load(Arc::new(registry), &mut manager)?;
//! ```
//!
//! Environment variables override the file: `WIREBOX_NAME_FALLBACK=false`,
//! `WIREBOX_BINDINGS__MAIL_HOST=localhost`.
//!
//! ## Default Container
//!
//! ```rust,ignore
//! wirebox_di::global::init(container)?;
//!
//! let container = wirebox_di::global::container().expect("initialized at startup");
//! ```
