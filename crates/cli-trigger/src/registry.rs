//! Command table built from the host's handlers
//!
//! Initialization runs once: every handler gets a unique command name and a
//! compiled flag schema. The table is read-only afterwards, except for the
//! flag values written into the resolved command during its one invocation.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::bridge;
use crate::error::ConfigError;
use crate::flags::{FlagSchema, ParsedArgs};
use crate::handler::{Handler, InvocationContext};
use crate::settings::{HandlerSettings, Settings};

/// Name given to the one handler allowed to be unnamed
pub const DEFAULT_COMMAND: &str = "default";

/// Reserved for help; matched case-insensitively
pub const HELP_COMMAND: &str = "help";

/// Host-side trigger configuration
#[derive(Debug, Clone, Default)]
pub struct TriggerConfig {
    /// Trigger id, used in diagnostics
    pub id: String,
    /// Raw trigger settings (`defaultCmd`, `singleCmd`, `usage`, `long`)
    pub settings: Map<String, Value>,
}

impl TriggerConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            settings: Map::new(),
        }
    }

    pub fn with_setting(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }
}

/// One entry of the command table
pub struct HandlerCommand {
    name: String,
    handler: Box<dyn Handler>,
    settings: HandlerSettings,
    schema: FlagSchema,
    values: OnceCell<ParsedArgs>,
}

impl HandlerCommand {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    pub fn settings(&self) -> &HandlerSettings {
        &self.settings
    }

    pub fn schema(&self) -> &FlagSchema {
        &self.schema
    }

    /// Values parsed for this command's invocation, once it has run
    pub fn values(&self) -> Option<&ParsedArgs> {
        self.values.get()
    }

    /// Store the parsed values and call the handler with them
    pub(crate) fn invoke(&self, ctx: &InvocationContext, parsed: ParsedArgs) -> anyhow::Result<String> {
        debug_assert!(self.values.get().is_none(), "flag values are written once");
        let values = self.values.get_or_init(|| parsed);
        bridge::invoke(self.handler.as_ref(), ctx, &values.args, &values.flags)
    }
}

impl fmt::Debug for HandlerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCommand")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// The trigger: global settings plus the command table
#[derive(Debug)]
pub struct Trigger {
    id: String,
    settings: Settings,
    commands: BTreeMap<String, HandlerCommand>,
}

impl Trigger {
    /// Build the command table from the host's handlers
    pub fn initialize(config: TriggerConfig, handlers: Vec<Box<dyn Handler>>) -> Result<Self, ConfigError> {
        if handlers.is_empty() {
            return Err(ConfigError::NoHandlers(config.id));
        }

        let settings = Settings::from_map(&config.settings)?;
        if settings.single_cmd && handlers.len() != 1 {
            return Err(ConfigError::SingleCommandCount(handlers.len()));
        }

        let mut commands = BTreeMap::new();
        let mut unnamed_seen = false;

        for handler in handlers {
            let name = match handler.name() {
                "" if unnamed_seen => return Err(ConfigError::MultipleUnnamed),
                "" => {
                    unnamed_seen = true;
                    DEFAULT_COMMAND.to_string()
                }
                name => name.to_string(),
            };

            if name.eq_ignore_ascii_case(HELP_COMMAND) {
                return Err(ConfigError::ReservedName(name));
            }
            if commands.contains_key(&name) {
                return Err(ConfigError::DuplicateCommand(name));
            }

            let handler_settings = HandlerSettings::from_map(handler.settings(), &name)?;
            let schema = FlagSchema::compile(&name, &handler_settings.flags)?;

            trace!("Adding command {}", name);
            commands.insert(
                name.clone(),
                HandlerCommand {
                    name,
                    handler,
                    settings: handler_settings,
                    schema,
                    values: OnceCell::new(),
                },
            );
        }

        if let Some(default) = settings.default_command() {
            if !commands.contains_key(default) {
                warn!("Default command '{}' is not a registered command", default);
            }
        }

        Ok(Self {
            id: config.id,
            settings,
            commands,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn command(&self, name: &str) -> Option<&HandlerCommand> {
        self.commands.get(name)
    }

    /// Registered commands in name order
    pub fn commands(&self) -> impl Iterator<Item = &HandlerCommand> {
        self.commands.values()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Handler with fixed settings that replies with `reply`
    pub(crate) struct StubHandler {
        pub name: String,
        pub settings: Map<String, Value>,
        pub reply: Map<String, Value>,
    }

    impl StubHandler {
        pub(crate) fn boxed(name: &str, flags: &[&str]) -> Box<dyn Handler> {
            Box::new(Self {
                name: name.to_string(),
                settings: json!({ "flags": flags }).as_object().cloned().unwrap(),
                reply: Map::new(),
            })
        }
    }

    impl Handler for StubHandler {
        fn name(&self) -> &str {
            &self.name
        }

        fn settings(&self) -> &Map<String, Value> {
            &self.settings
        }

        fn handle(&self, _ctx: &InvocationContext, _request: Map<String, Value>) -> anyhow::Result<Map<String, Value>> {
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_one_entry_per_distinct_handler() {
        let trigger = Trigger::initialize(
            TriggerConfig::new("cli"),
            vec![
                StubHandler::boxed("build", &[]),
                StubHandler::boxed("test", &[]),
                StubHandler::boxed("deploy", &[]),
            ],
        )
        .unwrap();

        let names: Vec<&str> = trigger.commands().map(|c| c.name()).collect();
        assert_eq!(names, vec!["build", "deploy", "test"]);
    }

    #[test]
    fn test_unnamed_handler_becomes_default() {
        let trigger = Trigger::initialize(
            TriggerConfig::new("cli"),
            vec![StubHandler::boxed("", &[]), StubHandler::boxed("build", &[])],
        )
        .unwrap();

        assert!(trigger.command(DEFAULT_COMMAND).is_some());
        assert_eq!(trigger.command(DEFAULT_COMMAND).unwrap().handler().name(), "");
    }

    #[test]
    fn test_no_handlers() {
        let err = Trigger::initialize(TriggerConfig::new("my-cli"), Vec::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NoHandlers(ref id) if id == "my-cli"));
    }

    #[test]
    fn test_two_unnamed_handlers() {
        let err = Trigger::initialize(
            TriggerConfig::new("cli"),
            vec![StubHandler::boxed("", &[]), StubHandler::boxed("", &[])],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MultipleUnnamed));
    }

    #[test]
    fn test_duplicate_names() {
        let err = Trigger::initialize(
            TriggerConfig::new("cli"),
            vec![StubHandler::boxed("build", &[]), StubHandler::boxed("build", &[])],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCommand(ref n) if n == "build"));
    }

    #[test]
    fn test_explicit_default_collides_with_unnamed() {
        let err = Trigger::initialize(
            TriggerConfig::new("cli"),
            vec![StubHandler::boxed("default", &[]), StubHandler::boxed("", &[])],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCommand(_)));
    }

    #[test]
    fn test_help_is_reserved() {
        let err = Trigger::initialize(TriggerConfig::new("cli"), vec![StubHandler::boxed("Help", &[])])
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReservedName(_)));
    }

    #[test]
    fn test_malformed_descriptor_fails_initialization() {
        let err = Trigger::initialize(
            TriggerConfig::new("cli"),
            vec![StubHandler::boxed("build", &["verbose||false"])],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_single_command_requires_one_handler() {
        let config = TriggerConfig::new("cli").with_setting("singleCmd", true);
        let err = Trigger::initialize(
            config,
            vec![StubHandler::boxed("a", &[]), StubHandler::boxed("b", &[])],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SingleCommandCount(2)));
    }

    #[test]
    fn test_schema_compiled_per_command() {
        let trigger = Trigger::initialize(
            TriggerConfig::new("cli"),
            vec![StubHandler::boxed("build", &["verbose||false||be loud", "out||a.out||output"])],
        )
        .unwrap();

        let cmd = trigger.command("build").unwrap();
        assert_eq!(cmd.schema().len(), 2);
        assert!(cmd.schema().get("verbose").unwrap().is_bool());
    }

    #[test]
    fn test_invoke_stores_parsed_values() {
        let trigger = Trigger::initialize(
            TriggerConfig::new("cli"),
            vec![StubHandler::boxed("build", &["verbose||false||be loud"])],
        )
        .unwrap();
        let cmd = trigger.command("build").unwrap();
        assert!(cmd.values().is_none());

        let parsed = cmd
            .schema()
            .parse(&["--verbose".to_string(), "src".to_string()])
            .unwrap();
        let ctx = InvocationContext {
            program: "prog".to_string(),
            command: "build".to_string(),
        };
        assert_eq!(cmd.invoke(&ctx, parsed.clone()).unwrap(), "");
        assert_eq!(cmd.values(), Some(&parsed));
    }

    #[test]
    fn test_invalid_trigger_settings() {
        let config = TriggerConfig::new("cli").with_setting("singleCmd", "yes please");
        let err = Trigger::initialize(config, vec![StubHandler::boxed("a", &[])]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSettings { .. }));
    }
}
