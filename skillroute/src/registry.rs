//! Command registry owned by a single owner.
//!
//! Keeps commands in registration order (listing order) and the two
//! distinguished fallbacks: `default` and `no_input`.

use crate::classifier::IntentCandidate;
use crate::error::RegistryError;
use crate::handler::SkillHandler;
use skillroute_api::{CommandKind, CommandSpec};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A command together with the handler that runs it.
#[derive(Clone)]
pub struct RegisteredCommand {
    spec: CommandSpec,
    handler: Option<Arc<dyn SkillHandler>>,
}

impl RegisteredCommand {
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Handler for skill commands; `None` for wizard and simple commands
    pub fn handler(&self) -> Option<&Arc<dyn SkillHandler>> {
        self.handler.as_ref()
    }
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("spec", &self.spec)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Target of a `default` or `no_input` fallback.
pub enum Fallback {
    /// A command registered under this name
    Command(String),

    /// A handler attached directly, not listed with the commands
    Handler {
        name: String,
        handler: Arc<dyn SkillHandler>,
    },
}

impl Fallback {
    pub fn command(name: impl Into<String>) -> Self {
        Fallback::Command(name.into())
    }

    pub fn handler(name: impl Into<String>, handler: Arc<dyn SkillHandler>) -> Self {
        Fallback::Handler {
            name: name.into(),
            handler,
        }
    }
}

/// Named commands of one owner.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<RegisteredCommand>>,
    index: HashMap<String, usize>,
    default: Option<Arc<RegisteredCommand>>,
    no_input: Option<Arc<RegisteredCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a wizard or simple command.
    ///
    /// Skill commands need a handler; use [`CommandRegistry::register_skill`].
    pub fn register(&mut self, spec: CommandSpec) -> Result<(), RegistryError> {
        if spec.kind == CommandKind::Skill {
            return Err(RegistryError::MissingHandler(spec.name));
        }
        self.insert(RegisteredCommand {
            spec,
            handler: None,
        })
    }

    /// Register a command together with its handler
    pub fn register_skill(
        &mut self,
        spec: CommandSpec,
        handler: Arc<dyn SkillHandler>,
    ) -> Result<(), RegistryError> {
        self.insert(RegisteredCommand {
            spec,
            handler: Some(handler),
        })
    }

    fn insert(&mut self, command: RegisteredCommand) -> Result<(), RegistryError> {
        let name = command.spec.name.clone();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        tracing::info!(command = %name, kind = ?command.spec.kind, "Command registered");
        self.index.insert(name, self.commands.len());
        self.commands.push(Arc::new(command));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RegisteredCommand>> {
        self.index.get(name).map(|&i| &self.commands[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Commands in registration order
    pub fn list(&self) -> impl Iterator<Item = &RegisteredCommand> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Set the handler used when nothing else matches
    pub fn set_default(&mut self, fallback: Fallback) -> Result<(), RegistryError> {
        if self.default.is_some() {
            return Err(RegistryError::FallbackAlreadySet("default"));
        }
        self.default = Some(self.resolve_fallback(fallback)?);
        Ok(())
    }

    /// Set the handler used for an empty prompt without a command
    pub fn set_no_input(&mut self, fallback: Fallback) -> Result<(), RegistryError> {
        if self.no_input.is_some() {
            return Err(RegistryError::FallbackAlreadySet("no_input"));
        }
        self.no_input = Some(self.resolve_fallback(fallback)?);
        Ok(())
    }

    fn resolve_fallback(&self, fallback: Fallback) -> Result<Arc<RegisteredCommand>, RegistryError> {
        match fallback {
            Fallback::Command(name) => self
                .get(&name)
                .cloned()
                .ok_or(RegistryError::UnknownCommand(name)),
            Fallback::Handler { name, handler } => Ok(Arc::new(RegisteredCommand {
                spec: CommandSpec::skill(name.clone(), name),
                handler: Some(handler),
            })),
        }
    }

    pub fn default_command(&self) -> Option<&Arc<RegisteredCommand>> {
        self.default.as_ref()
    }

    pub fn no_input_command(&self) -> Option<&Arc<RegisteredCommand>> {
        self.no_input.as_ref()
    }

    /// Commands that declare an intent description, in registration order
    pub fn intent_candidates(&self) -> Vec<IntentCandidate> {
        self.commands
            .iter()
            .filter_map(|c| {
                c.spec.intent_description.as_ref().map(|description| IntentCandidate {
                    name: c.spec.name.clone(),
                    description: description.clone(),
                })
            })
            .collect()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field(
                "commands",
                &self.commands.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("default", &self.default.as_ref().map(|c| c.name()))
            .field("no_input", &self.no_input.as_ref().map(|c| c.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::HandlerError;

    fn noop() -> Arc<dyn SkillHandler> {
        handler_fn(|_args| async { Ok::<_, HandlerError>(()) })
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandSpec::simple("open", "workbench.open"))
            .unwrap();

        let err = registry
            .register_skill(CommandSpec::skill("open", "other.open"), noop())
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("open".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_keeps_registration_order() {
        let mut registry = CommandRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register_skill(CommandSpec::skill(name, name), noop()).unwrap();
        }

        let names: Vec<_> = registry.list().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_skill_without_handler_rejected() {
        let mut registry = CommandRegistry::new();
        let err = registry
            .register(CommandSpec::skill("deploy", "azure.deploy"))
            .unwrap_err();
        assert_eq!(err, RegistryError::MissingHandler("deploy".into()));
    }

    #[test]
    fn test_fallbacks() {
        let mut registry = CommandRegistry::new();
        registry.register_skill(CommandSpec::skill("help", "help"), noop()).unwrap();

        assert_eq!(
            registry.set_default(Fallback::command("missing")).unwrap_err(),
            RegistryError::UnknownCommand("missing".into())
        );

        registry.set_default(Fallback::command("help")).unwrap();
        assert_eq!(
            registry.set_default(Fallback::command("help")).unwrap_err(),
            RegistryError::FallbackAlreadySet("default")
        );

        registry.set_no_input(Fallback::handler("greeting", noop())).unwrap();
        assert_eq!(registry.default_command().unwrap().name(), "help");
        assert_eq!(registry.no_input_command().unwrap().name(), "greeting");
        // Attached handlers are not listed
        assert!(!registry.contains("greeting"));
    }

    #[test]
    fn test_intent_candidates_skip_undescribed() {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandSpec::wizard("create", "azure.create").intent("Create a resource"))
            .unwrap();
        registry.register(CommandSpec::simple("open", "workbench.open")).unwrap();

        let candidates = registry.intent_candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "create");
    }
}
