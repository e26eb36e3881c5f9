//! Conversion of handler return values into skill results.

use skillroute_api::{ChatAgentResult, Followup, SkillCommandResult};

/// Trait for converting handler return values into a [`SkillCommandResult`].
///
/// Implemented for the shapes handlers commonly produce. The dispatcher
/// overwrites the chain and result id afterwards, whatever the shape.
pub trait IntoSkillResult {
    fn into_skill_result(self) -> SkillCommandResult;
}

impl IntoSkillResult for SkillCommandResult {
    fn into_skill_result(self) -> SkillCommandResult {
        self
    }
}

impl IntoSkillResult for ChatAgentResult {
    fn into_skill_result(self) -> SkillCommandResult {
        SkillCommandResult {
            chat_agent_result: self,
            follow_up: None,
        }
    }
}

impl IntoSkillResult for String {
    fn into_skill_result(self) -> SkillCommandResult {
        SkillCommandResult::message(self)
    }
}

impl IntoSkillResult for &'static str {
    fn into_skill_result(self) -> SkillCommandResult {
        SkillCommandResult::message(self)
    }
}

impl IntoSkillResult for () {
    fn into_skill_result(self) -> SkillCommandResult {
        SkillCommandResult::default()
    }
}

impl<T: IntoSkillResult> IntoSkillResult for (T, Vec<Followup>) {
    fn into_skill_result(self) -> SkillCommandResult {
        let (value, follow_ups) = self;
        value.into_skill_result().with_follow_ups(follow_ups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_into_skill_result() {
        let result = "Deployed".to_string().into_skill_result();
        assert_eq!(result.chat_agent_result.message.as_deref(), Some("Deployed"));
        assert!(result.follow_up.is_none());
    }

    #[test]
    fn test_unit_into_skill_result() {
        let result = ().into_skill_result();
        assert!(result.chat_agent_result.message.is_none());
        assert!(result.handler_chain().is_empty());
    }

    #[test]
    fn test_tuple_attaches_follow_ups() {
        let result = ("Created", vec![Followup::new("deploy it")]).into_skill_result();
        assert_eq!(result.follow_up_count(), 1);
    }
}
