use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{Category, Example, LabeledError, PipelineData, Signature, Type, Value};

use crate::algo::scan;
use crate::SocialCleanPlugin;

pub struct CleanText;

impl PluginCommand for CleanText {
    type Plugin = SocialCleanPlugin;

    fn name(&self) -> &str {
        "social clean-text"
    }

    fn description(&self) -> &str {
        "Rewrite every social-media link in a string without its tracking parameters"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::String, Type::String)
            .category(Category::Strings)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["text", "links", "clean", "tracking", "share"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: r#""watch https://youtu.be/abc?si=xyz now" | social clean-text"#,
            description: "Strip the share id from a link inside a message",
            result: Some(Value::test_string("watch https://youtu.be/abc now")),
        }]
    }

    fn run(
        &self,
        plugin: &SocialCleanPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let head = call.head;
        let text = input.into_value(head)?.coerce_string()?;
        let cleaned = scan::clean_text(&plugin.cleaner, &text);
        Ok(PipelineData::Value(Value::string(cleaned, head), None))
    }
}
