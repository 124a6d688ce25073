use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    record, Category, Example, LabeledError, PipelineData, Record, Signature, Span, SyntaxShape,
    Type, Value,
};

use crate::error::CleanError;
use crate::SocialCleanPlugin;

pub struct CleanUrl;

impl PluginCommand for CleanUrl {
    type Plugin = SocialCleanPlugin;

    fn name(&self) -> &str {
        "social clean-url"
    }

    fn description(&self) -> &str {
        "Strip tracking parameters from a social-media URL"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::Nothing, Type::record())
            .required("url", SyntaxShape::String, "URL to clean")
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["url", "clean", "tracking", "utm", "canonical", "share"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#"social clean-url "instagram.com/p/abc123/?igsh=xyz""#,
                description: "Infer https and strip Instagram share tracking",
                result: Some(Value::test_record(record! {
                    "original" => Value::test_string("instagram.com/p/abc123/?igsh=xyz"),
                    "clean_url" => Value::test_string("https://instagram.com/p/abc123/"),
                    "platform" => Value::test_string("Instagram"),
                    "removed" => Value::test_list(vec![Value::test_string("igsh")]),
                })),
            },
            Example {
                example: r#"social clean-url "https://youtube.com/watch?v=abc123&si=TRACK""#,
                description: "Keep the video id, drop the share id",
                result: Some(Value::test_record(record! {
                    "original" => Value::test_string("https://youtube.com/watch?v=abc123&si=TRACK"),
                    "clean_url" => Value::test_string("https://youtube.com/watch?v=abc123"),
                    "platform" => Value::test_string("YouTube"),
                    "removed" => Value::test_list(vec![Value::test_string("si")]),
                })),
            },
        ]
    }

    fn run(
        &self,
        plugin: &SocialCleanPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let url_str: String = call.req(0)?;
        let head = call.head;

        let outcome = plugin
            .cleaner
            .clean_detailed(&url_str)
            .map_err(|e| labeled(e, head))?;

        let mut result = Record::new();
        result.push("original", Value::string(&url_str, head));
        result.push("clean_url", Value::string(outcome.result.canonical_url, head));
        result.push("platform", Value::string(outcome.result.platform, head));
        result.push(
            "removed",
            Value::list(
                outcome
                    .removed
                    .into_iter()
                    .map(|r| Value::string(r, head))
                    .collect(),
                head,
            ),
        );

        Ok(PipelineData::Value(Value::record(result, head), None))
    }
}

/// Turn a clean failure into a labeled error pointing at the call.
fn labeled(err: CleanError, span: Span) -> LabeledError {
    let label = match &err {
        CleanError::InvalidUrl { .. } => "could not parse this as a URL",
        CleanError::UnsupportedPlatform { .. } => "host is not a supported platform",
    };
    LabeledError::new(err.to_string()).with_label(label, span)
}
