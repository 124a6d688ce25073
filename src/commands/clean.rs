use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, ListStream, PipelineData, Signature, Signals, SyntaxShape,
    Type, Value,
};
use rayon::prelude::*;

use super::util::{append_columns, normalize_input};
use crate::SocialCleanPlugin;

pub struct Clean;

impl PluginCommand for Clean {
    type Plugin = SocialCleanPlugin;

    fn name(&self) -> &str {
        "social clean"
    }

    fn description(&self) -> &str {
        "Clean a column of social-media URLs, adding clean_url and platform columns"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::table(), Type::table()),
                (Type::List(Box::new(Type::String)), Type::table()),
                (Type::String, Type::table()),
            ])
            .named(
                "field",
                SyntaxShape::String,
                "Field containing the URL (default: url)",
                Some('f'),
            )
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["url", "clean", "tracking", "batch", "table"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#"[[url]; ["https://x.com/a/status/1?s=20"] ["https://example.com"]] | social clean"#,
                description: "Clean every url in a table; unsupported rows get an error column",
                result: None,
            },
            Example {
                example: r#"["youtu.be/abc?si=1" "fb.watch/xyz/?mibextid=2"] | social clean"#,
                description: "Clean a list of URL strings",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        plugin: &SocialCleanPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let field: String = call
            .get_flag::<String>("field")?
            .unwrap_or_else(|| "url".into());
        let head = call.head;

        let rows = normalize_input(input, &field, head);
        if rows.is_empty() {
            return Ok(PipelineData::Value(Value::list(vec![], head), None));
        }

        let urls: Vec<String> = rows
            .iter()
            .map(|row| {
                row.get_data_by_key(&field)
                    .and_then(|v| v.coerce_string().ok())
                    .unwrap_or_default()
            })
            .collect();

        let cleaned: Vec<_> = urls.par_iter().map(|u| plugin.cleaner.clean(u)).collect();

        let result: Vec<Value> = rows
            .into_iter()
            .zip(cleaned)
            .map(|(row, outcome)| {
                let cols = match outcome {
                    Ok(r) => vec![
                        ("clean_url", Value::string(r.canonical_url, head)),
                        ("platform", Value::string(r.platform, head)),
                    ],
                    Err(e) => vec![
                        ("clean_url", Value::nothing(head)),
                        ("platform", Value::nothing(head)),
                        ("error", Value::string(e.to_string(), head)),
                    ],
                };
                append_columns(row, cols, head)
            })
            .collect();

        Ok(ListStream::new(result.into_iter(), head, Signals::empty()).into())
    }
}
