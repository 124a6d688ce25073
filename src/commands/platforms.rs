use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Record, Signature, Span, Type, Value,
};

use crate::algo::registry::Registry;
use crate::SocialCleanPlugin;

pub struct Platforms;

impl PluginCommand for Platforms {
    type Plugin = SocialCleanPlugin;

    fn name(&self) -> &str {
        "social platforms"
    }

    fn description(&self) -> &str {
        "List supported platforms in lookup order"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::Nothing, Type::table())
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["platforms", "hosts", "registry", "supported"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: "social platforms",
                description: "The built-in platform table, in lookup order",
                result: Some(platform_table(&Registry::builtin(), Span::test_data())),
            },
            Example {
                example: "social platforms | get display_name",
                description: "Names of the supported platforms",
                result: None,
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
        let table = platform_table(plugin.cleaner.registry(), call.head);
        Ok(PipelineData::Value(table, None))
    }
}

fn platform_table(registry: &Registry, span: Span) -> Value {
    let strings = |items: &[String]| {
        Value::list(items.iter().map(|s| Value::string(s, span)).collect(), span)
    };

    let rows = registry
        .platforms()
        .iter()
        .map(|p| {
            let mut record = Record::new();
            record.push("key", Value::string(&p.key, span));
            record.push("display_name", Value::string(&p.display_name, span));
            record.push("hostnames", strings(&p.hostnames));
            record.push("tracking_params", strings(&p.tracking_params));
            Value::record(record, span)
        })
        .collect();

    Value::list(rows, span)
}
