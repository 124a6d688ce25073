//! Nushell plugin tests, run in-process with `nu-plugin-test-support`.

#![cfg(feature = "plugin")]

use nu_plugin_social_clean::commands::{Clean, CleanText, CleanUrl, Platforms};
use nu_plugin_social_clean::{Registry, SocialCleanPlugin};
use nu_plugin_test_support::PluginTest;
use nu_protocol::{ShellError, Span, Value};

fn plugin_test() -> Result<PluginTest, ShellError> {
    PluginTest::new("social_clean", SocialCleanPlugin::new(Registry::builtin()).into())
}

#[test]
fn clean_url_examples() -> Result<(), ShellError> {
    plugin_test()?.test_command_examples(&CleanUrl)
}

#[test]
fn clean_text_examples() -> Result<(), ShellError> {
    plugin_test()?.test_command_examples(&CleanText)
}

#[test]
fn platforms_examples() -> Result<(), ShellError> {
    plugin_test()?.test_command_examples(&Platforms)
}

#[test]
fn clean_table_adds_columns() -> Result<(), ShellError> {
    let out = plugin_test()?
        .eval(r#"[[url]; ["https://x.com/a/status/1?s=20"] ["https://example.com"]] | social clean"#)?
        .into_value(Span::test_data())?;
    let rows = out.as_list()?;
    assert_eq!(rows.len(), 2);

    let first = rows[0].as_record()?;
    assert_eq!(
        first.get("clean_url").map(|v| v.as_str()).transpose()?,
        Some("https://x.com/a/status/1/")
    );
    assert_eq!(
        first.get("platform").map(|v| v.as_str()).transpose()?,
        Some("X (Twitter)")
    );

    let second = rows[1].as_record()?;
    assert!(matches!(second.get("clean_url"), Some(Value::Nothing { .. })));
    assert!(second.get("error").is_some());
    Ok(())
}

#[test]
fn clean_list_of_strings() -> Result<(), ShellError> {
    let out = plugin_test()?
        .eval(r#"["youtu.be/abc?si=1"] | social clean"#)?
        .into_value(Span::test_data())?;
    let row = out.as_list()?[0].as_record()?;
    assert_eq!(
        row.get("url").map(|v| v.as_str()).transpose()?,
        Some("youtu.be/abc?si=1")
    );
    assert_eq!(
        row.get("clean_url").map(|v| v.as_str()).transpose()?,
        Some("https://youtu.be/abc")
    );
    Ok(())
}

#[test]
fn clean_url_unsupported_fails() -> Result<(), ShellError> {
    let error = match plugin_test()?.eval(r#"social clean-url "https://example.com/""#) {
        Err(e) => format!("{e:?}"),
        Ok(data) => match data.into_value(Span::test_data()) {
            Err(e) => format!("{e:?}"),
            Ok(Value::Error { error, .. }) => format!("{error:?}"),
            Ok(other) => panic!("expected an error, got {other:?}"),
        },
    };
    assert!(error.contains("Unsupported platform"), "unexpected error: {error}");
    assert!(error.contains("X (Twitter)"), "unexpected error: {error}");
    Ok(())
}
