use std::fs;

use tempfile::TempDir;
use wirebox::config::{ConfigLoader, reload};
use wirebox::value::Value;

use super::demo_context;

const CONTEXT_TOML: &str = r#"
[properties]
greeting = "hello"
mode = "fast"

[[builder]]
name = "printer"
type = "demo.Printer"

[[builder]]
name = "greeter"
type = "demo.Greeter"
args = ["${greeting}"]
fields = { printer = { ref = "printer" } }

[[builder]]
name = "svc"
type = "demo.Service"
aliases = ["service"]
auto-init = true
init-method = "start"
destroy-method = "close"
calls = [{ method = "configure", args = ["${mode}", { value = "safe", index = 1 }] }]

[[aspect]]
pointcut = "public string demo.Greeter.greet()"
handler-type = "demo.Shout"
"#;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_file_end_to_end() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "context.toml", CONTEXT_TOML);

    let context = demo_context();
    let loaded = ConfigLoader::new(&context).load_file(&path).unwrap();
    assert_eq!(loaded, 3);
    context.initialize().unwrap();

    let svc = context.singleton("svc").unwrap();
    assert_eq!(svc.field("mode"), Some(Value::from("pair:fast+safe")));
    assert_eq!(svc.field("started"), Some(Value::Bool(true)));
    assert!(context.singleton("greeter").is_none());

    let greeter = context.build("greeter").unwrap();
    assert_eq!(context.invoke(&greeter, "greet", &[]).unwrap(), Value::from("HELLO!"));
}

#[test]
fn test_load_file_reports_the_path() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "broken.toml", "[[builder]\nname = ");

    let context = demo_context();
    let error = ConfigLoader::new(&context).load_file(&path).unwrap_err();
    let message = error.to_string();
    assert!(message.starts_with("Failed to parse config file"));
    assert!(message.contains("broken.toml"));
}

#[test]
fn test_reload_keeps_refreshable_singletons() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "context.toml", CONTEXT_TOML);

    let context = demo_context();
    ConfigLoader::new(&context).load_file(&path).unwrap();
    context.initialize().unwrap();
    let svc = context.build("service").unwrap();

    let replacement = r#"
        [properties]
        greeting = "bye"

        [[builder]]
        name = "svc"
        type = "demo.Service"

        [[builder]]
        name = "greeter"
        type = "demo.Greeter"
        args = ["${greeting}"]
    "#;
    fs::write(&path, replacement).unwrap();
    reload(&context, &path).unwrap();

    let kept = context.build("svc").unwrap();
    assert!(kept.same_instance(&svc));
    assert_eq!(kept.field("refreshes"), Some(Value::Int(1)));
    assert!(!context.contains("printer"));
    assert!(!context.contains("service"));

    let greeter = context.build("greeter").unwrap();
    assert_eq!(context.invoke(&greeter, "greet", &[]).unwrap(), Value::from("bye!"));
}

#[test]
fn test_failed_reload_leaves_context_untouched() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "context.toml", CONTEXT_TOML);

    let context = demo_context();
    ConfigLoader::new(&context).load_file(&path).unwrap();
    let greeter = context.build("greeter").unwrap();

    fs::write(&path, "[[builder]]\nname = \"x\"\ntype = \"demo.Printer\"\nscpoe = 1\n").unwrap();
    assert!(reload(&context, &path).is_err());

    let dangling = r#"
        [[aspect]]
        pointcut = "pkg.Type.("
    "#;
    fs::write(&path, dangling).unwrap();
    assert!(reload(&context, &path).is_err());

    assert!(context.build("greeter").unwrap().same_instance(&greeter));
    assert!(context.contains("service"));
}
