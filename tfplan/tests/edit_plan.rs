use anyhow::Result;
use prost::Message;
use rmpv::Value;
use std::path::Path;
use tfplan::{
    archive::{Member, PlanFile},
    plan::{Action, Backend, Change, DynamicValue, OutputChange, Plan, ResourceInstanceChange},
    session::{self, Config, PlanEditor},
};

fn msgpack(value: &Value) -> Vec<u8> {
    let mut bytes = Vec::new();
    rmpv::encode::write_value(&mut bytes, value).unwrap();
    bytes
}

fn object(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::from(k), v))
            .collect(),
    )
}

fn instance(ami: &str) -> Value {
    object(vec![
        ("ami", Value::from(ami)),
        ("id", Value::Ext(0, vec![0])),
        ("tags", object(vec![("Name", Value::from("web"))])),
    ])
}

fn connection(host: &str) -> Value {
    object(vec![(
        "transport",
        Value::Array(vec![
            Value::Binary(br#"["object",{"host":"string"}]"#.to_vec()),
            object(vec![("host", Value::from(host))]),
        ]),
    )])
}

fn plan() -> Plan {
    Plan {
        version: 3,
        terraform_version: "1.9.1".to_string(),
        variables: [("ami".to_string(), DynamicValue::new(msgpack(&Value::from("ami-1"))))]
            .into_iter()
            .collect(),
        resource_changes: vec![ResourceInstanceChange {
            addr: "aws_instance.web".to_string(),
            prev_run_addr: "aws_instance.web".to_string(),
            provider: "provider[\"registry.terraform.io/hashicorp/aws\"]".to_string(),
            change: Some(Change {
                action: Action::Create as i32,
                values: vec![
                    DynamicValue::new(msgpack(&Value::Nil)),
                    DynamicValue::new(msgpack(&instance("ami-1"))),
                ],
                ..Default::default()
            }),
            ..Default::default()
        }],
        output_changes: vec![OutputChange {
            name: "connection".to_string(),
            change: Some(Change {
                action: Action::Create as i32,
                values: vec![
                    DynamicValue::new(msgpack(&Value::Nil)),
                    DynamicValue::new(msgpack(&connection("0.0.0.0"))),
                ],
                ..Default::default()
            }),
            sensitive: false,
        }],
        backend: Some(Backend {
            r#type: "local".to_string(),
            config: Some(DynamicValue::new(msgpack(&object(vec![(
                "path",
                Value::from("terraform.tfstate"),
            )])))),
            workspace: "default".to_string(),
        }),
        applyable: true,
        complete: true,
        ..Default::default()
    }
}

fn plan_file(plan: &Plan) -> PlanFile {
    PlanFile::Archive(vec![
        Member {
            name: "tfplan".to_string(),
            contents: plan.encode_to_vec(),
        },
        Member {
            name: "tfstate".to_string(),
            contents: b"{\"version\": 4, \"serial\": 1}\n".to_vec(),
        },
    ])
}

fn rewrite(path: &Path, from: &str, to: &str) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    std::fs::write(path, text.replace(from, to))?;
    Ok(())
}

#[test]
fn edit_archive_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.tfplan");
    let destination = dir.path().join("destination.tfplan");
    plan_file(&plan()).write(&source).unwrap();

    let text_editor = |path: &Path| -> Result<()> {
        rewrite(path, "ami-1", "ami-2")?;
        rewrite(path, "\"serial\": 1", "\"serial\": 2")?;
        rewrite(path, "\"workspace\": \"default\"", "\"workspace\": \"staging\"")
    };
    let value_editor = |path: &Path| -> Result<()> {
        rewrite(path, "ami-1", "ami-2")?;
        rewrite(path, "0.0.0.0", "10.0.0.1")
    };

    let work_dir = tempfile::tempdir().unwrap();
    let mut file = PlanFile::read(&source).unwrap();
    PlanEditor::new(&text_editor, &value_editor, work_dir.path())
        .edit_plan_file(&mut file)
        .unwrap();
    file.write(&destination).unwrap();
    assert_eq!(std::fs::read_dir(work_dir.path()).unwrap().count(), 0);

    let PlanFile::Archive(members) = PlanFile::read(&destination).unwrap() else {
        panic!("expected a plan archive");
    };
    assert_eq!(members.len(), 2);
    assert_eq!(members[1].contents, b"{\"version\": 4, \"serial\": 2}\n");

    let edited = Plan::decode(members[0].contents.as_slice()).unwrap();
    let mut expected = plan();
    expected.variables.insert(
        "ami".to_string(),
        DynamicValue::new(msgpack(&Value::from("ami-2"))),
    );
    expected.resource_changes[0].change.as_mut().unwrap().values[1] =
        DynamicValue::new(msgpack(&instance("ami-2")));
    expected.output_changes[0].change.as_mut().unwrap().values[1] =
        DynamicValue::new(msgpack(&connection("10.0.0.1")));
    expected.backend.as_mut().unwrap().workspace = "staging".to_string();
    assert_eq!(edited, expected);

    // the source is left alone
    assert_eq!(PlanFile::read(&source).unwrap(), plan_file(&plan()));
}

#[test]
fn failed_edit_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.tfplan");
    plan_file(&plan()).write(&source).unwrap();

    let failing = |_: &Path| -> Result<()> { anyhow::bail!("editor exited with status 1") };
    let mut file = PlanFile::read(&source).unwrap();
    let err = PlanEditor::new(&failing, &failing, dir.path())
        .edit_plan_file(&mut file)
        .unwrap_err();
    assert!(format!("{:#}", err).contains("editor exited with status 1"));
    assert_eq!(PlanFile::read(&source).unwrap(), plan_file(&plan()));
}

#[test]
fn show_lists_every_value() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("plan");
    plan_file(&plan()).write(&source).unwrap();

    let text = session::show_plan_file(&source).unwrap();
    for header in [
        "# plan_variable_ami (typed)",
        "# resource_change_aws_instance.web_0 (untyped)",
        "# resource_change_aws_instance.web_1 (untyped)",
        "# output_change_connection_1 (untyped)",
        "# backend_config (typed)",
    ] {
        assert!(text.contains(header), "missing {} in\n{}", header, text);
    }
    assert!(text.contains("\"$ext\""));
}

#[cfg(unix)]
#[test]
fn command_editors_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan");
    plan_file(&plan()).write(&path).unwrap();

    let config = Config {
        text_editor: "true".to_string(),
        value_editor: "true".to_string(),
        plan_only: true,
    };
    session::edit_plan_file(&config, &path, &path).unwrap();

    let file = PlanFile::read(&path).unwrap();
    assert_eq!(Plan::decode(file.plan().unwrap()).unwrap(), plan());
}
